//! Application services and ports for the Warden authorization engine.

#![forbid(unsafe_code)]

mod assignment_ports;
mod assignment_service;
mod audit;
mod authorization_service;
mod cache_ports;
mod config;
mod entity_ports;
mod entity_ref;
mod permission_registry;
mod permission_service;
mod role_service;

#[cfg(test)]
pub(crate) mod testing;

pub use assignment_ports::AssignmentRepository;
pub use assignment_service::AssignmentService;
pub use audit::{AuditEvent, AuditRepository};
pub use authorization_service::AuthorizationService;
pub use cache_ports::PermissionNameCache;
pub use config::{DEFAULT_CACHE_TTL_SECONDS, DEFAULT_SUPER_ADMIN_ROLE, RbacConfig};
pub use entity_ports::{EntityScope, PermissionRepository, RoleRepository, TenantSelection};
pub use entity_ref::{PermissionRef, RoleRef};
pub use permission_registry::{Decision, PermissionRegistry};
pub use permission_service::{CreatePermissionInput, PermissionService};
pub use role_service::{CreateRoleInput, RoleService};
