//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_assignment_repository;
mod in_memory_audit_repository;
mod in_memory_permission_name_cache;
mod in_memory_permission_repository;
mod in_memory_role_repository;
mod migrations;
mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_permission_repository;
mod postgres_role_repository;
mod redis_permission_name_cache;


pub use in_memory_assignment_repository::InMemoryAssignmentRepository;
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_permission_name_cache::InMemoryPermissionNameCache;
pub use in_memory_permission_repository::InMemoryPermissionRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use migrations::run_migrations;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use redis_permission_name_cache::RedisPermissionNameCache;
