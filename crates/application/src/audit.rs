use async_trait::async_trait;
use warden_core::{AppResult, TenantId};
use warden_domain::AuditAction;

/// Audit event appended after a successful authorization mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant the mutated record belongs to, if any.
    pub tenant_id: Option<TenantId>,
    /// Subject the event concerns: the acting caller for entity
    /// operations, the affected principal for assignment operations.
    pub subject: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Mutated resource type.
    pub resource_type: String,
    /// Mutated resource identifier.
    pub resource_id: String,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Repository port for appending audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one event to the audit trail.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
