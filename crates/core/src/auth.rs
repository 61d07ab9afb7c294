use serde::{Deserialize, Serialize};

use crate::TenantId;

/// Caller context threaded explicitly into every entity-store operation.
///
/// The context is produced by the identity/session collaborator and passed
/// as a value; visibility decisions never read ambient authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantContext {
    /// No authenticated subject. Listing operations apply no visibility
    /// filter in this context.
    Anonymous,
    /// An authenticated subject, which may or may not belong to a tenant.
    Authenticated {
        /// Stable subject claim from the identity provider.
        subject: String,
        /// Tenant of the authenticated subject, if any.
        tenant_id: Option<TenantId>,
    },
}

impl TenantContext {
    /// Creates an authenticated context from identity-provider data.
    #[must_use]
    pub fn authenticated(subject: impl Into<String>, tenant_id: Option<TenantId>) -> Self {
        Self::Authenticated {
            subject: subject.into(),
            tenant_id,
        }
    }

    /// Creates an authenticated context for a tenant-scoped subject.
    #[must_use]
    pub fn for_tenant(subject: impl Into<String>, tenant_id: TenantId) -> Self {
        Self::authenticated(subject, Some(tenant_id))
    }

    /// Returns the ambient tenant, if the context carries one.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { tenant_id, .. } => *tenant_id,
        }
    }

    /// Returns the authenticated subject claim, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { subject, .. } => Some(subject.as_str()),
        }
    }

    /// Returns the subject claim for audit trails, with a stable
    /// placeholder for anonymous callers.
    #[must_use]
    pub fn audit_subject(&self) -> &str {
        self.subject().unwrap_or("anonymous")
    }

    /// Returns whether the context has an authenticated subject.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::TenantContext;
    use crate::TenantId;

    #[test]
    fn anonymous_context_carries_no_tenant() {
        let context = TenantContext::Anonymous;
        assert!(!context.is_authenticated());
        assert!(context.tenant_id().is_none());
        assert_eq!(context.audit_subject(), "anonymous");
    }

    #[test]
    fn tenant_context_exposes_subject_and_tenant() {
        let tenant_id = TenantId::new();
        let context = TenantContext::for_tenant("alice", tenant_id);
        assert!(context.is_authenticated());
        assert_eq!(context.subject(), Some("alice"));
        assert_eq!(context.tenant_id(), Some(tenant_id));
    }
}
