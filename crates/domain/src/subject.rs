use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{AppError, TenantId};

/// Kinds of principal the engine can hold assignments for.
///
/// The kind is part of the pivot key, so two principals of different kinds
/// may share an identifier without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// An interactive user account.
    User,
    /// A machine principal acting without a user session.
    ServiceAccount,
}

impl SubjectKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ServiceAccount => "service_account",
        }
    }
}

impl FromStr for SubjectKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "service_account" => Ok(Self::ServiceAccount),
            _ => Err(AppError::Validation(format!(
                "unknown subject kind '{value}'"
            ))),
        }
    }
}

/// Typed reference to a principal: kind plus identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    kind: SubjectKind,
    id: Uuid,
}

impl SubjectRef {
    /// Creates a reference to a principal of the given kind.
    #[must_use]
    pub fn new(kind: SubjectKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Creates a reference to a user principal.
    #[must_use]
    pub fn user(id: Uuid) -> Self {
        Self::new(SubjectKind::User, id)
    }

    /// Creates a reference to a service-account principal.
    #[must_use]
    pub fn service_account(id: Uuid) -> Self {
        Self::new(SubjectKind::ServiceAccount, id)
    }

    /// Returns the principal kind.
    #[must_use]
    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Display for SubjectRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// A principal together with its tenant, as handed to the assignment engine
/// and the authorization resolver.
///
/// The tenant recorded here is stamped onto every pivot row created for the
/// subject, so later revocation stays scoped to the tenant the assignment
/// was made under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    subject_ref: SubjectRef,
    tenant_id: Option<TenantId>,
}

impl Subject {
    /// Creates a subject value from a principal reference and its tenant.
    #[must_use]
    pub fn new(subject_ref: SubjectRef, tenant_id: Option<TenantId>) -> Self {
        Self {
            subject_ref,
            tenant_id,
        }
    }

    /// Returns the principal reference.
    #[must_use]
    pub fn subject_ref(&self) -> SubjectRef {
        self.subject_ref
    }

    /// Returns the subject's tenant, or `None` for a tenant-less subject.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }
}
