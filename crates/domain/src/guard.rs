use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use warden_core::{AppError, AppResult};

/// Guard applied when an operation does not name one.
pub const DEFAULT_GUARD: &str = "web";

/// A named authentication domain partition.
///
/// Roles and permissions are scoped per guard: the same name may exist once
/// per guard within a tenant. Guard names are single lowercase tokens such
/// as `web` or `api`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuardName(String);

impl GuardName {
    /// Creates a validated guard name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "guard name must not be empty".to_owned(),
            ));
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "guard name '{trimmed}' must not contain whitespace"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the default `web` guard.
    #[must_use]
    pub fn web() -> Self {
        Self(DEFAULT_GUARD.to_owned())
    }

    /// Returns the underlying guard name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for GuardName {
    fn default() -> Self {
        Self::web()
    }
}

impl Display for GuardName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
