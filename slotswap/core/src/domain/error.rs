// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Errors
//!
//! Failure taxonomy shared by the event store, the swap negotiation engine
//! and the identity services. Every engine failure is synchronous and leaves
//! the store untouched: validation runs before the first write, or the
//! surrounding transaction is rolled back.
//!
//! | Variant | Meaning | HTTP |
//! |---------|---------|------|
//! | `NotFound` | unknown id or identity | 404 |
//! | `Forbidden` | ownership / identity mismatch | 403 |
//! | `InvalidState` | status precondition failed (incl. lost races) | 409 |
//! | `InvalidInput` | malformed request data | 400 |
//! | `Conflict` | uniqueness violation (duplicate email) | 409 |
//! | `Unauthenticated` | bad credentials or token | 401 |
//! | `Repository` | storage failure | 500 |

use thiserror::Error;

use crate::domain::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => DomainError::NotFound(what),
            RepositoryError::Conflict(what) => DomainError::Conflict(what),
            other => DomainError::Repository(other),
        }
    }
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(why: impl Into<String>) -> Self {
        Self::Forbidden(why.into())
    }

    pub fn invalid_state(why: impl Into<String>) -> Self {
        Self::InvalidState(why.into())
    }

    /// Failure outside the domain taxonomy, reported as a 500.
    pub fn internal(what: impl Into<String>) -> Self {
        Self::Repository(RepositoryError::Unknown(what.into()))
    }

    /// Stable machine-readable code, used in error bodies and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidState(_) => "invalid_state",
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Repository(_) => "internal",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
