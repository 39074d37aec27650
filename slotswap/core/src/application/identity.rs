// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::repository::UserRepository;
use crate::domain::user::{normalize_email, User};

/// Resolves an authenticated caller identity (email) to its user record.
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn resolve(&self, identity: &str) -> DomainResult<User> {
        self.users
            .find_by_email(&normalize_email(identity))
            .await?
            .ok_or_else(|| DomainError::not_found("user not found"))
    }
}
