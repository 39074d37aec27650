// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Signup, login and bearer token verification.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::repository::UserRepository;
use crate::domain::user::{normalize_email, NewUser, User};
use crate::infrastructure::credentials::{PasswordHasher, TokenIssuer};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            tokens,
        }
    }

    /// Register an account and return a bearer token for it.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> DomainResult<String> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let hash = self.hash_password(password.to_string()).await?;
        let new_user = NewUser::new(name, email, hash)?;
        let user = self.users.create(new_user).await?;
        info!(user_id = %user.id, "User registered");

        self.issue(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> DomainResult<String> {
        let invalid = || DomainError::Unauthenticated("invalid credentials".to_string());

        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?;
        if !verified {
            debug!(user_id = %user.id, "Login rejected");
            return Err(invalid());
        }

        info!(user_id = %user.id, "User logged in");
        self.issue(&user)
    }

    /// Verify a bearer token and return the caller identity it carries.
    pub fn authenticate(&self, token: &str) -> DomainResult<String> {
        self.tokens
            .verify(token)
            .map(|claims| claims.sub)
            .map_err(|e| {
                debug!(error = %e, "Bearer token rejected");
                DomainError::Unauthenticated("invalid or expired token".to_string())
            })
    }

    fn issue(&self, user: &User) -> DomainResult<String> {
        self.tokens
            .issue(&user.email)
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    // runs on the blocking pool
    async fn hash_password(&self, password: String) -> DomainResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?
            .map_err(|e| DomainError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::InMemoryStore;
    use chrono::Duration;

    fn service() -> AuthService {
        let tokens = TokenIssuer::new(b"auth-service-test-secret", "slotswap", Duration::hours(1));
        AuthService::new(Arc::new(InMemoryStore::new()), tokens)
    }

    #[tokio::test]
    async fn test_signup_token_carries_normalized_email() {
        let auth = service();
        let token = auth.signup("Alice", "Alice@Example.com", "correct horse").await.unwrap();
        assert_eq!(auth.authenticate(&token).unwrap(), "alice@example.com");
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let auth = service();
        let err = auth.signup("Alice", "alice@example.com", "short").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        auth.signup("Alice", "alice@example.com", "correct horse").await.unwrap();
        let err = auth.signup("Other", "ALICE@example.com", "correct horse").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login() {
        let auth = service();
        auth.signup("Alice", "alice@example.com", "correct horse").await.unwrap();

        let token = auth.login(" alice@example.com", "correct horse").await.unwrap();
        assert_eq!(auth.authenticate(&token).unwrap(), "alice@example.com");

        for (email, password) in [("alice@example.com", "wrong horse"), ("bob@example.com", "correct horse")] {
            let err = auth.login(email, password).await.unwrap_err();
            assert!(matches!(err, DomainError::Unauthenticated(ref m) if m == "invalid credentials"));
        }
    }

    #[test]
    fn test_foreign_token_rejected() {
        let auth = service();
        let foreign = TokenIssuer::new(b"some-other-secret-value", "slotswap", Duration::hours(1))
            .issue("alice@example.com")
            .unwrap();
        assert!(matches!(
            auth.authenticate(&foreign),
            Err(DomainError::Unauthenticated(_))
        ));
    }
}
