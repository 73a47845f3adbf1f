//! Authentication service: login for staff and students, JWT issuance

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{UserClaims, UserRole},
    repository::Repository,
};

/// Authenticated principal returned by a successful login
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Principal {
    /// Student id or clerk id
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username (staff or student) or email (students) and
    /// return a JWT token. Staff accounts are tried first; when their
    /// password does not match, students are tried.
    pub async fn login(&self, login: &str, password: &str) -> AppResult<(String, Principal)> {
        let invalid = || AppError::Authentication("Invalid login or password".to_string());
        let login = login.trim();

        let mut uow = self.repository.begin().await?;

        let staff = match uow.find_staff_by_username(login).await? {
            Some((account, clerk)) if verify_password(&account.password_hash, password)? => {
                Some(Principal {
                    id: clerk.id,
                    username: account.username,
                    full_name: clerk.full_name(),
                    role: account.role,
                })
            }
            _ => None,
        };

        // A student may share a username with a staff member
        let principal = match staff {
            Some(principal) => principal,
            None => match uow.find_user_by_login(login).await? {
                Some(user) if verify_password(&user.password_hash, password)? => Principal {
                    id: user.id,
                    full_name: user.full_name(),
                    username: user.username,
                    role: user.role,
                },
                _ => {
                    tracing::warn!(login = %login, "Login failed");
                    return Err(invalid());
                }
            },
        };

        let token = self.create_token(&principal)?;
        tracing::info!(user_id = %principal.id, role = %principal.role, "User logged in");
        Ok((token, principal))
    }

    /// Create JWT token
    pub fn create_token(&self, principal: &Principal) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: principal.username.clone(),
            user_id: principal.id,
            role: principal.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Validate a bearer token
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::user::CreateStudent,
        test_support::{Fixture, CLERK_PASSWORD, STUDENT_PASSWORD},
    };

    #[test]
    fn password_hash_verifies_only_the_same_password() {
        let hash = hash_password("lib123").unwrap();
        assert!(verify_password(&hash, "lib123").unwrap());
        assert!(!verify_password(&hash, "lib124").unwrap());
    }

    #[tokio::test]
    async fn staff_login_yields_clerk_principal() {
        let fx = Fixture::new().await;
        let (token, principal) = fx
            .services
            .auth
            .login("librarian", CLERK_PASSWORD)
            .await
            .unwrap();

        assert_eq!(principal.id, fx.clerk.id);
        assert_eq!(principal.role, UserRole::Clerk);
        let claims = fx.services.auth.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, fx.clerk.id);
    }

    #[tokio::test]
    async fn students_log_in_by_username_or_email() {
        let fx = Fixture::new().await;
        let auth = &fx.services.auth;

        let (_, by_name) = auth.login("student", STUDENT_PASSWORD).await.unwrap();
        let (_, by_email) = auth.login("STUDENT@example.com", STUDENT_PASSWORD).await.unwrap();

        assert_eq!(by_name.id, fx.student.id);
        assert_eq!(by_email.id, fx.student.id);
        assert_eq!(by_name.role, UserRole::Student);
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let fx = Fixture::new().await;
        let auth = &fx.services.auth;

        let err = auth.login("student", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        let err = auth.login("nobody", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        assert!(auth.verify_token("not-a-token").is_err());
    }

    #[tokio::test]
    async fn student_sharing_a_staff_username_can_log_in() {
        let fx = Fixture::new().await;
        let student = fx
            .services
            .accounts
            .create_student(CreateStudent {
                first_name: "Lee".into(),
                middle_name: None,
                last_name: "Brarian".into(),
                email: "lee@example.com".into(),
                contact_number: String::new(),
                address: String::new(),
                college: String::new(),
                department: String::new(),
                username: "librarian".into(),
                password: "studentpw".into(),
            })
            .await
            .unwrap();

        let auth = &fx.services.auth;
        let (_, as_student) = auth.login("librarian", "studentpw").await.unwrap();
        assert_eq!(as_student.id, student.id);
        assert_eq!(as_student.role, UserRole::Student);

        let (_, as_clerk) = auth.login("librarian", CLERK_PASSWORD).await.unwrap();
        assert_eq!(as_clerk.id, fx.clerk.id);
    }
}
