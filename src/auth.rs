//! Admin authentication.
//!
//! Any signed-in user is an admin. With a remote store, credentials live in
//! the `admins` table as Argon2id hashes; without one only the configured
//! demo credentials are accepted and sign-up is unavailable.

use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog::store::remote::classify;
use crate::catalog::store::StoreError;
use crate::config::DemoAdmin;

pub const AUTH_COOKIE: &str = "auth-token";
pub const TOKEN_LIFETIME_DAYS: i64 = 60;

const ADMIN_ROLE: &str = "admin";
const DEMO_ADMIN_ID: &str = "demo-admin";

/// Compared against when the email is unknown, so both paths cost one
/// Argon2 verification.
const DUMMY_HASH: &str = "$argon2id$v=19$m=15000,t=2,p=1$\
    gZiV/M1gPc22ElAH/Jh1Hw$\
    CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Sign-up is unavailable without a configured catalog database")]
    NotConfigured,

    #[error("Admin already exists: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct SignedIn {
    pub email: String,
    pub token: String,
}

#[derive(Clone)]
enum CredentialSource {
    Database(PgPool),
    Demo(DemoAdmin),
}

#[derive(Clone)]
pub struct AuthService {
    source: CredentialSource,
    jwt_secret: Secret<String>,
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: String,
    password_hash: String,
}

impl AuthService {
    pub fn with_database(db: PgPool, jwt_secret: Secret<String>) -> Self {
        Self {
            source: CredentialSource::Database(db),
            jwt_secret,
        }
    }

    pub fn demo(admin: DemoAdmin, jwt_secret: Secret<String>) -> Self {
        Self {
            source: CredentialSource::Demo(admin),
            jwt_secret,
        }
    }

    #[tracing::instrument(name = "Admin sign-in", skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, AuthError> {
        let email = normalize_email(&credentials.email);

        let user_id = match &self.source {
            CredentialSource::Demo(admin) => {
                let matches = email == normalize_email(&admin.email)
                    && credentials.password == *admin.password.expose_secret();
                if !matches {
                    tracing::warn!("Rejected sign-in with non-demo credentials");
                    return Err(AuthError::InvalidCredentials);
                }
                DEMO_ADMIN_ID.to_string()
            }
            CredentialSource::Database(db) => {
                let row = sqlx::query_as::<_, AdminRow>(
                    "SELECT id, password_hash FROM admins WHERE email = $1",
                )
                .bind(&email)
                .fetch_optional(db)
                .await
                .context("Failed to look up admin credentials")?;

                let (user_id, expected_hash) = match row {
                    Some(row) => (Some(row.id), row.password_hash),
                    None => (None, DUMMY_HASH.to_string()),
                };

                verify_password_hash(&expected_hash, &credentials.password)?;
                user_id.ok_or_else(|| {
                    tracing::warn!("Sign-in for unknown admin");
                    AuthError::InvalidCredentials
                })?
            }
        };

        let token = self.issue_token(&email, &user_id)?;
        tracing::info!("Admin signed in");
        Ok(SignedIn { email, token })
    }

    #[tracing::instrument(name = "Admin sign-up", skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SignedIn, AuthError> {
        let CredentialSource::Database(db) = &self.source else {
            tracing::warn!("Sign-up attempted in demo mode");
            return Err(AuthError::NotConfigured);
        };

        let email = normalize_email(&credentials.email);
        let password_hash = compute_password_hash(&credentials.password)?;
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO admins (id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(&id)
            .bind(&email)
            .bind(&password_hash)
            .execute(db)
            .await
            .map_err(|e| match classify(e) {
                StoreError::Validation(_) => AuthError::Duplicate(email.clone()),
                other => AuthError::Unexpected(anyhow::Error::new(other).context("Failed to store admin")),
            })?;

        tracing::info!("Registered admin {}", id);
        let token = self.issue_token(&email, &id)?;
        Ok(SignedIn { email, token })
    }

    pub fn issue_token(&self, email: &str, user_id: &str) -> Result<String, AuthError> {
        let claims = Claims {
            sub: email.to_owned(),
            user_id: user_id.to_owned(),
            role: ADMIN_ROLE.to_owned(),
            exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp()
                as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
        )
        .context("Failed to encode JWT token")
        .map_err(AuthError::from)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("JWT validation failed: {:?}", e);
            AuthError::InvalidCredentials
        })
    }

    /// The `isAdmin` capability: any valid token belongs to an admin.
    /// Returns the token's claims when it does.
    pub fn admin_claims(&self, token: Option<&str>) -> Option<Claims> {
        token.and_then(|t| self.verify_token(t).ok())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn verify_password_hash(expected_hash: &str, candidate: &str) -> Result<(), AuthError> {
    let expected_hash = PasswordHash::new(expected_hash)
        .context("Failed to parse hash in PHC string format.")?;

    Argon2::default()
        .verify_password(candidate.as_bytes(), &expected_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

pub fn compute_password_hash(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let params = Params::new(15000, 2, 1, None)
        .map_err(|e| anyhow::anyhow!("Failed to create Argon2 params: {e}"))?;

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}
