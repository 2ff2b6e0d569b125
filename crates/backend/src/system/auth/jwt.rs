use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::{Role, TokenClaims};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::OnceCell;
use rand::Rng;

use crate::shared::config::AuthConfig;

struct JwtSettings {
    secret: String,
    lifetime_hours: i64,
}

static JWT_SETTINGS: OnceCell<JwtSettings> = OnceCell::new();

/// Install the signing secret and token lifetime from configuration
pub fn initialize(auth: &AuthConfig) {
    let secret = match &auth.jwt_secret {
        Some(secret) if !secret.trim().is_empty() => secret.clone(),
        _ => {
            tracing::warn!(
                "auth.jwt_secret is not configured, tokens will not survive a restart"
            );
            generate_jwt_secret()
        }
    };

    let settings = JwtSettings {
        secret,
        lifetime_hours: auth.token_lifetime_hours,
    };
    if JWT_SETTINGS.set(settings).is_err() {
        tracing::warn!("JWT settings were already initialized");
    }
}

fn settings() -> Result<&'static JwtSettings> {
    JWT_SETTINGS
        .get()
        .context("JWT settings have not been initialized")
}

/// Generate JWT access token
pub fn generate_access_token(user_id: &str, username: &str, level: Role) -> Result<String> {
    let settings = settings()?;
    encode_token(user_id, username, level, &settings.secret, settings.lifetime_hours)
}

/// Validate JWT token and extract claims
pub fn validate_token(token: &str) -> Result<TokenClaims> {
    decode_token(token, &settings()?.secret)
}

fn encode_token(
    user_id: &str,
    username: &str,
    level: Role,
    secret: &str,
    lifetime_hours: i64,
) -> Result<String> {
    let now = Utc::now();
    let exp = (now + chrono::Duration::hours(lifetime_hours)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = TokenClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        level,
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

fn decode_token(token: &str, secret: &str) -> Result<TokenClaims> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;

    Ok(token_data.claims)
}

/// Generate a cryptographically secure JWT secret (256 bits)
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}
