use crate::auth::{AuthError, AuthResult};

const DEFAULT_ISSUER: &str = "chirpy";
const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 60 * 24 * 60 * 60;
/// Upper bound for either token lifetime (ten years).
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Unparsable or non-positive values fall back to `default`; values past
/// [`MAX_TOKEN_TTL_SECS`] are a configuration error.
fn ttl_secs(key: &str, raw: Option<String>, default: i64) -> AuthResult<i64> {
    let Some(secs) = raw
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|secs| *secs > 0)
    else {
        return Ok(default);
    };
    if secs > MAX_TOKEN_TTL_SECS {
        return Err(AuthError::Config(format!(
            "{key} must be at most {MAX_TOKEN_TTL_SECS} seconds"
        )));
    }
    Ok(secs)
}

/// Authentication configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub polka_key: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("SECRET_JWT")
            .ok_or_else(|| AuthError::Config("SECRET_JWT is required".into()))?;
        if jwt_secret.is_empty() {
            log::warn!("SECRET_JWT is empty; access tokens are signed with an empty key");
        }
        let polka_key = lookup("POLKA_KEY")
            .ok_or_else(|| AuthError::Config("POLKA_KEY is required".into()))?;
        let jwt_issuer = lookup("CHIRPY_JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.into());
        let access_token_ttl_secs = ttl_secs(
            "CHIRPY_ACCESS_TOKEN_TTL_SECS",
            lookup("CHIRPY_ACCESS_TOKEN_TTL_SECS"),
            DEFAULT_ACCESS_TOKEN_TTL_SECS,
        )?;
        let refresh_token_ttl_secs = ttl_secs(
            "CHIRPY_REFRESH_TOKEN_TTL_SECS",
            lookup("CHIRPY_REFRESH_TOKEN_TTL_SECS"),
            DEFAULT_REFRESH_TOKEN_TTL_SECS,
        )?;

        Ok(Self {
            jwt_secret,
            jwt_issuer,
            polka_key,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
        })
    }
}
