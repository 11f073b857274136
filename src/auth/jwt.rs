use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use uuid::Uuid;

use crate::auth::{AuthConfig, AuthError, AuthResult};

const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct SignedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 access-token minting and validation bound to one secret.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_token_ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, issuer: &str, access_token_ttl: Duration) -> Self {
        let secret_bytes = secret.as_bytes();
        let encoding_key = EncodingKey::from_secret(secret_bytes);
        let decoding_key = DecodingKey::from_secret(secret_bytes);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: issuer.to_string(),
            access_token_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            Duration::seconds(config.access_token_ttl_secs),
        )
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Mint an access token with the configured lifetime.
    pub fn issue_access_token(&self, user_id: Uuid) -> AuthResult<SignedAccessToken> {
        self.issue_token(user_id, self.access_token_ttl)
    }

    pub fn issue_token(&self, user_id: Uuid, ttl: Duration) -> AuthResult<SignedAccessToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Config("access token lifetime out of range".into()))?;

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SignedAccessToken { token, expires_at })
    }

    /// Resolve the user a token was issued to.
    ///
    /// Expiry is checked against whole seconds with no leeway: a token is dead
    /// from the second named in `exp` onwards.
    pub fn validate_access_token(&self, token: &str) -> AuthResult<Uuid> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })?;
        let claims = token_data.claims;

        if Utc::now().timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AuthError::TokenInvalid)
    }
}

/// Opaque refresh token: 256 random bits, no embedded claims.
pub fn make_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const LONG_SECRET: &str = "AssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecretAssumeItsASecret";

    fn service(secret: &str) -> JwtService {
        JwtService::new(secret, "chirpy", Duration::hours(1))
    }

    #[test]
    fn issues_and_validates_for_any_secret_length() {
        assert!(LONG_SECRET.len() >= 200);

        for secret in ["AssumeItsASecret", "", LONG_SECRET] {
            let jwt = service(secret);
            let user_id = Uuid::new_v4();
            let token = jwt
                .issue_token(user_id, Duration::minutes(1))
                .expect("issue token");

            let resolved = jwt
                .validate_access_token(&token.token)
                .expect("validate token");
            assert_eq!(resolved, user_id, "secret of length {}", secret.len());
        }
    }

    #[test]
    fn access_tokens_last_an_hour() {
        let jwt = service("AssumeItsASecret");
        let before = Utc::now();
        let token = jwt.issue_access_token(Uuid::new_v4()).expect("issue token");

        let lifetime = token.expires_at - before;
        assert!(lifetime >= Duration::hours(1));
        assert!(lifetime < Duration::hours(1) + Duration::seconds(5));
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        let err = service("AssumeItsASecret")
            .issue_token(Uuid::new_v4(), Duration::MAX)
            .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let pairs = [
            ("AssumeItsASecret", "AssumeItsAnotherSecret"),
            ("", "AssumeItsASecret"),
            (LONG_SECRET, ""),
        ];

        for (signing, checking) in pairs {
            let token = service(signing)
                .issue_token(Uuid::new_v4(), Duration::minutes(1))
                .expect("issue token");
            let err = service(checking)
                .validate_access_token(&token.token)
                .unwrap_err();
            assert!(matches!(err, AuthError::TokenInvalid));
        }
    }

    #[test]
    fn rejects_expired_tokens() {
        let jwt = service("AssumeItsASecret");
        let token = jwt
            .issue_token(Uuid::new_v4(), Duration::milliseconds(1))
            .expect("issue token");

        std::thread::sleep(std::time::Duration::from_millis(1100));

        let err = jwt.validate_access_token(&token.token).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn rejects_foreign_issuer() {
        let token = JwtService::new("AssumeItsASecret", "someone-else", Duration::hours(1))
            .issue_access_token(Uuid::new_v4())
            .expect("issue token");
        let err = service("AssumeItsASecret")
            .validate_access_token(&token.token)
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[test]
    fn rejects_subjects_that_are_not_user_ids() {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: "not-a-uuid".into(),
            iss: "chirpy".into(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"AssumeItsASecret"),
        )
        .expect("encode");

        let err = service("AssumeItsASecret")
            .validate_access_token(&token)
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[test]
    fn rejects_garbage() {
        let jwt = service("AssumeItsASecret");
        for token in ["", "token", "a.b.c"] {
            assert!(matches!(
                jwt.validate_access_token(token),
                Err(AuthError::TokenInvalid)
            ));
        }
    }

    #[test]
    fn refresh_tokens_are_opaque_and_unique() {
        let tokens: HashSet<String> = (0..64).map(|_| make_refresh_token()).collect();
        assert_eq!(tokens.len(), 64);

        for token in &tokens {
            assert_eq!(token.len(), 43);
            assert!(!token.contains('.'));
            assert!(URL_SAFE_NO_PAD.decode(token).is_ok());
        }
    }
}
