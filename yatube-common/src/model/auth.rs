use crate::{
    model::{Id, user::UserMarker},
    util::PositiveDuration,
};
use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString},
};
use base64::{DecodeError, Engine, display::Base64Display, prelude::BASE64_URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use std::{
    fmt::{Debug, Formatter},
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;
use time::UtcDateTime;

pub const SESSION_SECRET_LEN: usize = 32;
pub const SESSION_TOKEN_HASH_LEN: usize = 32;
pub const PASSWORD_SALT_LEN: usize = 16;

/// Prefix marking a hash that no password verifies against.
const UNUSABLE_PASSWORD_PREFIX: char = '!';

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum SessionTokenDecodeError {
    #[error("Not enough parts separated by ':'")]
    NotEnoughParts,
    #[error("Invalid user id: {0}")]
    InvalidUserId(ParseIntError),
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The length of the secret part is incorrect")]
    InvalidSecretLength,
}

/// The value of the session cookie: `<user id>:<base64url secret>`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionToken {
    pub user_id: Id<UserMarker>,
    pub secret: [u8; SESSION_SECRET_LEN],
}

/// SHA-256 of a session secret. Only this is persisted.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionTokenHash(pub [u8; SESSION_TOKEN_HASH_LEN]);

/// A persisted session.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Authentication {
    pub user: Id<UserMarker>,
    pub token_hash: SessionTokenHash,
    pub created_at: UtcDateTime,
    pub expires_after: Option<PositiveDuration>,
}

impl Authentication {
    #[must_use]
    pub fn is_expired_at(&self, now: UtcDateTime) -> bool {
        self.expires_after
            .is_some_and(|expires_after| self.created_at + expires_after.get() < now)
    }
}

impl SessionToken {
    #[must_use]
    pub fn generate_random(user_id: Id<UserMarker>) -> Self {
        Self {
            user_id,
            secret: rand::random(),
        }
    }

    #[must_use]
    pub fn as_token_str(&self) -> String {
        let user_id = self.user_id;
        let encoded_secret = Base64Display::new(&self.secret, &BASE64_URL_SAFE_NO_PAD);

        format!("{user_id}:{encoded_secret}")
    }

    #[must_use]
    pub fn hash(&self) -> SessionTokenHash {
        SessionTokenHash(Sha256::digest(self.secret).into())
    }
}

impl FromStr for SessionToken {
    type Err = SessionTokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user_id_part, secret_part) = s.split_once(':').ok_or(Self::Err::NotEnoughParts)?;

        let user_id = u64::from_str(user_id_part)
            .map_err(Self::Err::InvalidUserId)?
            .into();
        let secret = BASE64_URL_SAFE_NO_PAD
            .decode(secret_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidSecretLength)?;

        Ok(Self { user_id, secret })
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("user_id", &self.user_id)
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl Debug for SessionTokenHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionTokenHash")
            .field(&"[redacted]")
            .finish()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The session token hash had an invalid length")]
pub struct InvalidSessionTokenHashError;

impl TryFrom<Vec<u8>> for SessionTokenHash {
    type Error = InvalidSessionTokenHashError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Ok(Self(
            value.try_into().map_err(|_| InvalidSessionTokenHashError)?,
        ))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(password_hash::Error);

/// Argon2 PHC string of a user's password.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn generate(password: &str) -> Result<Self, PasswordHashError> {
        let salt_bytes: [u8; PASSWORD_SALT_LEN] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordHashError)?;

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordHashError)?;

        Ok(Self(hash.to_string()))
    }

    /// A hash that never verifies, for accounts without a password.
    #[must_use]
    pub fn unusable() -> Self {
        let marker: u64 = rand::random();
        Self(format!("{UNUSABLE_PASSWORD_PREFIX}{marker:016x}"))
    }

    /// Wraps a stored PHC string without parsing it; parsing happens on
    /// [`PasswordHash::verify`].
    #[must_use]
    pub fn from_stored(phc: String) -> Self {
        Self(phc)
    }

    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        if self.0.starts_with(UNUSABLE_PASSWORD_PREFIX) {
            return false;
        }

        password_hash::PasswordHash::new(&self.0).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for PasswordHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[redacted]").finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            Id,
            auth::{Authentication, PasswordHash, SessionToken, SessionTokenDecodeError},
        },
        util::PositiveDuration,
    };
    use time::{Duration, macros::utc_datetime};

    #[test]
    fn session_token_round_trips_through_cookie_value() {
        let token = SessionToken::generate_random(Id::from(42_u64));
        let token_str = token.as_token_str();

        assert!(token_str.starts_with("42:"));
        assert!(!token_str.contains('='));

        let parsed: SessionToken = token_str.parse().unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.hash(), token.hash());
    }

    #[test]
    fn malformed_session_tokens_are_rejected() {
        assert_eq!(
            "no-separator".parse::<SessionToken>(),
            Err(SessionTokenDecodeError::NotEnoughParts)
        );
        assert!(matches!(
            "abc:AAAA".parse::<SessionToken>(),
            Err(SessionTokenDecodeError::InvalidUserId(_))
        ));
        assert_eq!(
            "1:AAAA".parse::<SessionToken>(),
            Err(SessionTokenDecodeError::InvalidSecretLength)
        );
    }

    #[test]
    fn session_expiry() {
        let session = Authentication {
            user: Id::from(1_u64),
            token_hash: SessionToken::generate_random(Id::from(1_u64)).hash(),
            created_at: utc_datetime!(2026-01-01 00:00),
            expires_after: PositiveDuration::new(Duration::hours(1)),
        };

        assert!(!session.is_expired_at(utc_datetime!(2026-01-01 00:59)));
        assert!(session.is_expired_at(utc_datetime!(2026-01-01 01:01)));

        let forever = Authentication {
            expires_after: None,
            ..session
        };
        assert!(!forever.is_expired_at(utc_datetime!(2099-01-01 00:00)));
    }

    #[test]
    fn password_hash_verifies_only_the_original_password() {
        let hash = PasswordHash::generate("correct horse battery").unwrap();

        assert!(hash.verify("correct horse battery"));
        assert!(!hash.verify("wrong"));
        assert!(!PasswordHash::unusable().verify(""));
        assert!(!PasswordHash::from_stored("garbage".to_owned()).verify("garbage"));
    }
}
