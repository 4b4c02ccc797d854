use crate::model::{Id, auth::PasswordHash};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const USER_HANDLE_MAX_LEN: usize = 150;
pub const USER_NAME_MAX_LEN: usize = 150;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub handle: UserHandle,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// "First Last", or the handle when neither name is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full_name = format!("{} {}", self.first_name, self.last_name);
        let full_name = full_name.trim();
        if full_name.is_empty() {
            self.handle.get().to_owned()
        } else {
            full_name.to_owned()
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CreateUser {
    pub handle: UserHandle,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: PasswordHash,
}

/// A user together with the stored hash of their password.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Credentials {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// Username: letters, digits and `@.+-_`, at most [`USER_HANDLE_MAX_LEN`] chars.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct UserHandle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The user handle is invalid: {0}")]
pub struct InvalidUserHandleError(String);

impl UserHandle {
    pub fn new(handle: String) -> Result<Self, InvalidUserHandleError> {
        let valid_chars = handle
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));

        if !handle.is_empty() && valid_chars && handle.chars().count() <= USER_HANDLE_MAX_LEN {
            Ok(UserHandle(handle))
        } else {
            Err(InvalidUserHandleError(handle))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for UserHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserHandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        UserHandle::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"UserHandle"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::user::{USER_HANDLE_MAX_LEN, User, UserHandle};

    #[test]
    fn handle_validation() {
        assert!(UserHandle::new("leo.tolstoy+1@mail_ru-x".to_owned()).is_ok());
        assert!(UserHandle::new("Лев".to_owned()).is_ok());
        assert!(UserHandle::new(String::new()).is_err());
        assert!(UserHandle::new("with space".to_owned()).is_err());
        assert!(UserHandle::new("slash/".to_owned()).is_err());
        assert!(UserHandle::new("a".repeat(USER_HANDLE_MAX_LEN)).is_ok());
        assert!(UserHandle::new("a".repeat(USER_HANDLE_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn display_name_falls_back_to_handle() {
        let mut user = User {
            handle: UserHandle::new("leo".to_owned()).unwrap(),
            ..User::default()
        };
        assert_eq!(user.display_name(), "leo");

        user.first_name = "Lev".to_owned();
        user.last_name = "Tolstoy".to_owned();
        assert_eq!(user.display_name(), "Lev Tolstoy");
    }
}
