use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const GROUP_SLUG_MAX_LEN: usize = 50;
pub const GROUP_TITLE_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct GroupMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Group {
    pub id: Id<GroupMarker>,
    pub title: String,
    pub slug: GroupSlug,
    pub description: String,
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// The part of a group shown next to each of its posts.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct GroupRef {
    pub id: Id<GroupMarker>,
    pub title: String,
    pub slug: GroupSlug,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreateGroup {
    pub title: String,
    pub slug: GroupSlug,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The group title must be 1 to {GROUP_TITLE_MAX_LEN} characters long: {0:?}")]
pub struct InvalidGroupTitleError(String);

impl CreateGroup {
    pub fn new(
        title: String,
        slug: GroupSlug,
        description: String,
    ) -> Result<Self, InvalidGroupTitleError> {
        let group = Self {
            title,
            slug,
            description,
        };
        group.validate()?;
        Ok(group)
    }

    /// The title may not be blank or longer than [`GROUP_TITLE_MAX_LEN`] characters.
    pub fn validate(&self) -> Result<(), InvalidGroupTitleError> {
        if self.title.trim().is_empty() || self.title.chars().count() > GROUP_TITLE_MAX_LEN {
            Err(InvalidGroupTitleError(self.title.clone()))
        } else {
            Ok(())
        }
    }
}

/// URL-safe group key: ASCII letters, digits, `-` and `_`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupSlug(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The group slug is invalid: {0}")]
pub struct InvalidGroupSlugError(String);

impl GroupSlug {
    pub fn new(slug: String) -> Result<Self, InvalidGroupSlugError> {
        let valid_chars = slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !slug.is_empty() && valid_chars && slug.len() <= GROUP_SLUG_MAX_LEN {
            Ok(Self(slug))
        } else {
            Err(InvalidGroupSlugError(slug))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for GroupSlug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for GroupSlug {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        GroupSlug::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"GroupSlug"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::group::{CreateGroup, Group, GroupSlug, InvalidGroupTitleError};

    #[test]
    fn slug_validation() {
        assert!(GroupSlug::new("test-slug_2".to_owned()).is_ok());
        assert!(GroupSlug::new(String::new()).is_err());
        assert!(GroupSlug::new("not a slug".to_owned()).is_err());
        assert!(GroupSlug::new("тест".to_owned()).is_err());
        assert!(GroupSlug::new("x".repeat(51)).is_err());
    }

    #[test]
    fn title_validation() {
        let slug = GroupSlug::new("books".to_owned()).unwrap();
        let create = |title: String| CreateGroup::new(title, slug.clone(), String::new());

        assert!(create("Книги".to_owned()).is_ok());
        assert!(create("ю".repeat(200)).is_ok());
        assert_eq!(
            create("ю".repeat(201)),
            Err(InvalidGroupTitleError("ю".repeat(201)))
        );
        assert!(create(String::new()).is_err());
        assert!(create("   ".to_owned()).is_err());
    }

    #[test]
    fn group_displays_its_title() {
        let group = Group {
            title: "Test group".to_owned(),
            ..Group::default()
        };
        assert_eq!(group.to_string(), "Test group");
    }
}
