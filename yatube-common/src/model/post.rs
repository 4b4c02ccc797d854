use crate::model::{
    Id,
    group::{GroupMarker, GroupRef},
    truncate_chars,
    user::{User, UserMarker},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const POST_THEME_MAX_LEN: usize = 50;
pub const POST_EXCERPT_LEN: usize = 15;
pub const POST_IMAGE_DIR: &str = "posts";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub group: Option<GroupRef>,
    pub content: PostContent,
    pub image: Option<ImagePath>,
}

impl Post {
    /// The first few characters of the text, for titles and logs.
    #[must_use]
    pub fn excerpt(&self) -> &str {
        truncate_chars(&self.content.text, POST_EXCERPT_LEN)
    }
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Post{}", self.excerpt())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostContent {
    pub text: String,
    pub theme: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub group: Option<Id<GroupMarker>>,
    pub content: PostContent,
    pub image: Option<ImagePath>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct UpdatePost {
    pub group: Option<Id<GroupMarker>>,
    pub content: PostContent,
    pub image: Option<ImagePath>,
}

/// Location of an uploaded image relative to the media root, e.g.
/// `posts/small.gif`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(try_from = "String")]
pub struct ImagePath(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The image path is invalid: {0}")]
pub struct InvalidImagePathError(String);

impl ImagePath {
    /// Relative, `/`-separated, and never escaping the media root.
    pub fn new(path: String) -> Result<Self, InvalidImagePathError> {
        let valid = !path.is_empty()
            && !path.starts_with('/')
            && !path.contains('\\')
            && path
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

        if valid {
            Ok(Self(path))
        } else {
            Err(InvalidImagePathError(path))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ImagePath {
    type Error = InvalidImagePathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::{ImagePath, Post, PostContent};

    #[test]
    fn post_displays_excerpt() {
        let post = Post {
            content: PostContent {
                text: "Тестовый текст длиннее пятнадцати символов".to_owned(),
                theme: String::new(),
            },
            ..Post::default()
        };
        assert_eq!(post.to_string(), "PostТестовый текст ");
        assert_eq!(post.excerpt().chars().count(), 15);
    }

    #[test]
    fn image_paths_stay_inside_media_root() {
        assert!(ImagePath::new("posts/small.gif".to_owned()).is_ok());
        assert!(ImagePath::new("/etc/passwd".to_owned()).is_err());
        assert!(ImagePath::new("posts/../../secret".to_owned()).is_err());
        assert!(ImagePath::new("posts//x.gif".to_owned()).is_err());
        assert!(ImagePath::new(String::new()).is_err());
    }
}
