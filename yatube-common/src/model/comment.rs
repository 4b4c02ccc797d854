use crate::model::{
    Id, truncate_chars,
    post::{POST_EXCERPT_LEN, PostMarker},
    user::{User, UserMarker},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub author: User,
    /// `None` once detached from its post.
    pub post: Option<Id<PostMarker>>,
    pub text: String,
}

impl Display for Comment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(truncate_chars(&self.text, POST_EXCERPT_LEN))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreateComment {
    pub author: Id<UserMarker>,
    pub post: Id<PostMarker>,
    pub text: String,
}
