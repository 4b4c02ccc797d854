use crate::model::{Id, user::UserMarker};
use serde::{Deserialize, Serialize};

/// Directed edge: `user` follows `author`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Follow {
    pub user: Id<UserMarker>,
    pub author: Id<UserMarker>,
}

impl Follow {
    #[must_use]
    pub fn is_self_follow(self) -> bool {
        self.user == self.author
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct FollowCounts {
    /// Users following this one.
    pub followers: u64,
    /// Authors this user follows.
    pub following: u64,
}
