use crate::server::{ServerRouter, ServerState};
use serde::Deserialize;
use yatube_common::pagination::PageRequest;

pub mod about;
pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod profiles;
pub mod users;

pub fn routes(state: &ServerState) -> ServerRouter {
    ServerRouter::new()
        .merge(posts::routes(&state.cache))
        .merge(groups::routes())
        .merge(profiles::routes())
        .merge(follows::routes())
        .merge(comments::routes())
        .merge(about::routes())
        .merge(users::routes())
}

/// `?page=N` on paginated listings. Kept as text so that garbage selects
/// the first page instead of failing.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref())
    }
}
