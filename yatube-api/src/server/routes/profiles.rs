use crate::server::{
    Result, ServerError, ServerRouter,
    auth::CurrentUser,
    extract::Query,
    routes::{
        PageQuery,
        follows::{ProfileFollowPath, ProfileUnfollowPath},
    },
    views::{Layout, ProfileTemplate, render},
};
use axum::{extract::State, response::Html};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use yatube_common::model::user::{User, UserHandle};
use yatube_db::client::{DbClient, PostFilter};

const PROFILE_TITLE: &str = "Профайл пользователя";

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(profile)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/", rejection(ServerError))]
pub struct ProfilePath {
    pub username: UserHandle,
}

impl ProfilePath {
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            username: user.handle.clone(),
        }
    }
}

async fn profile(
    ProfilePath { username }: ProfilePath,
    State(db): State<Arc<DbClient>>,
    CurrentUser(viewer): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let author = db
        .fetch_user_by_handle(&username)
        .await?
        .ok_or(ServerError::UserByHandleNotFound(username))?;
    let page = db
        .fetch_posts(PostFilter::Author(author.id), query.request())
        .await?;
    let counts = db.follow_counts(author.id).await?;

    let following = match &viewer {
        Some(viewer) => db.is_following(viewer.id, author.id).await?,
        None => false,
    };
    let can_follow = viewer.as_ref().is_some_and(|viewer| viewer.id != author.id);

    render(&ProfileTemplate {
        layout: Layout::new(PROFILE_TITLE, viewer.as_ref()),
        author_name: author.display_name(),
        author_handle: author.handle.get().to_owned(),
        follow_url: ProfileFollowPath {
            username: author.handle.clone(),
        }
        .to_string(),
        unfollow_url: ProfileUnfollowPath {
            username: author.handle.clone(),
        }
        .to_string(),
        counts,
        posts_count: page.window.count(),
        following,
        can_follow,
        list: (&page).into(),
    })
}
