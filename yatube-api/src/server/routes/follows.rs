use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::Query,
    routes::{PageQuery, profiles::ProfilePath},
    views::{FollowIndexTemplate, Layout, render},
};
use axum::{
    extract::State,
    response::{Html, Redirect},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use yatube_common::model::{
    follow::Follow,
    user::{User, UserHandle},
};
use yatube_db::client::{DbClient, PostFilter};

const FOLLOW_TITLE: &str = "Избранные авторы";
const FOLLOW_HEADING: &str = "Страница избранных авторов";

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(follow_index)
        .typed_get(profile_follow)
        .typed_get(profile_unfollow)
}

#[derive(TypedPath)]
#[typed_path("/follow/")]
pub struct FollowIndexPath;

async fn follow_index(
    _: FollowIndexPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let page = db
        .fetch_posts(PostFilter::FollowedBy(user.id), query.request())
        .await?;

    render(&FollowIndexTemplate {
        layout: Layout::new(FOLLOW_TITLE, Some(&user)),
        heading: FOLLOW_HEADING.to_owned(),
        list: (&page).into(),
    })
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/follow/", rejection(ServerError))]
pub struct ProfileFollowPath {
    pub username: UserHandle,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{username}/unfollow/", rejection(ServerError))]
pub struct ProfileUnfollowPath {
    pub username: UserHandle,
}

async fn find_author(db: &DbClient, username: UserHandle) -> Result<User> {
    db.fetch_user_by_handle(&username)
        .await?
        .ok_or(ServerError::UserByHandleNotFound(username))
}

async fn profile_follow(
    ProfileFollowPath { username }: ProfileFollowPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
) -> Result<Redirect> {
    let author = find_author(&db, username).await?;
    let follow = Follow {
        user: user.id,
        author: author.id,
    };

    if follow.is_self_follow() {
        debug!(user = %user.handle, "Ignoring self-follow");
    } else if db.follow(follow.user, follow.author).await? {
        info!(user = %user.handle, author = %author.handle, "Followed");
    }

    Ok(Redirect::to(&ProfilePath::for_user(&author).to_string()))
}

async fn profile_unfollow(
    ProfileUnfollowPath { username }: ProfileUnfollowPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
) -> Result<Redirect> {
    let author = find_author(&db, username).await?;

    if db.unfollow(user.id, author.id).await? {
        info!(user = %user.handle, author = %author.handle, "Unfollowed");
    }

    Ok(Redirect::to(&ProfilePath::for_user(&author).to_string()))
}
