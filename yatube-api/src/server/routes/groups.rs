use crate::server::{
    Result, ServerError, ServerRouter,
    auth::CurrentUser,
    extract::Query,
    routes::PageQuery,
    views::{GroupListTemplate, Layout, render},
};
use axum::{extract::State, response::Html};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use yatube_common::model::group::GroupSlug;
use yatube_db::client::{DbClient, PostFilter};

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(group_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/group/{slug}/", rejection(ServerError))]
pub struct GroupPath {
    pub slug: GroupSlug,
}

async fn group_posts(
    GroupPath { slug }: GroupPath,
    State(db): State<Arc<DbClient>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let group = db
        .fetch_group_by_slug(&slug)
        .await?
        .ok_or(ServerError::GroupBySlugNotFound(slug))?;
    let page = db
        .fetch_posts(PostFilter::Group(group.id), query.request())
        .await?;

    render(&GroupListTemplate {
        layout: Layout::new(format!("Записи сообщества {group}"), user.as_ref()),
        title: group.title,
        description: group.description,
        list: (&page).into(),
    })
}
