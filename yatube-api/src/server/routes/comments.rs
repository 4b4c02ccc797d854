use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::Form,
    forms::CommentForm,
    routes::posts::{IndexPath, PostDetailPath},
};
use axum::{extract::State, response::Redirect};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use yatube_common::model::{
    Id,
    comment::{CommentMarker, CreateComment},
    post::PostMarker,
};
use yatube_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(add_comment)
        .typed_get(delete_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comment/", rejection(ServerError))]
pub struct AddCommentPath {
    pub post_id: Id<PostMarker>,
}

async fn add_comment(
    AddCommentPath { post_id }: AddCommentPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect> {
    if db.fetch_post(post_id).await?.is_none() {
        return Err(ServerError::PostByIdNotFound(post_id));
    }

    match form.text() {
        Some(text) => {
            let comment_id = db
                .create_comment(&CreateComment {
                    author: user.id,
                    post: post_id,
                    text: text.to_owned(),
                })
                .await?;
            info!(comment = %comment_id, post = %post_id, user = %user.handle, "Comment added");
        }
        None => debug!(post = %post_id, "Ignoring empty comment"),
    }

    Ok(Redirect::to(&PostDetailPath { post_id }.to_string()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comment/{comment_id}/delete/", rejection(ServerError))]
pub struct DeleteCommentPath {
    pub post_id: Id<PostMarker>,
    pub comment_id: Id<CommentMarker>,
}

/// Only the comment's author may delete it; everyone lands on the post.
async fn delete_comment(
    DeleteCommentPath {
        post_id,
        comment_id,
    }: DeleteCommentPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
) -> Result<Redirect> {
    let comment = db
        .fetch_comment(comment_id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(comment_id))?;
    if comment.post.is_some_and(|post| post != post_id) {
        return Err(ServerError::CommentByIdNotFound(comment_id));
    }

    if comment.author.handle == user.handle {
        db.delete_comment(comment_id).await?;
        info!(comment = %comment_id, user = %user.handle, "Comment deleted");
    } else {
        debug!(comment = %comment_id, user = %user.handle, "Non-author tried to delete comment");
    }

    let target = match comment.post {
        Some(post_id) => PostDetailPath { post_id }.to_string(),
        None => IndexPath.to_string(),
    };
    Ok(Redirect::to(&target))
}
