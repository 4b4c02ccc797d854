use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{AuthenticatedUser, CurrentUser},
    cache::{ResponseCache, cache_page},
    extract::{Multipart, Query},
    forms::{FieldErrors, PostForm},
    media::MediaStore,
    routes::{
        PageQuery,
        comments::{AddCommentPath, DeleteCommentPath},
        profiles::ProfilePath,
    },
    views::{
        CommentView, IndexTemplate, Layout, PostDetailTemplate, PostFormTemplate, PostView,
        group_options, render,
    },
};
use axum::{
    extract::State,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use yatube_common::model::{
    Id,
    group::Group,
    post::{CreatePost, Post, PostMarker, UpdatePost},
    user::User,
};
use yatube_db::client::{DbClient, PostFilter};

const INDEX_TITLE: &str = "Это главная страница проекта Yatube.";
const INDEX_HEADING: &str = "Последние обновления на сайте";
const CREATE_TITLE: &str = "Новый пост";
const EDIT_TITLE: &str = "Редактировать пост";

pub fn routes(cache: &ResponseCache) -> ServerRouter {
    let cached = ServerRouter::new()
        .typed_get(index)
        .route_layer(middleware::from_fn_with_state(cache.clone(), cache_page));

    ServerRouter::new()
        .merge(cached)
        .typed_get(post_detail)
        .typed_get(create_post_form)
        .typed_post(create_post)
        .typed_get(edit_post_form)
        .typed_post(edit_post)
}

#[derive(TypedPath)]
#[typed_path("/")]
pub struct IndexPath;

async fn index(
    _: IndexPath,
    State(db): State<Arc<DbClient>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    let page = db.fetch_posts(PostFilter::All, query.request()).await?;

    render(&IndexTemplate {
        layout: Layout::new(INDEX_TITLE, user.as_ref()),
        heading: INDEX_HEADING.to_owned(),
        list: (&page).into(),
    })
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/", rejection(ServerError))]
pub struct PostDetailPath {
    pub post_id: Id<PostMarker>,
}

async fn post_detail(
    PostDetailPath { post_id }: PostDetailPath,
    State(db): State<Arc<DbClient>>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    let post = db
        .fetch_post(post_id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(post_id))?;
    let author_posts_count = db.count_posts(PostFilter::Author(post.author.id)).await?;
    let comments = db.fetch_post_comments(post_id).await?;

    let viewer_id = user.as_ref().map(|user| user.id);
    let comments = comments
        .iter()
        .map(|comment| {
            let delete_url = (viewer_id == Some(comment.author.id)).then(|| {
                DeleteCommentPath {
                    post_id,
                    comment_id: comment.id,
                }
                .to_string()
            });
            CommentView::new(comment, delete_url)
        })
        .collect();

    render(&PostDetailTemplate {
        layout: Layout::new(format!("Пост {}", post.excerpt()), user.as_ref()),
        can_edit: viewer_id == Some(post.author.id),
        can_comment: user.is_some(),
        comment_url: AddCommentPath { post_id }.to_string(),
        post: PostView::new(&post),
        author_posts_count,
        comments,
    })
}

#[derive(TypedPath)]
#[typed_path("/create/")]
pub struct CreatePostPath;

async fn create_post_form(
    _: CreatePostPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
) -> Result<Html<String>> {
    let groups = db.fetch_groups().await?;

    render_post_form(
        &user,
        None,
        PostForm::default(),
        &groups,
        FieldErrors::default(),
    )
}

async fn create_post(
    _: CreatePostPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
    State(media): State<Arc<MediaStore>>,
    Multipart(mut multipart): Multipart,
) -> Result<Response> {
    let form = PostForm::from_multipart(&mut multipart).await?;
    let groups = db.fetch_groups().await?;

    let valid = match form
        .clone()
        .validate(&groups, |bytes| MediaStore::check_image(bytes).is_ok())
    {
        Ok(valid) => valid,
        Err(errors) => {
            debug!(user = %user.handle, ?errors, "Rejected post form");
            return Ok(render_post_form(&user, None, form, &groups, errors)?.into_response());
        }
    };

    let image = match &valid.image {
        Some(upload) => Some(
            media
                .store_post_image(&upload.file_name, &upload.bytes)
                .await?,
        ),
        None => None,
    };

    let post_id = db
        .create_post(&CreatePost {
            author: user.id,
            group: valid.group,
            content: valid.content,
            image,
        })
        .await?;
    info!(post = %post_id, user = %user.handle, "Post created");

    Ok(Redirect::to(&ProfilePath::for_user(&user).to_string()).into_response())
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/edit/", rejection(ServerError))]
pub struct EditPostPath {
    pub post_id: Id<PostMarker>,
}

/// Loads the post, or tells the caller where a non-author goes instead.
async fn editable_post(
    db: &DbClient,
    user: &User,
    post_id: Id<PostMarker>,
) -> Result<Result<Post, Redirect>> {
    let post = db
        .fetch_post(post_id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(post_id))?;

    if post.author.id == user.id {
        Ok(Ok(post))
    } else {
        debug!(post = %post_id, user = %user.handle, "Non-author tried to edit post");
        Ok(Err(Redirect::to(&PostDetailPath { post_id }.to_string())))
    }
}

async fn edit_post_form(
    EditPostPath { post_id }: EditPostPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
) -> Result<Response> {
    let post = match editable_post(&db, &user, post_id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let groups = db.fetch_groups().await?;

    Ok(render_post_form(
        &user,
        Some(&post),
        PostForm::from_post(&post),
        &groups,
        FieldErrors::default(),
    )?
    .into_response())
}

async fn edit_post(
    EditPostPath { post_id }: EditPostPath,
    AuthenticatedUser(user): AuthenticatedUser,
    State(db): State<Arc<DbClient>>,
    State(media): State<Arc<MediaStore>>,
    Multipart(mut multipart): Multipart,
) -> Result<Response> {
    let post = match editable_post(&db, &user, post_id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let form = PostForm::from_multipart(&mut multipart).await?;
    let groups = db.fetch_groups().await?;

    let valid = match form
        .clone()
        .validate(&groups, |bytes| MediaStore::check_image(bytes).is_ok())
    {
        Ok(valid) => valid,
        Err(errors) => {
            debug!(post = %post_id, ?errors, "Rejected post form");
            return Ok(
                render_post_form(&user, Some(&post), form, &groups, errors)?.into_response(),
            );
        }
    };

    let image = match (&valid.image, valid.clear_image) {
        (Some(upload), _) => Some(
            media
                .store_post_image(&upload.file_name, &upload.bytes)
                .await?,
        ),
        (None, true) => None,
        (None, false) => post.image,
    };

    db.update_post(
        post_id,
        &UpdatePost {
            group: valid.group,
            content: valid.content,
            image,
        },
    )
    .await?;
    info!(post = %post_id, user = %user.handle, "Post edited");

    Ok(Redirect::to(&PostDetailPath { post_id }.to_string()).into_response())
}

fn render_post_form(
    user: &User,
    post: Option<&Post>,
    form: PostForm,
    groups: &[Group],
    errors: FieldErrors,
) -> Result<Html<String>> {
    let (title, action) = match post {
        Some(post) => (EDIT_TITLE, EditPostPath { post_id: post.id }.to_string()),
        None => (CREATE_TITLE, CreatePostPath.to_string()),
    };

    render(&PostFormTemplate {
        layout: Layout::new(title, Some(user)),
        is_edit: post.is_some(),
        action,
        groups: group_options(groups, &form.group),
        current_image: post
            .and_then(|post| post.image.as_ref())
            .map(MediaStore::url),
        form,
        errors,
    })
}
