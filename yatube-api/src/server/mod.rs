use crate::{
    config::ServerSettings,
    server::{cache::ResponseCache, media::MediaStore},
};
use axum::{
    Router,
    extract::{
        DefaultBodyLimit, FromRef, Request,
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, PathRejection, QueryRejection},
    },
    handler::HandlerWithoutStateExt,
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error};
use yatube_common::model::{
    Id,
    auth::PasswordHashError,
    comment::CommentMarker,
    group::GroupSlug,
    post::PostMarker,
    user::UserHandle,
};
use yatube_db::client::{DbClient, DbError};

pub mod auth;
pub mod cache;
pub mod extract;
pub mod forms;
pub mod media;
pub mod routes;
pub mod views;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub cache: ResponseCache,
    pub media: Arc<MediaStore>,
    pub settings: Arc<ServerSettings>,
}

impl ServerState {
    #[must_use]
    pub fn new(db_client: Arc<DbClient>, media: MediaStore, settings: ServerSettings) -> Self {
        Self {
            db_client,
            cache: ResponseCache::new(settings.index_cache_ttl, settings.index_cache_max_entries),
            media: Arc::new(media),
            settings: Arc::new(settings),
        }
    }
}

/// The whole application: pages, uploaded media and the not-found fallback.
pub fn app(state: ServerState) -> Router {
    let media = ServeDir::new(state.media.root()).not_found_service(fallback.into_service());

    routes::routes(&state)
        .nest_service(media::MEDIA_URL_PREFIX, media)
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(state.settings.upload_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Form rejected: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("Multipart body rejected: {0}")]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Reading multipart body failed: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Rendering template failed: {0}")]
    Template(#[from] askama::Error),
    #[error(transparent)]
    Media(#[from] media::MediaError),
    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Comment with id {0} was not found.")]
    CommentByIdNotFound(Id<CommentMarker>),
    #[error("Group with slug {0} was not found.")]
    GroupBySlugNotFound(GroupSlug),
    #[error("User {0} was not found.")]
    UserByHandleNotFound(UserHandle),
    #[error("Login required to access {next}")]
    LoginRequired { next: String },
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::CommentByIdNotFound(_)
            | ServerError::GroupBySlugNotFound(_)
            | ServerError::UserByHandleNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::QueryRejection(rejection) => rejection.status(),
            ServerError::FormRejection(rejection) => rejection.status(),
            ServerError::MultipartRejection(rejection) => rejection.status(),
            ServerError::Multipart(err) => err.status(),
            ServerError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            ServerError::Database(_)
            | ServerError::Template(_)
            | ServerError::Media(_)
            | ServerError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `/auth/login/?next=<next>`
#[must_use]
pub fn login_url(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();

    format!("{}?{query}", routes::users::LoginPath)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ServerError::LoginRequired { next } = &self {
            debug!(%next, "Redirecting anonymous user to login");
            return Redirect::to(&login_url(next)).into_response();
        }

        error!(error = %self, %status, "Replying with error");

        let path = match &self {
            ServerError::UnknownRoute(uri) => uri.path(),
            _ => "",
        };
        views::render_error_page(status, path)
    }
}
