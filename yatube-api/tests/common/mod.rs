#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use yatube_api::{
    config::ServerSettings,
    server::{
        self, ServerState,
        auth::{SESSION_COOKIE, start_session},
        media::MediaStore,
    },
};
use yatube_common::model::{
    Id,
    auth::PasswordHash,
    group::{CreateGroup, GroupMarker, GroupSlug},
    post::{CreatePost, PostContent, PostMarker},
    user::{CreateUser, User, UserHandle},
};
use yatube_db::client::DbClient;

pub const BOUNDARY: &str = "yatube-test-boundary";

pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

/// The whole application on an in-memory database and a throwaway media root.
pub struct TestApp {
    pub state: ServerState,
    router: Router,
    _media_root: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = DbClient::connect_in_memory().await.unwrap();
        let media_root = tempfile::tempdir().unwrap();
        let state = ServerState::new(
            Arc::new(db),
            MediaStore::new(media_root.path()),
            ServerSettings::default(),
        );

        Self {
            router: server::app(state.clone()),
            state,
            _media_root: media_root,
        }
    }

    pub fn db(&self) -> &DbClient {
        &self.state.db_client
    }

    pub async fn user(&self, handle: &str) -> User {
        let user_id = self
            .db()
            .create_user(&CreateUser {
                handle: UserHandle::new(handle.to_owned()).unwrap(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: PasswordHash::unusable(),
            })
            .await
            .unwrap();

        self.db().fetch_user(user_id).await.unwrap().unwrap()
    }

    /// A `Cookie` header value for a fresh session of `user`.
    pub async fn login(&self, user: &User) -> String {
        let token = start_session(self.db(), &self.state.settings, user.id)
            .await
            .unwrap();

        format!("{SESSION_COOKIE}={}", token.as_token_str())
    }

    pub async fn group(&self, slug: &str, title: &str) -> Id<GroupMarker> {
        self.db()
            .create_group(&CreateGroup {
                title: title.to_owned(),
                slug: GroupSlug::new(slug.to_owned()).unwrap(),
                description: format!("Всё про {title}"),
            })
            .await
            .unwrap()
    }

    pub async fn post(
        &self,
        author: &User,
        group: Option<Id<GroupMarker>>,
        text: &str,
    ) -> Id<PostMarker> {
        self.db()
            .create_post(&CreatePost {
                author: author.id,
                group,
                content: PostContent {
                    text: text.to_owned(),
                    theme: String::new(),
                },
                image: None,
            })
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::from(form.to_owned())).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        body: Vec<u8>,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut request = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::from(body)).unwrap()).await
    }
}

/// Builds a `multipart/form-data` body delimited by [`BOUNDARY`].
#[derive(Default)]
pub struct MultipartBody(Vec<u8>);

impl MultipartBody {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.0.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.0.extend_from_slice(bytes);
        self.0.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.0.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.0
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}
