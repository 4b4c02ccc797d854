use crate::{config::ServerSettings, server::ServerError};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use std::sync::Arc;
use time::UtcDateTime;
use tracing::debug;
use yatube_common::model::{
    Id,
    auth::{Authentication, SessionToken},
    user::{User, UserMarker},
};
use yatube_db::client::{DbClient, DbError};

pub const SESSION_COOKIE: &str = "yatube_session";

/// A signed-in user. Anonymous requests are redirected to the login page.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser(pub User);

/// The signed-in user, if any.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        user.map(Self).ok_or_else(|| ServerError::LoginRequired {
            next: parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string),
        })
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self(None));
        };

        let db = Arc::<DbClient>::from_ref(state);
        let Some(authentication) = db.fetch_session(token.user_id, &token.hash()).await? else {
            debug!(user = %token.user_id, "Unknown session");
            return Ok(Self(None));
        };

        if authentication.is_expired_at(UtcDateTime::now()) {
            debug!(user = %token.user_id, "Expired session");
            return Ok(Self(None));
        }

        Ok(Self(db.fetch_user(authentication.user).await?))
    }
}

/// The session token carried by the request's cookie. Malformed tokens are
/// treated as absent.
///
/// Read through [`CookieJar`], which percent-decodes what it encoded when the
/// cookie was set.
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    let jar = CookieJar::from_headers(headers);

    match jar.get(SESSION_COOKIE)?.value().parse() {
        Ok(token) => Some(token),
        Err(err) => {
            debug!(error = %err, "Ignoring malformed session cookie");
            None
        }
    }
}

/// Persists a new session for `user_id` and returns its token.
pub async fn start_session(
    db: &DbClient,
    settings: &ServerSettings,
    user_id: Id<UserMarker>,
) -> Result<SessionToken, DbError> {
    let now = UtcDateTime::now();
    let purged = db.delete_expired_sessions(user_id, now).await?;

    let token = SessionToken::generate_random(user_id);
    db.create_session(&Authentication {
        user: user_id,
        token_hash: token.hash(),
        created_at: now,
        expires_after: settings.session_ttl,
    })
    .await?;

    debug!(user = %user_id, purged, "Started session");
    Ok(token)
}

#[must_use]
pub fn session_cookie(token: &SessionToken, settings: &ServerSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, token.as_token_str()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookies);

    if let Some(ttl) = settings.session_ttl {
        cookie = cookie.max_age(ttl.get());
    }

    cookie.build()
}

/// A cookie that, given to `CookieJar::remove`, deletes the session cookie.
#[must_use]
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
