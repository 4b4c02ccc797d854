//! Short-lived cache for whole rendered pages.

use crate::server::auth::SESSION_COOKIE;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use headers::{Cookie as CookieHeader, HeaderMapExt};
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::{
    fmt::Write,
    num::NonZeroUsize,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, warn};

pub const INDEX_PAGE_KEY_PREFIX: &str = "index_page";

const MAX_CACHED_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Clone, Debug)]
struct CachedResponse {
    stored_at: Instant,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl CachedResponse {
    fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// Rendered pages, evicted after `ttl` or once more than `capacity` keys are
/// held (least recently used first).
#[derive(Clone, Debug)]
pub struct ResponseCache {
    entries: Arc<RwLock<LruCache<String, CachedResponse>>>,
    ttl: Duration,
}

impl ResponseCache {
    #[must_use]
    pub fn new(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(LruCache::new(capacity))),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
    }

    /// Looks up a live entry. An expired entry is dropped on the way.
    fn get(&self, key: &str) -> Option<Response> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if Instant::now().duration_since(entry.stored_at) < self.ttl {
            return Some(entry.to_response());
        }

        entries.pop(key);
        None
    }

    fn insert(&self, key: String, entry: CachedResponse) {
        let evicted = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.clone(), entry);

        if let Some((evicted, _)) = evicted
            && evicted != key
        {
            debug!(key = %evicted, "Evicted page from cache");
        }
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("Cleared page cache");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `index_page:<path and query>:<session digest>`.
///
/// The page shows who is signed in, so the session cookie is part of the key.
fn cache_key(request: &Request) -> String {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path(), |path_and_query| path_and_query.as_str());

    let session_digest = request
        .headers()
        .typed_get::<CookieHeader>()
        .and_then(|cookies| cookies.get(SESSION_COOKIE).map(str::to_owned))
        .map_or_else(
            || "anonymous".to_owned(),
            |session| {
                Sha256::digest(session.as_bytes())
                    .iter()
                    .fold(String::new(), |mut digest, byte| {
                        let _ = write!(digest, "{byte:02x}");
                        digest
                    })
            },
        );

    format!("{INDEX_PAGE_KEY_PREFIX}:{path_and_query}:{session_digest}")
}

/// Serves `GET` requests from the cache, storing fresh `200` responses that
/// do not set cookies.
pub async fn cache_page(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(&request);
    if let Some(response) = cache.get(&key) {
        debug!(%key, outcome = "hit", "Page cache");
        return response;
    }
    debug!(%key, outcome = "miss", "Page cache");

    let response = next.run(request).await;
    if response.status() != StatusCode::OK || response.headers().contains_key(header::SET_COOKIE)
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "Could not buffer page for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    cache.insert(
        key,
        CachedResponse {
            stored_at: Instant::now(),
            status: parts.status,
            headers: parts.headers.clone(),
            body: body.clone(),
        },
    );

    Response::from_parts(parts, Body::from(body))
}
