use serde::Deserialize;
use std::{net::IpAddr, num::NonZeroUsize, path::PathBuf, time::Duration};
use yatube_common::{
    snowflake::{ProcessId, WorkerId},
    util::PositiveDuration,
};

const DEFAULT_SESSION_TTL_SECONDS: u64 = 14 * 24 * 60 * 60;
const DEFAULT_INDEX_CACHE_SECONDS: u64 = 20;
const DEFAULT_INDEX_CACHE_MAX_ENTRIES: NonZeroUsize = match NonZeroUsize::new(300) {
    Some(entries) => entries,
    None => NonZeroUsize::MIN,
};
const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Process configuration, read from the environment.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Env {
    #[serde(default = "default_server_address")]
    pub server_address: IpAddr,
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    #[serde(default)]
    pub worker_id: WorkerId,
    #[serde(default)]
    pub process_id: ProcessId,
    /// `0` keeps sessions alive until logout.
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    #[serde(default = "default_index_cache_seconds")]
    pub index_cache_seconds: u64,
    #[serde(default = "default_index_cache_max_entries")]
    pub index_cache_max_entries: NonZeroUsize,
    #[serde(default = "default_upload_limit_bytes")]
    pub upload_limit_bytes: usize,
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_server_address() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_server_port() -> u16 {
    8000
}

fn default_database_url() -> String {
    "sqlite://yatube.db".to_owned()
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_session_ttl_seconds() -> u64 {
    DEFAULT_SESSION_TTL_SECONDS
}

fn default_index_cache_seconds() -> u64 {
    DEFAULT_INDEX_CACHE_SECONDS
}

fn default_index_cache_max_entries() -> NonZeroUsize {
    DEFAULT_INDEX_CACHE_MAX_ENTRIES
}

fn default_upload_limit_bytes() -> usize {
    DEFAULT_UPLOAD_LIMIT_BYTES
}

impl Env {
    #[must_use]
    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            session_ttl: PositiveDuration::from_seconds(self.session_ttl_seconds),
            index_cache_ttl: Duration::from_secs(self.index_cache_seconds),
            index_cache_max_entries: self.index_cache_max_entries,
            upload_limit_bytes: self.upload_limit_bytes,
            secure_cookies: self.secure_cookies,
        }
    }
}

/// The part of the configuration request handlers need.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ServerSettings {
    pub session_ttl: Option<PositiveDuration>,
    pub index_cache_ttl: Duration,
    pub index_cache_max_entries: NonZeroUsize,
    pub upload_limit_bytes: usize,
    pub secure_cookies: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            session_ttl: PositiveDuration::from_seconds(DEFAULT_SESSION_TTL_SECONDS),
            index_cache_ttl: Duration::from_secs(DEFAULT_INDEX_CACHE_SECONDS),
            index_cache_max_entries: DEFAULT_INDEX_CACHE_MAX_ENTRIES,
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
            secure_cookies: false,
        }
    }
}
