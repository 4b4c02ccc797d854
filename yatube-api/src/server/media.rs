//! Storage for uploaded post images below the media root.

use imagesize::{ImageError, ImageSize};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};
use yatube_common::model::post::{ImagePath, InvalidImagePathError, POST_IMAGE_DIR};

pub const MEDIA_URL_PREFIX: &str = "/media";

const MAX_FILE_NAME_CHARS: usize = 100;
const FALLBACK_FILE_NAME: &str = "image";
const MAX_STORE_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("The upload is not a recognizable image: {0}")]
    NotAnImage(#[from] ImageError),
    #[error("Could not create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No free file name for {0}")]
    NameExhausted(String),
    #[error(transparent)]
    Path(#[from] InvalidImagePathError),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn url(image: &ImagePath) -> String {
        format!("{MEDIA_URL_PREFIX}/{}", image.get())
    }

    #[must_use]
    pub fn file_path(&self, image: &ImagePath) -> PathBuf {
        self.root.join(image.get())
    }

    /// Sniffs the image format from the leading bytes.
    pub fn check_image(bytes: &[u8]) -> Result<ImageSize, MediaError> {
        Ok(imagesize::blob_size(bytes)?)
    }

    /// Writes an already checked image to `posts/<file name>`, never
    /// overwriting an existing file.
    pub async fn store_post_image(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ImagePath, MediaError> {
        let dir = self.root.join(POST_IMAGE_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| MediaError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let file_name = sanitize_file_name(file_name);
        for attempt in 0..MAX_STORE_ATTEMPTS {
            let candidate = if attempt == 0 {
                file_name.clone()
            } else {
                with_random_suffix(&file_name)
            };
            let path = dir.join(&candidate);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(file_name = %candidate, "Image name taken");
                    continue;
                }
                Err(source) => return Err(MediaError::Write { path, source }),
            };

            file.write_all(bytes)
                .await
                .map_err(|source| MediaError::Write {
                    path: path.clone(),
                    source,
                })?;
            file.flush()
                .await
                .map_err(|source| MediaError::Write {
                    path: path.clone(),
                    source,
                })?;

            let image = ImagePath::new(format!("{POST_IMAGE_DIR}/{candidate}"))?;
            info!(image = image.get(), len = bytes.len(), "Stored image");
            return Ok(image);
        }

        Err(MediaError::NameExhausted(file_name))
    }
}

/// Keeps the last path segment and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
fn sanitize_file_name(file_name: &str) -> String {
    let base_name = file_name.rsplit(['/', '\\']).next().unwrap_or_default();

    let sanitized: String = base_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        FALLBACK_FILE_NAME.to_owned()
    } else {
        sanitized.to_owned()
    }
}

fn with_random_suffix(file_name: &str) -> String {
    let suffix: u32 = rand::random();
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem}_{suffix:08x}.{extension}"),
        _ => format!("{file_name}_{suffix:08x}"),
    }
}
