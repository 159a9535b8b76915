//! Parallel binary downloads with per-file failure reporting.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;

/// One artifact to fetch. Errors are reported against the destination's
/// file name, so no separate label is carried.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Source URL.
    pub url: String,
    /// Destination file path.
    pub dest: PathBuf,
}

/// Download failure, always naming the destination file for context.
///
/// A failed download leaves any partially written file in place; no cleanup
/// or rollback is performed.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download failed with status {status} [{file}]")]
    Status {
        status: reqwest::StatusCode,
        file: String,
    },

    #[error("download failed: {source} [{file}]")]
    Transport {
        source: reqwest::Error,
        file: String,
    },

    #[error("write file failed: {source} [{file}]")]
    Io {
        source: std::io::Error,
        file: String,
    },

    #[error("download worker failed: {0}")]
    Worker(String),
}

/// HTTP downloader with optional basic auth applied to every request.
pub struct Downloader {
    client: reqwest::Client,
    auth: Option<(String, String)>,
}

impl Downloader {
    #[must_use]
    pub fn new(auth: Option<(String, String)>) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth,
        }
    }

    /// Fetch every task concurrently and wait for all of them to finish.
    ///
    /// Downloads are independent and ordering-irrelevant; the first error
    /// observed is returned and later results are discarded.
    ///
    /// # Errors
    ///
    /// Returns the first [`DownloadError`] any task reports.
    pub async fn fetch_all(&self, tasks: Vec<DownloadTask>) -> Result<(), DownloadError> {
        let mut set = JoinSet::new();
        for task in tasks {
            let client = self.client.clone();
            let auth = self.auth.clone();
            set.spawn(async move { fetch_one(&client, auth.as_ref(), &task).await });
        }

        let mut first_err = None;
        while let Some(joined) = set.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(join_err) => Err(DownloadError::Worker(join_err.to_string())),
            };
            if let Err(e) = result
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn fetch_one(
    client: &reqwest::Client,
    auth: Option<&(String, String)>,
    task: &DownloadTask,
) -> Result<(), DownloadError> {
    let file = file_label(&task.dest);

    let mut request = client.get(&task.url);
    if let Some((user, pass)) = auth {
        request = request.basic_auth(user, Some(pass));
    }

    let response = request.send().await.map_err(|source| DownloadError::Transport {
        source,
        file: file.clone(),
    })?;

    if !response.status().is_success() {
        return Err(DownloadError::Status {
            status: response.status(),
            file,
        });
    }

    if let Some(parent) = task.dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| DownloadError::Io {
                source,
                file: file.clone(),
            })?;
    }

    let mut out = tokio::fs::File::create(&task.dest)
        .await
        .map_err(|source| DownloadError::Io {
            source,
            file: file.clone(),
        })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| DownloadError::Transport {
            source,
            file: file.clone(),
        })?;
        out.write_all(&chunk)
            .await
            .map_err(|source| DownloadError::Io {
                source,
                file: file.clone(),
            })?;
    }
    out.flush().await.map_err(|source| DownloadError::Io {
        source,
        file: file.clone(),
    })?;
    drop(out);

    set_executable(&task.dest).await
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<(), DownloadError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|source| DownloadError::Io {
            source,
            file: file_label(path),
        })
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> Result<(), DownloadError> {
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
