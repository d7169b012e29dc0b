use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::audio::FormatHint;
use crate::error::{SessionError, SessionResult};
use crate::gateway::UserId;

/// File name of the combined recording inside a user's scope
pub const COMBINED_FILE: &str = "combined.wav";

/// In-progress combined recording, renamed over `COMBINED_FILE` once durable
const COMBINED_PARTIAL_FILE: &str = "combined.wav.partial";

const STAGED_PREFIX: &str = "staged-";

/// A fragment written to the user's scope for the duration of one event
#[derive(Debug, Clone)]
pub struct StagedFragment {
    pub path: PathBuf,
}

/// One directory per user under a common root
///
/// Each scope holds at most one staged fragment and one combined recording.
#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    root: PathBuf,
}

impl ArtifactStorage {
    pub fn new(root: impl Into<PathBuf>) -> SessionResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root)
            .map_err(|e| SessionError::storage("creating storage root", e))?;

        info!("Artifact storage initialized: {}", root.display());

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_dir(&self, user_id: &UserId) -> PathBuf {
        self.root.join(user_id.as_str())
    }

    pub fn combined_path(&self, user_id: &UserId) -> PathBuf {
        self.user_dir(user_id).join(COMBINED_FILE)
    }

    /// Write incoming fragment bytes into the user's scope
    pub async fn stage_fragment(
        &self,
        user_id: &UserId,
        fragment_id: &str,
        hint: &FormatHint,
        bytes: &[u8],
    ) -> SessionResult<StagedFragment> {
        let dir = self.user_dir(user_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SessionError::storage("creating user directory", e))?;

        let path = dir.join(staged_file_name(fragment_id, hint));
        if let Err(e) = fs::write(&path, bytes).await {
            let _ = fs::remove_file(&path).await;
            return Err(SessionError::storage("staging fragment", e));
        }

        debug!("Staged fragment for {}: {} ({} bytes)", user_id, path.display(), bytes.len());

        Ok(StagedFragment { path })
    }

    /// Bytes of a staged fragment, as handed to the decoder
    pub async fn read_staged(&self, staged: &StagedFragment) -> SessionResult<Vec<u8>> {
        fs::read(&staged.path)
            .await
            .map_err(|e| SessionError::storage("reading staged fragment", e))
    }

    /// Remove a staged fragment; already gone is fine
    pub async fn discard_staged(&self, staged: &StagedFragment) -> SessionResult<()> {
        match fs::remove_file(&staged.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::storage("discarding staged fragment", e)),
        }
    }

    /// Replace the combined recording.
    ///
    /// The previous file stays readable until the new one is fully on disk.
    pub async fn write_combined(&self, user_id: &UserId, bytes: &[u8]) -> SessionResult<PathBuf> {
        let dir = self.user_dir(user_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SessionError::storage("creating user directory", e))?;

        let partial = dir.join(COMBINED_PARTIAL_FILE);
        let target = dir.join(COMBINED_FILE);

        if let Err(e) = write_durable(&partial, bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(SessionError::storage("writing combined recording", e));
        }

        if let Err(e) = fs::rename(&partial, &target).await {
            let _ = fs::remove_file(&partial).await;
            return Err(SessionError::storage("publishing combined recording", e));
        }

        Ok(target)
    }

    /// Read a combined recording. `None` when the file is gone.
    pub async fn read_combined(&self, path: &Path) -> SessionResult<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::storage("reading combined recording", e)),
        }
    }

    /// Delete the user's whole scope; a missing scope is fine
    pub async fn purge(&self, user_id: &UserId) -> SessionResult<()> {
        let dir = self.user_dir(user_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Purged storage for {}", user_id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::storage("deleting user storage", e)),
        }
    }
}

async fn write_durable(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

/// Reduce a source identifier to one safe file name that cannot collide with the
/// combined recording
fn staged_file_name(fragment_id: &str, hint: &FormatHint) -> String {
    let mut name: String = fragment_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    name = name.trim_start_matches('.').to_string();

    if name.is_empty() {
        name = uuid::Uuid::new_v4().to_string();
    }

    if Path::new(&name).extension().is_none() {
        if let Some(extension) = hint.as_extension() {
            name = format!("{}.{}", name, extension);
        }
    }

    format!("{}{}", STAGED_PREFIX, name)
}
