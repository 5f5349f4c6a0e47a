//! File store for staged uploads and generated outputs
//!
//! Uploads and outputs live in two separate directories. Every request gets
//! its own UUID token, so names never collide and no locking is needed.

use crate::error::{GatewayError, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Prefix shared by every generated output file
pub const OUTPUT_PREFIX: &str = "no_bg_";

/// Extension of every generated output file
pub const OUTPUT_SUFFIX: &str = ".png";

/// Paths reserved for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub token: Uuid,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl Reservation {
    /// File name of the output, as served under `/outputs/`
    #[must_use]
    pub fn output_filename(&self) -> String {
        output_filename(self.token)
    }
}

/// Upload/output directory pair on local disk
#[derive(Debug, Clone)]
pub struct FileStore {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl FileStore {
    /// Open the store, creating both directories if absent
    ///
    /// # Errors
    /// - Either directory cannot be created
    pub fn open<P: Into<PathBuf>, Q: Into<PathBuf>>(upload_dir: P, output_dir: Q) -> Result<Self> {
        let upload_dir = upload_dir.into();
        let output_dir = output_dir.into();

        for dir in [&upload_dir, &output_dir] {
            std::fs::create_dir_all(dir)
                .map_err(|e| GatewayError::file_io_error("create directory", dir, &e))?;
        }

        tracing::debug!(
            upload_dir = %upload_dir.display(),
            output_dir = %output_dir.display(),
            "File store ready"
        );

        Ok(Self {
            upload_dir,
            output_dir,
        })
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Reserve input and output paths under a fresh token
    ///
    /// `original_extension` is appended verbatim to the input name and is
    /// expected to come from [`extension_of`].
    #[must_use]
    pub fn reserve(&self, original_extension: &str) -> Reservation {
        let token = Uuid::new_v4();
        Reservation {
            token,
            input_path: self.upload_dir.join(format!("{token}{original_extension}")),
            output_path: self.output_dir.join(output_filename(token)),
        }
    }

    /// Resolve a client-supplied output name to a path inside the output dir
    ///
    /// Returns `None` for anything that is not a generated output name.
    #[must_use]
    pub fn output_path_for(&self, filename: &str) -> Option<PathBuf> {
        is_valid_output_name(filename).then(|| self.output_dir.join(filename))
    }

    /// Best-effort deletion; a missing file is not an error
    ///
    /// Returns whether a file was actually removed.
    pub async fn cleanup(path: &Path) -> bool {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::trace!(path = %path.display(), "Removed file");
                true
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove file");
                false
            },
        }
    }
}

/// Owns a reservation and removes its files on drop
///
/// The input is always removed; the output survives only after
/// [`StagedFiles::commit`]. Dropping covers early returns, errors and
/// cancelled request futures alike.
#[derive(Debug)]
pub struct StagedFiles {
    reservation: Reservation,
    committed: bool,
}

impl StagedFiles {
    #[must_use]
    pub fn new(reservation: Reservation) -> Self {
        Self {
            reservation,
            committed: false,
        }
    }

    #[must_use]
    pub fn reservation(&self) -> &Reservation {
        &self.reservation
    }

    /// Keep the output file and return its served name
    #[must_use]
    pub fn commit(mut self) -> String {
        self.committed = true;
        self.reservation.output_filename()
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        remove_quietly(&self.reservation.input_path);
        if !self.committed {
            remove_quietly(&self.reservation.output_path);
        }
    }
}

// Drop cannot await, so the guard unlinks with blocking std::fs calls.
// Each call removes a single staged file and returns immediately.
fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::trace!(path = %path.display(), "Removed staged file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged file"),
    }
}

/// Served name for a token: `no_bg_<uuid>.png`
#[must_use]
pub fn output_filename(token: Uuid) -> String {
    format!("{OUTPUT_PREFIX}{token}{OUTPUT_SUFFIX}")
}

/// Whether `filename` is exactly a generated output name
#[must_use]
pub fn is_valid_output_name(filename: &str) -> bool {
    if filename.contains("..")
        || filename.starts_with('/')
        || filename.starts_with('\\')
        || filename.contains(['/', '\\'])
    {
        return false;
    }

    filename
        .strip_prefix(OUTPUT_PREFIX)
        .and_then(|rest| rest.strip_suffix(OUTPUT_SUFFIX))
        .is_some_and(|token| token.len() == 36 && Uuid::try_parse(token).is_ok())
}

/// Reduce a client-supplied file name to a safe, flat ASCII name
///
/// Path components are dropped, whitespace becomes `_`, and anything outside
/// `[A-Za-z0-9._-]` is removed. Leading and trailing dots and underscores are
/// stripped, so the result can be empty.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    cleaned.trim_matches(['.', '_']).to_string()
}

/// Lowercased extension (with leading dot) of the sanitized name, or empty
#[must_use]
pub fn extension_of(name: &str) -> String {
    let sanitized = sanitize_filename(name);
    Path::new(&sanitized)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
