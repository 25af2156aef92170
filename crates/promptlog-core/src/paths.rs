//! Log file path generation
//!
//! Layout: `<log_dir>/<logger_name>[/<batch_id>]/<file>.log`, where the file
//! name carries the creation time and a short random id so separate runs
//! never share a file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use uuid::Uuid;

use crate::config::Config;

/// Timestamp layout used in file names, e.g. `2024-09-18_18-38-44`
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Log file extension
pub const LOG_EXTENSION: &str = "log";

/// Attempts at finding an unused file name before giving up
const MAX_NAME_ATTEMPTS: usize = 8;

/// Generate a random v4 UUID string
pub fn make_id() -> String {
    Uuid::new_v4().to_string()
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Make `segment` safe to use as a single path component.
///
/// Separators, `..` and control characters become `_`; an empty segment
/// becomes `_`.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Derives per-logger folders and collision-free log file paths
#[derive(Debug, Clone)]
pub struct PathGenerator {
    root: PathBuf,
}

impl PathGenerator {
    /// Create a generator rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a generator rooted at the configured log folder
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.log_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder for a logger, without touching the filesystem
    pub fn folder(&self, logger_name: &str, batch_id: Option<&str>) -> PathBuf {
        let mut folder = self.root.join(sanitize_segment(logger_name));
        if let Some(batch) = batch_id {
            folder.push(sanitize_segment(batch));
        }
        folder
    }

    /// Folder for a logger, created if missing. Safe to call repeatedly.
    pub fn ensure_folder(&self, logger_name: &str, batch_id: Option<&str>) -> io::Result<PathBuf> {
        let folder = self.folder(logger_name, batch_id);
        fs::create_dir_all(&folder)?;
        Ok(folder)
    }

    /// New path for a logger's file:
    /// `<root>/<name>[/<batch>]/<name>_debug_log_<timestamp>_<id>.log`
    pub fn generate_path(&self, logger_name: &str, batch_id: Option<&str>) -> io::Result<PathBuf> {
        let stem = format!("{}_debug_log", sanitize_segment(logger_name));
        self.unique_file(logger_name, batch_id, &stem)
    }

    /// New path for a prompt log:
    /// `<root>/<name>[/<batch>]/<prompt_name>_<timestamp>_<id>.log`
    pub fn generate_prompt_path(
        &self,
        logger_name: &str,
        prompt_name: &str,
        batch_id: Option<&str>,
    ) -> io::Result<PathBuf> {
        self.unique_file(logger_name, batch_id, &sanitize_segment(prompt_name))
    }

    fn unique_file(&self, logger_name: &str, batch_id: Option<&str>, stem: &str) -> io::Result<PathBuf> {
        let folder = self.ensure_folder(logger_name, batch_id)?;
        let timestamp = Local::now().format(FILE_TIMESTAMP_FORMAT).to_string();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = folder.join(format!("{}_{}_{}.{}", stem, timestamp, short_id(), LOG_EXTENSION));
            if !candidate.exists() {
                return Ok(candidate);
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no unused log file name in {}", folder.display()),
        ))
    }
}
