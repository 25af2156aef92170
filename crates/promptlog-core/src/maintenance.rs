//! Log folder housekeeping
//!
//! Keeps the log root usable over many runs: removes empty log files and
//! folders left by loggers that never wrote, prunes old logs when the root
//! grows past a size cap, and moves per-logger folders aside when there are
//! too many of them.
//!
//! Per-entry failures are reported through [`diag`](crate::logging::diag),
//! counted, and skipped. Nothing here panics.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::config::Config;
use crate::logging::diag;
use crate::paths::LOG_EXTENSION;

/// Folder inside the log root that receives overflowing log folders
pub const OVERFLOW_DIR_NAME: &str = "overflow_debug_logs";

/// Upper bound on deletions in one pruning pass
pub const MAX_FILES_DELETED_PER_PASS: usize = 100;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Outcome of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

/// Outcome of a size pruning pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Total size of log files before pruning
    pub total_bytes: u64,
    /// Total size after pruning
    pub remaining_bytes: u64,
    pub deleted: Vec<PathBuf>,
    pub failed: usize,
}

/// Everything [`run`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub empty_files: CleanupReport,
    pub empty_dirs: CleanupReport,
    pub moved_folders: usize,
    pub pruned: Option<PruneReport>,
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().map(|e| e == extension).unwrap_or(false)
}

/// Delete zero-length files ending in `.<extension>` anywhere under `root`
pub fn delete_empty_files(root: impl AsRef<Path>, extension: &str) -> CleanupReport {
    let mut report = CleanupReport::default();

    for entry in WalkDir::new(root.as_ref()).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }
        let is_empty = entry.metadata().map(|m| m.len() == 0).unwrap_or(false);
        if !is_empty {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                report.failed += 1;
                diag::warn("maintenance", &format!("could not delete {}: {}", entry.path().display(), e));
            }
        }
    }

    report
}

/// Delete empty folders under `root`, deepest first, so folders that only
/// held empty folders go too. `root` itself is kept.
pub fn delete_empty_dirs(root: impl AsRef<Path>) -> CleanupReport {
    let mut report = CleanupReport::default();

    let walker = WalkDir::new(root.as_ref()).min_depth(1).contents_first(true);
    for entry in walker.into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let is_empty = fs::read_dir(entry.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            continue;
        }
        match fs::remove_dir(entry.path()) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                report.failed += 1;
                diag::warn("maintenance", &format!("could not delete folder {}: {}", entry.path().display(), e));
            }
        }
    }

    report
}

struct LogFileInfo {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

fn collect_log_files(root: &Path) -> (Vec<LogFileInfo>, u64) {
    let mut files = Vec::new();
    let mut total = 0;

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() || !has_extension(entry.path(), LOG_EXTENSION) {
            continue;
        }
        match entry.metadata() {
            Ok(meta) => {
                total += meta.len();
                files.push(LogFileInfo {
                    path: entry.path().to_path_buf(),
                    size: meta.len(),
                    modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                });
            }
            Err(e) => diag::warn("maintenance", &format!("could not stat {}: {}", entry.path().display(), e)),
        }
    }

    (files, total)
}

/// Delete log files when the total under `root` exceeds `max_mb` megabytes.
///
/// Oldest files go first, and among files of the same age the largest. Stops
/// once the total is at or below half the cap, or after
/// [`MAX_FILES_DELETED_PER_PASS`] deletions.
pub fn prune_to_size(root: impl AsRef<Path>, max_mb: f64) -> io::Result<PruneReport> {
    let root = root.as_ref();
    if !max_mb.is_finite() || max_mb <= 0.0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("size cap must be a positive number of megabytes, got {}", max_mb),
        ));
    }
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("log folder {} does not exist", root.display()),
        ));
    }

    let (mut files, total) = collect_log_files(root);
    let max_bytes = max_mb * BYTES_PER_MB;
    let mut report = PruneReport {
        total_bytes: total,
        remaining_bytes: total,
        ..PruneReport::default()
    };

    if (total as f64) <= max_bytes {
        return Ok(report);
    }

    files.sort_by(|a, b| a.modified.cmp(&b.modified).then(b.size.cmp(&a.size)));
    let acceptable = max_bytes / 2.0;

    for file in files {
        if (report.remaining_bytes as f64) <= acceptable || report.deleted.len() >= MAX_FILES_DELETED_PER_PASS {
            break;
        }
        match fs::remove_file(&file.path) {
            Ok(()) => {
                report.remaining_bytes -= file.size;
                report.deleted.push(file.path);
            }
            Err(e) => {
                report.failed += 1;
                diag::warn("maintenance", &format!("could not delete {}: {}", file.path.display(), e));
            }
        }
    }

    Ok(report)
}

/// Move every folder in `root` into `overflow` when there are more than
/// `too_many` of them. The overflow folder itself is never counted or moved.
///
/// Returns the number of folders moved.
pub fn move_overflow_folders(
    root: impl AsRef<Path>,
    overflow: impl AsRef<Path>,
    too_many: usize,
) -> io::Result<usize> {
    let root = root.as_ref();
    let overflow = overflow.as_ref();

    let mut folders = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() && !same_path(&path, overflow) {
            folders.push(path);
        }
    }

    if folders.len() <= too_many {
        return Ok(0);
    }

    fs::create_dir_all(overflow)?;
    let mut moved = 0;
    for folder in folders {
        let Some(name) = folder.file_name() else {
            continue;
        };
        let destination = overflow.join(name);
        if destination.exists() {
            diag::warn(
                "maintenance",
                &format!("not moving {}: {} already exists", folder.display(), destination.display()),
            );
            continue;
        }
        match fs::rename(&folder, &destination) {
            Ok(()) => moved += 1,
            Err(e) => diag::warn("maintenance", &format!("could not move {}: {}", folder.display(), e)),
        }
    }

    Ok(moved)
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Housekeeping driven by configuration:
/// - `cleanup_on_start`: delete empty log files, then empty folders
/// - `max_log_folders`: move folders into [`OVERFLOW_DIR_NAME`]
/// - `max_log_dir_mb`: prune to size
///
/// A missing log root is not an error; there is nothing to maintain yet.
pub fn run(config: &Config) -> MaintenanceReport {
    let root = &config.log_dir;
    let mut report = MaintenanceReport::default();
    if !root.is_dir() {
        return report;
    }

    if config.cleanup_on_start {
        report.empty_files = delete_empty_files(root, LOG_EXTENSION);
        report.empty_dirs = delete_empty_dirs(root);
    }

    if let Some(too_many) = config.max_log_folders {
        match move_overflow_folders(root, root.join(OVERFLOW_DIR_NAME), too_many) {
            Ok(moved) => report.moved_folders = moved,
            Err(e) => diag::warn("maintenance", &format!("overflow check failed: {}", e)),
        }
    }

    if let Some(max_mb) = config.max_log_dir_mb {
        match prune_to_size(root, max_mb) {
            Ok(pruned) => {
                if !pruned.deleted.is_empty() {
                    diag::warn(
                        "maintenance",
                        &format!(
                            "log folder exceeded {} MB; deleted {} old log files",
                            max_mb,
                            pruned.deleted.len()
                        ),
                    );
                }
                report.pruned = Some(pruned);
            }
            Err(e) => diag::warn("maintenance", &format!("size check failed: {}", e)),
        }
    }

    report
}
