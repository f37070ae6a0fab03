use std::path::PathBuf;

use directories::ProjectDirs;

const ASSET_DIR_ENV: &str = "TASKBOARD_ASSET_DIR";

/// Directory holding the SQLite database and other runtime assets.
///
/// `TASKBOARD_ASSET_DIR` overrides the platform default, which is what the
/// test suites use to point the server at a throwaway location.
pub fn asset_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ASSET_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    ProjectDirs::from("dev", "taskboard", "taskboard")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".taskboard"))
}
