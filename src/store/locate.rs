use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info};

use super::error::{StoreError, StoreResult};

/// Find the most recently modified spreadsheet with `extension` in `dir`
///
/// Office lock files (`~$name.xlsx`) and hidden files are skipped.
pub fn latest_spreadsheet(dir: &Path, extension: &str) -> StoreResult<PathBuf> {
    let io_err = |source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();

        let matches_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        let is_hidden_or_lock = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("~$") || n.starts_with('.'));
        if !matches_extension || is_hidden_or_lock {
            continue;
        }

        let metadata = entry.metadata().map_err(io_err)?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(io_err)?;
        debug!("Candidate spreadsheet: {}", path.display());

        if latest.as_ref().is_none_or(|(newest, _)| modified > *newest) {
            latest = Some((modified, path));
        }
    }

    match latest {
        Some((_, path)) => {
            info!("Using latest spreadsheet: {}", path.display());
            Ok(path)
        }
        None => Err(StoreError::NoSpreadsheet {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};

    fn touch(dir: &Path, name: &str, mtime_secs: i64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
        path
    }

    #[test]
    fn picks_newest_matching_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "old.xlsx", 1_000);
        let newest = touch(dir.path(), "new.XLSX", 3_000);
        touch(dir.path(), "newer-but-csv.csv", 5_000);
        touch(dir.path(), "~$new.xlsx", 9_000);

        assert_eq!(latest_spreadsheet(dir.path(), "xlsx").unwrap(), newest);
    }

    #[test]
    fn empty_directory_reports_no_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            latest_spreadsheet(dir.path(), "xlsx"),
            Err(StoreError::NoSpreadsheet { .. })
        ));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            latest_spreadsheet(&missing, "xlsx"),
            Err(StoreError::Io { .. })
        ));
    }
}
