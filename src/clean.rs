use std::{fs, path::Path};

use tracing::{info, warn};

/// Tally of a cleanup sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: usize,
    pub failed: usize,
}

impl CleanReport {
    fn absorb(&mut self, other: Self) {
        self.removed += other.removed;
        self.failed += other.failed;
    }
}

/// Removes the contents of `dir`, recursively for subdirectories, keeping
/// `dir` itself in place.
///
/// A missing directory is skipped with a note. Individual removals that fail
/// are logged and counted without stopping the sweep.
pub fn clean_dir(dir: &Path) -> CleanReport {
    let mut report = CleanReport::default();
    if !dir.is_dir() {
        info!(directory = %dir.display(), "not present, skipping");
        return report;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(directory = %dir.display(), %error, "could not list directory");
            report.failed += 1;
            return report;
        }
    };
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(error) => {
                warn!(directory = %dir.display(), %error, "could not read entry");
                report.failed += 1;
                continue;
            }
        };
        let removal = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match removal {
            Ok(()) => report.removed += 1,
            Err(error) => {
                warn!(path = %path.display(), %error, "could not remove");
                report.failed += 1;
            }
        }
    }

    info!(directory = %dir.display(), removed = report.removed, "cleaned");
    report
}

/// Sweeps every given stage directory in turn.
pub fn clean_dirs<'a>(dirs: impl IntoIterator<Item = &'a Path>) -> CleanReport {
    let mut report = CleanReport::default();
    for dir in dirs {
        report.absorb(clean_dir(dir));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removes_contents_but_keeps_the_directory() {
        let workspace = TempDir::new().unwrap();
        let stage = workspace.path().join("raw_frames");
        fs::create_dir_all(stage.join("nested")).unwrap();
        fs::write(stage.join("frame.png"), b"x").unwrap();
        fs::write(stage.join("nested/deep.png"), b"x").unwrap();

        let report = clean_dir(&stage);
        assert_eq!(report, CleanReport { removed: 2, failed: 0 });
        assert!(stage.is_dir());
        assert_eq!(fs::read_dir(&stage).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_skipped_quietly() {
        let workspace = TempDir::new().unwrap();
        let report = clean_dir(&workspace.path().join("not_there"));
        assert_eq!(report, CleanReport::default());
    }

    #[test]
    fn test_sweeps_multiple_directories() {
        let workspace = TempDir::new().unwrap();
        let first = workspace.path().join("a");
        let second = workspace.path().join("b");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("one.png"), b"x").unwrap();
        fs::write(second.join("two.png"), b"x").unwrap();

        let report = clean_dirs([first.as_path(), second.as_path(), Path::new("missing")]);
        assert_eq!(report, CleanReport { removed: 2, failed: 0 });
    }
}
