use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use crate::pkg::locate::{LocateError, PackageKind, PackageLocator, is_local_import};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory names never resolved nor descended into.
    pub skip_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            skip_dirs: vec!["vendor".to_string(), "testdata".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDir {
    pub dir: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Directories entered, including those without Go source.
    pub visited: usize,
    /// Directories holding Go source that could not be resolved.
    pub skipped: Vec<SkippedDir>,
}

/// Best-effort walk used when the root has no Go source of its own. Records the
/// direct imports of every package found under the root, without following them.
pub struct FallbackTreeScanner<'a, L: PackageLocator + ?Sized> {
    locator: &'a L,
    project: &'a str,
    root: PathBuf,
    options: &'a ScanOptions,
}

impl<'a, L: PackageLocator + ?Sized> FallbackTreeScanner<'a, L> {
    pub fn new(locator: &'a L, project: &'a str, root: PathBuf, options: &'a ScanOptions) -> Self {
        Self {
            locator,
            project,
            root,
            options,
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn scan(&self, found: &mut BTreeSet<String>) -> ScanReport {
        debug!(root = %self.root.display(), "scanning tree");
        let mut report = ScanReport::default();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.excluded(e));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    let dir = err.path().map(Path::to_path_buf).unwrap_or_default();
                    debug!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                    report.skipped.push(SkippedDir {
                        dir,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            report.visited += 1;
            self.scan_dir(entry.path(), found, &mut report);
        }
        report
    }

    fn scan_dir(&self, dir: &Path, found: &mut BTreeSet<String>, report: &mut ScanReport) {
        let pkg = match self.locator.resolve_directory(dir) {
            Ok(pkg) => pkg,
            Err(LocateError::NoBuildableSource(_)) => {
                debug!(dir = %dir.display(), "no Go source");
                return;
            }
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "skipping directory");
                report.skipped.push(SkippedDir {
                    dir: dir.to_path_buf(),
                    reason: err.to_string(),
                });
                return;
            }
        };
        if pkg.is_standard_library {
            return;
        }

        for imp in &pkg.imports {
            if self.is_internal(imp) {
                continue;
            }
            match self.locator.classify(imp, &self.root) {
                PackageKind::Standard | PackageKind::NativeInterop => {}
                _ => {
                    if found.insert(imp.clone()) {
                        debug!(import = %imp, dir = %dir.display(), "discovered");
                    }
                }
            }
        }
    }

    fn is_internal(&self, imp: &str) -> bool {
        is_local_import(imp)
            || imp == self.project
            || imp.starts_with(&format!("{}/", self.project))
    }

    // The root itself is always scanned; below it the go tool ignores `.` and `_` names.
    fn excluded(&self, e: &DirEntry) -> bool {
        if e.depth() == 0 || !e.file_type().is_dir() {
            return false;
        }
        let name = e.file_name().to_string_lossy();
        name.starts_with('.')
            || name.starts_with('_')
            || self.options.skip_dirs.iter().any(|s| *s == *name)
    }
}
