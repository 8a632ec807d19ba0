// Purpose: Infer the external dependencies of a Go tree: import-graph walk with tree-scan fallback.
// Inputs/Outputs: Locator + base directory in; project name and compacted dependency roots out.
// Invariants: Result never holds std, cgo, the project itself or any of its sub-packages.
// Gotchas: Only "no buildable source at the root" switches strategy; deeper failures abort.

pub mod compact;
pub mod name;
pub mod scan;
pub mod walk;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

use crate::pkg::build_ctx::{absolutize, normalize_path};
use crate::pkg::locate::{LocateError, PackageLocator};
use crate::pkg::normalize::NameNormalizer;

pub use compact::compact;
pub use name::{DEFAULT_PROJECT_NAME, guess_project_name};
pub use scan::{FallbackTreeScanner, ScanOptions, ScanReport, SkippedDir};
pub use walk::{ImportGraphWalker, OverlayResolver};

#[derive(Error, Debug)]
pub enum GuessError {
    #[error("no buildable Go source at {0}")]
    NoBuildableSource(PathBuf),
    #[error("resolve import {import:?}")]
    Failure {
        import: String,
        #[source]
        source: LocateError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ImportGraph,
    TreeScan,
}

#[derive(Debug, Clone)]
pub struct Guess {
    pub name: String,
    pub dependencies: BTreeSet<String>,
    pub strategy: Strategy,
    /// Directories with Go source the tree scan could not resolve.
    pub skipped: Vec<SkippedDir>,
}

/// Import name the go tool would use for `base` given the locator's working directory.
pub fn root_import_name(base: &Path) -> String {
    let s = base.to_string_lossy().replace('\\', "/");
    if s.is_empty() || s == "." {
        return ".".to_string();
    }
    if base.is_absolute() || s.starts_with("./") || s.starts_with("../") || s == ".." {
        return s;
    }
    format!("./{}", s)
}

#[instrument(level = "debug", skip(locator, options))]
pub fn guess_deps<L>(locator: &L, base: &Path, options: &ScanOptions) -> Result<Guess, GuessError>
where
    L: PackageLocator + ?Sized,
{
    let root = root_import_name(base);
    let name = guess_project_name(locator, &root);
    info!(project = %name, "guessing dependencies");

    let (found, strategy, skipped) = match ImportGraphWalker::new(locator, &name).walk(&root) {
        Ok(found) => (found, Strategy::ImportGraph, vec![]),
        Err(GuessError::NoBuildableSource(dir)) => {
            info!(dir = %dir.display(), "no Go source at the top level, scanning subdirectories");
            let root_dir = normalize_path(&absolutize(&locator.config().cwd, base));
            let mut found = BTreeSet::new();
            let report =
                FallbackTreeScanner::new(locator, &name, root_dir, options).scan(&mut found);
            info!(
                visited = report.visited,
                skipped = report.skipped.len(),
                "tree scan finished"
            );
            (found, Strategy::TreeScan, report.skipped)
        }
        Err(err) => return Err(err),
    };

    let normalizer = NameNormalizer::with_config(locator.config());
    let mut dependencies = compact(&found, &normalizer);
    dependencies.remove(&name);
    dependencies.remove(&root);
    for dep in &dependencies {
        info!("Found reference to {}", dep);
    }

    Ok(Guess {
        name,
        dependencies,
        strategy,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::root_import_name;
    use std::path::Path;

    #[test]
    fn base_directories_become_local_import_names() {
        assert_eq!(root_import_name(Path::new(".")), ".");
        assert_eq!(root_import_name(Path::new("")), ".");
        assert_eq!(root_import_name(Path::new("cmd/tool")), "./cmd/tool");
        assert_eq!(root_import_name(Path::new("../other")), "../other");
        assert_eq!(root_import_name(Path::new("/abs/proj")), "/abs/proj");
    }
}
