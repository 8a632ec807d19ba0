use std::path::Path;
use tracing::debug;

use crate::pkg::build_ctx::{absolutize, normalize_path};
use crate::pkg::locate::{PackageLocator, is_local_import};

/// Identity used when nothing better can be derived.
pub const DEFAULT_PROJECT_NAME: &str = "main";

/// Top-level import path of the project at `root`. Never fails.
pub fn guess_project_name<L: PackageLocator + ?Sized>(locator: &L, root: &str) -> String {
    let cfg = locator.config();
    match locator.resolve_by_name(root, &cfg.cwd) {
        Ok(pkg) if !is_local_import(&pkg.import_path) && !Path::new(&pkg.import_path).is_absolute() => {
            return pkg.import_path;
        }
        Ok(_) => {}
        Err(err) => debug!(root, error = %err, "root did not resolve"),
    }

    // No top level source, but the tree may still sit inside a GOPATH.
    let dir = normalize_path(&absolutize(&cfg.cwd, Path::new(root)));
    for src in cfg.gopath_srcs() {
        if let Ok(rel) = dir.strip_prefix(&src) {
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            let name = name.trim_matches('/');
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }

    DEFAULT_PROJECT_NAME.to_string()
}
