use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, instrument, trace};

use crate::guess::GuessError;
use crate::pkg::locate::{LocateError, NATIVE_INTEROP, Package, PackageLocator, is_local_import};
use crate::pkg::normalize::NameNormalizer;

/// Looks a name up beneath `<vendor_parent>/vendor/` before the ambient search path.
pub struct OverlayResolver<'a, L: PackageLocator + ?Sized> {
    locator: &'a L,
    cwd: &'a Path,
}

impl<'a, L: PackageLocator + ?Sized> OverlayResolver<'a, L> {
    pub fn new(locator: &'a L) -> Self {
        Self {
            locator,
            cwd: &locator.config().cwd,
        }
    }

    pub fn resolve(&self, name: &str, vendor_parent: &str) -> Result<Package, LocateError> {
        if vendor_parent.is_empty() {
            return self.locator.resolve_by_name(name, self.cwd);
        }
        let vendored = format!("{}/vendor/{}", vendor_parent, name);
        match self.locator.resolve_by_name(&vendored, self.cwd) {
            Ok(pkg) => Ok(pkg),
            Err(err) => {
                trace!(import = name, error = %err, "no vendored copy");
                self.locator.resolve_by_name(name, self.cwd)
            }
        }
    }
}

/// Depth-first traversal of the import graph from the project root.
///
/// The visited set is keyed on reportable (de-vendored) names while each step
/// looks up the raw import name, so two vendor contexts that de-vendor to the
/// same name count as one node.
pub struct ImportGraphWalker<'a, L: PackageLocator + ?Sized> {
    resolver: OverlayResolver<'a, L>,
    normalizer: NameNormalizer,
    project: &'a str,
    vendor_parent: String,
    found: BTreeSet<String>,
    visited: HashSet<String>,
}

impl<'a, L: PackageLocator + ?Sized> ImportGraphWalker<'a, L> {
    pub fn new(locator: &'a L, project: &'a str) -> Self {
        Self {
            resolver: OverlayResolver::new(locator),
            normalizer: NameNormalizer::with_config(locator.config()),
            project,
            vendor_parent: String::new(),
            found: BTreeSet::new(),
            visited: HashSet::new(),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn walk(mut self, root: &str) -> Result<BTreeSet<String>, GuessError> {
        if root == NATIVE_INTEROP {
            return Ok(self.found);
        }
        let pkg = match self.resolver.resolve(root, "") {
            Ok(pkg) => pkg,
            Err(LocateError::NoBuildableSource(dir)) => {
                return Err(GuessError::NoBuildableSource(dir));
            }
            Err(source) => {
                return Err(GuessError::Failure {
                    import: root.to_string(),
                    source,
                });
            }
        };
        // Every nested lookup anchors on the top-level vendor tree.
        self.vendor_parent = pkg.import_path.clone();
        self.visit(pkg)?;
        Ok(self.found)
    }

    /// `importer_dir` anchors relative imports; every other name goes through the overlay.
    fn descend(&mut self, name: &str, importer_dir: &Path) -> Result<(), GuessError> {
        if name == NATIVE_INTEROP {
            return Ok(());
        }
        let resolved = if is_local_import(name) {
            self.resolver.locator.resolve_by_name(name, importer_dir)
        } else {
            self.resolver.resolve(name, &self.vendor_parent)
        };
        let pkg = resolved.map_err(|source| GuessError::Failure {
            import: name.to_string(),
            source,
        })?;
        self.visit(pkg)
    }

    fn visit(&mut self, pkg: Package) -> Result<(), GuessError> {
        if pkg.is_native_interop {
            return Ok(());
        }
        if pkg.is_standard_library {
            self.visited.insert(pkg.import_path);
            return Ok(());
        }

        let prefix = format!("{}/vendor/", self.vendor_parent);
        let real = pkg
            .import_path
            .strip_prefix(&prefix)
            .unwrap_or(&pkg.import_path)
            .to_string();
        // Relative paths only identify a package together with the importer's directory.
        let key = if is_local_import(&real) {
            pkg.dir.to_string_lossy().into_owned()
        } else {
            real.clone()
        };
        if !self.visited.insert(key) {
            return Ok(());
        }

        if !self.is_self_reference(&real) && self.found.insert(real.clone()) {
            debug!(import = %real, "discovered");
        }

        for imp in &pkg.imports {
            if !self.visited.contains(imp) {
                self.descend(imp, &pkg.dir)?;
            }
        }
        Ok(())
    }

    fn is_self_reference(&self, real: &str) -> bool {
        if is_local_import(real)
            || real == self.vendor_parent
            || real == self.project
            || real.starts_with(&format!("{}/", self.project))
        {
            return true;
        }
        let lookup = self.normalizer.root(real);
        lookup == self.project || lookup == self.vendor_parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::build_ctx::BuildConfig;
    use crate::pkg::locate::PackageKind;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory locator keyed by import name.
    struct MapLocator {
        cfg: BuildConfig,
        pkgs: HashMap<String, Package>,
        empty_root: bool,
    }

    impl MapLocator {
        fn new() -> Self {
            Self {
                cfg: BuildConfig::new("/work"),
                pkgs: HashMap::new(),
                empty_root: false,
            }
        }

        fn add(mut self, key: &str, import_path: &str, imports: &[&str], std: bool) -> Self {
            self.pkgs.insert(
                key.to_string(),
                Package {
                    import_path: import_path.to_string(),
                    dir: PathBuf::from("/src").join(import_path),
                    name: "p".to_string(),
                    imports: imports.iter().map(|s| s.to_string()).collect(),
                    is_standard_library: std,
                    is_native_interop: false,
                },
            );
            self
        }
    }

    impl PackageLocator for MapLocator {
        fn resolve_by_name(&self, name: &str, _ctx: &Path) -> Result<Package, LocateError> {
            if name == "." && self.empty_root {
                return Err(LocateError::NoBuildableSource(PathBuf::from("/work")));
            }
            self.pkgs.get(name).cloned().ok_or_else(|| LocateError::NotFound {
                name: name.to_string(),
                hint: String::new(),
            })
        }

        fn resolve_directory(&self, dir: &Path) -> Result<Package, LocateError> {
            Err(LocateError::NoBuildableSource(dir.to_path_buf()))
        }

        fn classify(&self, _name: &str, _ctx: &Path) -> PackageKind {
            PackageKind::Unknown
        }

        fn config(&self) -> &BuildConfig {
            &self.cfg
        }
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn overlay_copy_wins_over_plain_lookup() {
        let loc = MapLocator::new()
            .add("github.com/x/y", "github.com/x/y", &[], false)
            .add(
                "github.com/me/proj/vendor/github.com/x/y",
                "github.com/me/proj/vendor/github.com/x/y",
                &[],
                false,
            );
        let r = OverlayResolver::new(&loc);
        let pkg = r.resolve("github.com/x/y", "github.com/me/proj").expect("resolve");
        assert_eq!(pkg.import_path, "github.com/me/proj/vendor/github.com/x/y");
        let plain = r.resolve("github.com/x/y", "github.com/other/proj").expect("resolve");
        assert_eq!(plain.import_path, "github.com/x/y");
    }

    #[test]
    fn walk_collects_transitive_deps_and_skips_std_cgo_and_self() {
        let loc = MapLocator::new()
            .add(
                ".",
                "github.com/me/proj",
                &["C", "fmt", "github.com/me/proj/util", "github.com/x/y"],
                false,
            )
            .add("fmt", "fmt", &["internal/fmtsort"], true)
            .add("github.com/me/proj/util", "github.com/me/proj/util", &["github.com/x/y/sub"], false)
            .add(
                "github.com/me/proj/vendor/github.com/x/y",
                "github.com/me/proj/vendor/github.com/x/y",
                &["strings", "example.org/deep"],
                false,
            )
            .add("github.com/x/y/sub", "github.com/x/y/sub", &[], false)
            .add("strings", "strings", &[], true)
            .add("example.org/deep", "example.org/deep", &["C"], false);

        let found = ImportGraphWalker::new(&loc, "github.com/me/proj")
            .walk(".")
            .expect("walk");
        assert_eq!(
            names(&found),
            vec!["example.org/deep", "github.com/x/y", "github.com/x/y/sub"]
        );
    }

    #[test]
    fn devendored_name_seen_through_two_contexts_is_one_node() {
        // The same library reached once through the overlay and once through an
        // explicit vendor path collapses onto one visited entry.
        let loc = MapLocator::new()
            .add(
                ".",
                "github.com/me/proj",
                &["github.com/me/proj/vendor/github.com/x/y", "github.com/x/y"],
                false,
            )
            .add(
                "github.com/me/proj/vendor/github.com/x/y",
                "github.com/me/proj/vendor/github.com/x/y",
                &["example.org/leaf"],
                false,
            )
            .add("example.org/leaf", "example.org/leaf", &[], false);

        let found = ImportGraphWalker::new(&loc, "github.com/me/proj")
            .walk(".")
            .expect("walk");
        assert_eq!(names(&found), vec!["example.org/leaf", "github.com/x/y"]);
    }

    #[test]
    fn missing_transitive_import_aborts_the_walk() {
        let loc = MapLocator::new().add(".", "github.com/me/proj", &["github.com/gone/pkg"], false);
        let err = ImportGraphWalker::new(&loc, "github.com/me/proj")
            .walk(".")
            .expect_err("missing");
        match err {
            GuessError::Failure { import, .. } => assert_eq!(import, "github.com/gone/pkg"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_root_signals_fallback() {
        let mut loc = MapLocator::new();
        loc.empty_root = true;
        let err = ImportGraphWalker::new(&loc, "main").walk(".").expect_err("empty");
        assert!(matches!(err, GuessError::NoBuildableSource(_)));
    }
}
