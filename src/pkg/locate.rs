// Purpose: Resolve Go import names and directories to package metadata the way the go tool searches.
// Inputs/Outputs: Import name or directory in, `Package` (import path, imports, std/cgo flags) out.
// Invariants: Search order is local path, GOROOT, GOPATH entries in order; `NoBuildableSource` is
//   only returned when a directory exists but holds no buildable .go files.
// Gotchas: Unknown dot-less names are standard library even without a GOROOT on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use strsim::jaro_winkler;
use thiserror::Error;

use crate::pkg::build_ctx::{BuildConfig, absolutize, normalize_path};
use crate::pkg::import_scan;

/// The cgo pseudo-import.
pub const NATIVE_INTEROP: &str = "C";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub import_path: String,
    pub dir: PathBuf,
    pub name: String,
    pub imports: Vec<String>,
    pub is_standard_library: bool,
    pub is_native_interop: bool,
}

impl Package {
    fn native_interop() -> Self {
        Self {
            import_path: NATIVE_INTEROP.to_string(),
            dir: PathBuf::new(),
            name: NATIVE_INTEROP.to_string(),
            imports: vec![],
            is_standard_library: false,
            is_native_interop: true,
        }
    }

    fn standard(import_path: &str) -> Self {
        let name = import_path.rsplit('/').next().unwrap_or(import_path);
        Self {
            import_path: import_path.to_string(),
            dir: PathBuf::new(),
            name: name.to_string(),
            imports: vec![],
            is_standard_library: true,
            is_native_interop: false,
        }
    }
}

/// Where an import name would come from, without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Standard,
    NativeInterop,
    Vendored,
    GoPath,
    Unknown,
}

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("no buildable Go source files in {0}")]
    NoBuildableSource(PathBuf),
    #[error("cannot find package {name:?} in any of GOROOT, GOPATH or the working directory{hint}")]
    NotFound { name: String, hint: String },
    #[error("found packages {first} and {second} in {dir}")]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        second: String,
    },
    #[error("{0}: expected package clause")]
    Malformed(PathBuf),
    #[error("read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LocateError {
    pub fn is_no_buildable_source(&self) -> bool {
        matches!(self, LocateError::NoBuildableSource(_))
    }
}

pub trait PackageLocator {
    /// Resolves an import name searching from `context_dir`.
    fn resolve_by_name(&self, name: &str, context_dir: &Path) -> Result<Package, LocateError>;

    /// Resolves whatever package lives directly inside `dir`.
    fn resolve_directory(&self, dir: &Path) -> Result<Package, LocateError>;

    /// Classifies an import name without failing.
    fn classify(&self, name: &str, context_dir: &Path) -> PackageKind;

    fn config(&self) -> &BuildConfig;
}

pub fn is_local_import(name: &str) -> bool {
    name == "." || name == ".." || name.starts_with("./") || name.starts_with("../")
}

/// Dot-less first element: the go tool reserves these for the standard library.
pub fn looks_standard(name: &str) -> bool {
    let first = name.split('/').next().unwrap_or(name);
    !first.is_empty() && !first.contains('.') && !is_local_import(name)
}

#[derive(Debug, Clone)]
pub struct FsLocator {
    cfg: BuildConfig,
}

impl FsLocator {
    pub fn new(cfg: BuildConfig) -> Self {
        Self {
            cfg: cfg.resolved(),
        }
    }

    fn import_dir(&self, dir: &Path, import_path: Option<String>) -> Result<Package, LocateError> {
        let known = self.cfg.import_path_for_dir(dir);
        let is_standard_library = matches!(known, Some((_, true)));
        let import_path = known
            .map(|(p, _)| p)
            .or(import_path)
            .unwrap_or_else(|| ".".to_string());

        let files = collect_go_files(dir)?;
        let mut name: Option<(String, PathBuf)> = None;
        let mut imports = std::collections::BTreeSet::new();
        let mut buildable = 0usize;
        for f in files {
            let header = import_scan::scan_header_in_file(&f).map_err(|source| LocateError::Io {
                path: f.clone(),
                source,
            })?;
            if header.ignored {
                continue;
            }
            buildable += 1;
            let Some(pkg_name) = header.package else {
                return Err(LocateError::Malformed(f));
            };
            if let Some((first, first_file)) = &name
                && *first != pkg_name
            {
                return Err(LocateError::MultiplePackages {
                    dir: dir.to_path_buf(),
                    first: format!("{} ({})", first, file_name(first_file)),
                    second: format!("{} ({})", pkg_name, file_name(&f)),
                });
            }
            if name.is_none() {
                name = Some((pkg_name, f.clone()));
            }
            imports.extend(header.imports);
        }
        if buildable == 0 {
            return Err(LocateError::NoBuildableSource(dir.to_path_buf()));
        }

        Ok(Package {
            import_path,
            dir: dir.to_path_buf(),
            name: name.map(|(n, _)| n).unwrap_or_default(),
            imports: imports.into_iter().collect(),
            is_standard_library,
            is_native_interop: false,
        })
    }

    fn search_roots(&self) -> Vec<PathBuf> {
        self.cfg
            .goroot_src()
            .into_iter()
            .chain(self.cfg.gopath_srcs())
            .collect()
    }
}

impl PackageLocator for FsLocator {
    fn resolve_by_name(&self, name: &str, context_dir: &Path) -> Result<Package, LocateError> {
        if name == NATIVE_INTEROP {
            return Ok(Package::native_interop());
        }

        if is_local_import(name) || Path::new(name).is_absolute() {
            let dir = normalize_path(&absolutize(context_dir, Path::new(name)));
            if !dir.is_dir() {
                return Err(not_found(name, &dir));
            }
            return self.import_dir(&dir, Some(name.to_string()));
        }

        for src in self.search_roots() {
            let dir = src.join(name);
            if dir.is_dir() {
                return self.import_dir(&dir, Some(name.to_string()));
            }
        }

        if looks_standard(name) {
            return Ok(Package::standard(name));
        }

        let candidates = self
            .search_roots()
            .into_iter()
            .map(|src| src.join(name))
            .collect::<Vec<_>>();
        let hint_dir = candidates
            .iter()
            .find(|d| d.parent().map(Path::is_dir).unwrap_or(false))
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name));
        Err(not_found(name, &hint_dir))
    }

    fn resolve_directory(&self, dir: &Path) -> Result<Package, LocateError> {
        let dir = normalize_path(&absolutize(&self.cfg.cwd, dir));
        if !dir.is_dir() {
            return Err(LocateError::Io {
                path: dir,
                source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            });
        }
        self.import_dir(&dir, None)
    }

    fn classify(&self, name: &str, context_dir: &Path) -> PackageKind {
        if name == NATIVE_INTEROP {
            return PackageKind::NativeInterop;
        }
        let start = absolutize(&self.cfg.cwd, context_dir);
        for dir in start.ancestors() {
            if dir.join("vendor").join(name).is_dir() {
                return PackageKind::Vendored;
            }
        }
        for src in self.cfg.gopath_srcs() {
            if src.join(name).is_dir() {
                return PackageKind::GoPath;
            }
        }
        if let Some(src) = self.cfg.goroot_src()
            && src.join(name).is_dir()
        {
            return PackageKind::Standard;
        }
        if looks_standard(name) {
            return PackageKind::Standard;
        }
        PackageKind::Unknown
    }

    fn config(&self) -> &BuildConfig {
        &self.cfg
    }
}

fn collect_go_files(dir: &Path) -> Result<Vec<PathBuf>, LocateError> {
    let rd = fs::read_dir(dir).map_err(|source| LocateError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut v = vec![];
    for ent in rd {
        let ent = ent.map_err(|source| LocateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let p = ent.path();
        if !p.is_file() {
            continue;
        }
        let Some(fname) = p.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if fname.starts_with('_') || fname.starts_with('.') {
            continue;
        }
        if fname.ends_with(".go") && !fname.ends_with("_test.go") {
            v.push(p);
        }
    }
    v.sort();
    Ok(v)
}

fn file_name(p: &Path) -> String {
    p.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn list_subdirs(dir: &Path) -> Vec<String> {
    let Ok(rd) = fs::read_dir(dir) else {
        return vec![];
    };
    let mut out: Vec<String> = rd
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter_map(|p| p.file_name().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    out.sort();
    out
}

fn best_name_match<'a>(needle: &str, candidates: &'a [String]) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for c in candidates {
        let score = jaro_winkler(needle, c);
        if best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((c.as_str(), score));
        }
    }
    match best {
        Some((name, score)) if score >= 0.84 => Some(name),
        _ => None,
    }
}

fn not_found(name: &str, dir: &Path) -> LocateError {
    let leaf = name.rsplit('/').next().unwrap_or(name);
    let candidates = dir.parent().map(list_subdirs).unwrap_or_default();
    let hint = match best_name_match(leaf, &candidates) {
        Some(best) if best != leaf => {
            let suggested = match name.rfind('/') {
                Some(i) => format!("{}/{}", &name[..i], best),
                None => best.to_string(),
            };
            format!("\nhelp: did you mean \"{}\"?", suggested)
        }
        _ => String::new(),
    };
    LocateError::NotFound {
        name: name.to_string(),
        hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().expect("parent")).expect("mkdir");
        fs::write(p, body).expect("write");
    }

    fn locator(tmp: &TempDir) -> FsLocator {
        let cfg = BuildConfig::new(tmp.path().join("work"))
            .with_goroot(tmp.path().join("goroot"))
            .with_gopath(tmp.path().join("gopath"));
        FsLocator::new(cfg)
    }

    #[test]
    fn resolves_gopath_package_and_merges_imports() {
        let tmp = TempDir::new().expect("tempdir");
        write(
            tmp.path(),
            "gopath/src/example.org/lib/a.go",
            "package lib\n\nimport (\n\t\"fmt\"\n\t\"example.org/dep\"\n)\n",
        );
        write(
            tmp.path(),
            "gopath/src/example.org/lib/b.go",
            "package lib\n\nimport \"fmt\"\nimport \"C\"\n",
        );
        write(
            tmp.path(),
            "gopath/src/example.org/lib/b_test.go",
            "package lib\n\nimport \"example.org/testonly\"\n",
        );
        let loc = locator(&tmp);
        let pkg = loc
            .resolve_by_name("example.org/lib", tmp.path())
            .expect("resolve");
        assert_eq!(pkg.import_path, "example.org/lib");
        assert_eq!(pkg.name, "lib");
        assert_eq!(pkg.imports, vec!["C", "example.org/dep", "fmt"]);
        assert!(!pkg.is_standard_library);
    }

    #[test]
    fn goroot_packages_are_standard_library() {
        let tmp = TempDir::new().expect("tempdir");
        write(tmp.path(), "goroot/src/net/http/server.go", "package http\n");
        let loc = locator(&tmp);
        let pkg = loc.resolve_by_name("net/http", tmp.path()).expect("resolve");
        assert!(pkg.is_standard_library);
        let fmt = loc.resolve_by_name("fmt", tmp.path()).expect("fallback");
        assert!(fmt.is_standard_library);
        assert!(fmt.imports.is_empty());
    }

    #[test]
    fn cgo_pseudo_import_is_native_interop() {
        let tmp = TempDir::new().expect("tempdir");
        let loc = locator(&tmp);
        let pkg = loc.resolve_by_name("C", tmp.path()).expect("resolve");
        assert!(pkg.is_native_interop);
        assert_eq!(loc.classify("C", tmp.path()), PackageKind::NativeInterop);
    }

    #[test]
    fn empty_directory_is_no_buildable_source() {
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir_all(tmp.path().join("work/docs")).expect("mkdir");
        write(tmp.path(), "work/docs/skip_test.go", "package docs\n");
        write(tmp.path(), "work/docs/gen.go", "//go:build ignore\n\npackage main\n");
        let loc = locator(&tmp);
        let err = loc
            .resolve_directory(&tmp.path().join("work/docs"))
            .expect_err("no source");
        assert!(err.is_no_buildable_source());
    }

    #[test]
    fn mixed_package_clauses_are_a_failure() {
        let tmp = TempDir::new().expect("tempdir");
        write(tmp.path(), "work/a.go", "package a\n");
        write(tmp.path(), "work/b.go", "package b\n");
        let loc = locator(&tmp);
        let err = loc.resolve_directory(Path::new(".")).expect_err("mixed");
        assert!(matches!(err, LocateError::MultiplePackages { .. }));
        assert!(!err.is_no_buildable_source());
    }

    #[test]
    fn missing_remote_package_suggests_a_sibling() {
        let tmp = TempDir::new().expect("tempdir");
        write(tmp.path(), "gopath/src/github.com/acme/widgets/w.go", "package widgets\n");
        let loc = locator(&tmp);
        let err = loc
            .resolve_by_name("github.com/acme/widget", tmp.path())
            .expect_err("missing");
        let msg = err.to_string();
        assert!(msg.contains("github.com/acme/widget"), "{msg}");
        assert!(msg.contains("did you mean \"github.com/acme/widgets\""), "{msg}");
    }

    #[test]
    fn local_import_outside_gopath_keeps_given_path() {
        let tmp = TempDir::new().expect("tempdir");
        write(tmp.path(), "work/vendor/example.org/x/x.go", "package x\n");
        let loc = locator(&tmp);
        let pkg = loc
            .resolve_by_name("./vendor/example.org/x", &tmp.path().join("work"))
            .expect("resolve");
        assert_eq!(pkg.import_path, "./vendor/example.org/x");
    }

    #[test]
    fn classify_walks_vendor_dirs_upwards() {
        let tmp = TempDir::new().expect("tempdir");
        write(tmp.path(), "work/vendor/example.org/v/v.go", "package v\n");
        write(tmp.path(), "gopath/src/example.org/g/g.go", "package g\n");
        let loc = locator(&tmp);
        let ctx = tmp.path().join("work/cmd/tool");
        assert_eq!(loc.classify("example.org/v", &ctx), PackageKind::Vendored);
        assert_eq!(loc.classify("example.org/g", &ctx), PackageKind::GoPath);
        assert_eq!(loc.classify("strings", &ctx), PackageKind::Standard);
        assert_eq!(loc.classify("example.org/none", &ctx), PackageKind::Unknown);
    }
}
