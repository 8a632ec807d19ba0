// Purpose: Hold the toolchain search context (GOROOT, GOPATH, working directory) as an explicit value.
// Inputs/Outputs: Built from environment or CLI flags; read by every locator call.
// Invariants: Paths are absolute once `resolved` has run; GOPATH order is search order.
// Gotchas: An empty GOROOT is legal; dot-less names are then classified as standard library.

use anyhow::Context;
use directories::BaseDirs;
use std::env;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub goroot: Option<PathBuf>,
    pub gopath: Vec<PathBuf>,
    pub cwd: PathBuf,
}

impl BuildConfig {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            goroot: None,
            gopath: vec![],
            cwd: cwd.into(),
        }
    }

    pub fn with_goroot(mut self, goroot: impl Into<PathBuf>) -> Self {
        self.goroot = Some(goroot.into());
        self
    }

    pub fn with_gopath(mut self, entry: impl Into<PathBuf>) -> Self {
        self.gopath.push(entry.into());
        self
    }

    /// Reads `GOROOT` and `GOPATH` the way the go tool does. When `GOPATH` is
    /// unset the per-user default `$HOME/go` is used.
    pub fn from_env() -> anyhow::Result<Self> {
        let cwd = env::current_dir().context("determine working directory")?;
        let goroot = env::var_os("GOROOT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let gopath = match env::var_os("GOPATH").filter(|v| !v.is_empty()) {
            Some(v) => env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect(),
            None => default_gopath().into_iter().collect(),
        };
        Ok(Self { goroot, gopath, cwd })
    }

    /// Makes every configured path absolute against `cwd`.
    pub fn resolved(mut self) -> Self {
        let cwd = self.cwd.clone();
        self.goroot = self.goroot.map(|p| absolutize(&cwd, &p));
        self.gopath = self.gopath.iter().map(|p| absolutize(&cwd, p)).collect();
        self
    }

    pub fn goroot_src(&self) -> Option<PathBuf> {
        self.goroot.as_ref().map(|r| r.join("src"))
    }

    pub fn gopath_srcs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.gopath.iter().map(|p| p.join("src"))
    }

    /// Import path of `dir` when it lies under GOROOT/src or a GOPATH src tree.
    /// The flag is true for the GOROOT case.
    pub fn import_path_for_dir(&self, dir: &Path) -> Option<(String, bool)> {
        if let Some(src) = self.goroot_src()
            && let Some(sub) = sub_import_path(&src, dir)
        {
            return Some((sub, true));
        }
        for src in self.gopath_srcs() {
            if let Some(sub) = sub_import_path(&src, dir) {
                return Some((sub, false));
            }
        }
        None
    }
}

fn default_gopath() -> Option<PathBuf> {
    BaseDirs::new().map(|b| b.home_dir().join("go"))
}

pub fn absolutize(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Lexically folds `.` and `..` components.
pub fn normalize_path(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Forward-slash relative path of `dir` below `root`, skipping `testdata` trees.
fn sub_import_path(root: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() || parts.iter().any(|p| p == "testdata") {
        return None;
    }
    Some(parts.join("/"))
}
