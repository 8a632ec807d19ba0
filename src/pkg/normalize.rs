// Purpose: Map a full import path to the root of the repository that versions it.
// Inputs/Outputs: Import path in, (root, sub-package remainder) out.
// Invariants: `root + "/" + rest == name` whenever `rest` is non-empty (modulo vendor/backslash cleanup).
// Gotchas: Unknown hosts fall back to host + one element; keep the host table ordered longest prefix first.

use crate::pkg::build_ctx::BuildConfig;
use crate::pkg::locate::looks_standard;

/// Hosting layouts with a fixed number of path elements in the repository root.
const KNOWN_HOSTS: &[(&str, usize)] = &[
    ("hub.jazz.net/git", 4),
    ("golang.org/x", 3),
    ("github.com", 3),
    ("bitbucket.org", 3),
    ("gitlab.com", 3),
    ("launchpad.net", 2),
    ("go.googlesource.com", 2),
];

const VCS_SUFFIXES: &[&str] = &[".git", ".hg", ".bzr", ".svn", ".fossil"];

#[derive(Debug, Clone, Default)]
pub struct NameNormalizer {
    cfg: Option<BuildConfig>,
}

impl NameNormalizer {
    pub fn new() -> Self {
        Self { cfg: None }
    }

    /// Paths present under GOROOT/src are always their own root.
    pub fn with_config(cfg: &BuildConfig) -> Self {
        Self {
            cfg: Some(cfg.clone()),
        }
    }

    pub fn normalize(&self, name: &str) -> (String, String) {
        let name = name.replace('\\', "/");
        let name = match name.rfind("/vendor/") {
            Some(i) => name[i + "/vendor/".len()..].to_string(),
            None => name.strip_prefix("vendor/").map(str::to_string).unwrap_or(name),
        };
        let name = name.trim_matches('/').to_string();

        if self.in_goroot(&name) || looks_standard(&name) {
            return (name, String::new());
        }

        let root = root_of(&name);
        let rest = name
            .get(root.len()..)
            .unwrap_or("")
            .trim_start_matches('/')
            .to_string();
        (root, rest)
    }

    pub fn root(&self, name: &str) -> String {
        self.normalize(name).0
    }

    fn in_goroot(&self, name: &str) -> bool {
        self.cfg
            .as_ref()
            .and_then(BuildConfig::goroot_src)
            .map(|src| !name.is_empty() && src.join(name).is_dir())
            .unwrap_or(false)
    }
}

fn root_of(name: &str) -> String {
    let seg: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(i) = seg
        .iter()
        .position(|s| VCS_SUFFIXES.iter().any(|suf| s.ends_with(suf)))
    {
        return seg[..=i].join("/");
    }

    if seg.first() == Some(&"gopkg.in") {
        // gopkg.in/pkg.v1 or gopkg.in/user/pkg.v1
        let take = if seg.len() >= 2 && is_gopkg_version(seg[1]) {
            2
        } else {
            3
        };
        return seg[..take.min(seg.len())].join("/");
    }

    for (host, take) in KNOWN_HOSTS {
        let host_len = host.split('/').count();
        if seg.len() >= host_len && seg[..host_len].join("/") == *host {
            return seg[..(*take).min(seg.len())].join("/");
        }
    }

    seg[..2.min(seg.len())].join("/")
}

fn is_gopkg_version(elem: &str) -> bool {
    match elem.rsplit_once(".v") {
        Some((pkg, ver)) => {
            !pkg.is_empty() && !ver.is_empty() && ver.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
