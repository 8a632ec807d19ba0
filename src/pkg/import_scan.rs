use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

static PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*package\s+([\p{L}_][\p{L}\p{N}_]*)").expect("package clause regex")
});

static SINGLE_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[\p{L}_.][\p{L}\p{N}_]*\s+)?["`]([^"`]+)["`]"#)
        .expect("single import regex")
});

static GROUP_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^\s*import\s*\((.*?)\)").expect("import group regex"));

// Imports must precede the first top-level declaration.
static FIRST_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:func|type|var|const)\b").expect("top-level declaration regex")
});

static GROUP_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:[\p{L}_.][\p{L}\p{N}_]*\s+)?["`]([^"`]+)["`]"#).expect("import spec regex")
});

/// What the locator needs from one Go source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHeader {
    pub package: Option<String>,
    pub imports: BTreeSet<String>,
    /// The file carries an `ignore` build constraint and is never built.
    pub ignored: bool,
}

pub fn scan_header_in_text(src: &str) -> SourceHeader {
    let ignored = has_ignore_constraint(src);
    let code = strip_comments(src);

    let package = PACKAGE_RE
        .captures(&code)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let header = match FIRST_DECL_RE.find(&code) {
        Some(m) => &code[..m.start()],
        None => code.as_str(),
    };

    let mut imports = BTreeSet::new();
    for c in SINGLE_IMPORT_RE.captures_iter(header) {
        if let Some(m) = c.get(1) {
            imports.insert(m.as_str().to_string());
        }
    }
    for group in GROUP_IMPORT_RE.captures_iter(header) {
        let Some(body) = group.get(1) else {
            continue;
        };
        for c in GROUP_SPEC_RE.captures_iter(body.as_str()) {
            if let Some(m) = c.get(1) {
                imports.insert(m.as_str().to_string());
            }
        }
    }

    SourceHeader {
        package,
        imports,
        ignored,
    }
}

pub fn scan_header_in_file(p: &Path) -> io::Result<SourceHeader> {
    let s = fs::read_to_string(p)?;
    Ok(scan_header_in_text(&s))
}

// Constraints live in line comments before the package clause.
fn has_ignore_constraint(src: &str) -> bool {
    for line in src.lines() {
        let line = line.trim();
        if line.starts_with("package ") {
            break;
        }
        let expr = if let Some(rest) = line.strip_prefix("//go:build") {
            rest
        } else if let Some(rest) = line.strip_prefix("// +build") {
            rest
        } else {
            continue;
        };
        let mut fields = expr.split_whitespace();
        if fields.next() == Some("ignore") && fields.next().is_none() {
            return true;
        }
    }
    false
}

/// Blanks out comments while keeping string and rune literals intact, so that a
/// commented-out import never counts.
fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for n in chars.by_ref() {
                    if n == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if n == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            '"' | '\'' => {
                out.push(c);
                let mut escaped = false;
                for n in chars.by_ref() {
                    out.push(n);
                    if n == '\n' {
                        break;
                    }
                    if escaped {
                        escaped = false;
                    } else if n == '\\' {
                        escaped = true;
                    } else if n == c {
                        break;
                    }
                }
            }
            '`' => {
                out.push(c);
                for n in chars.by_ref() {
                    out.push(n);
                    if n == '`' {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}
