use serde::{Deserialize, Serialize};

use crate::guess::Guess;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub package: String,
    #[serde(default)]
    pub import: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub package: String,
}

impl Manifest {
    pub fn from_guess(guess: &Guess) -> Self {
        let mut m = Self {
            package: guess.name.clone(),
            import: guess
                .dependencies
                .iter()
                .map(|d| Dependency { package: d.clone() })
                .collect(),
        };
        m.sort_deterministic();
        m
    }

    pub fn to_pretty_toml(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("package = {}\n", toml_str(&self.package)));

        if !self.import.is_empty() {
            out.push('\n');
            for d in &self.import {
                out.push_str("[[import]]\n");
                out.push_str(&format!("package = {}\n\n", toml_str(&d.package)));
            }
        }

        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        let mut s = serde_json::to_string_pretty(self)?;
        s.push('\n');
        Ok(s)
    }

    pub fn sort_deterministic(&mut self) {
        self.import.sort_by(|a, b| a.package.cmp(&b.package));
        self.import.dedup();
    }
}

// Rust's Debug escaping is not TOML; let the toml encoder quote.
fn toml_str(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guess::Strategy;

    fn guess(deps: &[&str]) -> Guess {
        Guess {
            name: "github.com/me/proj".to_string(),
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
            strategy: Strategy::ImportGraph,
            skipped: vec![],
        }
    }

    #[test]
    fn toml_lists_imports_sorted_and_parses_back() {
        let m = Manifest::from_guess(&guess(&["gopkg.in/yaml.v2", "github.com/x/y"]));
        let text = m.to_pretty_toml();
        assert!(text.starts_with("package = \"github.com/me/proj\"\n"));
        let first = text.find("github.com/x/y").expect("x/y listed");
        let second = text.find("gopkg.in/yaml.v2").expect("yaml listed");
        assert!(first < second);
        assert_eq!(toml::from_str::<Manifest>(&text).expect("parse"), m);
    }

    #[test]
    fn names_needing_escapes_stay_valid_toml() {
        let mut g = guess(&["example.org/caf\u{e9}", "example.org/q\"uote"]);
        g.name = "C:\\work\\proj".to_string();
        let m = Manifest::from_guess(&g);
        let parsed: Manifest = toml::from_str(&m.to_pretty_toml()).expect("valid toml");
        assert_eq!(parsed, m);
    }

    #[test]
    fn empty_dependency_set_renders_only_the_name() {
        let m = Manifest::from_guess(&guess(&[]));
        assert_eq!(m.to_pretty_toml(), "package = \"github.com/me/proj\"\n");
        let json: serde_json::Value =
            serde_json::from_str(&m.to_json().expect("json")).expect("valid json");
        assert_eq!(json["import"], serde_json::json!([]));
    }
}
