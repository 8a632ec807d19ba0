use std::collections::BTreeSet;

use crate::pkg::normalize::NameNormalizer;

/// Registers only top level packages: importing `github.com/Masterminds/cookoo`
/// and `github.com/Masterminds/cookoo/io` yields one reference.
pub fn compact(found: &BTreeSet<String>, normalizer: &NameNormalizer) -> BTreeSet<String> {
    found.iter().map(|name| normalizer.root(name)).collect()
}
