//! Community list normalization.

use std::collections::BTreeSet;

use super::types::CommunityId;

/// Parse newline-delimited community names into a normalized set.
///
/// Each line is lowercased, trimmed and stripped of an `r/` prefix.
/// Blank lines are dropped and duplicates collapse.
pub fn normalize(raw: &str) -> BTreeSet<CommunityId> {
    raw.split('\n').filter_map(CommunityId::parse).collect()
}

/// Normalize already-split entries (e.g. a stored JSON array).
pub fn normalize_entries<I, S>(entries: I) -> BTreeSet<CommunityId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| CommunityId::parse(entry.as_ref()))
        .collect()
}

/// Render a set back into the newline-delimited form used by settings forms.
pub fn to_lines(communities: &BTreeSet<CommunityId>) -> String {
    communities
        .iter()
        .map(CommunityId::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}
