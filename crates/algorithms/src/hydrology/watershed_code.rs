//! Hierarchical watershed codes
//!
//! A watershed code is a dash-delimited list of groups, e.g.
//! `100-190442-244975-000000`. Each group narrows the position within the
//! drainage network, so a code's dash-prefixes are its downstream ancestors
//! and longer codes sit further upstream. Trailing `000000` groups are
//! padding meaning "no sub-reach" and are stripped before any comparison.
//!
//! Comparisons are group-wise: `100-2` is not a prefix of `100-20`.
//! Blank or malformed codes (an empty group anywhere) compare as unrelated
//! to everything.

/// Placeholder group meaning "no sub-reach"
pub const EMPTY_GROUP: &str = "000000";

const SEPARATOR: char = '-';

/// Strip trailing `-000000` placeholder groups and surrounding whitespace.
///
/// ```
/// use confluence_algorithms::hydrology::normalize;
/// assert_eq!(normalize("100-190442-000000-000000"), "100-190442");
/// assert_eq!(normalize("100-190442"), "100-190442");
/// ```
pub fn normalize(code: &str) -> &str {
    let mut code = code.trim();
    while let Some(rest) = code.strip_suffix(EMPTY_GROUP) {
        match rest.strip_suffix(SEPARATOR) {
            Some(parent) => code = parent,
            None => break,
        }
    }
    code
}

/// Split a code into its groups. A blank code has no groups.
pub fn segments(code: &str) -> Vec<&str> {
    let code = code.trim();
    if code.is_empty() {
        return Vec::new();
    }
    code.split(SEPARATOR).collect()
}

/// Every ancestor code from the root group down to the normalized code itself.
///
/// `"100-200-300"` gives `["100", "100-200", "100-200-300"]`.
pub fn ancestor_chain(code: &str) -> Vec<String> {
    let groups = segments(normalize(code));
    let mut chain: Vec<String> = Vec::with_capacity(groups.len());
    for group in groups {
        let next = match chain.last() {
            Some(parent) => format!("{}{}{}", parent, SEPARATOR, group),
            None => group.to_string(),
        };
        chain.push(next);
    }
    chain
}

/// Number of groups in the normalized code, or 0 if the code is malformed.
pub fn depth(code: &str) -> usize {
    groups(code).map_or(0, |g| g.len())
}

/// True iff `candidate` lies strictly upstream of `selected`: the selected
/// code is a proper group-wise prefix of the candidate.
pub fn is_upstream_of(candidate: &str, selected: &str) -> bool {
    match (groups(candidate), groups(selected)) {
        (Some(c), Some(s)) => c.len() > s.len() && c.starts_with(&s),
        _ => false,
    }
}

/// True iff `candidate` lies strictly downstream of `selected`: the candidate
/// code is a proper group-wise prefix (an ancestor) of the selected code.
pub fn is_downstream_of(candidate: &str, selected: &str) -> bool {
    match (groups(candidate), groups(selected)) {
        (Some(c), Some(s)) => c.len() < s.len() && s.starts_with(&c),
        _ => false,
    }
}

/// True iff both codes normalize to the same well-formed code.
pub fn same_reach(a: &str, b: &str) -> bool {
    match (groups(a), groups(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Normalized groups of a well-formed code
fn groups(code: &str) -> Option<Vec<&str>> {
    let groups = segments(normalize(code));
    if groups.is_empty() || groups.iter().any(|g| g.is_empty()) {
        None
    } else {
        Some(groups)
    }
}
