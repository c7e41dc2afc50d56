//! Maps configuration entity names to data sheet names.

/// Domain word appended to portfolio sheet names ("combination").
pub const PORTFOLIO_SUFFIX: &str = "组合";

/// Picks the data sheet for `entity` among `candidates`.
///
/// Rules, first success wins:
/// 1. exact name;
/// 2. `entity` + [`PORTFOLIO_SUFFIX`];
/// 3. candidate with the suffix removed equals `entity`;
/// 4. longest candidate that contains `entity`, or whose suffix-stripped
///    form is contained in `entity`. Equal lengths keep candidate order.
///
/// Rule 4 can still pick an unintended sheet when several candidates share a
/// stem; length is the only tie-break.
pub fn match_sheet_name<'a>(entity: &str, candidates: &'a [String]) -> Option<&'a str> {
    let entity = entity.trim();
    if entity.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().find(|c| c.as_str() == entity) {
        return Some(exact);
    }

    let suffixed = format!("{entity}{PORTFOLIO_SUFFIX}");
    if let Some(found) = candidates.iter().find(|c| **c == suffixed) {
        return Some(found);
    }

    if let Some(found) = candidates.iter().find(|c| strip_suffix(c) == entity) {
        return Some(found);
    }

    let mut substring: Vec<&String> = candidates
        .iter()
        .filter(|c| {
            let stripped = strip_suffix(c);
            c.contains(entity) || (!stripped.is_empty() && entity.contains(stripped.as_str()))
        })
        .collect();
    // Stable sort: the earliest of equally long candidates stays first.
    substring.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    substring.first().map(|s| s.as_str())
}

fn strip_suffix(name: &str) -> String {
    name.replace(PORTFOLIO_SUFFIX, "")
}
