//! Subsequence fuzzy matching.

/// Whether every character of `query` occurs in `candidate` in order,
/// ignoring case. An empty query matches everything.
pub fn fuzzy_match(candidate: &str, query: &str) -> bool {
    match_span(candidate, query).is_some()
}

/// Start and length (in characters) of the tightest in-order match
/// beginning at the earliest possible position.
pub fn match_span(candidate: &str, query: &str) -> Option<(usize, usize)> {
    let query: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let Some(&first) = query.first() else {
        return Some((0, 0));
    };
    let haystack: Vec<char> = candidate.chars().flat_map(char::to_lowercase).collect();

    let start = haystack.iter().position(|&c| c == first)?;
    let mut idx = start + 1;
    for &wanted in &query[1..] {
        let offset = haystack[idx..].iter().position(|&c| c == wanted)?;
        idx += offset + 1;
    }
    Some((start, idx - start))
}

/// Keep the items matching `query`, best matches first.
///
/// Earlier and tighter matches rank higher; ties keep input order.
pub fn rank<T, F>(items: impl IntoIterator<Item = T>, query: &str, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut scored: Vec<((usize, usize), T)> = items
        .into_iter()
        .filter_map(|item| match_span(key(&item), query).map(|span| (span, item)))
        .collect();
    scored.sort_by_key(|(span, _)| *span);
    scored.into_iter().map(|(_, item)| item).collect()
}
