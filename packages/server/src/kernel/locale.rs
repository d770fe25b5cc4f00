//! Pick an installed language from an `Accept-Language` header.

/// Returns the installed locale that best matches the header, if any.
///
/// Exact tag matches (case-insensitive) win; otherwise the first installed
/// locale sharing the primary subtag (`de` for `de-AT`) is used. Tags are
/// visited in descending `q` order, ties keep header order.
pub fn auto_detect_language(accept_language: &str, installed: &[String]) -> Option<String> {
    let mut tags: Vec<(String, f32)> = accept_language
        .split(',')
        .filter_map(parse_entry)
        .filter(|(tag, q)| *q > 0.0 && tag != "*")
        .collect();

    // sort_by is stable
    tags.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (tag, _) in &tags {
        if let Some(exact) = installed.iter().find(|l| l.eq_ignore_ascii_case(tag)) {
            return Some(exact.clone());
        }

        let primary = primary_subtag(tag);
        if let Some(partial) = installed
            .iter()
            .find(|l| primary_subtag(l).eq_ignore_ascii_case(primary))
        {
            return Some(partial.clone());
        }
    }

    None
}

fn parse_entry(entry: &str) -> Option<(String, f32)> {
    let mut parts = entry.split(';');
    let tag = parts.next()?.trim();
    if tag.is_empty() {
        return None;
    }

    let mut q = 1.0;
    for param in parts {
        if let Some(value) = param.trim().strip_prefix("q=") {
            q = value.trim().parse().ok()?;
        }
    }

    Some((tag.replace('_', "-"), q))
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(|c: char| c == '-' || c == '_').next().unwrap_or(tag)
}
