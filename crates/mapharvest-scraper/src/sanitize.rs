//! Reduction of scraped text to single-spaced printable ASCII.

/// Returns `raw` with every character outside `0x20..=0x7E` removed, runs of
/// whitespace collapsed to one space, and leading/trailing whitespace trimmed.
///
/// `None` and the empty string both yield `""`. The function is idempotent.
#[must_use]
pub fn sanitize(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.chars().filter(|c| (' '..='~').contains(c)) {
        if ch == ' ' {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }

    out
}
