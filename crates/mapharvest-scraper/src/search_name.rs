//! Derives a filename-safe name for a harvest from the results page's
//! `Results for <query>` label.

use std::sync::LazyLock;

use regex::Regex;

use crate::page::PageCapability;

/// Used when the page has no usable results label.
pub const DEFAULT_SEARCH_NAME: &str = "google-maps-data";

static RESULTS_FOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Results for (.+)").expect("valid results label regex"));
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s-]").expect("valid disallowed-chars regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Turns an `aria-label` such as `Results for Dentists in Dubai` into
/// `dentists-in-dubai`.
///
/// Returns `None` when the label does not match or nothing survives the
/// character filter.
#[must_use]
pub fn slugify_search_label(label: &str) -> Option<String> {
    let query = RESULTS_FOR_RE.captures(label)?.get(1)?.as_str();
    let kept = DISALLOWED_RE.replace_all(query, "");
    let slug = WHITESPACE_RE
        .replace_all(kept.trim(), "-")
        .to_lowercase();
    (!slug.is_empty()).then_some(slug)
}

/// Reads the results label from the page and slugifies it, falling back to
/// [`DEFAULT_SEARCH_NAME`]. Never fails.
pub async fn detect_search_name<P>(page: &P, selector: &str) -> String
where
    P: PageCapability + ?Sized,
{
    let label = match page.query_all(selector, &["aria-label"]).await {
        Ok(elements) => elements
            .into_iter()
            .find_map(|el| el.attribute("aria-label").map(str::to_owned)),
        Err(err) => {
            tracing::warn!(error = %err, "could not read search label; using default name");
            None
        }
    };

    label
        .as_deref()
        .and_then(slugify_search_label)
        .unwrap_or_else(|| DEFAULT_SEARCH_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Selectors;
    use crate::testing::ScriptedPage;

    #[test]
    fn slugifies_query() {
        assert_eq!(
            slugify_search_label("Results for Dentists in Dubai").as_deref(),
            Some("dentists-in-dubai")
        );
    }

    #[test]
    fn strips_punctuation_and_keeps_hyphens() {
        assert_eq!(
            slugify_search_label("Results for Café & Bar, Al-Barsha!").as_deref(),
            Some("caf-bar-al-barsha")
        );
    }

    #[test]
    fn unmatched_or_empty_label_is_none() {
        assert_eq!(slugify_search_label("Map results"), None);
        assert_eq!(slugify_search_label("Results for ★★★"), None);
    }

    #[tokio::test]
    async fn detects_name_from_page_label() {
        let page = ScriptedPage::with_businesses(1).with_search_label("Results for Pizza Berlin");
        let name = detect_search_name(&page, &Selectors::default().search_label).await;
        assert_eq!(name, "pizza-berlin");
    }

    #[tokio::test]
    async fn falls_back_to_default_without_label() {
        let page = ScriptedPage::with_businesses(1);
        let name = detect_search_name(&page, &Selectors::default().search_label).await;
        assert_eq!(name, DEFAULT_SEARCH_NAME);
    }
}
