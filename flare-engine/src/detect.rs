//! Query-type detectors. Each returns the synthesized result when the query
//! is of its kind.

use std::sync::LazyLock;

use flare_plugin::{SearchResult, kind};
use regex::Regex;

use crate::calc;

pub const CALCULATOR_SCORE: f64 = 1000.0;
pub const URL_SCORE: f64 = 900.0;
pub const WEB_SHORTCUT_SCORE: f64 = 850.0;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://|www\.|[a-z0-9-]+\.(com|org|net|io|dev|co))")
        .expect("URL pattern is valid")
});

/// `(prefix, engine name, URL the search term is appended to)`
pub const WEB_SHORTCUTS: &[(&str, &str, &str)] = &[
    ("g ", "Google", "https://www.google.com/search?q="),
    ("yt ", "YouTube", "https://www.youtube.com/results?search_query="),
    ("ddg ", "DuckDuckGo", "https://duckduckgo.com/?q="),
    ("gh ", "GitHub", "https://github.com/search?q="),
    ("so ", "Stack Overflow", "https://stackoverflow.com/search?q="),
    ("wiki ", "Wikipedia", "https://en.wikipedia.org/wiki/Special:Search?search="),
];

pub fn calculator(query: &str) -> Option<SearchResult> {
    if !calc::is_calculator_query(query) {
        return None;
    }
    let expr = query.trim();
    match calc::evaluate(expr) {
        Ok(value) => {
            let value = calc::format_number(value);
            Some(
                SearchResult::new(kind::CALCULATOR, format!("{expr} = {value}"), value)
                    .with_subtitle("Calculator")
                    .with_icon("accessories-calculator")
                    .with_score(CALCULATOR_SCORE),
            )
        }
        Err(e) => {
            tracing::trace!(query = expr, error = %e, "not a calculator expression");
            None
        }
    }
}

pub fn is_url(query: &str) -> bool {
    URL_RE.is_match(query.trim())
}

pub fn url(query: &str) -> Option<SearchResult> {
    if !is_url(query) {
        return None;
    }
    let query = query.trim();
    let url = if query.starts_with("http://") || query.starts_with("https://") {
        query.to_string()
    } else {
        format!("https://{query}")
    };
    Some(
        SearchResult::new(kind::URL, url.clone(), url)
            .with_subtitle("Open in browser")
            .with_icon("web-browser")
            .with_score(URL_SCORE),
    )
}

/// Matches the query against a shortcut table; the first matching prefix wins.
pub fn web_shortcut_in(
    shortcuts: &[(&str, &str, &str)],
    query: &str,
    score: f64,
) -> Option<SearchResult> {
    shortcuts.iter().find_map(|&(prefix, engine, base)| {
        let head = query.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let term = query[prefix.len()..].trim();
        if term.is_empty() {
            return None;
        }
        Some(
            SearchResult::new(kind::WEB, format!("Search {engine} for '{term}'"), format!("{base}{}", term.replace(' ', "+")))
                .with_subtitle(engine)
                .with_icon("web-browser")
                .with_score(score),
        )
    })
}

pub fn web_shortcut(query: &str) -> Option<SearchResult> {
    web_shortcut_in(WEB_SHORTCUTS, query.trim(), WEB_SHORTCUT_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculator_result_carries_value() {
        let result = calculator("2+2*10").unwrap();
        assert_eq!(result.kind, kind::CALCULATOR);
        assert_eq!(result.action, "22");
        assert_eq!(result.name, "2+2*10 = 22");
        assert_eq!(result.score, CALCULATOR_SCORE);
    }

    #[test]
    fn calculator_declines_bad_expressions() {
        assert!(calculator("2+").is_none());
        assert!(calculator("1/0").is_none());
        assert!(calculator("2+2 apples").is_none());
    }

    #[test]
    fn recognizes_urls() {
        assert!(is_url("https://example.org/a"));
        assert!(is_url("WWW.rust-lang.org"));
        assert!(is_url("github.com"));
        assert!(is_url("crates.io"));
        assert!(!is_url("firefox"));
        assert!(!is_url("notes.txt"));
    }

    #[test]
    fn prefixes_scheme_when_missing() {
        assert_eq!(url("github.com").unwrap().action, "https://github.com");
        assert_eq!(url("http://localhost.dev").unwrap().action, "http://localhost.dev");
        assert!(url("terminal").is_none());
    }

    #[test]
    fn expands_web_shortcuts() {
        let result = web_shortcut("g rust ownership").unwrap();
        assert_eq!(result.action, "https://www.google.com/search?q=rust+ownership");
        assert_eq!(result.subtitle, "Google");
        assert_eq!(result.name, "Search Google for 'rust ownership'");

        let result = web_shortcut("YT lofi beats").unwrap();
        assert_eq!(result.action, "https://www.youtube.com/results?search_query=lofi+beats");
    }

    #[test]
    fn shortcut_needs_a_term() {
        assert!(web_shortcut("g ").is_none());
        assert!(web_shortcut("gimp").is_none());
        assert!(web_shortcut("wikipedia").is_none());
    }
}
