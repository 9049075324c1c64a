//! Pull (title, url) pairs out of pasted `<ul>/<ol>` link lists.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use thiserror::Error;

use crate::model::VideoItem;

const UNTITLED: &str = "Untitled Video";

/// html5ever's tokenizer reports input that ends inside a tag, attribute,
/// comment or doctype with this message.
const TRUNCATED: &str = "Unexpected EOF";

static LIST_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li a").expect("constant selector parses"));

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnchorError {
    #[error("markup could not be parsed: {0}")]
    Markup(String),
}

/// Every anchor nested in a list item, in document order.
///
/// Recoverable markup errors (stray end tags, unclosed elements, a full
/// document pasted as a fragment) are tolerated the way a browser tolerates
/// them. A fragment cut off mid-tag fails as a whole. A fragment with no list
/// links yields an empty list.
pub fn parse(fragment: &str) -> Result<Vec<VideoItem>, AnchorError> {
    let document = Html::parse_fragment(fragment);
    if let Some(error) = document.errors.iter().find(|e| e.as_ref() == TRUNCATED) {
        return Err(AnchorError::Markup(error.to_string()));
    }
    if !document.errors.is_empty() {
        tracing::debug!(errors = document.errors.len(), "recovered from markup errors");
    }

    let items = document
        .select(&LIST_LINKS)
        .map(|link| {
            let text: String = link.text().collect();
            VideoItem {
                title: if text.is_empty() {
                    UNTITLED.to_string()
                } else {
                    text
                },
                url: link.value().attr("href").unwrap_or_default().to_string(),
            }
        })
        .collect();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str) -> VideoItem {
        VideoItem {
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn extracts_titles_and_defaults_empty_ones() {
        let fragment = r#"<ul><li><a href="http://x/1">One</a></li><li><a href="http://x/2"></a></li></ul>"#;
        assert_eq!(
            parse(fragment).unwrap(),
            vec![item("One", "http://x/1"), item("Untitled Video", "http://x/2")]
        );
    }

    #[test]
    fn missing_href_gives_empty_url() {
        let items = parse("<ol><li><a>No link</a></li></ol>").unwrap();
        assert_eq!(items, vec![item("No link", "")]);
    }

    #[test]
    fn only_links_inside_list_items_are_selected() {
        let fragment = concat!(
            r#"<p><a href="/skip">outside</a></p>"#,
            r#"<ul><li><span><a href="/a">Nested <b>bold</b></a></span></li></ul>"#,
            r#"<ol><li><a href="/b">Second list</a></li></ol>"#,
        );
        assert_eq!(
            parse(fragment).unwrap(),
            vec![item("Nested bold", "/a"), item("Second list", "/b")]
        );
    }

    #[test]
    fn no_matches_is_not_an_error() {
        assert!(parse("just some text").unwrap().is_empty());
        assert!(parse("").unwrap().is_empty());
        assert!(parse(r#"<a href="/x">loose</a>"#).unwrap().is_empty());
    }

    #[test]
    fn truncated_markup_is_rejected_without_partial_results() {
        let fragment = r#"<ul><li><a href="http://x/1">One</a></li></ul><a href="http://x/2"#;
        assert!(matches!(parse(fragment), Err(AnchorError::Markup(_))));
    }

    #[test]
    fn unterminated_comment_is_rejected() {
        let fragment = r#"<ul><li><a href="/a">A</a></li></ul><!-- notes"#;
        assert!(matches!(parse(fragment), Err(AnchorError::Markup(_))));
    }

    #[test]
    fn recoverable_markup_still_yields_links() {
        let one = vec![item("A", "/a")];
        let cases = [
            r#"<html><body><ul><li><a href="/a">A</a></li></ul></body></html>"#,
            r#"<!DOCTYPE html><ul><li><a href="/a">A</a></li></ul>"#,
            r#"<ul><li><a href="/a">A</a></li></ul></div>"#,
            r#"<ul><li><a href="/a">A</li></ul>"#,
            r#"<ul><li><a href="/a" href="/b">A</a></li></ul>"#,
            r#"<ul><li><a href="/a">A"#,
        ];
        for fragment in cases {
            assert_eq!(parse(fragment).unwrap(), one, "fragment: {fragment}");
        }
    }

    #[test]
    fn unterminated_character_reference_is_decoded() {
        let items = parse(r#"<ul><li><a href="/a">Tom &nbsp Jerry</a></li></ul>"#).unwrap();
        assert_eq!(items, vec![item("Tom \u{a0} Jerry", "/a")]);
    }
}
