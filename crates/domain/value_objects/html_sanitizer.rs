use std::panic::{AssertUnwindSafe, catch_unwind};

use ammonia::{Builder, UrlRelative};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use super::markdown::render_markdown_lite;

pub const CONTENT_UNAVAILABLE_HTML: &str = "<p>Content unavailable.</p>";

const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "strong",
    "em",
    "b",
    "i",
    "u",
    "a",
    "ul",
    "ol",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "img",
    "span",
    "div",
    "table",
    "tr",
    "td",
    "th",
];
const ANCHOR_ATTRIBUTES: &[&str] = &["href", "target", "rel", "title", "class"];
const IMAGE_ATTRIBUTES: &[&str] = &["src", "alt", "title", "width", "height", "class", "style"];
const GENERIC_ATTRIBUTES: &[&str] = &["class", "id", "style"];
const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

const EXTERNAL_LINK_TARGET: &str = "_blank";
const EXTERNAL_LINK_REL: &[&str] = &["noopener", "noreferrer"];

lazy_static! {
    // The sanitizer always serializes attributes double-quoted with `"` escaped,
    // so a quoted value can never contain a bare `"`.
    static ref ANCHOR_OPEN_TAG: Regex =
        Regex::new(r#"<a((?:\s+[^\s"'>/=]+(?:="[^"]*")?)*)\s*>"#).expect("anchor pattern is valid");
    static ref TAG_ATTRIBUTE: Regex =
        Regex::new(r#"([^\s"'>/=]+)(?:="([^"]*)")?"#).expect("attribute pattern is valid");
}

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("html sanitizer aborted: {0}")]
    Aborted(String),
}

/// Filters `fragment` down to the blog allow-list and rewrites external links.
///
/// Never fails: if the sanitizer itself breaks, the fragment is rendered as
/// escaped plain text instead.
pub fn sanitize_html(fragment: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }

    match try_sanitize_html(fragment) {
        Ok(html) => html,
        Err(err) => {
            warn!(error = %err, "html_sanitizer: falling back to escaped text");
            plain_text_fallback(fragment)
        }
    }
}

pub fn try_sanitize_html(fragment: &str) -> Result<String, SanitizeError> {
    let cleaned = catch_unwind(AssertUnwindSafe(|| {
        allow_list_builder().clean(fragment).to_string()
    }))
    .map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        SanitizeError::Aborted(reason)
    })?;

    Ok(rewrite_external_links(&cleaned))
}

/// Renders stored post content (markdown-lite source) into safe HTML.
pub fn render_post_content(raw: &str) -> String {
    if raw.trim().is_empty() {
        return CONTENT_UNAVAILABLE_HTML.to_string();
    }

    match try_sanitize_html(&render_markdown_lite(raw)) {
        Ok(html) => html,
        Err(err) => {
            warn!(error = %err, "html_sanitizer: post content rendered as plain text");
            plain_text_fallback(raw)
        }
    }
}

/// Escaped text in a whitespace-preserving container.
pub fn plain_text_fallback(raw: &str) -> String {
    format!(
        "<div style=\"white-space: pre-line;\">{}</div>",
        ammonia::clean_text(raw)
    )
}

/// Default clean for short form fields (titles, categories, settings values).
pub fn clean_text_field(value: &str) -> String {
    ammonia::clean(value)
}

/// Adds `target="_blank"` and `rel="noopener noreferrer"` to every anchor that
/// points at an absolute http(s) URL. Existing `rel` tokens are kept.
pub fn rewrite_external_links(html: &str) -> String {
    ANCHOR_OPEN_TAG
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let mut attributes: Vec<(String, Option<String>)> = TAG_ATTRIBUTE
                .captures_iter(&caps[1])
                .map(|attr| {
                    (
                        attr[1].to_string(),
                        attr.get(2).map(|value| value.as_str().to_string()),
                    )
                })
                .collect();

            let is_external = attributes.iter().any(|(name, value)| {
                name.eq_ignore_ascii_case("href")
                    && value.as_deref().is_some_and(is_absolute_http_url)
            });

            if is_external {
                set_attribute(&mut attributes, "target", EXTERNAL_LINK_TARGET.to_string());

                let existing_rel = attributes
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case("rel"))
                    .and_then(|(_, value)| value.clone())
                    .unwrap_or_default();
                set_attribute(&mut attributes, "rel", merge_rel_tokens(&existing_rel));
            }

            let mut tag = String::from("<a");
            for (name, value) in &attributes {
                match value {
                    Some(value) => tag.push_str(&format!(" {name}=\"{value}\"")),
                    None => tag.push_str(&format!(" {name}")),
                }
            }
            tag.push('>');
            tag
        })
        .into_owned()
}

fn allow_list_builder() -> Builder<'static> {
    let mut builder = Builder::empty();
    builder
        .add_tags(ALLOWED_TAGS)
        .add_tag_attributes("a", ANCHOR_ATTRIBUTES)
        .add_tag_attributes("img", IMAGE_ATTRIBUTES)
        .add_generic_attributes(GENERIC_ATTRIBUTES)
        .add_url_schemes(URL_SCHEMES)
        .url_relative(UrlRelative::PassThrough)
        .link_rel(None)
        .strip_comments(true);
    builder
}

fn is_absolute_http_url(href: &str) -> bool {
    let lowered = href.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

fn set_attribute(attributes: &mut Vec<(String, Option<String>)>, name: &str, value: String) {
    match attributes
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
    {
        Some((_, slot)) => *slot = Some(value),
        None => attributes.push((name.to_string(), Some(value))),
    }
}

fn merge_rel_tokens(existing: &str) -> String {
    let mut tokens: Vec<&str> = existing.split_whitespace().collect();
    for required in EXTERNAL_LINK_REL {
        if !tokens.iter().any(|token| token.eq_ignore_ascii_case(required)) {
            tokens.push(required);
        }
    }
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disallowed_element_is_stripped_but_text_kept() {
        let html = sanitize_html(r#"<p>before <font color="red">inner <b>bold</b></font> after</p>"#);
        assert_eq!(html, "<p>before inner <b>bold</b> after</p>");
    }

    #[test]
    fn disallowed_attributes_are_dropped() {
        let html = sanitize_html(r#"<p onclick="steal()" class="lead">hi</p>"#);
        assert_eq!(html, r#"<p class="lead">hi</p>"#);

        let html = sanitize_html(r#"<img src="/a.png" onerror="x()" alt="a">"#);
        assert!(html.contains(r#"src="/a.png""#));
        assert!(html.contains(r#"alt="a""#));
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(sanitize_html("<p>a<!-- hidden -->b</p>"), "<p>ab</p>");
    }

    #[test]
    fn javascript_urls_are_removed() {
        let html = sanitize_html(r#"<a href="javascript:alert(1)">x</a>"#);
        assert!(!html.contains("javascript"));
        assert!(html.contains(">x</a>"));
    }

    #[test]
    fn external_link_opens_new_context_with_safe_rel() {
        let html = sanitize_html(r#"<a href="http://x.test">t</a>"#);
        assert_eq!(
            html,
            r#"<a href="http://x.test" target="_blank" rel="noopener noreferrer">t</a>"#
        );
    }

    #[test]
    fn existing_rel_is_merged_not_replaced() {
        let html = sanitize_html(
            r#"<a href="https://x.test" rel="nofollow" target="_self">t</a>"#,
        );
        assert!(html.contains(r#"rel="nofollow noopener noreferrer""#), "{html}");
        assert!(html.contains(r#"target="_blank""#), "{html}");
        assert!(!html.contains("_self"));
    }

    #[test]
    fn relative_links_are_left_alone() {
        let html = sanitize_html(r#"<a href="/plans">plans</a>"#);
        assert_eq!(html, r#"<a href="/plans">plans</a>"#);
    }

    #[test]
    fn rel_tokens_are_not_duplicated() {
        assert_eq!(
            merge_rel_tokens("noopener external"),
            "noopener external noreferrer"
        );
    }

    #[test]
    fn fallback_escapes_markup() {
        let html = plain_text_fallback("<script>x</script>");
        assert!(html.starts_with(r#"<div style="white-space: pre-line;">"#));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(sanitize_html(""), "");
        assert_eq!(render_post_content("   "), CONTENT_UNAVAILABLE_HTML);
    }

    #[test]
    fn post_content_runs_markdown_then_sanitizer() {
        let html = render_post_content(
            "# News\n**Fast** fiber\n<a href=\"https://news.test\">source</a>\n<iframe>gone</iframe>",
        );
        assert!(html.contains("<h1>News</h1>"));
        assert!(html.contains("<strong>Fast</strong> fiber<br>"));
        assert!(html.contains(r#"rel="noopener noreferrer""#));
        assert!(!html.contains("<iframe"));
    }

    #[test]
    fn clean_text_field_escapes_disallowed_markup() {
        let cleaned = clean_text_field("Plano <script>x()</script>");
        assert!(!cleaned.contains("<script"));
        assert!(cleaned.starts_with("Plano"));
    }
}
