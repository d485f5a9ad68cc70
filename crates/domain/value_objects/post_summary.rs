use lazy_static::lazy_static;
use regex::Regex;

pub const SUMMARY_MAX_CHARS: usize = 150;
const ELLIPSIS: &str = "...";

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").expect("tag pattern is valid");
    static ref BOLD_SPAN: Regex = Regex::new(r"\*\*.*?\*\*").expect("bold span pattern is valid");
}

/// Derives the listing summary of a post from its raw content.
///
/// Tags and whole `**bold**` spans are removed, then the text is cut at
/// [`SUMMARY_MAX_CHARS`] characters with a trailing ellipsis. The caller is
/// expected to text-clean the result before storing it.
pub fn derive_summary(raw_content: &str) -> String {
    let without_tags = HTML_TAG.replace_all(raw_content.trim(), "");
    let cleaned = BOLD_SPAN.replace_all(&without_tags, "");

    if cleaned.chars().count() > SUMMARY_MAX_CHARS {
        let mut summary: String = cleaned.chars().take(SUMMARY_MAX_CHARS).collect();
        summary.push_str(ELLIPSIS);
        summary
    } else {
        cleaned.into_owned()
    }
}
