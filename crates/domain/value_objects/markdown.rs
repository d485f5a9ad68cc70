use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BOLD: Regex = Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid");
}

const LINE_BREAK: &str = "<br>";

/// Renders the small markdown subset used by blog posts into an HTML fragment.
///
/// Supported per line: blank lines, `- `/`* ` list items, `#`/`##`/`###`
/// headings and `**bold**` spans. The output is NOT sanitized; pass it through
/// [`super::html_sanitizer::sanitize_html`] before embedding it in a page.
pub fn render_markdown_lite(source: &str) -> String {
    if source.is_empty() {
        return String::new();
    }

    let mut output: Vec<String> = Vec::new();
    let mut in_list = false;

    for raw_line in source.split('\n') {
        let line = raw_line.trim_end();

        if line.is_empty() {
            if in_list {
                output.push("</ul>".to_string());
                in_list = false;
            }
            output.push(LINE_BREAK.to_string());
            continue;
        }

        let trimmed = line.trim();

        if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
            if !in_list {
                output.push("<ul>".to_string());
                in_list = true;
            }
            let item = trimmed[2..].trim();
            output.push(format!("<li>{}</li>", apply_bold(item)));
            continue;
        }

        if in_list {
            output.push("</ul>".to_string());
            in_list = false;
        }

        // Longest prefix first so `### ` never falls through to the `# ` rule.
        if let Some(title) = trimmed.strip_prefix("### ") {
            output.push(format!("<h3>{}</h3>", title.trim()));
        } else if let Some(title) = trimmed.strip_prefix("## ") {
            output.push(format!("<h2>{}</h2>", title.trim()));
        } else if let Some(title) = trimmed.strip_prefix("# ") {
            output.push(format!("<h1>{}</h1>", title.trim()));
        } else {
            output.push(format!("{}{}", apply_bold(line), LINE_BREAK));
        }
    }

    if in_list {
        output.push("</ul>".to_string());
    }

    output.join("\n")
}

/// `**text**` -> `<strong>text</strong>`, non-greedy and line-local.
pub fn apply_bold(text: &str) -> String {
    BOLD.replace_all(text, "<strong>$1</strong>").into_owned()
}
