//! HTML to plain-text conversion for the text part of outgoing emails

use serde::Deserialize;

/// Converts a rendered HTML body to its plain-text alternative
pub trait TextConverter: Send + Sync {
    fn to_plain_text(&self, html: &str) -> String;
}

/// Options for [`HtmlToText`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TextOptions {
    /// Wrap lines at this many columns
    #[serde(default)]
    pub wordwrap: Option<usize>,
}

/// Tag-stripping converter.
///
/// Block-level tags and `<br>` become line breaks, `<script>`, `<style>`,
/// `<head>` and `<title>` content is dropped along with comments, common
/// entities are decoded and runs of whitespace collapse to a single space.
#[derive(Debug, Clone, Default)]
pub struct HtmlToText {
    options: TextOptions,
}

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "title"];

impl HtmlToText {
    pub fn new(options: TextOptions) -> Self {
        Self { options }
    }
}

impl TextConverter for HtmlToText {
    fn to_plain_text(&self, html: &str) -> String {
        let lines = collapse_lines(&strip_tags(html));

        match self.options.wordwrap {
            Some(width) if width > 0 => lines
                .iter()
                .map(|line| wrap_line(line, width))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => lines.join("\n"),
        }
    }
}

fn strip_tags(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut skipping: Option<String> = None;
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        if skipping.is_none() {
            push_text(&mut output, &rest[..open]);
        }

        if let Some(comment) = rest[open..].strip_prefix("<!--") {
            // Comments may contain '>' and end only at "-->"
            rest = comment
                .find("-->")
                .map(|end| &comment[end + 3..])
                .unwrap_or("");
            continue;
        }

        let Some(close) = rest[open..].find('>') else {
            // Stray '<' with no closing bracket is text
            if skipping.is_none() {
                push_text(&mut output, &rest[open..]);
            }
            rest = "";
            break;
        };

        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let closing = tag.starts_with('/');
        let name = tag_name(tag);

        if let Some(skipped) = &skipping {
            if closing && name == *skipped {
                skipping = None;
            }
            continue;
        }

        if !closing && !tag.ends_with('/') && SKIPPED_TAGS.contains(&name.as_str()) {
            skipping = Some(name);
            continue;
        }

        if BLOCK_TAGS.contains(&name.as_str()) {
            output.push('\n');
        }
    }

    if skipping.is_none() {
        push_text(&mut output, rest);
    }

    output
}

fn push_text(output: &mut String, text: &str) {
    // Source line breaks are layout, not content
    output.push_str(&decode_entities(text).replace(['\n', '\r', '\t'], " "));
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn decode_entities(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                output.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                output.push('&');
                rest = &tail[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| name.strip_prefix('#').map(|dec| dec.parse::<u32>()))?
                .ok()?;
            char::from_u32(code)
        }
    }
}

fn collapse_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for raw in text.split('\n') {
        let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        // At most one blank line in a row, none at the start
        if line.is_empty() && lines.last().map_or(true, |last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }

    lines
}

fn wrap_line(line: &str, width: usize) -> String {
    let mut wrapped = String::with_capacity(line.len());
    let mut column = 0;

    for word in line.split(' ') {
        let len = word.chars().count();
        if column > 0 && column + 1 + len > width {
            wrapped.push('\n');
            column = 0;
        } else if column > 0 {
            wrapped.push(' ');
            column += 1;
        }
        wrapped.push_str(word);
        column += len;
    }

    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        HtmlToText::default().to_plain_text(html)
    }

    #[test]
    fn test_strips_simple_markup() {
        assert_eq!(convert("<p>Ada</p>"), "Ada");
        assert_eq!(convert("<p>Hello <strong>World</strong></p>"), "Hello World");
    }

    #[test]
    fn test_block_tags_become_lines() {
        assert_eq!(convert("<p>one</p><p>two</p>"), "one\n\ntwo");
        assert_eq!(convert("first<br>second<br/>third"), "first\nsecond\nthird");
        assert_eq!(convert("<ul><li>a</li><li>b</li></ul>"), "a\n\nb");
    }

    #[test]
    fn test_source_whitespace_collapses() {
        let html = "<div>\n    Hello\n    there,   friend\n</div>";
        assert_eq!(convert(html), "Hello there, friend");
    }

    #[test]
    fn test_script_and_style_are_dropped() {
        let html = "<head><title>T</title><style>p { color: red; }</style></head>\
                    <body><script>alert('x')</script><p>Visible</p></body>";
        assert_eq!(convert(html), "Visible");
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(convert("<p>a</p><!-- a > b --><p>c</p>"), "a\n\nc");
        assert_eq!(convert("<!DOCTYPE html><p>kept</p><!-- never closed > x"), "kept");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(
            convert("<p>Fish &amp; Chips &lt;3 &quot;ok&quot; &#39;yes&#39; &#x41;</p>"),
            "Fish & Chips <3 \"ok\" 'yes' A"
        );
        assert_eq!(convert("AT&T and &unknown; stay"), "AT&T and &unknown; stay");
    }

    #[test]
    fn test_decoded_brackets_are_not_tags() {
        assert_eq!(convert("&lt;p&gt;literal&lt;/p&gt;"), "<p>literal</p>");
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(convert("no markup here"), "no markup here");
        assert_eq!(convert(""), "");
        assert_eq!(convert("2 < 3"), "2 < 3");
    }

    #[test]
    fn test_wordwrap() {
        let converter = HtmlToText::new(TextOptions { wordwrap: Some(10) });
        assert_eq!(
            converter.to_plain_text("<p>the quick brown fox jumps</p>"),
            "the quick\nbrown fox\njumps"
        );
    }
}
