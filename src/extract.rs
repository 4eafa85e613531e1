//! Pulls generated code out of a model reply.
//!
//! Only the first fenced block is honoured; anything after its closing fence,
//! including further blocks, is dropped.

const FENCE: &str = "```";

/// Return the trimmed interior of the first fenced block in `raw`, or `raw`
/// trimmed when it has no complete fenced block.
pub fn extract_code(raw: &str) -> String {
    fenced_interior(raw).unwrap_or(raw).trim().to_string()
}

fn fenced_interior(raw: &str) -> Option<&str> {
    let start = raw.find(FENCE)? + FENCE.len();
    let after_open = &raw[start..];

    // Optional language hint, e.g. ```html
    let tag_len = after_open
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];
    let body = body.strip_prefix('\n').unwrap_or(body);

    let end = body.find(FENCE)?;
    Some(&body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_fence() {
        assert_eq!(extract_code("```html\n<div>x</div>\n```"), "<div>x</div>");
    }

    #[test]
    fn test_untagged_fence() {
        assert_eq!(extract_code("```\n<p>hi</p>\n```"), "<p>hi</p>");
    }

    #[test]
    fn test_unfenced_input_returned_trimmed() {
        assert_eq!(extract_code("<div>x</div>"), "<div>x</div>");
        assert_eq!(extract_code("  \n<div>x</div>\n\n"), "<div>x</div>");
    }

    #[test]
    fn test_idempotent_on_unfenced_input() {
        let inputs = ["<div>x</div>", "  plain text  ", "", "<html>\n  <body></body>\n</html>\n"];
        for input in inputs {
            let once = extract_code(input);
            assert_eq!(extract_code(&once), once);
        }
    }

    #[test]
    fn test_surrounding_prose_is_dropped() {
        let raw = "Here is your component:\n\n```html\n<button>Go</button>\n```\n\nEnjoy!";
        assert_eq!(extract_code(raw), "<button>Go</button>");
    }

    #[test]
    fn test_only_first_block_is_honoured() {
        let raw = "```html\n<div>first</div>\n```\ntext\n```css\n.second {}\n```";
        assert_eq!(extract_code(raw), "<div>first</div>");
    }

    #[test]
    fn test_unclosed_fence_falls_back_to_whole_input() {
        let raw = "```html\n<div>cut off";
        assert_eq!(extract_code(raw), raw);
    }

    #[test]
    fn test_fence_without_newline_after_tag() {
        assert_eq!(extract_code("```<div>inline</div>```"), "<div>inline</div>");
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(extract_code("```html\r\n<div>x</div>\r\n```"), "<div>x</div>");
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(extract_code("```html\n```"), "");
    }

    #[test]
    fn test_interior_indentation_preserved() {
        let raw = "```html\n<ul>\n  <li>a</li>\n</ul>\n```";
        assert_eq!(extract_code(raw), "<ul>\n  <li>a</li>\n</ul>");
    }
}
