//! Minimal HTML handling for result emails: tables, tag stripping, entities.
//!
//! Vendor mails use simple table markup, so regex scanning is enough; no DOM
//! is built.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:html|body|table|tr|td|th|div|p|br|span|font|b|strong)\b[^>]*>").unwrap()
});
static NON_CONTENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(style|script|head|title)\b[^>]*>.*?</(?:style|script|head|title)\s*>|<!--.*?-->")
        .unwrap()
});
static BLOCK_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|tr|td|th|li|h[1-6]|table|thead|tbody)\s*>").unwrap()
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").unwrap());
static CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<t[dh]\b[^>]*>(.*?)</t[dh]\s*>").unwrap());
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Whether the text contains common HTML element tags.
pub fn looks_like_html(text: &str) -> bool {
    HTML_TAG_RE.is_match(text)
}

/// Decode the named and numeric entities seen in result mails.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "nbsp" => Some(' '),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Text content of an HTML fragment, whitespace collapsed.
pub fn strip_tags(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, " ");
    let text = decode_entities(&text);
    SPACES_RE.replace_all(&text, " ").trim().to_string()
}

/// Render an HTML document as non-empty text lines, one per block or cell.
pub fn html_to_lines(html: &str) -> Vec<String> {
    let text = NON_CONTENT_RE.replace_all(html, "");
    let text = BLOCK_BREAK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = decode_entities(&text);
    text.lines()
        .map(|line| SPACES_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Cell texts of every `<tr>` in the fragment.
pub fn table_rows(html: &str) -> Vec<Vec<String>> {
    ROW_RE
        .captures_iter(html)
        .map(|row| {
            CELL_RE
                .captures_iter(&row[1])
                .map(|cell| strip_tags(&cell[1]))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<table><tr><td>1</td></tr></table>"));
        assert!(looks_like_html("<P class=x>hi</P>"));
        assert!(!looks_like_html("Lap 1 < 2 laps > 0"));
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a&nbsp;&amp;&nbsp;b"), "a & b");
        assert_eq!(decode_entities("Sesi&#243;n &#x31;7"), "Sesión 17");
        assert_eq!(decode_entities("&bogus; &#xZZ;"), "&bogus; &#xZZ;");
    }

    #[test]
    fn test_table_rows() {
        let html = r#"<table>
            <tr><th>Pos</th><th>Naam</th><th>Beste</th></tr>
            <tr><td>1</td><td><b>Max&nbsp;van Lierop</b></td><td> 34.512 </td></tr>
            <tr></tr>
        </table>"#;
        let rows = table_rows(html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Pos", "Naam", "Beste"]);
        assert_eq!(rows[1], vec!["1", "Max van Lierop", "34.512"]);
    }

    #[test]
    fn test_html_to_lines() {
        let html = "<html><head><title>Lot66</title><style>td { color: red }</style></head>\
                    <body><p>Max van Lierop</p><table><tr><td>1</td><td>Lap 1</td>\
                    <td>00:35.560</td></tr></table><!-- footer --></body></html>";
        assert_eq!(
            html_to_lines(html),
            vec!["Max van Lierop", "1", "Lap 1", "00:35.560"]
        );
    }
}
