/// One logical line of a document together with its byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Closed set of tags a line of inline-transformed text can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    ListItem,
    PreformedBlock,
    PlainText,
    Blank,
}

const LIST_MARKERS: [&str; 2] = ["- ", "* "];

const BLOCK_TAGS: [&str; 13] = [
    "div",
    "ul",
    "ol",
    "li",
    "p",
    "figure",
    "img",
    "blockquote",
    "table",
    "pre",
    "hr",
    "section",
    "br",
];

/// Splits `content` into lines, stripping `\n` and `\r\n` terminators.
///
/// The spans cover the source without gaps, so slicing the original text by
/// `start..end` of every record reproduces it byte for byte.
pub fn split_lines(content: &str) -> Vec<LineRecord> {
    let mut lines = Vec::new();
    let mut offset = 0usize;

    for raw in content.split_inclusive('\n') {
        let mut text = raw;
        if let Some(stripped) = text.strip_suffix('\n') {
            text = stripped.strip_suffix('\r').unwrap_or(stripped);
        }

        lines.push(LineRecord {
            text: text.to_string(),
            start: offset,
            end: offset + raw.len(),
        });

        offset += raw.len();
    }

    lines
}

/// Classifies a line of text that has already been through the inline pass.
pub fn classify_transformed(line: &str) -> LineKind {
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() {
        return LineKind::Blank;
    }

    if LIST_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
    {
        return LineKind::ListItem;
    }

    if is_heading_tag(trimmed) {
        return LineKind::Heading;
    }

    if BLOCK_TAGS.iter().any(|tag| starts_with_tag(trimmed, tag)) {
        return LineKind::PreformedBlock;
    }

    LineKind::PlainText
}

/// Returns the item text of a list line, without its marker.
pub(crate) fn list_item_text(line: &str) -> &str {
    let trimmed = line.trim_start();
    LIST_MARKERS
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
        .unwrap_or(trimmed)
        .trim()
}

fn is_heading_tag(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('<'), Some('h' | 'H'), Some('1'..='6'))
    )
}

fn starts_with_tag(line: &str, tag: &str) -> bool {
    let Some(rest) = line.strip_prefix('<') else {
        return false;
    };

    match rest.get(..tag.len()) {
        Some(name) if name.eq_ignore_ascii_case(tag) => {}
        _ => return false,
    }

    match rest[tag.len()..].chars().next() {
        None => true,
        Some(ch) => ch == '>' || ch == '/' || ch.is_whitespace(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_tracks_offsets_and_strips_terminators() {
        let content = "first\r\nsecond\nthird";
        let lines = split_lines(content);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "first");
        assert_eq!(lines[1].text, "second");
        assert_eq!(lines[2].text, "third");
        assert_eq!(&content[lines[1].start..lines[1].end], "second\n");
        assert_eq!(lines[2].end, content.len());
    }

    #[test]
    fn split_lines_does_not_invent_trailing_line() {
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("one\n").len(), 1);
    }

    #[test]
    fn classifies_every_kind() {
        assert_eq!(classify_transformed("   "), LineKind::Blank);
        assert_eq!(classify_transformed("- item"), LineKind::ListItem);
        assert_eq!(classify_transformed("* item"), LineKind::ListItem);
        assert_eq!(classify_transformed("<h2>Risks</h2>"), LineKind::Heading);
        assert_eq!(
            classify_transformed("<figure><img src=\"a\"></figure>"),
            LineKind::PreformedBlock
        );
        assert_eq!(classify_transformed("<hr>"), LineKind::PreformedBlock);
        assert_eq!(classify_transformed("plain words"), LineKind::PlainText);
    }

    #[test]
    fn inline_tags_are_not_block_markup() {
        assert_eq!(
            classify_transformed("<strong>Ticker:</strong> ACME"),
            LineKind::PlainText
        );
        assert_eq!(
            classify_transformed("<a href=\"x\">link</a> after"),
            LineKind::PlainText
        );
        assert_eq!(classify_transformed("<pretend>"), LineKind::PlainText);
    }

    #[test]
    fn emphasis_without_space_is_not_a_list_marker() {
        assert_eq!(classify_transformed("*note*"), LineKind::PlainText);
        assert_eq!(classify_transformed("-5% revenue"), LineKind::PlainText);
    }

    #[test]
    fn list_item_text_strips_marker() {
        assert_eq!(list_item_text("- first "), "first");
        assert_eq!(list_item_text("  * second"), "second");
    }
}
