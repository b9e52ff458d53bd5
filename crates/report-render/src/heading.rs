use crate::line::LineRecord;

/// Deepest ATX level recognised when looking for section titles.
pub const MAX_HEADING_DEPTH: usize = 6;

/// Level at which the document is split into sections.
pub const SECTION_DEPTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub depth: usize,
    /// Heading text with the leading markers removed, otherwise untouched.
    pub raw: String,
}

/// Detects an ATX heading: 1 to 6 `#` at the very start of the line, then a space.
pub fn detect_heading(line: &str) -> Option<Heading> {
    let pound_count = line.chars().take_while(|ch| *ch == '#').count();
    if pound_count == 0 || pound_count > MAX_HEADING_DEPTH {
        return None;
    }

    let after_hashes = &line[pound_count..];
    if !after_hashes.starts_with(' ') {
        return None;
    }

    Some(Heading {
        depth: pound_count,
        raw: after_hashes.trim().to_string(),
    })
}

pub fn is_heading_line(line: &str) -> bool {
    detect_heading(line).is_some()
}

/// Whether any line in `lines` is a heading of any level.
pub fn contains_heading(lines: &[LineRecord]) -> bool {
    lines.iter().any(|line| is_heading_line(&line.text))
}

/// Strips heading and bold markers from a heading line and trims the result.
pub fn clean_title(line: &str) -> String {
    line.trim_start()
        .trim_start_matches('#')
        .replace("**", "")
        .trim()
        .to_string()
}
