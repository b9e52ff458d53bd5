use tracing::trace;

use crate::line::{classify_transformed, list_item_text, LineKind};

const LIST_OPEN: &str = "<ul>";
const LIST_CLOSE: &str = "</ul>";

/// Whether the segmenter is currently inside an open `<ul>`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    #[default]
    NoList,
    InList,
}

impl ListState {
    /// Consumes one classified line, pushing its output and returning the next state.
    fn step(self, kind: LineKind, line: &str, out: &mut Vec<String>) -> ListState {
        match (self, kind) {
            (ListState::NoList, LineKind::ListItem) => {
                out.push(LIST_OPEN.to_string());
                out.push(list_item(line));
                ListState::InList
            }
            (ListState::InList, LineKind::ListItem) => {
                out.push(list_item(line));
                ListState::InList
            }
            (ListState::InList, other) => {
                out.push(LIST_CLOSE.to_string());
                emit_block(other, line, out);
                ListState::NoList
            }
            (ListState::NoList, other) => {
                emit_block(other, line, out);
                ListState::NoList
            }
        }
    }

    /// Closes a list left open at the end of the input.
    fn finish(self, out: &mut Vec<String>) {
        if self == ListState::InList {
            out.push(LIST_CLOSE.to_string());
        }
    }
}

/// Wraps plain lines in paragraphs and groups consecutive list lines into one list.
///
/// Input is expected to have been through the inline pass already; lines that
/// start with block-level markup pass through untouched and blank lines are
/// dropped.
pub fn segment(input: &str) -> String {
    let classified: Vec<(LineKind, &str)> = input
        .lines()
        .map(|line| (classify_transformed(line), line))
        .collect();

    let mut out = Vec::with_capacity(classified.len());
    let mut state = ListState::default();

    for (kind, line) in classified {
        let next = state.step(kind, line, &mut out);
        if next != state {
            trace!(from = ?state, to = ?next, "list state changed");
        }
        state = next;
    }
    state.finish(&mut out);

    out.join("\n")
}

fn emit_block(kind: LineKind, line: &str, out: &mut Vec<String>) {
    match kind {
        LineKind::Blank => {}
        LineKind::Heading | LineKind::PreformedBlock => out.push(line.trim().to_string()),
        LineKind::PlainText => out.push(format!("<p>{}</p>", line.trim())),
        LineKind::ListItem => out.push(list_item(line)),
    }
}

fn list_item(line: &str) -> String {
    format!("<li>{}</li>", list_item_text(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn groups_consecutive_items_into_one_list() {
        assert_eq!(
            segment("- one\n- two\n- three"),
            "<ul>\n<li>one</li>\n<li>two</li>\n<li>three</li>\n</ul>"
        );
    }

    #[test]
    fn wraps_plain_lines_and_passes_block_markup() {
        assert_eq!(
            segment("<h2>Risks</h2>\nSupply chain.\n\n<hr>"),
            "<h2>Risks</h2>\n<p>Supply chain.</p>\n<hr>"
        );
    }

    #[test]
    fn blank_line_closes_list() {
        assert_eq!(
            segment("- a\n\n- b"),
            "<ul>\n<li>a</li>\n</ul>\n<ul>\n<li>b</li>\n</ul>"
        );
    }

    #[test]
    fn text_after_list_closes_it_before_wrapping() {
        assert_eq!(
            segment("* a\nafter"),
            "<ul>\n<li>a</li>\n</ul>\n<p>after</p>"
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(segment(""), "");
        assert_eq!(segment("\n\n"), "");
    }

    #[test]
    fn list_tags_balance() {
        let inputs = [
            "- a",
            "- a\n- b\ntext\n- c",
            "text\n\n* x\n\n* y\n<h3>h</h3>\n- z",
        ];
        for input in inputs {
            let output = segment(input);
            assert_eq!(
                output.matches(LIST_OPEN).count(),
                output.matches(LIST_CLOSE).count(),
                "unbalanced output for {input:?}"
            );
        }
    }
}
