use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace};

use crate::heading::{clean_title, contains_heading, detect_heading, SECTION_DEPTH};
use crate::line::split_lines;

/// A titled, identified slice of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub identifier: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionizeOptions {
    /// Chunks whose body has at most this many characters are dropped.
    pub min_body_len: usize,
}

impl Default for SectionizeOptions {
    fn default() -> Self {
        Self { min_body_len: 10 }
    }
}

/// A raw slice of the document starting at a level-2 heading (or at the
/// document start for the leading chunk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Splits `document` immediately before every line that opens a level-2 heading.
///
/// Chunks are contiguous and cover the whole input.
pub fn split_chunks(document: &str) -> Vec<Chunk<'_>> {
    let mut boundaries: Vec<usize> = split_lines(document)
        .into_iter()
        .filter(|line| {
            detect_heading(&line.text).is_some_and(|heading| heading.depth == SECTION_DEPTH)
        })
        .map(|line| line.start)
        .collect();

    if boundaries.first() != Some(&0) {
        boundaries.insert(0, 0);
    }
    boundaries.push(document.len());

    boundaries
        .windows(2)
        .filter(|pair| pair[0] < pair[1])
        .enumerate()
        .map(|(index, pair)| Chunk {
            index,
            text: &document[pair[0]..pair[1]],
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

/// Splits a report into ordered sections at level-2 headings.
///
/// Returns an empty list when the document contains no heading at all; the
/// caller is expected to render the document unsectioned in that case.
pub fn sectionize(document: &str, options: SectionizeOptions) -> Vec<Section> {
    if !contains_heading(&split_lines(document)) {
        debug!("document has no headings, nothing to sectionize");
        return Vec::new();
    }

    let mut used = HashSet::new();
    let mut sections = Vec::new();

    for chunk in split_chunks(document) {
        let (title, body) = title_and_body(&chunk);

        let title = if title.is_empty() && !body.is_empty() {
            format!("Section {}", chunk.index + 1)
        } else {
            title
        };

        let body_len = body.chars().count();
        if body_len <= options.min_body_len || title.is_empty() {
            trace!(
                chunk = chunk.index,
                title = %title,
                body_len,
                "dropping short or untitled chunk"
            );
            continue;
        }

        let identifier = unique_identifier(&title, chunk.index, &mut used);
        sections.push(Section {
            identifier,
            title,
            body,
        });
    }

    debug!(count = sections.len(), "sectionized document");
    sections
}

/// Lower-cases `title` and collapses every run of non-alphanumeric characters
/// into a single hyphen, without leading or trailing hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn title_and_body(chunk: &Chunk<'_>) -> (String, String) {
    let lines = split_lines(chunk.text);

    let mut section_heading = None;
    let mut any_heading = None;
    let mut body_lines = Vec::new();

    for line in &lines {
        match detect_heading(&line.text) {
            Some(heading) => {
                if heading.depth == SECTION_DEPTH && section_heading.is_none() {
                    section_heading = Some(line.text.as_str());
                }
                if any_heading.is_none() {
                    any_heading = Some(line.text.as_str());
                }
            }
            None => body_lines.push(line.text.as_str()),
        }
    }

    let title = section_heading
        .or(any_heading)
        .map(clean_title)
        .unwrap_or_default();
    let body = body_lines.join("\n").trim().to_string();
    (title, body)
}

fn unique_identifier(title: &str, chunk_index: usize, used: &mut HashSet<String>) -> String {
    let slug = slugify(title);
    let base = if slug.is_empty() {
        format!("section-{chunk_index}")
    } else {
        slug
    };

    let mut candidate = base.clone();
    let mut suffix = chunk_index + 1;
    while used.contains(&candidate) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }

    used.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Recent News & Market Activity"), "recent-news-market-activity");
        assert_eq!(slugify("  SWOT Analysis!  "), "swot-analysis");
        assert_eq!(slugify("Q3 2024 -- Results"), "q3-2024-results");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn slugify_is_pure() {
        let title = "Investment Thesis";
        assert_eq!(slugify(title), slugify(title));
    }

    #[test]
    fn chunks_cover_document_without_overlap() {
        let document = "# Report\nintro\n## One\nbody\n### Sub\n## Two\nmore\n";
        let chunks = split_chunks(document);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "# Report\nintro\n");
        assert_eq!(chunks[1].text, "## One\nbody\n### Sub\n");
        assert_eq!(chunks[2].text, "## Two\nmore\n");

        let rebuilt: String = chunks.iter().map(|chunk| chunk.text).collect();
        assert_eq!(rebuilt, document);
    }

    #[test]
    fn document_starting_with_section_has_no_empty_leading_chunk() {
        let chunks = split_chunks("## Only\ntext");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn no_headings_means_no_sections() {
        assert!(sectionize("just text\n- and a list", SectionizeOptions::default()).is_empty());
        assert!(sectionize("", SectionizeOptions::default()).is_empty());
    }

    #[test]
    fn leading_chunk_uses_any_heading_level_for_title() {
        let sections = sectionize(
            "# ACME - Comprehensive Research Report\n**Ticker:** ACME\n## Risks\nCompetition is intensifying.",
            SectionizeOptions::default(),
        );

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "ACME - Comprehensive Research Report");
        assert_eq!(sections[0].identifier, "acme-comprehensive-research-report");
        assert_eq!(sections[0].body, "**Ticker:** ACME");
        assert_eq!(sections[1].title, "Risks");
    }

    #[test]
    fn untitled_leading_chunk_gets_positional_title() {
        let sections = sectionize(
            "Preamble text that is long enough.\n## Risks\nCompetition is intensifying.",
            SectionizeOptions::default(),
        );

        assert_eq!(sections[0].title, "Section 1");
        assert_eq!(sections[0].identifier, "section-1");
    }

    #[test]
    fn symbol_only_title_gets_positional_identifier() {
        let sections = sectionize(
            "## Intro\nlong enough body text\n## ***\nanother long enough body",
            SectionizeOptions::default(),
        );

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].identifier, "section-1");
    }

    #[test]
    fn duplicate_titles_get_unique_identifiers() {
        let sections = sectionize(
            "## Outlook\nfirst outlook body\n## Outlook\nsecond outlook body",
            SectionizeOptions::default(),
        );

        assert_eq!(sections[0].identifier, "outlook");
        assert_eq!(sections[1].identifier, "outlook-2");
    }

    #[test]
    fn body_excludes_nested_heading_lines() {
        let sections = sectionize(
            "## SWOT Analysis\n### Strengths\n- Brand\n### Weaknesses\n- Debt load",
            SectionizeOptions::default(),
        );

        assert_eq!(sections[0].body, "- Brand\n- Debt load");
    }

    #[test]
    fn drops_short_bodies() {
        let sections = sectionize(
            "## Executive Summary\nShort.\n## Risks\nThis paragraph is long enough to pass the ten-character body-length filter easily.",
            SectionizeOptions::default(),
        );

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Risks");
    }

    #[test]
    fn body_of_exactly_minimum_length_is_dropped() {
        let options = SectionizeOptions { min_body_len: 10 };
        assert!(sectionize("## Ten\n0123456789", options).is_empty());
        assert_eq!(sectionize("## Eleven\n0123456789a", options).len(), 1);
    }
}
