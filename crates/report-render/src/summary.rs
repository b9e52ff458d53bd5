use serde::Serialize;
use tracing::debug;

use crate::section::Section;

pub const DEFAULT_SUMMARY_KEYWORDS: [&str; 2] = ["executive", "summary"];

/// Sections after overview selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionedReport {
    pub overview: Option<Section>,
    pub sections: Vec<Section>,
}

impl SectionedReport {
    pub fn is_empty(&self) -> bool {
        self.overview.is_none() && self.sections.is_empty()
    }
}

/// Promotes the first section whose title mentions a summary keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySelector {
    keywords: Vec<String>,
}

impl Default for SummarySelector {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_KEYWORDS)
    }
}

impl SummarySelector {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.as_ref().trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Case-insensitive keyword containment test against `title`.
    pub fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| title.contains(keyword.as_str()))
    }

    /// Removes at most one matching section from `sections` and makes it the overview.
    pub fn select(&self, mut sections: Vec<Section>) -> SectionedReport {
        let position = sections
            .iter()
            .position(|section| self.matches(&section.title));

        let overview = position.map(|index| sections.remove(index));
        match &overview {
            Some(section) => debug!(identifier = %section.identifier, "promoted overview section"),
            None => debug!("no overview section found"),
        }

        SectionedReport { overview, sections }
    }
}
