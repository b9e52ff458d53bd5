use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::block::segment;
use crate::error::{RenderError, RenderResult};
use crate::inline::InlineTransformer;
use crate::sanitize::{Sanitizer, TrustSource};
use crate::section::{sectionize, Section, SectionizeOptions};
use crate::summary::{SectionedReport, SummarySelector, DEFAULT_SUMMARY_KEYWORDS};

pub const DEFAULT_ASSET_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ASSET_PREFIX: &str = "reports/";
pub const DEFAULT_LINK_MAX_CHARS: usize = 80;
pub const DEFAULT_LINK_KEEP_CHARS: usize = 77;

/// Knobs shared by every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Absolute base that report-asset image paths are resolved against.
    pub asset_base_url: String,
    /// Path prefix identifying report assets, e.g. `reports/`.
    pub asset_prefix: String,
    pub link_max_chars: usize,
    pub link_keep_chars: usize,
    pub min_body_len: usize,
    pub summary_keywords: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
            link_max_chars: DEFAULT_LINK_MAX_CHARS,
            link_keep_chars: DEFAULT_LINK_KEEP_CHARS,
            min_body_len: SectionizeOptions::default().min_body_len,
            summary_keywords: DEFAULT_SUMMARY_KEYWORDS
                .iter()
                .map(|keyword| keyword.to_string())
                .collect(),
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> RenderResult<()> {
        if self.asset_base_url.trim().is_empty() {
            return Err(RenderError::InvalidOptions(
                "asset base url must not be empty".into(),
            ));
        }
        if self.asset_prefix.is_empty() {
            return Err(RenderError::InvalidOptions(
                "asset prefix must not be empty".into(),
            ));
        }
        if self.link_keep_chars >= self.link_max_chars {
            return Err(RenderError::InvalidOptions(format!(
                "link keep length ({}) must be below the maximum ({})",
                self.link_keep_chars, self.link_max_chars
            )));
        }
        if self.summary_keywords.is_empty() {
            return Err(RenderError::InvalidOptions(
                "at least one summary keyword is required".into(),
            ));
        }
        if self.summary_keywords.iter().any(|keyword| keyword.trim().is_empty()) {
            return Err(RenderError::InvalidOptions(
                "summary keywords cannot contain blank entries".into(),
            ));
        }
        Ok(())
    }

    pub fn sectionize_options(&self) -> SectionizeOptions {
        SectionizeOptions {
            min_body_len: self.min_body_len,
        }
    }
}

/// Navigation entry for one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub identifier: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSection {
    pub identifier: String,
    pub title: String,
    pub html: String,
}

/// Everything a display surface needs to present one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReportView {
    /// The document had no usable sections and is shown as one block.
    Whole { html: String },
    Sectioned {
        navigation: Vec<NavEntry>,
        overview: Option<RenderedSection>,
        sections: Vec<RenderedSection>,
    },
}

impl ReportView {
    pub fn navigation(&self) -> &[NavEntry] {
        match self {
            ReportView::Whole { .. } => &[],
            ReportView::Sectioned { navigation, .. } => navigation.as_slice(),
        }
    }

    pub fn overview(&self) -> Option<&RenderedSection> {
        match self {
            ReportView::Whole { .. } => None,
            ReportView::Sectioned { overview, .. } => overview.as_ref(),
        }
    }

    /// Looks up a rendered section by identifier, the overview included.
    pub fn fragment(&self, identifier: &str) -> RenderResult<&RenderedSection> {
        let found = match self {
            ReportView::Whole { .. } => None,
            ReportView::Sectioned {
                overview, sections, ..
            } => overview
                .iter()
                .chain(sections.iter())
                .find(|section| section.identifier == identifier),
        };

        found.ok_or_else(|| RenderError::SectionNotFound {
            identifier: identifier.to_string(),
        })
    }

    /// The section shown before a tab is chosen: the overview, else the first section.
    pub fn default_identifier(&self) -> Option<&str> {
        match self {
            ReportView::Whole { .. } => None,
            ReportView::Sectioned {
                overview, sections, ..
            } => overview
                .as_ref()
                .or_else(|| sections.first())
                .map(|section| section.identifier.as_str()),
        }
    }
}

/// Markdown-to-HTML pipeline: sanitize, inline rewrite, block segmentation.
pub struct ReportRenderer {
    options: RenderOptions,
    inline: InlineTransformer,
    selector: SummarySelector,
    sanitizer: Arc<dyn Sanitizer>,
}

impl ReportRenderer {
    pub fn new(options: RenderOptions) -> RenderResult<Self> {
        options.validate()?;
        Ok(Self {
            inline: InlineTransformer::standard(&options),
            selector: SummarySelector::new(&options.summary_keywords),
            sanitizer: Arc::new(TrustSource),
            options,
        })
    }

    pub fn with_sanitizer(self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.with_shared_sanitizer(Arc::new(sanitizer))
    }

    pub fn with_shared_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders a section body or a whole document into an HTML fragment.
    pub fn render_fragment(&self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        let sanitized = self.sanitizer.sanitize(&normalized);
        let inline = self.inline.transform(&sanitized);
        segment(&inline)
    }

    /// Splits `document` into sections and promotes the overview.
    ///
    /// Short and untitled chunks are filtered out before the overview is
    /// chosen, so a summary section with a near-empty body is never promoted.
    pub fn sectionize(&self, document: &str) -> SectionedReport {
        let sections = sectionize(document, self.options.sectionize_options());
        self.selector.select(sections)
    }

    pub fn render_report(&self, document: &str) -> ReportView {
        let sectioned = self.sectionize(document);
        if sectioned.is_empty() {
            debug!("rendering report unsectioned");
            return ReportView::Whole {
                html: self.render_fragment(document),
            };
        }

        let SectionedReport { overview, sections } = sectioned;
        let navigation = sections
            .iter()
            .map(|section| NavEntry {
                identifier: section.identifier.clone(),
                title: section.title.clone(),
            })
            .collect();

        ReportView::Sectioned {
            navigation,
            overview: overview.map(|section| self.render_section(section)),
            sections: sections
                .into_iter()
                .map(|section| self.render_section(section))
                .collect(),
        }
    }

    fn render_section(&self, section: Section) -> RenderedSection {
        RenderedSection {
            html: self.render_fragment(&section.body),
            identifier: section.identifier,
            title: section.title,
        }
    }
}

impl fmt::Debug for ReportRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportRenderer")
            .field("options", &self.options)
            .field("inline", &self.inline)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}
