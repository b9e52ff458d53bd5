//! Rendering of generated research reports into sectioned HTML.
//!
//! A report is written in a small Markdown dialect. [`ReportRenderer`] splits
//! it at level-2 headings into [`Section`]s, promotes an executive summary to
//! the overview slot, and turns each body into an HTML fragment through the
//! inline rewrite chain and the block segmenter. All functions are pure and
//! recompute their output on every call.

mod block;
mod error;
mod heading;
mod inline;
mod line;
mod render;
mod sanitize;
mod section;
mod summary;

pub use block::{segment, ListState};
pub use error::{RenderError, RenderResult};
pub use heading::{clean_title, detect_heading, is_heading_line, Heading};
pub use inline::{
    EmphasisStage, HeadingStage, ImageStage, InlineTransformer, LinkStage, RewriteStage, RuleStage,
};
pub use line::{classify_transformed, split_lines, LineKind, LineRecord};
pub use render::{
    NavEntry, RenderOptions, RenderedSection, ReportRenderer, ReportView, DEFAULT_ASSET_BASE_URL,
    DEFAULT_ASSET_PREFIX, DEFAULT_LINK_KEEP_CHARS, DEFAULT_LINK_MAX_CHARS,
};
pub use sanitize::{EscapeHtml, SanitizePolicy, Sanitizer, TrustSource};
pub use section::{sectionize, slugify, split_chunks, Chunk, Section, SectionizeOptions};
pub use summary::{SectionedReport, SummarySelector, DEFAULT_SUMMARY_KEYWORDS};
