//! Inline rewriting: an ordered chain of stages, each consuming the previous
//! stage's output.
//!
//! Precedence is fixed by [`InlineTransformer::standard`]:
//! heading lines, horizontal rules, images, links, then emphasis. Images run
//! before links so `![alt](url)` is never read as a link, and emphasis runs
//! last so `*` inside bracket syntax is already consumed.
//! Anything that does not match a stage's pattern is left as literal text.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

use crate::render::RenderOptions;

static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,3}) (.*)$").expect("valid heading pattern"));

static RULE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*---[ \t]*$").expect("valid rule pattern"));

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]\n]*)\]\(([^)\s]+)\)").expect("valid image pattern")
});

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").expect("valid link pattern"));

// Markup tags are matched first and kept verbatim so attribute values written
// by earlier stages are never rewritten.
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<tag></?[A-Za-z][^>\n]*>)|\*\*\*(?P<both>[^\n]+?)\*\*\*|\*\*(?P<bold>[^\n]+?)\*\*|\*(?P<italic>[^\s*][^*\n]*)\*",
    )
    .expect("valid emphasis pattern")
});

/// One rewrite pass over the whole text.
pub trait RewriteStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn rewrite(&self, input: &str) -> String;
}

/// `#`, `##` and `###` lines become `<h1>`..`<h3>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadingStage;

impl RewriteStage for HeadingStage {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn rewrite(&self, input: &str) -> String {
        HEADING_LINE
            .replace_all(input, |caps: &Captures| {
                let depth = caps[1].len();
                format!("<h{depth}>{}</h{depth}>", caps[2].trim())
            })
            .into_owned()
    }
}

/// A line consisting only of `---` becomes `<hr>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleStage;

impl RewriteStage for RuleStage {
    fn name(&self) -> &'static str {
        "rule"
    }

    fn rewrite(&self, input: &str) -> String {
        RULE_LINE.replace_all(input, "<hr>").into_owned()
    }
}

/// `![alt](url)` becomes a captioned figure; report-asset paths are made absolute.
#[derive(Debug, Clone)]
pub struct ImageStage {
    base_url: String,
    asset_prefix: String,
}

impl ImageStage {
    pub fn new(base_url: impl Into<String>, asset_prefix: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            asset_prefix: asset_prefix.into(),
        }
    }

    /// Resolves `url` against the asset base when it carries the asset prefix.
    pub fn resolve(&self, url: &str) -> String {
        let relative = url.strip_prefix('/').unwrap_or(url);
        if relative.starts_with(&self.asset_prefix) {
            format!("{}/{}", self.base_url, relative)
        } else {
            url.to_string()
        }
    }
}

impl RewriteStage for ImageStage {
    fn name(&self) -> &'static str {
        "image"
    }

    fn rewrite(&self, input: &str) -> String {
        IMAGE
            .replace_all(input, |caps: &Captures| {
                let alt = caps[1].trim();
                let src = self.resolve(&caps[2]);
                let caption = if alt.is_empty() {
                    String::new()
                } else {
                    format!("<figcaption>{alt}</figcaption>")
                };
                format!(
                    "<figure><img src=\"{src}\" alt=\"{alt}\" loading=\"lazy\">{caption}</figure>"
                )
            })
            .into_owned()
    }
}

/// `[text](url)` becomes an anchor opening in a new browsing context.
#[derive(Debug, Clone, Copy)]
pub struct LinkStage {
    max_chars: usize,
    keep_chars: usize,
}

impl LinkStage {
    pub fn new(max_chars: usize, keep_chars: usize) -> Self {
        Self {
            max_chars,
            keep_chars,
        }
    }

    /// Shortens visible text longer than `max_chars` to `keep_chars` plus an ellipsis.
    pub fn display_text(&self, text: &str) -> String {
        if text.chars().count() > self.max_chars {
            let kept: String = text.chars().take(self.keep_chars).collect();
            format!("{kept}...")
        } else {
            text.to_string()
        }
    }
}

impl RewriteStage for LinkStage {
    fn name(&self) -> &'static str {
        "link"
    }

    fn rewrite(&self, input: &str) -> String {
        LINK.replace_all(input, |caps: &Captures| {
            format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                &caps[2],
                self.display_text(&caps[1])
            )
        })
        .into_owned()
    }
}

/// `***both***`, `**bold**` and `*italic*`, outside of markup tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmphasisStage;

impl EmphasisStage {
    fn emphasize(&self, input: &str) -> String {
        EMPHASIS
            .replace_all(input, |caps: &Captures| {
                if let Some(inner) = caps.name("both") {
                    format!("<strong><em>{}</em></strong>", self.emphasize(inner.as_str()))
                } else if let Some(inner) = caps.name("bold") {
                    format!("<strong>{}</strong>", self.emphasize(inner.as_str()))
                } else if let Some(inner) = caps.name("italic") {
                    format!("<em>{}</em>", inner.as_str())
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}

impl RewriteStage for EmphasisStage {
    fn name(&self) -> &'static str {
        "emphasis"
    }

    fn rewrite(&self, input: &str) -> String {
        self.emphasize(input)
    }
}

/// Ordered chain of [`RewriteStage`]s.
pub struct InlineTransformer {
    stages: Vec<Box<dyn RewriteStage>>,
}

impl InlineTransformer {
    /// The standard chain: heading, rule, image, link, emphasis.
    pub fn standard(options: &RenderOptions) -> Self {
        Self::from_stages(vec![
            Box::new(HeadingStage),
            Box::new(RuleStage),
            Box::new(ImageStage::new(
                options.asset_base_url.clone(),
                options.asset_prefix.clone(),
            )),
            Box::new(LinkStage::new(
                options.link_max_chars,
                options.link_keep_chars,
            )),
            Box::new(EmphasisStage),
        ])
    }

    pub fn from_stages(stages: Vec<Box<dyn RewriteStage>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn transform(&self, input: &str) -> String {
        self.stages
            .iter()
            .fold(input.to_string(), |text, stage| {
                let rewritten = stage.rewrite(&text);
                trace!(stage = stage.name(), bytes = rewritten.len(), "inline stage applied");
                rewritten
            })
    }
}

impl Default for InlineTransformer {
    fn default() -> Self {
        Self::standard(&RenderOptions::default())
    }
}

impl std::fmt::Debug for InlineTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineTransformer")
            .field("stages", &self.stage_names())
            .finish()
    }
}
