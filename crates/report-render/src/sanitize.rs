//! Source-text sanitizing, applied before any markup is generated.
//!
//! The renderer never escapes on its own: whether report text is trusted is
//! the caller's call, expressed by the [`Sanitizer`] it injects.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

pub trait Sanitizer: Send + Sync {
    fn sanitize<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

/// Passes source text through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustSource;

impl Sanitizer for TrustSource {
    fn sanitize<'a>(&self, input: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(input)
    }
}

/// Escapes `&`, `<` and `>` so raw HTML in the source renders as text.
#[derive(Debug, Default, Clone, Copy)]
pub struct EscapeHtml;

impl Sanitizer for EscapeHtml {
    fn sanitize<'a>(&self, input: &'a str) -> Cow<'a, str> {
        html_escape::encode_text(input)
    }
}

impl<F> Sanitizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn sanitize<'a>(&self, input: &'a str) -> Cow<'a, str> {
        Cow::Owned(self(input))
    }
}

/// Named sanitizer choices, as selected from configuration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SanitizePolicy {
    #[default]
    Trust,
    Escape,
}

impl SanitizePolicy {
    pub fn sanitizer(self) -> Arc<dyn Sanitizer> {
        match self {
            SanitizePolicy::Trust => Arc::new(TrustSource),
            SanitizePolicy::Escape => Arc::new(EscapeHtml),
        }
    }
}

impl fmt::Display for SanitizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SanitizePolicy::Trust => "trust",
            SanitizePolicy::Escape => "escape",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for SanitizePolicy {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "trust" => Ok(SanitizePolicy::Trust),
            "escape" => Ok(SanitizePolicy::Escape),
            _ => Err(()),
        }
    }
}
