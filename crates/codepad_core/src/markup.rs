//! Markup assembly
//!
//! Merges the structure, style and behavior buffers into one self-contained
//! document by literal substitution of two sentinel lines. This is not an
//! HTML parser: the sentinels must appear verbatim in the structure buffer.

use crate::config::MarkupSettings;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Stylesheet reference replaced by an inline `<style>` block.
pub const STYLESHEET_SENTINEL: &str = r#"<link rel="stylesheet" href="styles.css">"#;

/// Script reference replaced by an inline `<script>` block.
pub const SCRIPT_SENTINEL: &str = r#"<script src="script.js"></script>"#;

/// Owned markup-mode buffers, detached from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupSources {
    pub structure: String,
    pub style: String,
    pub behavior: String,
}

/// A self-contained markup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderableDocument {
    pub markup: String,
}

impl RenderableDocument {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    /// Isolation the rendering surface must apply to this document.
    pub fn surface_policy(&self) -> SurfacePolicy {
        SurfacePolicy::ISOLATED
    }

    /// Host page showing this document in a sandboxed frame sized for
    /// `viewport`.
    pub fn framed(&self, viewport: PreviewViewport) -> String {
        let width = match viewport.max_width() {
            Some(px) => format!("max-width: {px}px; "),
            None => String::new(),
        };
        let srcdoc = self.markup.replace('&', "&amp;").replace('"', "&quot;");
        format!(
            "<!DOCTYPE html>\n<html>\n<body style=\"margin: 0\">\n\
             <iframe sandbox=\"{}\" style=\"{width}width: 100%; height: 100vh; border: 0; display: block; margin: 0 auto\" srcdoc=\"{srcdoc}\"></iframe>\n\
             </body>\n</html>\n",
            self.surface_policy().sandbox_attribute()
        )
    }
}

/// Capabilities granted to the surface that renders a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePolicy {
    pub allow_scripts: bool,
    pub allow_same_origin: bool,
    pub allow_storage: bool,
    pub allow_top_navigation: bool,
    pub allow_parent_access: bool,
}

impl SurfacePolicy {
    /// Scripts run; everything that reaches the hosting context is denied.
    pub const ISOLATED: SurfacePolicy = SurfacePolicy {
        allow_scripts: true,
        allow_same_origin: false,
        allow_storage: false,
        allow_top_navigation: false,
        allow_parent_access: false,
    };

    /// Equivalent iframe `sandbox` attribute value.
    pub fn sandbox_attribute(&self) -> String {
        let mut tokens = Vec::new();
        if self.allow_scripts {
            tokens.push("allow-scripts");
        }
        if self.allow_same_origin || self.allow_storage || self.allow_parent_access {
            tokens.push("allow-same-origin");
        }
        if self.allow_top_navigation {
            tokens.push("allow-top-navigation");
        }
        tokens.join(" ")
    }
}

/// Preview widths offered by the preview pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewViewport {
    Desktop,
    Tablet,
    Mobile,
}

/// Name that is not one of the preview widths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown viewport '{0}' (expected desktop, tablet or mobile)")]
pub struct UnknownViewport(pub String);

impl FromStr for PreviewViewport {
    type Err = UnknownViewport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(PreviewViewport::Desktop),
            "tablet" => Ok(PreviewViewport::Tablet),
            "mobile" => Ok(PreviewViewport::Mobile),
            _ => Err(UnknownViewport(s.to_string())),
        }
    }
}

impl PreviewViewport {
    /// Maximum width in CSS pixels; `None` fills the pane.
    pub fn max_width(self) -> Option<u32> {
        match self {
            PreviewViewport::Desktop => None,
            PreviewViewport::Tablet => Some(768),
            PreviewViewport::Mobile => Some(375),
        }
    }
}

/// Sentinel-substitution assembler.
#[derive(Debug, Clone)]
pub struct MarkupAssembler {
    stylesheet_sentinel: String,
    script_sentinel: String,
}

impl MarkupAssembler {
    pub fn new(settings: &MarkupSettings) -> Self {
        Self {
            stylesheet_sentinel: settings.stylesheet_sentinel.clone(),
            script_sentinel: settings.script_sentinel.clone(),
        }
    }

    /// Inline `style` and `behavior` into `structure`.
    ///
    /// Only the first occurrence of each sentinel is replaced and the
    /// inserted text is copied verbatim. A missing sentinel leaves the
    /// structure unchanged for that part.
    pub fn assemble(&self, structure: &str, style: &str, behavior: &str) -> RenderableDocument {
        let styled = replace_first(
            structure,
            &self.stylesheet_sentinel,
            &["<style>", style, "</style>"],
        );
        let markup = match styled {
            Some(styled) => styled,
            None => {
                tracing::debug!(sentinel = %self.stylesheet_sentinel, "stylesheet sentinel missing; style not inlined");
                structure.to_string()
            }
        };

        let markup = match replace_first(
            &markup,
            &self.script_sentinel,
            &["<script>", behavior, "</script>"],
        ) {
            Some(scripted) => scripted,
            None => {
                tracing::debug!(sentinel = %self.script_sentinel, "script sentinel missing; behavior not inlined");
                markup
            }
        };

        RenderableDocument { markup }
    }

    pub fn assemble_sources(&self, sources: &MarkupSources) -> RenderableDocument {
        self.assemble(&sources.structure, &sources.style, &sources.behavior)
    }
}

impl Default for MarkupAssembler {
    fn default() -> Self {
        Self::new(&MarkupSettings::default())
    }
}

fn replace_first(haystack: &str, needle: &str, replacement: &[&str]) -> Option<String> {
    if needle.is_empty() {
        return None;
    }
    let at = haystack.find(needle)?;
    let extra: usize = replacement.iter().map(|part| part.len()).sum();
    let mut out = String::with_capacity(haystack.len() - needle.len() + extra);
    out.push_str(&haystack[..at]);
    for part in replacement {
        out.push_str(part);
    }
    out.push_str(&haystack[at + needle.len()..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURE: &str = "<html>\n<head>\n    <link rel=\"stylesheet\" href=\"styles.css\">\n</head>\n<body>\n    <script src=\"script.js\"></script>\n</body>\n</html>";

    #[test]
    fn test_assemble_inlines_both_parts() {
        let assembler = MarkupAssembler::default();
        let document = assembler.assemble(STRUCTURE, "body { margin: 0; }", "go();");

        assert!(document.markup.contains("<style>body { margin: 0; }</style>"));
        assert!(document.markup.contains("<script>go();</script>"));
        assert!(!document.markup.contains(STYLESHEET_SENTINEL));
        assert!(!document.markup.contains(SCRIPT_SENTINEL));
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let assembler = MarkupAssembler::default();
        let first = assembler.assemble(STRUCTURE, "p {}", "x();");
        let second = assembler.assemble(STRUCTURE, "p {}", "x();");
        assert_eq!(first, second);
    }

    #[test]
    fn test_replacement_text_is_verbatim() {
        let assembler = MarkupAssembler::default();
        let behavior = "const s = '$& $1 $$';";
        let document = assembler.assemble(STRUCTURE, "", behavior);
        assert!(document.markup.contains("<script>const s = '$& $1 $$';</script>"));
    }

    #[test]
    fn test_missing_sentinels_leave_structure() {
        let assembler = MarkupAssembler::default();
        let structure = "<body><p>plain</p></body>";
        let document = assembler.assemble(structure, "p {}", "x();");
        assert_eq!(document.markup, structure);
    }

    #[test]
    fn test_only_first_sentinel_replaced() {
        let assembler = MarkupAssembler::default();
        let structure = format!("{SCRIPT_SENTINEL}{SCRIPT_SENTINEL}");
        let document = assembler.assemble(&structure, "", "a();");
        assert_eq!(document.markup, format!("<script>a();</script>{SCRIPT_SENTINEL}"));
    }

    #[test]
    fn test_custom_sentinels() {
        let settings = MarkupSettings {
            stylesheet_sentinel: "<!-- css -->".to_string(),
            script_sentinel: "<!-- js -->".to_string(),
        };
        let assembler = MarkupAssembler::new(&settings);
        let document = assembler.assemble("<!-- css --><!-- js -->", "a{}", "b()");
        assert_eq!(document.markup, "<style>a{}</style><script>b()</script>");
    }

    #[test]
    fn test_isolated_surface_policy() {
        let document = RenderableDocument::new("<p></p>");
        let policy = document.surface_policy();
        assert!(policy.allow_scripts);
        assert!(!policy.allow_storage);
        assert_eq!(policy.sandbox_attribute(), "allow-scripts");
    }

    #[test]
    fn test_viewport_widths() {
        assert_eq!(PreviewViewport::Desktop.max_width(), None);
        assert_eq!(PreviewViewport::Tablet.max_width(), Some(768));
        assert_eq!(PreviewViewport::Mobile.max_width(), Some(375));
    }

    #[test]
    fn test_framed_document_is_sandboxed() {
        let document = RenderableDocument::new(r#"<p class="x">a & b</p>"#);
        let page = document.framed(PreviewViewport::Mobile);
        assert!(page.contains(r#"sandbox="allow-scripts""#));
        assert!(page.contains("max-width: 375px;"));
        assert!(page.contains(r#"srcdoc="<p class=&quot;x&quot;>a &amp; b</p>""#));

        let page = document.framed(PreviewViewport::Desktop);
        assert!(!page.contains("max-width"));
    }

    #[test]
    fn test_viewport_from_str() {
        assert_eq!("Tablet".parse(), Ok(PreviewViewport::Tablet));
        assert_eq!(" mobile ".parse(), Ok(PreviewViewport::Mobile));
        assert_eq!(
            "watch".parse::<PreviewViewport>(),
            Err(UnknownViewport("watch".to_string()))
        );
    }
}
