//! Markdown preview rendering
//!
//! Converts a notable file's markdown into sanitized HTML for inline
//! embedding in a directory listing. The output is cleaned with `ammonia`
//! so uploaded markdown cannot smuggle script into the listing page.

use crate::config::PreviewMode;

/// Render markdown for inline embedding, honoring the endpoint's preview
/// mode. Returns `None` when previewing is disabled.
pub fn render_inline(mode: PreviewMode, markdown: &str) -> Option<String> {
    match mode {
        PreviewMode::None => None,
        PreviewMode::Inline => {
            let html = comrak::markdown_to_html(markdown, &comrak::Options::default());
            Some(ammonia::clean(&html))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_mode_renders_nothing() {
        assert_eq!(render_inline(PreviewMode::None, "# Hello"), None);
    }

    #[test]
    fn test_inline_mode_renders_html() {
        let html = render_inline(PreviewMode::Inline, "# Hello").unwrap();
        assert!(html.contains("<h1>"));
        assert!(html.contains("Hello"));
    }

    #[test]
    fn test_script_is_stripped() {
        let html = render_inline(
            PreviewMode::Inline,
            "safe <script>alert('xss')</script> text",
        )
        .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("safe"));
    }
}
