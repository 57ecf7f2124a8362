use crate::html;
use pulldown_cmark::{Options, Parser};

/// Converts chapter markdown into HTML. Escaping behaviour is whatever the
/// implementation does; raw HTML blocks (the character boxes) pass through.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMarkRenderer;

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut opts = Options::empty();
        opts.insert(Options::ENABLE_TABLES);
        opts.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(markdown, opts);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut out, parser);
        out
    }
}

/// Title shown above the chapter: text of the first `<h1>`, empty if none.
pub fn extract_title(rendered_html: &str) -> String {
    let root = html::parse(rendered_html);
    html::find_first(&root, "h1")
        .map(|h1| html::text_content(&h1).trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_paragraphs() {
        let out = CommonMarkRenderer.render("# The Divide\n\nFirst *line*.");
        assert!(out.contains("<h1>The Divide</h1>"));
        assert!(out.contains("<p>First <em>line</em>.</p>"));
    }

    #[test]
    fn character_box_passes_through_as_html_block() {
        let markdown =
            "Before.\n\n<fieldset class=\"character-box red\"><legend>Hya</legend><p>Hi</p></fieldset>\n\nAfter.";
        let out = CommonMarkRenderer.render(markdown);
        assert!(out.contains("<fieldset class=\"character-box red\">"));
        assert!(out.contains("<p>After.</p>"));
    }

    #[test]
    fn title_comes_from_first_h1() {
        let out = CommonMarkRenderer.render("## Prologue\n\n# Chapter 3: Ash\n\n# Later");
        assert_eq!(extract_title(&out), "Chapter 3: Ash");
        assert_eq!(extract_title("<p>No heading</p>"), "");
    }
}
