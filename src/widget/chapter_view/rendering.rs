use crate::html;
use crate::theme::Base16Palette;
use crate::transform::CHARACTER_BOX_CLASS;
use markup5ever_rcdom::{Handle, NodeData};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use textwrap::core::{Fragment, display_width};
use textwrap::wrap_algorithms::wrap_first_fit;

const BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "ul",
    "ol",
    "li",
    "pre",
    "hr",
    "fieldset",
    "legend",
    "div",
    "section",
    "article",
    "header",
    "footer",
    "figure",
    "table",
];

/// A run of non-whitespace text that may change style midway, e.g.
/// `plain*emphasis*` with no space in between.
#[derive(Debug, Clone, Default)]
struct StyledWord {
    pieces: Vec<(String, Style)>,
    width: usize,
    space_after: bool,
}

impl StyledWord {
    fn push_char(&mut self, ch: char, style: Style) {
        let mut buf = [0u8; 4];
        self.width += display_width(ch.encode_utf8(&mut buf));
        match self.pieces.last_mut() {
            Some((text, last_style)) if *last_style == style => text.push(ch),
            _ => self.pieces.push((ch.to_string(), style)),
        }
    }

    fn last_style(&self) -> Style {
        self.pieces.last().map(|(_, s)| *s).unwrap_or_default()
    }
}

impl Fragment for StyledWord {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn whitespace_width(&self) -> f64 {
        if self.space_after { 1.0 } else { 0.0 }
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// Inline content gathered between two blocks. Each segment ends at a `<br>`.
#[derive(Debug)]
struct InlineBuffer {
    segments: Vec<Vec<StyledWord>>,
}

impl InlineBuffer {
    fn new() -> Self {
        Self {
            segments: vec![Vec::new()],
        }
    }

    fn has_content(&self) -> bool {
        self.segments.iter().any(|s| !s.is_empty())
    }

    fn line_break(&mut self) {
        self.segments.push(Vec::new());
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let Some(words) = self.segments.last_mut() else {
            return;
        };
        for ch in text.chars() {
            if ch.is_whitespace() {
                if let Some(last) = words.last_mut() {
                    last.space_after = true;
                }
                continue;
            }
            let start_new = words.last().map(|w| w.space_after).unwrap_or(true);
            if start_new {
                words.push(StyledWord::default());
            }
            if let Some(word) = words.last_mut() {
                word.push_char(ch, style);
            }
        }
    }

    fn take(&mut self) -> Vec<Vec<StyledWord>> {
        let mut segments = std::mem::replace(&mut self.segments, vec![Vec::new()]);
        while segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }
        segments
    }
}

/// Lays chapter HTML out as terminal lines `width` columns wide.
pub struct ChapterRenderer<'a> {
    palette: &'a Base16Palette,
}

impl<'a> ChapterRenderer<'a> {
    pub fn new(palette: &'a Base16Palette) -> Self {
        Self { palette }
    }

    pub fn render_html(&self, chapter_html: &str, width: usize) -> Vec<Line<'static>> {
        let document = html::parse(chapter_html);
        let body = html::body(&document);
        let base = Style::default().fg(self.palette.base_05);
        self.render_blocks(&body, width.max(1), base)
    }

    /// Plain text in the body color, one paragraph per blank-line block.
    pub fn render_plain(&self, text: &str, width: usize) -> Vec<Line<'static>> {
        let base = Style::default().fg(self.palette.base_04);
        let mut out = Vec::new();
        for paragraph in text.split("\n\n") {
            let mut buffer = InlineBuffer::new();
            buffer.push_text(paragraph, base);
            push_block(&mut out, wrap_segments(buffer.take(), width.max(1)));
        }
        out
    }

    fn render_blocks(&self, parent: &Handle, width: usize, base: Style) -> Vec<Line<'static>> {
        let mut out = Vec::new();
        let mut inline = InlineBuffer::new();

        for child in parent.children.borrow().iter() {
            if is_block(child) {
                if inline.has_content() {
                    push_block(&mut out, wrap_segments(inline.take(), width));
                }
                let block = self.render_block(child, width, base);
                push_block(&mut out, block);
            } else {
                self.collect_inline(child, base, &mut inline);
            }
        }

        if inline.has_content() {
            push_block(&mut out, wrap_segments(inline.take(), width));
        }
        out
    }

    fn render_block(&self, node: &Handle, width: usize, base: Style) -> Vec<Line<'static>> {
        let palette = self.palette;
        match html::tag_name(node).unwrap_or_default() {
            "h1" => {
                let style = base.fg(palette.base_0a).add_modifier(Modifier::BOLD);
                self.render_blocks(node, width, style)
            }
            "h2" | "h3" | "h4" | "h5" | "h6" => {
                let style = base.fg(palette.base_0d).add_modifier(Modifier::BOLD);
                self.render_blocks(node, width, style)
            }
            "hr" => vec![Line::from(Span::styled(
                "─".repeat(width),
                Style::default().fg(palette.base_03),
            ))],
            "pre" => self.render_preformatted(node),
            "blockquote" => {
                let inner = self.render_blocks(
                    node,
                    width.saturating_sub(2).max(1),
                    base.fg(palette.base_04).add_modifier(Modifier::ITALIC),
                );
                prefix_lines(inner, "│ ", Style::default().fg(palette.base_03), None)
            }
            "ul" | "ol" => self.render_list(node, width, base),
            "fieldset" if html::has_class(node, CHARACTER_BOX_CLASS) => {
                self.render_character_box(node, width, base)
            }
            // Drawn as part of the character box header.
            "legend" => Vec::new(),
            "table" => self.render_table(node, base),
            _ => self.render_blocks(node, width, base),
        }
    }

    fn collect_inline(&self, node: &Handle, style: Style, buffer: &mut InlineBuffer) {
        match node.data {
            NodeData::Text { ref contents } => buffer.push_text(&contents.borrow(), style),
            NodeData::Element { .. } => {
                let palette = self.palette;
                let style = match html::tag_name(node).unwrap_or_default() {
                    "br" => {
                        buffer.line_break();
                        return;
                    }
                    "img" => {
                        let alt = html::attr(node, "alt").unwrap_or_default();
                        buffer.push_text(&format!("[image: {alt}]"), style.fg(palette.base_03));
                        return;
                    }
                    "em" | "i" => style.add_modifier(Modifier::ITALIC),
                    "strong" | "b" => style.add_modifier(Modifier::BOLD),
                    "code" => style.fg(palette.base_0b),
                    "a" => style.fg(palette.base_0d).add_modifier(Modifier::UNDERLINED),
                    "del" | "s" => style.add_modifier(Modifier::CROSSED_OUT),
                    _ => style,
                };
                for child in node.children.borrow().iter() {
                    self.collect_inline(child, style, buffer);
                }
            }
            _ => {}
        }
    }

    fn render_preformatted(&self, node: &Handle) -> Vec<Line<'static>> {
        let style = Style::default().fg(self.palette.base_0b);
        let text = html::text_content(node);
        text.trim_end_matches('\n')
            .lines()
            .map(|line| Line::from(vec![Span::raw("  "), Span::styled(line.to_string(), style)]))
            .collect()
    }

    fn render_list(&self, node: &Handle, width: usize, base: Style) -> Vec<Line<'static>> {
        let ordered = html::tag_name(node) == Some("ol");
        let marker_style = Style::default().fg(self.palette.base_03);
        let mut out = Vec::new();
        let mut number = html::attr(node, "start")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1);

        for item in node.children.borrow().iter() {
            if html::tag_name(item) != Some("li") {
                continue;
            }
            let marker = if ordered {
                format!("{number}. ")
            } else {
                "• ".to_string()
            };
            number += 1;

            let marker_width = display_width(&marker);
            let inner = self.render_blocks(item, width.saturating_sub(marker_width).max(1), base);
            let padding = " ".repeat(marker_width);
            out.extend(prefix_lines(inner, &padding, marker_style, Some(&marker)));
        }
        out
    }

    fn render_character_box(&self, node: &Handle, width: usize, base: Style) -> Vec<Line<'static>> {
        let color_class = html::classes(node)
            .into_iter()
            .find(|c| c != CHARACTER_BOX_CLASS)
            .unwrap_or_default();
        let frame = Style::default().fg(self.palette.speaker_color(&color_class));
        let label = html::find_first(node, "legend")
            .map(|legend| html::text_content(&legend).trim().to_string())
            .unwrap_or_default();

        let label_width = display_width(&label);
        let fill = width.saturating_sub(label_width + 4);
        let mut out = vec![Line::from(vec![
            Span::styled("╭─ ", frame),
            Span::styled(label, frame.add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {}", "─".repeat(fill)), frame),
        ])];

        let inner = self.render_blocks(node, width.saturating_sub(2).max(1), base);
        out.extend(prefix_lines(inner, "│ ", frame, None));
        out.push(Line::from(Span::styled(
            format!("╰{}", "─".repeat(width.saturating_sub(1))),
            frame,
        )));
        out
    }

    fn render_table(&self, node: &Handle, base: Style) -> Vec<Line<'static>> {
        let separator = Span::styled(" │ ", Style::default().fg(self.palette.base_03));
        let mut rows = Vec::new();
        collect_rows(node, &mut rows);

        rows.into_iter()
            .map(|row| {
                let mut spans = Vec::new();
                for (i, cell) in row.iter().enumerate() {
                    if i > 0 {
                        spans.push(separator.clone());
                    }
                    let style = if html::tag_name(cell) == Some("th") {
                        base.add_modifier(Modifier::BOLD)
                    } else {
                        base
                    };
                    spans.push(Span::styled(html::text_content(cell).trim().to_string(), style));
                }
                Line::from(spans)
            })
            .collect()
    }
}

fn collect_rows(node: &Handle, rows: &mut Vec<Vec<Handle>>) {
    for child in node.children.borrow().iter() {
        if html::tag_name(child) == Some("tr") {
            let cells = child
                .children
                .borrow()
                .iter()
                .filter(|c| matches!(html::tag_name(c), Some("td") | Some("th")))
                .cloned()
                .collect();
            rows.push(cells);
        } else {
            collect_rows(child, rows);
        }
    }
}

fn is_block(node: &Handle) -> bool {
    html::tag_name(node)
        .map(|tag| BLOCK_TAGS.contains(&tag))
        .unwrap_or(false)
}

/// Appends a block, separated from the previous one by a blank line.
fn push_block(out: &mut Vec<Line<'static>>, block: Vec<Line<'static>>) {
    if block.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push(Line::default());
    }
    out.extend(block);
}

/// Prefixes every line; the first line gets `first` instead when given.
fn prefix_lines(
    lines: Vec<Line<'static>>,
    prefix: &str,
    style: Style,
    first: Option<&str>,
) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let lead = match first {
                Some(first) if i == 0 => first.to_string(),
                _ => prefix.to_string(),
            };
            let mut spans = vec![Span::styled(lead, style)];
            spans.extend(line.spans);
            Line::from(spans)
        })
        .collect()
}

fn wrap_segments(segments: Vec<Vec<StyledWord>>, width: usize) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for segment in segments {
        if segment.is_empty() {
            out.push(Line::default());
            continue;
        }
        let words = split_long_words(segment, width);
        for line_words in wrap_first_fit(&words, &[width as f64]) {
            out.push(words_to_line(line_words));
        }
    }
    out
}

fn words_to_line(words: &[StyledWord]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, word) in words.iter().enumerate() {
        for (text, style) in &word.pieces {
            spans.push(Span::styled(text.clone(), *style));
        }
        if word.space_after && i + 1 < words.len() {
            spans.push(Span::styled(" ", word.last_style()));
        }
    }
    Line::from(spans)
}

/// Breaks words wider than the line into line-sized chunks.
fn split_long_words(words: Vec<StyledWord>, width: usize) -> Vec<StyledWord> {
    let mut out = Vec::with_capacity(words.len());
    for word in words {
        if word.width <= width {
            out.push(word);
            continue;
        }
        let mut chunk = StyledWord::default();
        for (text, style) in &word.pieces {
            for ch in text.chars() {
                let mut buf = [0u8; 4];
                let ch_width = display_width(ch.encode_utf8(&mut buf));
                if chunk.width + ch_width > width && chunk.width > 0 {
                    out.push(std::mem::take(&mut chunk));
                }
                chunk.push_char(ch, *style);
            }
        }
        chunk.space_after = word.space_after;
        out.push(chunk);
    }
    out
}
