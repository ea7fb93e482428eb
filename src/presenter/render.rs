//! Markdown → styled spans for terminal output.
//!
//! Model replies use a small Markdown subset (headings, bold section labels,
//! bullet lists, the odd inline code). Anything richer degrades to plain text.
//! HTML is dropped.

use console::{Style, StyledObject};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    Plain,
    Strong,
    Emphasis,
    Heading,
    Code,
    Bullet,
}

impl SpanStyle {
    fn console_style(self) -> Style {
        match self {
            Self::Plain => Style::new(),
            Self::Strong => Style::new().bold(),
            Self::Emphasis => Style::new().italic(),
            Self::Heading => Style::new().bold().cyan(),
            Self::Code => Style::new().yellow(),
            Self::Bullet => Style::new().dim(),
        }
    }

    /// Apply this style to `text` for terminal output.
    pub fn paint<D>(self, text: D) -> StyledObject<D> {
        self.console_style().apply_to(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Parse `text` as Markdown into a flat run of styled spans.
///
/// Block structure is flattened into `\n` characters inside the spans.
pub fn render_markdown(text: &str) -> Vec<Span> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut renderer = Renderer::default();
    for event in Parser::new(text) {
        renderer.process_event(event);
    }
    renderer.finish()
}

/// Concatenated span text, styles dropped.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// Spans rendered to one string with terminal styling applied.
pub fn paint(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| s.style.paint(s.text.as_str()).to_string())
        .collect()
}

#[derive(Default)]
struct Renderer {
    spans: Vec<Span>,
    styles: Vec<SpanStyle>,
    /// `None` for bullets, `Some(n)` for the next ordered number.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl Renderer {
    fn style(&self) -> SpanStyle {
        self.styles.last().copied().unwrap_or(SpanStyle::Plain)
    }

    fn push(&mut self, text: &str, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span::new(text, style)),
        }
    }

    fn ends_with_newline(&self) -> bool {
        self.spans
            .last()
            .is_none_or(|s| s.text.ends_with('\n'))
    }

    fn newline(&mut self) {
        self.push("\n", SpanStyle::Plain);
    }

    /// Start a new block: end the current line and leave one blank line.
    fn block_break(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        if !self.ends_with_newline() {
            self.newline();
        }
        let blank = self
            .spans
            .last()
            .is_some_and(|s| s.text.ends_with("\n\n"));
        if !blank {
            self.newline();
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                let style = if self.in_code_block {
                    SpanStyle::Code
                } else {
                    self.style()
                };
                self.push(&text, style);
            }
            Event::Code(code) => self.push(&code, SpanStyle::Code),
            Event::SoftBreak => self.push(" ", self.style()),
            Event::HardBreak => self.newline(),
            Event::Rule => {
                self.block_break();
                self.push("────────", SpanStyle::Bullet);
                self.newline();
            }
            Event::TaskListMarker(checked) => {
                self.push(if checked { "[x] " } else { "[ ] " }, SpanStyle::Bullet);
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.block_break();
                }
            }
            Tag::Heading { .. } => {
                self.block_break();
                self.styles.push(SpanStyle::Heading);
            }
            Tag::Strong => self.styles.push(SpanStyle::Strong),
            Tag::Emphasis => self.styles.push(SpanStyle::Emphasis),
            Tag::CodeBlock(_) => {
                self.block_break();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.block_break();
                } else if !self.ends_with_newline() {
                    self.newline();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                if !self.ends_with_newline() {
                    self.newline();
                }
                let depth = self.lists.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.push(&marker, SpanStyle::Bullet);
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) | TagEnd::Strong | TagEnd::Emphasis => {
                self.styles.pop();
                if matches!(tag, TagEnd::Heading(_)) {
                    self.newline();
                }
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                if !self.ends_with_newline() {
                    self.newline();
                }
            }
            TagEnd::List(_) => {
                self.lists.pop();
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Span> {
        while let Some(last) = self.spans.last_mut() {
            let trimmed = last.text.trim_end_matches('\n').len();
            if trimmed == 0 {
                self.spans.pop();
            } else {
                last.text.truncate(trimmed);
                break;
            }
        }
        self.spans
    }
}
