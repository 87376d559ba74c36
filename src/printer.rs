//! The styled renderer (spec §4.5): gutter + content + annotation emission
//! over a [`Source`], with overlay composition and optional soft word-wrap.
//!
//! The renderer is stateless: `Printer::print` depends only on its `Source`
//! and `Spans` arguments plus the `Printer`'s own configuration (spec
//! invariant 10, "renderer idempotence").

use unicode_width::UnicodeWidthChar;

use crate::line::{Annotation, AnnotationPosition, Line, LineFlag, Source};
use crate::position::{Position, Spans};
use crate::style::{blend, type_style, Style, StyleKind, Styles};

/// Context passed to a [`GutterFn`] for one visual (post-wrap) line.
pub struct GutterContext<'a, S: Style> {
    pub number: usize,
    pub flag: LineFlag,
    /// True for a word-wrap continuation of a logical line.
    pub soft: bool,
    pub styles: &'a Styles<S>,
}

pub type GutterFn<S> = Box<dyn Fn(&GutterContext<'_, S>) -> String>;

/// Context passed to an [`AnnotationFn`] for one annotation group (all
/// annotations sharing a line and [`AnnotationPosition`]).
pub struct AnnotationContext<'a, S: Style> {
    pub annotations: &'a [Annotation],
    pub position: AnnotationPosition,
    pub styles: &'a Styles<S>,
}

pub type AnnotationFn<S> = Box<dyn Fn(&AnnotationContext<'_, S>) -> String>;

/// No gutter at all.
pub fn no_gutter<S: Style + 'static>() -> GutterFn<S> {
    Box::new(|_ctx| String::new())
}

/// Right-aligned line number in a 4-wide field plus a trailing separator
/// space (5 columns total); `-` for a soft continuation; blank for
/// [`LineFlag::Annotation`].
pub fn line_number_gutter<S: Style + 'static>() -> GutterFn<S> {
    Box::new(|ctx| {
        if ctx.flag == LineFlag::Annotation {
            return " ".repeat(5);
        }
        if ctx.soft {
            return format!("{:>4} ", "-");
        }
        format!("{:>4} ", ctx.number)
    })
}

/// One of `' '`, `'+'`, `'-'`; blank on a soft continuation.
pub fn diff_gutter<S: Style + 'static>() -> GutterFn<S> {
    Box::new(|ctx| {
        if ctx.soft {
            return " ".to_string();
        }
        match ctx.flag {
            LineFlag::Inserted => "+".to_string(),
            LineFlag::Deleted => "-".to_string(),
            _ => " ".to_string(),
        }
    })
}

/// [`line_number_gutter`] followed by [`diff_gutter`].
pub fn default_gutter<S: Style + 'static>() -> GutterFn<S> {
    let number = line_number_gutter::<S>();
    let marker = diff_gutter::<S>();
    Box::new(move |ctx| format!("{}{}", number(ctx), marker(ctx)))
}

/// Joins annotation contents with `"; "`. For [`AnnotationPosition::Below`],
/// prefixes with column padding computed from the minimum `col` across the
/// group, then `"^ "`. For [`AnnotationPosition::Above`], the same padding
/// without the marker.
pub fn default_annotation_fn<S: Style + 'static>() -> AnnotationFn<S> {
    Box::new(|ctx| {
        let min_col = ctx.annotations.iter().map(|a| a.col).min().unwrap_or(0);
        let joined = ctx
            .annotations
            .iter()
            .map(|a| a.content.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let padding = " ".repeat(min_col);
        match ctx.position {
            AnnotationPosition::Below => format!("{padding}^ {joined}"),
            AnnotationPosition::Above => format!("{padding}{joined}"),
        }
    })
}

/// Explicit configuration record (spec §9's "functional options" note,
/// realized as a plain struct with a [`Default`]-friendly constructor
/// instead of variadic option closures).
pub struct PrinterConfig<S: Style> {
    /// Base style every run is composed against before semantic/overlay
    /// styles are blended in.
    pub container: S,
    /// `0` disables word-wrap regardless of `word_wrap`.
    pub width: usize,
    pub word_wrap: bool,
    pub annotations_enabled: bool,
}

impl<S: Style + Default> Default for PrinterConfig<S> {
    fn default() -> Self {
        Self {
            container: S::default(),
            width: 0,
            word_wrap: false,
            annotations_enabled: true,
        }
    }
}

/// Gutter + content + annotation renderer over a [`Source`] (spec §4.5).
pub struct Printer<S: Style + PartialEq> {
    styles: Styles<S>,
    gutter: GutterFn<S>,
    annotation: AnnotationFn<S>,
    config: PrinterConfig<S>,
}

impl<S: Style + PartialEq + 'static> Printer<S> {
    pub fn new(styles: Styles<S>, config: PrinterConfig<S>) -> Self {
        Self {
            styles,
            gutter: no_gutter(),
            annotation: default_annotation_fn(),
            config,
        }
    }

    pub fn with_gutter(mut self, gutter: GutterFn<S>) -> Self {
        self.gutter = gutter;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationFn<S>) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn styles(&self) -> &Styles<S> {
        &self.styles
    }

    /// Render `source`, restricted to the lines selected by `spans` (empty
    /// `spans` means every line).
    pub fn print(&self, source: &Source, spans: &Spans) -> String {
        let mut output_lines: Vec<String> = Vec::new();
        for (idx, line) in source.all_lines().iter().enumerate() {
            if !spans.selects(idx) {
                continue;
            }
            if self.config.annotations_enabled {
                self.emit_annotations(&mut output_lines, line, AnnotationPosition::Above);
            }

            let content = self.render_content(source, idx, line);
            let gutter_width = display_width(&(self.gutter)(&GutterContext {
                number: line.number,
                flag: line.flag,
                soft: false,
                styles: &self.styles,
            }));
            let visual_lines = if self.config.width > 0 && self.config.word_wrap {
                let budget = self.config.width.saturating_sub(gutter_width).max(1);
                word_wrap(&content, budget)
            } else {
                vec![content]
            };
            for (i, visual) in visual_lines.iter().enumerate() {
                let gutter = (self.gutter)(&GutterContext {
                    number: line.number,
                    flag: line.flag,
                    soft: i > 0,
                    styles: &self.styles,
                });
                output_lines.push(format!("{gutter}{visual}"));
            }

            if self.config.annotations_enabled {
                self.emit_annotations(&mut output_lines, line, AnnotationPosition::Below);
            }
        }
        output_lines.join("\n")
    }

    fn emit_annotations(&self, output_lines: &mut Vec<String>, line: &Line, position: AnnotationPosition) {
        let group: Vec<Annotation> = line
            .annotations
            .iter()
            .filter(|a| a.position == position)
            .cloned()
            .collect();
        if group.is_empty() {
            return;
        }
        let text = (self.annotation)(&AnnotationContext {
            annotations: &group,
            position,
            styles: &self.styles,
        });
        let gutter = (self.gutter)(&GutterContext {
            number: line.number,
            flag: LineFlag::Annotation,
            soft: false,
            styles: &self.styles,
        });
        output_lines.push(format!("{gutter}{text}"));
    }

    /// Walk `line`'s segments rune by rune, composing the semantic style
    /// with every overlay whose range covers the rune's position, and merge
    /// adjacent runs sharing an identical effective style.
    fn render_content(&self, source: &Source, line_idx: usize, line: &Line) -> String {
        let tokens = source.tokens();
        let mut out = String::new();
        let mut run = String::new();
        let mut run_style: Option<S> = None;
        let mut col = 0usize;

        for seg in &line.segments.items {
            let trimmed = seg.part.origin.strip_suffix('\n').unwrap_or(&seg.part.origin);
            let semantic = type_style(tokens, seg.source_index);
            for ch in trimmed.chars() {
                let pos = Position::new(line_idx, col);
                let mut style = self.config.container.clone();
                style = blend(&style, self.styles.style(semantic));
                for kind in source.overlay_kinds() {
                    if source.overlay_ranges(kind).iter().any(|r| r.contains(pos)) {
                        style = blend(&style, self.styles.style(StyleKind::from_overlay_key(kind)));
                    }
                }
                match &run_style {
                    Some(s) if *s == style => run.push(ch),
                    _ => {
                        if let Some(s) = run_style.take() {
                            out.push_str(&s.apply(&run));
                        }
                        run.clear();
                        run.push(ch);
                        run_style = Some(style);
                    }
                }
                col += 1;
            }
        }
        if let Some(s) = run_style.take() {
            out.push_str(&s.apply(&run));
        }
        out
    }
}

fn display_width(s: &str) -> usize {
    s.chars().filter_map(UnicodeWidthChar::width).sum()
}

/// Break `content` into soft-wrapped pieces no wider than `budget` display
/// columns. Prefers breaking at whitespace, then `/` or `-`, then the last
/// rune that fits. Never splits inside an ANSI CSI escape sequence.
fn word_wrap(content: &str, budget: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < chars.len() {
        let mut width = 0usize;
        let mut j = i;
        let mut last_break: Option<usize> = None;
        while j < chars.len() {
            if chars[j] == '\u{1b}' {
                let esc_end = consume_ansi(&chars, j);
                j = esc_end;
                continue;
            }
            let w = UnicodeWidthChar::width(chars[j]).unwrap_or(0);
            if width + w > budget && j > i {
                break;
            }
            width += w;
            if matches!(chars[j], ' ' | '/' | '-') {
                last_break = Some(j + 1);
            }
            j += 1;
        }
        let break_at = if j >= chars.len() {
            j
        } else {
            match last_break {
                Some(b) if b > i => b,
                _ => j.max(i + 1),
            }
        };
        let piece: String = chars[i..break_at].iter().collect();
        out.push(piece.trim_end_matches(' ').to_string());
        i = break_at;
    }
    out
}

/// `chars[start]` must be the ESC byte. Returns the index just past the
/// escape sequence (its final letter byte, inclusive), or `start + 1` if the
/// sequence is malformed/truncated.
fn consume_ansi(chars: &[char], start: usize) -> usize {
    let mut j = start + 1;
    if j < chars.len() && chars[j] == '[' {
        j += 1;
        while j < chars.len() && !chars[j].is_ascii_alphabetic() {
            j += 1;
        }
        if j < chars.len() {
            j += 1;
        }
        return j;
    }
    start + 1
}
