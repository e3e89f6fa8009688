//! Line clustering: group a page's tokens into visual rows.

use crate::model::{Line, NormalizedBox, Token};

use super::options::LineOptions;

/// Groups tokens into lines using fixed, configurable thresholds.
#[derive(Debug, Clone, Default)]
pub struct LineClusterer {
    options: LineOptions,
}

/// Line under construction.
struct OpenLine {
    tokens: Vec<Token>,
    text: String,
    bbox: NormalizedBox,
    chars: usize,
}

impl OpenLine {
    fn start(token: Token) -> Self {
        Self {
            text: token.text.clone(),
            bbox: token.bbox,
            chars: token.text_len(),
            tokens: vec![token],
        }
    }

    fn reference(&self) -> &Token {
        &self.tokens[0]
    }

    fn into_line(self, reading_order: u32) -> Line {
        Line {
            tokens: self.tokens,
            text: self.text,
            bbox: self.bbox,
            reading_order,
        }
    }
}

impl LineClusterer {
    /// Create a clusterer with the given thresholds.
    pub fn new(options: LineOptions) -> Self {
        Self { options }
    }

    /// Order tokens top-to-bottom, then left-to-right within a row.
    ///
    /// Tokens whose tops differ by less than the line threshold from the
    /// first token of a row are treated as tied and ordered by `left`.
    pub fn reading_sequence(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        tokens.sort_by(|a, b| {
            a.bbox
                .top
                .total_cmp(&b.bbox.top)
                .then(a.bbox.left.total_cmp(&b.bbox.left))
        });

        let mut ordered = Vec::with_capacity(tokens.len());
        let mut row: Vec<Token> = Vec::new();
        let mut row_top: Option<f64> = None;

        for token in tokens {
            match row_top {
                Some(top) if (token.bbox.top - top).abs() < self.options.line_threshold => {
                    row.push(token);
                }
                _ => {
                    flush_row(&mut row, &mut ordered);
                    row_top = Some(token.bbox.top);
                    row.push(token);
                }
            }
        }
        flush_row(&mut row, &mut ordered);

        ordered
    }

    /// Cluster tokens into lines with reading order assigned at emission.
    ///
    /// `max_line_chars` only stops merging. A single token longer than the
    /// cap is never split and becomes a line of its own.
    pub fn cluster(&self, tokens: Vec<Token>) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut current: Option<OpenLine> = None;

        for token in self.reading_sequence(tokens) {
            if token.text_len() >= self.options.max_line_chars {
                log::debug!(
                    "token of {} chars exceeds line cap {}, kept as its own line",
                    token.text_len(),
                    self.options.max_line_chars
                );
            }
            current = Some(match current.take() {
                None => OpenLine::start(token),
                Some(mut line) => {
                    if let Some(separator) = self.join(&line, &token) {
                        line.chars += separator.len() + token.text_len();
                        line.text.push_str(separator);
                        line.text.push_str(&token.text);
                        line.bbox = line.bbox.union(&token.bbox);
                        line.tokens.push(token);
                        line
                    } else {
                        let order = lines.len() as u32;
                        lines.push(line.into_line(order));
                        OpenLine::start(token)
                    }
                }
            });
        }

        if let Some(line) = current {
            let order = lines.len() as u32;
            lines.push(line.into_line(order));
        }

        log::trace!("clustered {} lines", lines.len());
        lines
    }

    /// Decide whether `token` extends `line`; returns the separator to insert.
    fn join(&self, line: &OpenLine, token: &Token) -> Option<&'static str> {
        let opts = &self.options;
        let reference = line.reference();

        if (token.bbox.top - reference.bbox.top).abs() >= opts.line_threshold {
            return None;
        }

        let gap = token.bbox.left - line.bbox.right;
        if !(0.0..opts.word_threshold).contains(&gap) {
            return None;
        }

        if (token.bbox.height() - reference.bbox.height()).abs() >= opts.font_threshold {
            return None;
        }

        let separator = if gap > opts.kerning_threshold { " " } else { "" };
        if line.chars + separator.len() + token.text_len() >= opts.max_line_chars {
            return None;
        }

        Some(separator)
    }
}

fn flush_row(row: &mut Vec<Token>, out: &mut Vec<Token>) {
    row.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));
    out.append(row);
}
