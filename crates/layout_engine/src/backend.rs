//! Control measurement and splitting

use report_model::{Control, ControlKind, Point, Size};
use unicode_segmentation::UnicodeSegmentation;

use crate::{BackendError, TextMetrics};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Measures bound controls and splits them at page breaks.
///
/// The engine only talks to rendering through this trait, so the same
/// pagination can run against real font metrics or a fixed-metrics stand-in.
pub trait LayoutBackend {
    /// Final size of a bound control, honoring its CanGrow/CanShrink flags
    fn measure(&self, control: &Control) -> BackendResult<Size>;

    /// Split `control` so that the first piece is at most `max_height` tall.
    ///
    /// The first piece keeps the control's location and the second starts
    /// directly below it; together they cover the control's full height.
    /// A first piece of zero height means the control cannot be split there
    /// and has to move to the next page whole.
    fn break_at_most_at_height(
        &self,
        control: &Control,
        max_height: f64,
    ) -> BackendResult<(Control, Control)>;
}

/// Fixed-metrics backend: every grapheme has the same advance and every
/// wrapped line the same height.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMetricsBackend {
    metrics: TextMetrics,
}

impl TextMetricsBackend {
    pub fn new(metrics: TextMetrics) -> Self {
        Self { metrics }
    }

    /// Greedy word wrap at Unicode word boundaries. Explicit newlines always break.
    pub fn wrap(&self, text: &str, width: f64) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let columns = self.columns(width);
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut line = String::new();
            let mut line_len = 0;

            for word in paragraph.split_word_bounds() {
                let word_len = word.graphemes(true).count();
                if line_len > 0 && line_len + word_len > columns {
                    lines.push(line.trim_end().to_string());
                    line.clear();
                    line_len = 0;
                    if word.trim().is_empty() {
                        continue;
                    }
                }

                if word_len > columns {
                    for grapheme in word.graphemes(true) {
                        if line_len == columns {
                            lines.push(std::mem::take(&mut line));
                            line_len = 0;
                        }
                        line.push_str(grapheme);
                        line_len += 1;
                    }
                    continue;
                }

                line.push_str(word);
                line_len += word_len;
            }

            lines.push(line.trim_end().to_string());
        }

        lines
    }

    fn columns(&self, width: f64) -> usize {
        ((width / self.metrics.char_width).floor() as usize).max(1)
    }

    fn check_metrics(&self) -> BackendResult<()> {
        let TextMetrics {
            line_height,
            char_width,
        } = self.metrics;
        if line_height > 0.0 && char_width > 0.0 {
            Ok(())
        } else {
            Err(BackendError::Measure(format!(
                "invalid text metrics: line height {}, char width {}",
                line_height, char_width
            )))
        }
    }

    fn text_height(&self, text: &str, width: f64) -> f64 {
        self.wrap(text, width).len() as f64 * self.metrics.line_height
    }
}

impl LayoutBackend for TextMetricsBackend {
    fn measure(&self, control: &Control) -> BackendResult<Size> {
        match &control.kind {
            ControlKind::Text(text) => {
                self.check_metrics()?;
                let content = self.text_height(&text.text, control.width());
                Ok(Size::new(control.size.width, fit_height(control, content)))
            }
            _ => Ok(Size::new(control.width(), control.height())),
        }
    }

    fn break_at_most_at_height(
        &self,
        control: &Control,
        max_height: f64,
    ) -> BackendResult<(Control, Control)> {
        let max_height = max_height.clamp(0.0, control.height());

        match &control.kind {
            ControlKind::Text(text) => {
                self.check_metrics()?;
                let lines = self.wrap(&text.text, control.width());
                let fit = (((max_height + 1e-9) / self.metrics.line_height).floor() as usize)
                    .min(lines.len());

                // All text fits: the remainder is trailing padding
                let (first_height, first_text, rest_text) = if fit == lines.len() {
                    (max_height, text.text.clone(), String::new())
                } else {
                    (
                        fit as f64 * self.metrics.line_height,
                        lines[..fit].join("\n"),
                        lines[fit..].join("\n"),
                    )
                };

                let (mut first, mut second) = split_box(control, first_height);
                set_text(&mut first, first_text);
                set_text(&mut second, rest_text);
                Ok((first, second))
            }
            ControlKind::Line(_) | ControlKind::CrossSectionLine(_) => {
                let cut = control.top() + max_height;
                Ok((
                    clip_line(control, control.top(), cut),
                    clip_line(control, cut, control.bottom()),
                ))
            }
            ControlKind::Image(_) => Ok(split_box(control, 0.0)),
            ControlKind::SubReport(_) => Err(BackendError::Split(
                "sub-report placeholders are paginated by their own engine".into(),
            )),
        }
    }
}

fn fit_height(control: &Control, content: f64) -> f64 {
    let height = control.size.height;
    if (content > height && control.can_grow) || (content < height && control.can_shrink) {
        content
    } else {
        height
    }
}

fn split_box(control: &Control, first_height: f64) -> (Control, Control) {
    let mut first = control.clone();
    first.size.height = first_height;

    let mut second = control.clone();
    second.location.y = control.location.y + first_height;
    second.size.height = control.size.height - first_height;
    (first, second)
}

fn set_text(control: &mut Control, value: String) {
    if let ControlKind::Text(text) = &mut control.kind {
        text.text = value;
    }
}

/// The part of a line between two horizontal cuts
fn clip_line(control: &Control, from: f64, to: f64) -> Control {
    let mut piece = control.clone();
    if let Some(line) = control.line_geometry() {
        let start = control.location;
        let end = line.end;
        let dy = end.y - start.y;
        let clip = |p: Point| {
            let y = p.y.clamp(from, to);
            let x = if dy.abs() > f64::EPSILON {
                start.x + (end.x - start.x) * (y - start.y) / dy
            } else {
                p.x
            };
            Point::new(x, y)
        };

        piece.location = clip(start);
        if let Some(piece_line) = piece.line_geometry_mut() {
            piece_line.end = clip(end);
        }
    }
    piece.size = Size::new(piece.width(), piece.height());
    piece
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> TextMetricsBackend {
        TextMetricsBackend::new(TextMetrics {
            line_height: 10.0,
            char_width: 5.0,
        })
    }

    fn text_of(control: &Control) -> &str {
        control.text().unwrap_or_default()
    }

    #[test]
    fn test_wrap_breaks_at_word_boundaries() {
        // 10 columns
        let lines = backend().wrap("hello brave new world", 50.0);
        assert_eq!(lines, vec!["hello", "brave new", "world"]);
    }

    #[test]
    fn test_wrap_honors_newlines_and_long_words() {
        let lines = backend().wrap("ab\nabcdefghijkl", 50.0);
        assert_eq!(lines, vec!["ab", "abcdefghij", "kl"]);
        assert!(backend().wrap("", 50.0).is_empty());
    }

    #[test]
    fn test_measure_respects_grow_and_shrink() {
        let text = "one two three four five six";
        let fixed = Control::label(0.0, 0.0, 50.0, 15.0, text);
        assert_eq!(backend().measure(&fixed).unwrap().height, 15.0);

        let growing = fixed.clone().with_can_grow(true);
        assert_eq!(backend().measure(&growing).unwrap().height, 30.0);

        let shrinking = Control::label(0.0, 0.0, 50.0, 100.0, "short").with_can_shrink(true);
        assert_eq!(backend().measure(&shrinking).unwrap().height, 10.0);
    }

    #[test]
    fn test_text_split_on_line_boundary_conserves_height() {
        let text = (0..50).map(|i| format!("l{}", i)).collect::<Vec<_>>().join("\n");
        let mut control = Control::label(0.0, 20.0, 100.0, 10.0, text).with_can_grow(true);
        control.apply_size(backend().measure(&control).unwrap());
        assert_eq!(control.height(), 500.0);

        let (first, second) = backend().break_at_most_at_height(&control, 255.0).unwrap();
        assert_eq!(first.height(), 250.0);
        assert_eq!(second.height(), 250.0);
        assert_eq!(first.top(), 20.0);
        assert_eq!(second.top(), 270.0);
        assert!(text_of(&first).ends_with("l24"));
        assert!(text_of(&second).starts_with("l25"));
    }

    #[test]
    fn test_text_split_below_one_line_gives_empty_first_piece() {
        let control = Control::label(0.0, 0.0, 100.0, 40.0, "a\nb\nc\nd");
        let (first, second) = backend().break_at_most_at_height(&control, 5.0).unwrap();
        assert_eq!(first.height(), 0.0);
        assert_eq!(second.height(), 40.0);
    }

    #[test]
    fn test_images_are_not_split() {
        let control = Control::image(0.0, 0.0, 10.0, 80.0, Some("logo.png".into()));
        let (first, second) = backend().break_at_most_at_height(&control, 50.0).unwrap();
        assert_eq!(first.height(), 0.0);
        assert_eq!(second.height(), 80.0);
    }

    #[test]
    fn test_vertical_line_split_geometrically() {
        let line = Control::line(Point::new(5.0, 10.0), Point::new(5.0, 110.0), 1.0);
        let (first, second) = backend().break_at_most_at_height(&line, 30.0).unwrap();
        assert_eq!((first.top(), first.bottom()), (10.0, 40.0));
        assert_eq!((second.top(), second.bottom()), (40.0, 110.0));
    }

    #[test]
    fn test_sub_report_split_is_an_error() {
        let placeholder = Control::sub_report(
            0.0,
            0.0,
            10.0,
            10.0,
            report_model::Report::new("inner", 10.0, 10.0),
        );
        assert!(matches!(
            backend().break_at_most_at_height(&placeholder, 5.0),
            Err(BackendError::Split(_))
        ));
    }

    #[test]
    fn test_invalid_metrics_fail_measurement() {
        let broken = TextMetricsBackend::new(TextMetrics {
            line_height: 0.0,
            char_width: 5.0,
        });
        let control = Control::label(0.0, 0.0, 10.0, 10.0, "x");
        assert!(matches!(broken.measure(&control), Err(BackendError::Measure(_))));
    }
}
