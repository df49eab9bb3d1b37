//! Height-threshold layout of the current section

use report_model::{Control, ControlKind, Size};

use super::ReportEngine;
use crate::{BackendError, LayoutBackend, LayoutError, Result};

/// Running state of one section pass
pub(super) struct SectionPass {
    pub(super) threshold: f64,
    /// Space between the lowest template control and the section bottom
    pub(super) margin_bottom: f64,
    /// Section coordinate that becomes y = 0 on the next page
    pub(super) real_break: f64,
    pub(super) max_height: f64,
    pub(super) fits: bool,
}

impl<'a> ReportEngine<'a> {
    /// Lay the current section out against `threshold`.
    ///
    /// Returns true when the whole section fits. Placed controls end up in the
    /// section buffer; overflow goes to the continuation store.
    pub(super) fn layout_section(
        &mut self,
        backend: &dyn LayoutBackend,
        threshold: f64,
    ) -> Result<bool> {
        let content_bottom = self.ordered.iter().map(Control::bottom).fold(0.0, f64::max);
        let mut pass = SectionPass {
            threshold,
            margin_bottom: (self.current.height - content_bottom).max(0.0),
            real_break: 0.0,
            max_height: 0.0,
            fits: true,
        };
        let mut extended = Vec::new();
        self.overflow_index = None;

        let ordered = std::mem::take(&mut self.ordered);
        for (index, mut control) in ordered.into_iter().enumerate() {
            if !control.is_visible {
                continue;
            }
            control.assign_value(self.cursor.as_ref());

            let original_top = control.top();
            let original_bottom = control.bottom();
            let span = self.spans.span_for(original_top);
            control.move_by_y(span);
            let shifted_bottom = control.bottom();

            if matches!(control.kind, ControlKind::SubReport(_)) {
                self.layout_sub_report(backend, &mut pass, control, index, span, original_bottom)?;
                continue;
            }

            let size = backend
                .measure(&control)
                .map_err(|source| self.backend_error(index, source))?;
            control.apply_size(size);
            self.spans
                .record(original_bottom, span + control.bottom() - shifted_bottom);

            if control.extends_to_bottom() {
                extended.push(control);
            } else {
                self.place_or_break(backend, &mut pass, control, index)?;
            }
        }

        let height_with_margin = pass.max_height + pass.margin_bottom;
        let overflowing = !self.fits(height_with_margin, threshold);
        if overflowing {
            pass.fits = false;
        }
        let section = &mut self.current;
        if !overflowing
            && ((height_with_margin > section.height && section.can_grow)
                || (height_with_margin < section.height && section.can_shrink))
        {
            section.height = height_with_margin;
        }

        // Nothing was deferred but the section still ran past the threshold:
        // carry the rest of its bottom margin instead of re-running the row
        if !pass.fits
            && self.current.can_grow
            && !self.current.keep_together
            && !self.continuations.contains(&self.current.name)
        {
            let break_line = if pass.real_break > 0.0 {
                pass.real_break
            } else {
                threshold
            };
            let remaining = (height_with_margin - break_line).max(0.0);
            tracing::trace!(
                "Carrying {} of trailing margin of '{}' to the next page",
                remaining,
                self.current.name
            );
            self.continuations.reserve(&self.current, remaining);
        }

        let carry_lines = overflowing && self.current.can_grow;
        self.stretch_lines(extended, &pass, carry_lines);

        // Fixed sections clip: whatever did not fit is dropped
        if !self.current.can_grow {
            self.continuations.discard(&self.current.name);
            for id in self.touched_subreports.drain(..) {
                self.subreports.remove(&id);
            }
            return Ok(true);
        }
        Ok(pass.fits)
    }

    /// Buffer a positioned control, or split/defer the part below the threshold
    pub(super) fn place_or_break(
        &mut self,
        backend: &dyn LayoutBackend,
        pass: &mut SectionPass,
        control: Control,
        index: usize,
    ) -> Result<()> {
        let bottom = control.bottom();
        pass.max_height = pass.max_height.max(bottom);
        if self.fits(bottom, pass.threshold) {
            self.buffer.push(control);
            return Ok(());
        }

        pass.fits = false;
        self.overflow_index.get_or_insert(index);
        if self.current.keep_together {
            self.buffer.push(control);
            return Ok(());
        }
        if pass.real_break == 0.0 {
            pass.real_break = pass.threshold;
        }

        if control.top() >= pass.threshold {
            tracing::trace!(
                "Deferring control {} of '{}' to the next page",
                index,
                self.current.name
            );
            self.defer(pass, control);
            return Ok(());
        }

        let break_height = pass.threshold - control.top();
        let (first, second) = backend
            .break_at_most_at_height(&control, break_height)
            .map_err(|source| self.backend_error(index, source))?;

        if first.height() > break_height + self.config.epsilon {
            return Err(self.backend_error(
                index,
                BackendError::Split(format!(
                    "first piece is {} tall, limit was {}",
                    first.height(),
                    break_height
                )),
            ));
        }
        if first.height() <= self.config.epsilon {
            self.defer(pass, control);
            return Ok(());
        }

        tracing::debug!(
            "Split control {} of '{}': {} here, {} on the next page",
            index,
            self.current.name,
            first.height(),
            second.height()
        );
        pass.real_break = first.bottom();
        self.buffer.push(first);
        if second.height() > self.config.epsilon {
            self.defer(pass, second);
        }
        Ok(())
    }

    /// Store a control for the next page, rebased so the break line is y = 0
    fn defer(&mut self, pass: &SectionPass, mut control: Control) {
        control.move_by_y(-pass.real_break);
        if control.top() < 0.0 {
            control.set_top(0.0);
        }
        self.continuations
            .push(&self.current, control, pass.margin_bottom);
    }

    /// Stretch extend-to-bottom lines to the section bottom
    fn stretch_lines(&mut self, lines: Vec<Control>, pass: &SectionPass, carry_over: bool) {
        let bottom = if carry_over {
            pass.threshold
        } else {
            self.current.height
        };

        for mut line in lines {
            let horizontal = line
                .line_geometry()
                .is_some_and(|g| g.end.y == line.location.y && g.end.x != line.location.x);
            let line_width = line.line_geometry().map_or(0.0, |g| g.line_width);

            if horizontal {
                // Bottom border: drawn under the last piece of the section only
                if carry_over {
                    line.set_top(0.0);
                    self.continuations
                        .push(&self.current, line, pass.margin_bottom);
                    continue;
                }
                line.set_top(bottom - line_width / 2.0);
            } else {
                let end_is_lower = line
                    .line_geometry()
                    .is_some_and(|g| g.end.y >= line.location.y);
                if end_is_lower {
                    if let Some(geometry) = line.line_geometry_mut() {
                        geometry.end.y = bottom;
                    }
                } else {
                    line.location.y = bottom;
                }

                if carry_over {
                    // Zero length until stretched again on the next page
                    let mut rest = line.clone();
                    rest.location.y = 0.0;
                    if let Some(geometry) = rest.line_geometry_mut() {
                        geometry.end.y = 0.0;
                    }
                    self.continuations
                        .push(&self.current, rest, pass.margin_bottom);
                }
            }

            line.apply_size(Size::new(line.width(), line.height()));
            self.buffer.push(line);
        }
    }

    fn backend_error(&self, control_index: usize, source: BackendError) -> LayoutError {
        LayoutError::Backend {
            section: self.current.name.clone(),
            control_index,
            source,
        }
    }
}
