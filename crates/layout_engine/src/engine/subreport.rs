//! Sub-reports: nested engines paginated chunk by chunk inside a parent section

use std::collections::hash_map::Entry;

use report_data::{DataCursor, EmptyDataSource};
use report_model::{Control, ControlId, ControlKind, Point, SectionKind, SubReportControl};

use super::layout::SectionPass;
use super::ReportEngine;
use crate::{LayoutBackend, LayoutConfig, LayoutError, Result};

/// Controls a nested report produced for one parent page
#[derive(Debug, Clone, PartialEq)]
pub struct SubReportChunk {
    /// Placed controls, translated into the parent section's coordinates
    pub controls: Vec<Control>,
    pub finished: bool,
}

/// Drives the private engine of one sub-report placeholder
pub struct SubReportDelegate<'a> {
    engine: ReportEngine<'a>,
    chunks: usize,
    progressed: bool,
}

impl<'a> SubReportDelegate<'a> {
    pub fn new(sub: &'a SubReportControl, config: LayoutConfig) -> Result<Self> {
        let cursor: Box<dyn DataCursor + 'a> = match &sub.data {
            Some(data) => Box::new(data.clone()),
            None => Box::new(EmptyDataSource),
        };
        let mut engine = ReportEngine::build(&sub.report, cursor, config)?;
        engine.is_subreport = true;
        Ok(Self {
            engine,
            chunks: 0,
            progressed: true,
        })
    }

    /// Paginate the next slice of the nested report.
    ///
    /// The nested page is `threshold` tall, the parent's remaining height taken
    /// as is, and its content is moved by `offset`. A slice where nothing fits
    /// is tolerated once so the parent can carry the placeholder to a fresh page.
    pub fn next_chunk(
        &mut self,
        backend: &dyn LayoutBackend,
        threshold: f64,
        offset: Point,
    ) -> Result<SubReportChunk> {
        let engine = &mut self.engine;
        engine.location = offset;
        if self.chunks == 0 {
            engine.page_height = threshold;
            engine.height_left = threshold;
            if let Some(page) = engine.pages.last_mut() {
                page.height = threshold;
            }
        } else {
            engine.open_page(threshold)?;
            engine.enter(SectionKind::PageHeader)?;
        }
        self.chunks += 1;

        engine.tolerate_empty_page = self.progressed;
        let finished = engine.process_page(backend)?;
        if !finished {
            engine.close_page();
        }
        self.progressed = engine.body_started;

        let controls = engine
            .pages
            .last_mut()
            .map(|page| std::mem::take(&mut page.controls))
            .unwrap_or_default();
        Ok(SubReportChunk { controls, finished })
    }
}

impl<'a> ReportEngine<'a> {
    /// Lay out a sub-report placeholder: its nested content is positioned
    /// below the placeholder's (shifted) top and goes through the same
    /// fit/split rules as the section's own controls.
    pub(super) fn layout_sub_report(
        &mut self,
        backend: &dyn LayoutBackend,
        pass: &mut SectionPass,
        mut control: Control,
        index: usize,
        span: f64,
        original_bottom: f64,
    ) -> Result<()> {
        let key = control.template_id();
        let offset = Point::new(control.left(), control.top());
        let chunk = self.next_sub_report_chunk(key, backend, pass.threshold, offset)?;
        if !self.touched_subreports.contains(&key) {
            self.touched_subreports.push(key);
        }

        let shifted_bottom = control.bottom();
        let content_bottom = chunk
            .controls
            .iter()
            .map(Control::bottom)
            .fold(control.top(), f64::max);
        if (content_bottom > shifted_bottom && control.can_grow)
            || (content_bottom < shifted_bottom && control.can_shrink)
        {
            control.size.height = content_bottom - control.top();
        }
        self.spans
            .record(original_bottom, span + control.bottom() - shifted_bottom);
        pass.max_height = pass.max_height.max(control.bottom());

        for piece in chunk.controls {
            self.place_or_break(backend, pass, piece, index)?;
        }

        if !chunk.finished {
            pass.fits = false;
            self.overflow_index.get_or_insert(index);
            // Resume below whatever nested content was carried over
            let top = if pass.real_break > 0.0 {
                (content_bottom - pass.real_break).max(0.0)
            } else {
                0.0
            };
            control.set_top(top);
            self.continuations
                .push(&self.current, control, pass.margin_bottom);
        }
        Ok(())
    }

    fn next_sub_report_chunk(
        &mut self,
        key: ControlId,
        backend: &dyn LayoutBackend,
        threshold: f64,
        offset: Point,
    ) -> Result<SubReportChunk> {
        let report = self.report;
        let delegate = match self.subreports.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let sub = match report.template_control(key).map(|c| &c.kind) {
                    Some(ControlKind::SubReport(sub)) => sub,
                    _ => return Err(LayoutError::MissingSubReport(key)),
                };
                tracing::debug!("Starting sub-report '{}'", sub.report.title);
                entry.insert(SubReportDelegate::new(sub, self.config.clone())?)
            }
        };

        let chunk = delegate.next_chunk(backend, threshold, offset)?;
        if chunk.finished {
            self.subreports.remove(&key);
        }
        Ok(chunk)
    }
}
