//! Report pagination engine
//!
//! The engine walks the report's sections as a state machine, lays each one
//! out against the height left on the current page and stacks the placed
//! controls into [`Page`]s. Content that does not fit is carried to the next
//! page through the continuation store.

mod layout;
mod subreport;
mod transition;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use report_data::DataCursor;
use report_model::{
    Control, ControlId, ControlKind, Page, PlacedSection, Point, Report, Section, SectionKind,
};

use crate::{ContinuationStore, LayoutBackend, LayoutConfig, LayoutError, Result, SpanTracker};

pub use subreport::{SubReportChunk, SubReportDelegate};

/// Outcome of a cancellable run
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub pages: Vec<Page>,
    /// False when the run was cancelled before the report footer
    pub completed: bool,
}

/// A cross-section line still waiting for its end section
#[derive(Debug, Clone)]
struct OpenCrossLine {
    x: f64,
    line_width: f64,
    end_section: String,
    end_y: f64,
}

/// Paginates one report against one data cursor.
///
/// Each engine owns all of its mutable state; concurrent paginations need
/// separate engines.
pub struct ReportEngine<'a> {
    /// Template being paginated; never mutated
    report: &'a Report,
    /// Row source, sorted by the group fields on construction
    cursor: Box<dyn DataCursor + 'a>,
    config: LayoutConfig,
    /// Pages produced so far, the last one still open
    pages: Vec<Page>,

    // Current page
    page_height: f64,
    /// Height still available for body sections
    height_left: f64,
    /// Height consumed by every section placed so far, footer included
    height_used: f64,
    /// Added to body offsets; cancels the footer height counted in `height_used`
    span_correction: f64,
    /// Height of the footer buffered for this page
    footer_height: f64,
    /// Page header and footer already handled on this page
    page_bands_done: bool,
    /// A body section has placed content on this page
    body_started: bool,

    // Current section
    /// Runtime instance of the section being laid out
    current: Section,
    /// Its controls not yet laid out, by top
    ordered: Vec<Control>,
    spans: SpanTracker,
    /// Controls placed by the current section, in section coordinates
    buffer: Vec<Control>,
    /// Page footer controls, placed when the page closes
    footer_buffer: Vec<Control>,
    /// Index of the first control that did not fit
    overflow_index: Option<usize>,

    // Sequencing
    continuations: ContinuationStore,
    /// Section to resume after the page bands of the next page
    resume: Option<SectionKind>,
    /// Last cursor advance landed on a row
    has_more_rows: bool,
    /// Key captured by each group header, outermost first
    group_keys: Vec<Option<String>>,
    /// Outermost group level whose footer closes the current break
    group_stop: usize,
    /// Cross-section lines waiting for their end section
    open_lines: Vec<OpenCrossLine>,
    /// Report footer done
    stop: bool,

    // Nested reports
    /// Running sub-reports keyed by their placeholder's template id
    subreports: HashMap<ControlId, SubReportDelegate<'a>>,
    /// Sub-reports advanced during the current section pass
    touched_subreports: Vec<ControlId>,
    is_subreport: bool,
    /// Offset applied to placed controls when running as a sub-report
    location: Point,
    /// Let a page end with nothing placed instead of failing
    tolerate_empty_page: bool,
}

impl<'a> ReportEngine<'a> {
    /// Create an engine with the default configuration
    pub fn new(report: &'a Report, cursor: impl DataCursor + 'a) -> Result<Self> {
        Self::with_config(report, cursor, LayoutConfig::default())
    }

    pub fn with_config(
        report: &'a Report,
        cursor: impl DataCursor + 'a,
        config: LayoutConfig,
    ) -> Result<Self> {
        Self::build(report, Box::new(cursor), config)
    }

    fn build(
        report: &'a Report,
        mut cursor: Box<dyn DataCursor + 'a>,
        config: LayoutConfig,
    ) -> Result<Self> {
        config.validate()?;
        report.validate()?;

        let sort_fields: Vec<String> = report
            .groups
            .iter()
            .filter(|g| !g.field_name.is_empty())
            .map(|g| g.field_name.clone())
            .collect();
        if !sort_fields.is_empty() {
            cursor.apply_sort(&sort_fields);
        }

        let mut engine = Self {
            report,
            cursor,
            config,
            pages: Vec::new(),
            page_height: report.height,
            height_left: report.height,
            height_used: 0.0,
            span_correction: 0.0,
            footer_height: 0.0,
            page_bands_done: false,
            body_started: false,
            current: report.report_header.empty_copy(),
            ordered: Vec::new(),
            spans: SpanTracker::new(),
            buffer: Vec::new(),
            footer_buffer: Vec::new(),
            overflow_index: None,
            continuations: ContinuationStore::new(),
            resume: None,
            has_more_rows: false,
            group_keys: vec![None; report.groups.len()],
            group_stop: 0,
            open_lines: Vec::new(),
            stop: false,
            subreports: HashMap::new(),
            touched_subreports: Vec::new(),
            is_subreport: false,
            location: Point::default(),
            tolerate_empty_page: false,
        };
        engine.open_page(report.height)?;
        engine.enter(SectionKind::ReportHeader)?;
        Ok(engine)
    }

    /// Paginate the whole report
    pub fn process(mut self, backend: &dyn LayoutBackend) -> Result<Vec<Page>> {
        self.run(backend, None)?;
        Ok(self.pages)
    }

    /// Paginate until done or until `cancel` is raised between two pages
    pub fn process_cancellable(
        mut self,
        backend: &dyn LayoutBackend,
        cancel: &AtomicBool,
    ) -> Result<Pagination> {
        let completed = self.run(backend, Some(cancel))?;
        Ok(Pagination {
            pages: self.pages,
            completed,
        })
    }

    fn run(&mut self, backend: &dyn LayoutBackend, cancel: Option<&AtomicBool>) -> Result<bool> {
        loop {
            if self.process_page(backend)? {
                tracing::debug!(
                    "Report '{}' finished on {} page(s)",
                    self.report.title,
                    self.pages.len()
                );
                return Ok(true);
            }
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                self.close_page();
                tracing::debug!(
                    "Report '{}' cancelled after {} page(s)",
                    self.report.title,
                    self.pages.len()
                );
                return Ok(false);
            }
            self.open_page(self.report.height)?;
            self.enter(SectionKind::PageHeader)?;
        }
    }

    /// Place sections on the current page. Returns true once the report footer is done.
    fn process_page(&mut self, backend: &dyn LayoutBackend) -> Result<bool> {
        while !self.stop {
            let kind = self.current.kind;

            // Fixed-height sections move to the next page whole
            if !self.current.can_grow && !self.fits(self.current.height, self.height_left) {
                self.overflow_index = None;
                self.defer_section()?;
                return Ok(false);
            }

            self.touched_subreports.clear();
            let finished = self.layout_section(backend, self.height_left)?;

            if finished {
                self.commit_section(true);
                self.next_section()?;
            } else if self.current.keep_together || kind.is_page_band() {
                self.buffer.clear();
                self.continuations.discard(&self.current.name);
                for id in self.touched_subreports.drain(..) {
                    self.subreports.remove(&id);
                }
                tracing::debug!(
                    "Section '{}' does not fit on page {}, retrying it whole",
                    self.current.name,
                    self.pages.len()
                );
                self.defer_section()?;
                return Ok(false);
            } else {
                if !self.body_started && self.buffer.is_empty() && !self.tolerate_empty_page {
                    return Err(self.unplaceable());
                }
                self.commit_section(false);
                self.resume = Some(kind);
                tracing::debug!(
                    "Section '{}' continues after page {}",
                    self.current.name,
                    self.pages.len()
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Leave the current section for the next page
    fn defer_section(&mut self) -> Result<()> {
        if !self.body_started && !self.tolerate_empty_page {
            return Err(self.unplaceable());
        }
        self.resume = if self.current.kind.is_page_band() {
            None
        } else {
            Some(self.current.kind)
        };
        Ok(())
    }

    fn unplaceable(&self) -> LayoutError {
        let section = self.current.name.clone();
        if self.current.kind.is_page_band() {
            LayoutError::PageBandOverflow { section }
        } else {
            LayoutError::Unplaceable {
                section,
                control_index: self.overflow_index,
            }
        }
    }

    /// Move the buffered controls of the current section onto the page
    fn commit_section(&mut self, finished: bool) {
        let consumed = if finished {
            self.current.height
        } else {
            self.height_left.max(0.0)
        };
        let controls = std::mem::take(&mut self.buffer);

        if self.current.kind == SectionKind::PageFooter {
            // Anchored to the page bottom when the page closes
            self.footer_height = consumed;
            self.span_correction -= consumed;
            self.footer_buffer.extend(controls);
            self.record_band(self.page_height - consumed, consumed);
        } else {
            let offset = self.height_used + self.span_correction;
            if !self.current.kind.is_page_band() && (consumed > 0.0 || !controls.is_empty()) {
                self.body_started = true;
            }
            self.place_controls(controls, offset);
            self.record_band(offset, consumed);
        }

        self.height_left -= consumed;
        self.height_used += consumed;
    }

    fn record_band(&mut self, top: f64, height: f64) {
        if let Some(page) = self.pages.last_mut() {
            page.sections.push(PlacedSection {
                name: self.current.name.clone(),
                kind: self.current.kind,
                top,
                height,
            });
        }
    }

    fn place_controls(&mut self, controls: Vec<Control>, offset: f64) {
        let origin = if self.is_subreport {
            self.location
        } else {
            Point::default()
        };
        if let Some(page) = self.pages.last_mut() {
            for mut control in controls {
                control.move_by_x(origin.x);
                control.move_by_y(offset + origin.y);
                page.controls.push(control);
            }
        }
    }

    /// Flush the pending footer and start a new page
    fn open_page(&mut self, height: f64) -> Result<()> {
        self.close_page();
        if let Some(max) = self.config.max_pages {
            if self.pages.len() >= max {
                return Err(LayoutError::PageLimitExceeded(max));
            }
        }

        let number = self.pages.len() + 1;
        self.pages.push(Page::new(number, height));
        self.page_height = height;
        self.height_left = height;
        self.height_used = 0.0;
        self.span_correction = 0.0;
        self.footer_height = 0.0;
        self.page_bands_done = false;
        self.body_started = false;

        tracing::debug!("Opened page {} (height {})", number, height);
        Ok(())
    }

    /// Place the buffered page footer at the bottom of the current page
    fn close_page(&mut self) {
        if self.footer_buffer.is_empty() {
            return;
        }
        let controls = std::mem::take(&mut self.footer_buffer);
        self.place_controls(controls, self.page_height - self.footer_height);
    }

    fn finish(&mut self) {
        self.close_page();
        self.stop = true;
    }

    fn fits(&self, bottom: f64, threshold: f64) -> bool {
        bottom <= threshold + self.config.epsilon
    }

    /// Make `kind` the current section, resuming its continuation if one is stored
    fn select_section(&mut self, kind: SectionKind) -> Result<()> {
        let report = self.report;
        let template = report
            .section(kind)
            .ok_or(LayoutError::MissingSection(kind))?;

        let (mut section, mut ordered, resumed) = match self.continuations.take(&template.name) {
            Some(continuation) => {
                let mut ordered = continuation.controls;
                ordered.sort_by(|a, b| a.top().total_cmp(&b.top()));
                (continuation.section, ordered, true)
            }
            None => {
                let mut section = template.instantiate();
                let ordered = section.ordered_controls();
                section.controls.clear();
                (section, ordered, false)
            }
        };
        section.location = Point::new(template.location.x, 0.0);

        if !resumed && !kind.is_page_band() {
            self.route_cross_lines(&section, &mut ordered);
        }

        tracing::trace!(
            "Selected section '{}' (resumed: {}, {} controls)",
            section.name,
            resumed,
            ordered.len()
        );
        self.current = section;
        self.ordered = ordered;
        self.spans.clear();
        self.buffer.clear();
        Ok(())
    }

    /// Add segments of lines crossing into this section and register lines starting in it
    fn route_cross_lines(&mut self, section: &Section, ordered: &mut Vec<Control>) {
        let mut segments = Vec::new();
        for line in std::mem::take(&mut self.open_lines) {
            if line.end_section == section.name {
                segments.push(Control::line(
                    Point::new(line.x, 0.0),
                    Point::new(line.x, line.end_y),
                    line.line_width,
                ));
            } else {
                segments.push(Control::extended_line(line.x, 0.0, line.line_width));
                self.open_lines.push(line);
            }
        }

        for control in ordered.iter_mut() {
            if let ControlKind::CrossSectionLine(cross) = &mut control.kind {
                if cross.end_section == section.name {
                    cross.line.end.y = cross.end_y;
                    cross.line.extend_to_bottom = false;
                } else {
                    self.open_lines.push(OpenCrossLine {
                        x: control.location.x,
                        line_width: cross.line.line_width,
                        end_section: cross.end_section.clone(),
                        end_y: cross.end_y,
                    });
                }
            }
        }

        ordered.splice(0..0, segments);
    }
}
