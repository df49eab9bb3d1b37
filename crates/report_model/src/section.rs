//! Report sections (bands)

use serde::{Deserialize, Serialize};

use crate::{Color, Control, ControlId, Point};

/// Role of a section inside a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    ReportHeader,
    PageHeader,
    PageFooter,
    /// Header of the group at this nesting level (0 = outermost)
    GroupHeader(usize),
    Details,
    /// Footer of the group at this nesting level (0 = outermost)
    GroupFooter(usize),
    ReportFooter,
}

impl SectionKind {
    /// Page header and footer repeat on every page
    pub fn is_page_band(&self) -> bool {
        matches!(self, SectionKind::PageHeader | SectionKind::PageFooter)
    }

    /// Default section name for this role
    pub fn default_name(&self) -> String {
        match self {
            SectionKind::ReportHeader => "ReportHeader".to_string(),
            SectionKind::PageHeader => "PageHeader".to_string(),
            SectionKind::PageFooter => "PageFooter".to_string(),
            SectionKind::GroupHeader(i) => format!("GroupHeader{}", i),
            SectionKind::Details => "Details".to_string(),
            SectionKind::GroupFooter(i) => format!("GroupFooter{}", i),
            SectionKind::ReportFooter => "ReportFooter".to_string(),
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.default_name())
    }
}

/// A named band holding positioned controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Unique name, also the key of the continuation store
    pub name: String,
    pub kind: SectionKind,
    /// Horizontal offset of the band; the vertical offset is assigned at layout time
    #[serde(default)]
    pub location: Point,
    pub height: f64,
    #[serde(default)]
    pub can_grow: bool,
    #[serde(default)]
    pub can_shrink: bool,
    /// Never split across pages; retried whole on a fresh page instead
    #[serde(default)]
    pub keep_together: bool,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    /// Start a new page after this section (report header only)
    #[serde(default)]
    pub break_page_after: bool,
    #[serde(default)]
    pub background: Color,
    #[serde(default)]
    pub controls: Vec<Control>,
}

fn default_visible() -> bool {
    true
}

impl Section {
    /// Create an empty section of the given role
    pub fn new(name: impl Into<String>, kind: SectionKind, height: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            location: Point::default(),
            height,
            can_grow: false,
            can_shrink: false,
            keep_together: false,
            is_visible: true,
            break_page_after: false,
            background: Color::TRANSPARENT,
            controls: Vec::new(),
        }
    }

    /// Create an empty section named after its role
    pub fn of_kind(kind: SectionKind, height: f64) -> Self {
        Self::new(kind.default_name(), kind, height)
    }

    pub fn with_control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_can_grow(mut self, can_grow: bool) -> Self {
        self.can_grow = can_grow;
        self
    }

    pub fn with_can_shrink(mut self, can_shrink: bool) -> Self {
        self.can_shrink = can_shrink;
        self
    }

    pub fn with_keep_together(mut self, keep_together: bool) -> Self {
        self.keep_together = keep_together;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    pub fn with_break_page_after(mut self, break_page_after: bool) -> Self {
        self.break_page_after = break_page_after;
        self
    }

    pub fn add_control(&mut self, control: Control) {
        self.controls.push(control);
    }

    /// Clone the section and its controls into a runtime instance
    pub fn instantiate(&self) -> Section {
        let mut copy = self.empty_copy();
        copy.height = self.height;
        copy.controls = self.controls.iter().map(Control::instantiate).collect();
        copy
    }

    /// Copy of the section settings with no controls and zero height
    pub fn empty_copy(&self) -> Section {
        Section {
            name: self.name.clone(),
            kind: self.kind,
            location: self.location,
            height: 0.0,
            can_grow: self.can_grow,
            can_shrink: self.can_shrink,
            keep_together: self.keep_together,
            is_visible: self.is_visible,
            break_page_after: self.break_page_after,
            background: self.background,
            controls: Vec::new(),
        }
    }

    /// Controls ordered by their top edge; equal tops keep template order
    pub fn ordered_controls(&self) -> Vec<Control> {
        let mut ordered = self.controls.clone();
        ordered.sort_by(|a, b| a.top().total_cmp(&b.top()));
        ordered
    }

    /// Bottom edge of the lowest control, 0 for an empty section
    pub fn max_control_bottom(&self) -> f64 {
        self.controls.iter().map(Control::bottom).fold(0.0, f64::max)
    }

    /// Find a control by ID among this section's controls, descending into sub-reports
    pub fn find_control(&self, id: ControlId) -> Option<&Control> {
        self.controls.iter().find_map(|c| {
            if c.id == id {
                return Some(c);
            }
            match &c.kind {
                crate::ControlKind::SubReport(sub) => sub.report.template_control(id),
                _ => None,
            }
        })
    }
}
