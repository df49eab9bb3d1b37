//! Positioned report controls

use report_data::{DataCursor, DataSource};
use serde::{Deserialize, Serialize};

use crate::{Color, ControlId, Point, Report, Size};

/// A positioned, sized, data-bindable element of a section.
///
/// Coordinates are local to the section holding the control until the
/// engine places it on a page, where they become absolute page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    /// Identity of this control
    pub id: ControlId,
    /// Template this runtime instance was cloned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ControlId>,
    /// Top-left corner (the start point for lines)
    pub location: Point,
    /// Template size; lines derive their extent from their end point instead
    pub size: Size,
    /// Background fill
    #[serde(default)]
    pub background: Color,
    /// Whether the control may grow to fit its content
    #[serde(default)]
    pub can_grow: bool,
    /// Whether the control may shrink to fit its content
    #[serde(default)]
    pub can_shrink: bool,
    /// Hidden controls are skipped by layout
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    /// Set once the control has pulled its value from a data row
    #[serde(skip)]
    pub bound: bool,
    /// Variant-specific payload
    pub kind: ControlKind,
}

fn default_visible() -> bool {
    true
}

/// Control variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlKind {
    /// Static label or field-bound text
    Text(TextControl),
    /// Static or field-bound image
    Image(ImageControl),
    /// Straight line inside one section
    Line(LineControl),
    /// Vertical line running from one section down into a later one
    CrossSectionLine(CrossSectionLine),
    /// Nested report paginated by its own engine
    SubReport(SubReportControl),
}

/// Text content, optionally bound to a data field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextControl {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

/// Image reference, optionally bound to a data field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageControl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

/// Line geometry; the start point is the control location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineControl {
    pub end: Point,
    pub line_width: f64,
    /// Stretch the line to the bottom of its section after layout
    #[serde(default)]
    pub extend_to_bottom: bool,
}

/// A vertical line that starts in one section and ends in another.
///
/// Inside the start section it behaves like an extend-to-bottom line; the
/// sections in between receive full-height segments and the end section a
/// segment from its top down to `end_y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionLine {
    pub line: LineControl,
    pub start_section: String,
    pub end_section: String,
    /// End point offset inside the end section
    pub end_y: f64,
}

/// A nested report with its own rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubReportControl {
    pub report: Box<Report>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataSource>,
}

impl Control {
    fn with_kind(location: Point, size: Size, kind: ControlKind) -> Self {
        Self {
            id: ControlId::new(),
            template: None,
            location,
            size,
            background: Color::TRANSPARENT,
            can_grow: false,
            can_shrink: false,
            is_visible: true,
            bound: false,
            kind,
        }
    }

    /// Create a static text label
    pub fn label(x: f64, y: f64, width: f64, height: f64, text: impl Into<String>) -> Self {
        Self::with_kind(
            Point::new(x, y),
            Size::new(width, height),
            ControlKind::Text(TextControl {
                text: text.into(),
                field_name: None,
            }),
        )
    }

    /// Create a text control bound to a data field
    pub fn field(x: f64, y: f64, width: f64, height: f64, field_name: impl Into<String>) -> Self {
        Self::with_kind(
            Point::new(x, y),
            Size::new(width, height),
            ControlKind::Text(TextControl {
                text: String::new(),
                field_name: Some(field_name.into()),
            }),
        )
    }

    /// Create an image control
    pub fn image(x: f64, y: f64, width: f64, height: f64, source: Option<String>) -> Self {
        Self::with_kind(
            Point::new(x, y),
            Size::new(width, height),
            ControlKind::Image(ImageControl {
                source,
                field_name: None,
            }),
        )
    }

    /// Create a line from `start` to `end`
    pub fn line(start: Point, end: Point, line_width: f64) -> Self {
        let size = Size::new((end.x - start.x).abs(), (end.y - start.y).abs());
        Self::with_kind(
            start,
            size,
            ControlKind::Line(LineControl {
                end,
                line_width,
                extend_to_bottom: false,
            }),
        )
    }

    /// Create a vertical line that stretches to the bottom of its section
    pub fn extended_line(x: f64, y: f64, line_width: f64) -> Self {
        let start = Point::new(x, y);
        Self::with_kind(
            start,
            Size::default(),
            ControlKind::Line(LineControl {
                end: start,
                line_width,
                extend_to_bottom: true,
            }),
        )
    }

    /// Create a line running from `start` in `start_section` down to `end_y` in `end_section`
    pub fn cross_section_line(
        start: Point,
        start_section: impl Into<String>,
        end_section: impl Into<String>,
        end_y: f64,
        line_width: f64,
    ) -> Self {
        Self::with_kind(
            start,
            Size::default(),
            ControlKind::CrossSectionLine(CrossSectionLine {
                line: LineControl {
                    end: start,
                    line_width,
                    extend_to_bottom: true,
                },
                start_section: start_section.into(),
                end_section: end_section.into(),
                end_y,
            }),
        )
    }

    /// Create a sub-report placeholder
    pub fn sub_report(x: f64, y: f64, width: f64, height: f64, report: Report) -> Self {
        Self::with_kind(
            Point::new(x, y),
            Size::new(width, height),
            ControlKind::SubReport(SubReportControl {
                report: Box::new(report),
                data: None,
            }),
        )
    }

    /// Attach rows to a sub-report placeholder
    pub fn with_sub_report_data(mut self, data: DataSource) -> Self {
        if let ControlKind::SubReport(sub) = &mut self.kind {
            sub.data = Some(data);
        }
        self
    }

    /// Bind an image control to a data field
    pub fn with_image_field(mut self, field_name: impl Into<String>) -> Self {
        if let ControlKind::Image(image) = &mut self.kind {
            image.field_name = Some(field_name.into());
        }
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

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Clone this control into a runtime instance.
    ///
    /// The copy gets a fresh identity and points back at the root template,
    /// so re-cloning a clone still resolves to the original template.
    pub fn instantiate(&self) -> Control {
        let mut copy = self.clone();
        copy.id = ControlId::new();
        copy.template = Some(self.template.unwrap_or(self.id));
        copy
    }

    /// ID of the template this control came from (itself for templates)
    pub fn template_id(&self) -> ControlId {
        self.template.unwrap_or(self.id)
    }

    /// Pull bound values from the current row. Binding happens once per instance.
    pub fn assign_value(&mut self, cursor: &dyn DataCursor) {
        if self.bound {
            return;
        }
        match &mut self.kind {
            ControlKind::Text(text) => {
                if let Some(field) = &text.field_name {
                    text.text = cursor.value_or_default(field);
                }
            }
            ControlKind::Image(image) => {
                if let Some(field) = &image.field_name {
                    let value = cursor.value_or_default(field);
                    image.source = (!value.is_empty()).then_some(value);
                }
            }
            ControlKind::Line(_) | ControlKind::CrossSectionLine(_) | ControlKind::SubReport(_) => {}
        }
        self.bound = true;
    }

    /// Line geometry, for both plain and cross-section lines
    pub fn line_geometry(&self) -> Option<&LineControl> {
        match &self.kind {
            ControlKind::Line(line) => Some(line),
            ControlKind::CrossSectionLine(cross) => Some(&cross.line),
            _ => None,
        }
    }

    pub fn line_geometry_mut(&mut self) -> Option<&mut LineControl> {
        match &mut self.kind {
            ControlKind::Line(line) => Some(line),
            ControlKind::CrossSectionLine(cross) => Some(&mut cross.line),
            _ => None,
        }
    }

    /// Whether layout stretches this line to the bottom of its section
    pub fn extends_to_bottom(&self) -> bool {
        self.line_geometry().is_some_and(|l| l.extend_to_bottom)
    }

    /// Text content, if this is a text control
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ControlKind::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    pub fn left(&self) -> f64 {
        self.location.x
    }

    pub fn top(&self) -> f64 {
        match self.line_geometry() {
            Some(line) => self.location.y.min(line.end.y),
            None => self.location.y,
        }
    }

    pub fn bottom(&self) -> f64 {
        match self.line_geometry() {
            Some(line) => self.location.y.max(line.end.y),
            None => self.location.y + self.size.height,
        }
    }

    pub fn width(&self) -> f64 {
        match self.line_geometry() {
            Some(line) => (line.end.x - self.location.x).abs(),
            None => self.size.width,
        }
    }

    pub fn height(&self) -> f64 {
        self.bottom() - self.top()
    }

    /// Move the control vertically; lines move both end points
    pub fn move_by_y(&mut self, dy: f64) {
        self.location.y += dy;
        if let Some(line) = self.line_geometry_mut() {
            line.end.y += dy;
        }
    }

    /// Move the control horizontally; lines move both end points
    pub fn move_by_x(&mut self, dx: f64) {
        self.location.x += dx;
        if let Some(line) = self.line_geometry_mut() {
            line.end.x += dx;
        }
    }

    /// Move the control so that its top edge sits at `y`
    pub fn set_top(&mut self, y: f64) {
        let dy = y - self.top();
        self.move_by_y(dy);
    }

    /// Apply a measured size. Lines keep their end-point geometry.
    pub fn apply_size(&mut self, size: Size) {
        if self.line_geometry().is_none() {
            self.size = size;
        } else {
            self.size = Size::new(self.width(), self.height());
        }
    }

    /// Bottom margin between this control and the bottom edge of a section of `section_height`
    pub fn bottom_margin_in(&self, section_height: f64) -> f64 {
        section_height - self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_data::{EmptyDataSource, Value};

    #[test]
    fn test_instantiate_points_at_root_template() {
        let template = Control::label(0.0, 10.0, 100.0, 20.0, "Total");
        let first = template.instantiate();
        let second = first.instantiate();

        assert_ne!(first.id, template.id);
        assert_eq!(first.template, Some(template.id));
        assert_eq!(second.template, Some(template.id));
        assert_eq!(second.template_id(), template.id);
        assert_eq!(second.location, template.location);
    }

    #[test]
    fn test_assign_value_binds_once() {
        let mut rows = DataSource::from_rows("r", ["name"], vec![vec!["Ada"], vec!["Grace"]]);
        rows.advance();

        let mut control = Control::field(0.0, 0.0, 50.0, 10.0, "name");
        control.assign_value(&rows);
        assert_eq!(control.text(), Some("Ada"));

        rows.advance();
        control.assign_value(&rows);
        assert_eq!(control.text(), Some("Ada"));
    }

    #[test]
    fn test_missing_field_binds_empty() {
        let mut control = Control::field(0.0, 0.0, 50.0, 10.0, "nope");
        control.assign_value(&EmptyDataSource);
        assert_eq!(control.text(), Some(""));
        assert!(control.bound);
    }

    #[test]
    fn test_image_field_binding() {
        let mut rows = DataSource::from_rows("r", ["logo"], vec![vec![Value::from("logo.png")]]);
        rows.advance();

        let mut control = Control::image(0.0, 0.0, 10.0, 10.0, None).with_image_field("logo");
        control.assign_value(&rows);
        match &control.kind {
            ControlKind::Image(image) => assert_eq!(image.source.as_deref(), Some("logo.png")),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_line_extent_follows_end_points() {
        let mut line = Control::line(Point::new(5.0, 30.0), Point::new(5.0, 10.0), 1.0);
        assert_eq!(line.top(), 10.0);
        assert_eq!(line.bottom(), 30.0);
        assert_eq!(line.height(), 20.0);

        line.move_by_y(5.0);
        assert_eq!(line.top(), 15.0);
        assert_eq!(line.bottom(), 35.0);

        line.set_top(0.0);
        assert_eq!(line.top(), 0.0);
        assert_eq!(line.bottom(), 20.0);
    }

    #[test]
    fn test_apply_size_ignored_for_lines() {
        let mut line = Control::line(Point::new(0.0, 0.0), Point::new(40.0, 0.0), 1.0);
        line.apply_size(Size::new(1.0, 99.0));
        assert_eq!(line.height(), 0.0);
        assert_eq!(line.width(), 40.0);

        let mut label = Control::label(0.0, 0.0, 10.0, 10.0, "x");
        label.apply_size(Size::new(10.0, 30.0));
        assert_eq!(label.bottom(), 30.0);
    }

    #[test]
    fn test_serde_round_trip_keeps_kind() {
        let control = Control::field(1.0, 2.0, 3.0, 4.0, "amount").with_can_grow(true);
        let json = serde_json::to_string(&control).unwrap();
        let back: Control = serde_json::from_str(&json).unwrap();
        assert_eq!(back, control);
    }
}
