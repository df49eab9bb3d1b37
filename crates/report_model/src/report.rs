//! Report template

use std::collections::HashSet;

use report_data::ColumnDef;
use serde::{Deserialize, Serialize};

use crate::{Control, ControlId, Page, ReportModelError, Result, Section, SectionKind};

/// Grouping of detail rows by a field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Field whose value changes mark a group break; empty groups the whole report
    pub field_name: String,
}

impl Group {
    pub fn new(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_name: field_name.into(),
        }
    }
}

/// A banded report template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    /// Page width
    pub width: f64,
    /// Usable page height
    pub height: f64,
    pub report_header: Section,
    pub page_header: Section,
    pub page_footer: Section,
    pub details: Section,
    pub report_footer: Section,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub group_headers: Vec<Section>,
    #[serde(default)]
    pub group_footers: Vec<Section>,
    /// Fields available to bindings and groups
    #[serde(default)]
    pub fields: Vec<ColumnDef>,
    /// Output of the last pagination
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,
}

impl Report {
    /// Create a report with empty, zero-height sections
    pub fn new(title: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            report_header: Section::of_kind(SectionKind::ReportHeader, 0.0),
            page_header: Section::of_kind(SectionKind::PageHeader, 0.0),
            page_footer: Section::of_kind(SectionKind::PageFooter, 0.0),
            details: Section::of_kind(SectionKind::Details, 0.0),
            report_footer: Section::of_kind(SectionKind::ReportFooter, 0.0),
            groups: Vec::new(),
            group_headers: Vec::new(),
            group_footers: Vec::new(),
            fields: Vec::new(),
            pages: Vec::new(),
        }
    }

    pub fn with_report_header(mut self, section: Section) -> Self {
        self.report_header = section;
        self
    }

    pub fn with_page_header(mut self, section: Section) -> Self {
        self.page_header = section;
        self
    }

    pub fn with_page_footer(mut self, section: Section) -> Self {
        self.page_footer = section;
        self
    }

    pub fn with_details(mut self, section: Section) -> Self {
        self.details = section;
        self
    }

    pub fn with_report_footer(mut self, section: Section) -> Self {
        self.report_footer = section;
        self
    }

    pub fn with_field(mut self, field: ColumnDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a group nested inside the existing ones, with its header and footer bands
    pub fn with_group(mut self, group: Group, header: Section, footer: Section) -> Self {
        self.add_group(group, header, footer);
        self
    }

    pub fn add_group(&mut self, group: Group, header: Section, footer: Section) {
        self.groups.push(group);
        self.group_headers.push(header);
        self.group_footers.push(footer);
    }

    /// The template section serving a role
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        match kind {
            SectionKind::ReportHeader => Some(&self.report_header),
            SectionKind::PageHeader => Some(&self.page_header),
            SectionKind::PageFooter => Some(&self.page_footer),
            SectionKind::GroupHeader(i) => self.group_headers.get(i),
            SectionKind::Details => Some(&self.details),
            SectionKind::GroupFooter(i) => self.group_footers.get(i),
            SectionKind::ReportFooter => Some(&self.report_footer),
        }
    }

    /// All template sections with the role each slot expects
    pub fn sections(&self) -> Vec<(SectionKind, &Section)> {
        let mut all = vec![
            (SectionKind::ReportHeader, &self.report_header),
            (SectionKind::PageHeader, &self.page_header),
            (SectionKind::PageFooter, &self.page_footer),
        ];
        all.extend(
            self.group_headers
                .iter()
                .enumerate()
                .map(|(i, s)| (SectionKind::GroupHeader(i), s)),
        );
        all.push((SectionKind::Details, &self.details));
        all.extend(
            self.group_footers
                .iter()
                .enumerate()
                .map(|(i, s)| (SectionKind::GroupFooter(i), s)),
        );
        all.push((SectionKind::ReportFooter, &self.report_footer));
        all
    }

    /// Resolve a template control ID, searching nested sub-reports too
    pub fn template_control(&self, id: ControlId) -> Option<&Control> {
        self.sections()
            .into_iter()
            .find_map(|(_, section)| section.find_control(id))
    }

    /// Height taken by the visible page header and footer on every page
    pub fn page_band_height(&self) -> f64 {
        [&self.page_header, &self.page_footer]
            .iter()
            .filter(|s| s.is_visible)
            .map(|s| s.height)
            .sum()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Check the template before pagination.
    pub fn validate(&self) -> Result<()> {
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(ReportModelError::InvalidPageHeight(self.height));
        }

        if self.group_headers.len() != self.groups.len()
            || self.group_footers.len() != self.groups.len()
        {
            return Err(ReportModelError::GroupSectionCountMismatch {
                groups: self.groups.len(),
                headers: self.group_headers.len(),
                footers: self.group_footers.len(),
            });
        }

        let mut names = HashSet::new();
        for (expected, section) in self.sections() {
            if section.kind != expected {
                return Err(ReportModelError::SectionKindMismatch {
                    name: section.name.clone(),
                    expected,
                    found: section.kind,
                });
            }
            if section.name.trim().is_empty() {
                return Err(ReportModelError::EmptySectionName(expected));
            }
            if !names.insert(section.name.as_str()) {
                return Err(ReportModelError::DuplicateSectionName(section.name.clone()));
            }
        }

        for group in &self.groups {
            if !group.field_name.is_empty() && !self.has_field(&group.field_name) {
                return Err(ReportModelError::UnknownGroupField {
                    group: group.name.clone(),
                    field: group.field_name.clone(),
                });
            }
        }

        // A fixed-height body band has to fit on a fresh page
        let available = self.height - self.page_band_height();
        for (kind, section) in self.sections() {
            if kind.is_page_band() || !section.is_visible || section.can_grow {
                continue;
            }
            if section.height > available {
                return Err(ReportModelError::SectionTooTall {
                    name: section.name.clone(),
                    height: section.height,
                    available,
                });
            }
        }
        if available < 0.0 {
            return Err(ReportModelError::SectionTooTall {
                name: self.page_header.name.clone(),
                height: self.page_band_height(),
                available: self.height,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_data::DataType;

    fn grouped_report() -> Report {
        Report::new("Sales", 500.0, 800.0)
            .with_field(ColumnDef::new("region", DataType::Text))
            .with_group(
                Group::new("ByRegion", "region"),
                Section::of_kind(SectionKind::GroupHeader(0), 20.0),
                Section::of_kind(SectionKind::GroupFooter(0), 20.0),
            )
    }

    #[test]
    fn test_default_report_is_valid() {
        assert_eq!(Report::new("r", 100.0, 100.0).validate(), Ok(()));
        assert_eq!(grouped_report().validate(), Ok(()));
    }

    #[test]
    fn test_invalid_page_height() {
        let report = Report::new("r", 100.0, 0.0);
        assert_eq!(report.validate(), Err(ReportModelError::InvalidPageHeight(0.0)));
    }

    #[test]
    fn test_unknown_group_field() {
        let report = Report::new("r", 100.0, 100.0).with_group(
            Group::new("g", "missing"),
            Section::of_kind(SectionKind::GroupHeader(0), 0.0),
            Section::of_kind(SectionKind::GroupFooter(0), 0.0),
        );
        assert!(matches!(
            report.validate(),
            Err(ReportModelError::UnknownGroupField { .. })
        ));
    }

    #[test]
    fn test_missing_group_footer() {
        let mut report = grouped_report();
        report.group_footers.clear();
        assert!(matches!(
            report.validate(),
            Err(ReportModelError::GroupSectionCountMismatch { groups: 1, footers: 0, .. })
        ));
    }

    #[test]
    fn test_section_in_wrong_slot() {
        let report = Report::new("r", 100.0, 100.0)
            .with_details(Section::of_kind(SectionKind::ReportFooter, 10.0));
        assert!(matches!(
            report.validate(),
            Err(ReportModelError::SectionKindMismatch { expected: SectionKind::Details, .. })
        ));
    }

    #[test]
    fn test_duplicate_section_names() {
        let report = Report::new("r", 100.0, 100.0)
            .with_details(Section::new("Band", SectionKind::Details, 10.0))
            .with_report_footer(Section::new("Band", SectionKind::ReportFooter, 10.0));
        assert_eq!(
            report.validate(),
            Err(ReportModelError::DuplicateSectionName("Band".into()))
        );
    }

    #[test]
    fn test_fixed_section_taller_than_page() {
        let report = Report::new("r", 100.0, 100.0)
            .with_page_header(Section::of_kind(SectionKind::PageHeader, 30.0))
            .with_details(Section::of_kind(SectionKind::Details, 80.0));
        assert!(matches!(
            report.validate(),
            Err(ReportModelError::SectionTooTall { .. })
        ));

        let growing = Report::new("r", 100.0, 100.0)
            .with_page_header(Section::of_kind(SectionKind::PageHeader, 30.0))
            .with_details(Section::of_kind(SectionKind::Details, 80.0).with_can_grow(true));
        assert_eq!(growing.validate(), Ok(()));
    }

    #[test]
    fn test_template_control_lookup_descends_into_sub_reports() {
        let inner_label = Control::label(0.0, 0.0, 10.0, 10.0, "inner");
        let inner_id = inner_label.id;
        let inner = Report::new("inner", 100.0, 100.0)
            .with_details(Section::of_kind(SectionKind::Details, 10.0).with_control(inner_label));

        let outer_label = Control::label(0.0, 0.0, 10.0, 10.0, "outer");
        let outer_id = outer_label.id;
        let report = Report::new("outer", 100.0, 100.0).with_report_header(
            Section::of_kind(SectionKind::ReportHeader, 40.0)
                .with_control(outer_label)
                .with_control(Control::sub_report(0.0, 10.0, 100.0, 20.0, inner)),
        );

        assert_eq!(report.template_control(outer_id).and_then(Control::text), Some("outer"));
        assert_eq!(report.template_control(inner_id).and_then(Control::text), Some("inner"));
        assert!(report.template_control(ControlId::new()).is_none());
    }
}
