//! Section sequencing: which band comes next

use report_model::SectionKind;

use super::ReportEngine;
use crate::Result;

impl<'a> ReportEngine<'a> {
    /// Select `kind`, walking past hidden sections
    pub(super) fn enter(&mut self, kind: SectionKind) -> Result<()> {
        let mut kind = kind;
        loop {
            self.select_section(kind)?;
            if self.current.is_visible {
                return Ok(());
            }
            tracing::trace!("Skipping hidden section '{}'", self.current.name);
            match self.next_kind(kind)? {
                Some(next) => kind = next,
                None => {
                    self.finish();
                    return Ok(());
                }
            }
        }
    }

    /// Move past the section that was just placed
    pub(super) fn next_section(&mut self) -> Result<()> {
        match self.next_kind(self.current.kind)? {
            Some(next) => self.enter(next),
            None => {
                self.finish();
                Ok(())
            }
        }
    }

    /// Run the side effects of leaving `from` and return the following section
    fn next_kind(&mut self, from: SectionKind) -> Result<Option<SectionKind>> {
        let groups = self.report.groups.len();

        let next = match from {
            SectionKind::ReportHeader => {
                let report = self.report;
                let header = &report.report_header;
                if header.break_page_after && header.is_visible && !self.is_subreport {
                    self.open_page(self.page_height)?;
                }
                self.advance_cursor();
                if self.page_bands_done {
                    self.after_page_bands()
                } else {
                    SectionKind::PageHeader
                }
            }
            SectionKind::PageHeader => SectionKind::PageFooter,
            SectionKind::PageFooter => {
                self.page_bands_done = true;
                match self.resume.take() {
                    Some(kind) => kind,
                    None => self.after_page_bands(),
                }
            }
            SectionKind::GroupHeader(level) => {
                self.capture_group_key(level);
                if level + 1 < groups {
                    SectionKind::GroupHeader(level + 1)
                } else if self.has_more_rows {
                    SectionKind::Details
                } else {
                    self.close_groups_from(0)
                }
            }
            SectionKind::Details => {
                self.advance_cursor();
                if !self.has_more_rows {
                    self.close_groups_from(0)
                } else {
                    match self.changed_group_level() {
                        Some(level) => {
                            tracing::debug!(
                                "Group '{}' breaks at row {:?}",
                                self.report.groups[level].name,
                                self.cursor.current_row_index()
                            );
                            self.close_groups_from(level)
                        }
                        None => SectionKind::Details,
                    }
                }
            }
            SectionKind::GroupFooter(level) => {
                if level > self.group_stop {
                    SectionKind::GroupFooter(level - 1)
                } else if self.has_more_rows {
                    SectionKind::GroupHeader(level)
                } else {
                    SectionKind::ReportFooter
                }
            }
            SectionKind::ReportFooter => return Ok(None),
        };

        Ok(Some(next))
    }

    /// First body section after the page header and footer
    fn after_page_bands(&self) -> SectionKind {
        if !self.report.groups.is_empty() {
            SectionKind::GroupHeader(0)
        } else if self.has_more_rows {
            SectionKind::Details
        } else {
            SectionKind::ReportFooter
        }
    }

    /// Footers of every group from the innermost out to `level`
    fn close_groups_from(&mut self, level: usize) -> SectionKind {
        match self.report.groups.len() {
            0 => SectionKind::ReportFooter,
            groups => {
                self.group_stop = level;
                SectionKind::GroupFooter(groups - 1)
            }
        }
    }

    fn advance_cursor(&mut self) {
        self.has_more_rows = self.cursor.advance();
        tracing::trace!(
            "Cursor at row {:?} (more rows: {})",
            self.cursor.current_row_index(),
            self.has_more_rows
        );
    }

    fn group_key(&self, level: usize) -> String {
        let field = &self.report.groups[level].field_name;
        if field.is_empty() {
            String::new()
        } else {
            self.cursor.value_or_default(field)
        }
    }

    fn capture_group_key(&mut self, level: usize) {
        let key = self.group_key(level);
        if let Some(slot) = self.group_keys.get_mut(level) {
            *slot = Some(key);
        }
    }

    /// Outermost group whose key differs from the one captured in its header
    fn changed_group_level(&self) -> Option<usize> {
        (0..self.report.groups.len()).find(|&level| {
            let key = self.group_key(level);
            self.group_keys.get(level).and_then(|k| k.as_deref()) != Some(key.as_str())
        })
    }
}
