//! Laid-out output pages

use serde::{Deserialize, Serialize};

use crate::{Control, SectionKind};

/// A finished page: controls in absolute page coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    /// Usable height this page was laid out against
    pub height: f64,
    /// Controls in placement order
    pub controls: Vec<Control>,
    /// Section bands placed on this page, in placement order
    pub sections: Vec<PlacedSection>,
}

/// Where a section band ended up on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedSection {
    pub name: String,
    pub kind: SectionKind,
    pub top: f64,
    pub height: f64,
}

impl PlacedSection {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

impl Page {
    pub fn new(number: usize, height: f64) -> Self {
        Self {
            number,
            height,
            controls: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Total height of the bands placed on this page
    pub fn used_height(&self) -> f64 {
        self.sections.iter().map(|s| s.height).sum()
    }

    /// Bands of one role
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &PlacedSection> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// Text of every text control, in placement order
    pub fn texts(&self) -> Vec<&str> {
        self.controls.iter().filter_map(Control::text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_used_height_sums_bands() {
        let mut page = Page::new(1, 100.0);
        page.sections.push(PlacedSection {
            name: "PageHeader".into(),
            kind: SectionKind::PageHeader,
            top: 0.0,
            height: 10.0,
        });
        page.sections.push(PlacedSection {
            name: "Details".into(),
            kind: SectionKind::Details,
            top: 10.0,
            height: 25.0,
        });

        assert_eq!(page.used_height(), 35.0);
        assert_eq!(page.sections_of(SectionKind::Details).count(), 1);
        assert_eq!(page.sections[1].bottom(), 35.0);
    }
}
