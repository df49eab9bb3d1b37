//! Deferred content carried to the next page

use std::collections::HashMap;

use report_model::{Control, Section};

/// The unfinished remainder of a section
#[derive(Debug, Clone)]
pub struct Continuation {
    /// Settings of the original section; height covers the deferred controls
    pub section: Section,
    /// Deferred controls, rebased so the page break line is y = 0
    pub controls: Vec<Control>,
}

/// Continuations keyed by section name
#[derive(Debug, Clone, Default)]
pub struct ContinuationStore {
    entries: HashMap<String, Continuation>,
}

impl ContinuationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer a control of `section`, growing the stored height to cover it plus `margin_bottom`
    pub fn push(&mut self, section: &Section, control: Control, margin_bottom: f64) {
        let entry = self
            .entries
            .entry(section.name.clone())
            .or_insert_with(|| Continuation {
                section: section.empty_copy(),
                controls: Vec::new(),
            });
        entry.section.height = entry.section.height.max(control.bottom() + margin_bottom);
        entry.controls.push(control);
    }

    /// Make sure `section` resumes on the next page with at least `height` of
    /// space left to place, even when none of its controls were deferred
    pub fn reserve(&mut self, section: &Section, height: f64) {
        let entry = self
            .entries
            .entry(section.name.clone())
            .or_insert_with(|| Continuation {
                section: section.empty_copy(),
                controls: Vec::new(),
            });
        entry.section.height = entry.section.height.max(height);
    }

    /// Remove and return the continuation of a section
    pub fn take(&mut self, name: &str) -> Option<Continuation> {
        self.entries.remove(name)
    }

    pub fn discard(&mut self, name: &str) {
        self.entries.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
