//! Per-section change counts derived from a [`ChangeSet`].

use std::fmt;

use crate::diff::ChangeSet;
use crate::model::Section;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionReport {
    pub new: usize,
    pub updated: usize,
    pub total: usize,
}

/// Derived counts for display and the delivery-skip decision. Never
/// persisted; recompute from the ChangeSet as needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub hottest: SectionReport,
    pub latest: SectionReport,
    pub updated: SectionReport,
    pub total_new: usize,
    pub total_updated: usize,
    pub grand_total: usize,
}

impl Report {
    pub fn from_changes(changes: &ChangeSet) -> Self {
        let mut report = Report::default();
        for section in Section::ALL {
            let changed = changes.section(section);
            let entry = SectionReport {
                new: changed.new.len(),
                updated: changed.updated.len(),
                total: changed.new.len() + changed.updated.len(),
            };
            match section {
                Section::Hottest => report.hottest = entry,
                Section::Latest => report.latest = entry,
                Section::Updated => report.updated = entry,
            }
            report.total_new += entry.new;
            report.total_updated += entry.updated;
        }
        report.grand_total = report.total_new + report.total_updated;
        report
    }

    pub fn section(&self, section: Section) -> SectionReport {
        match section {
            Section::Hottest => self.hottest,
            Section::Latest => self.latest,
            Section::Updated => self.updated,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "CHANGE DETECTION REPORT")?;
        writeln!(f, "{}", "=".repeat(50))?;
        for section in Section::ALL {
            let entry = self.section(section);
            writeln!(f)?;
            writeln!(f, "{} airdrops:", section.label().to_uppercase())?;
            writeln!(f, "   New: {}", entry.new)?;
            writeln!(f, "   Updated: {}", entry.updated)?;
            writeln!(f, "   Total changes: {}", entry.total)?;
        }
        writeln!(f)?;
        writeln!(f, "OVERALL:")?;
        writeln!(f, "   Total new: {}", self.total_new)?;
        writeln!(f, "   Total updated: {}", self.total_updated)?;
        writeln!(f, "   Grand total: {}", self.grand_total)?;
        write!(f, "{}", "=".repeat(50))
    }
}
