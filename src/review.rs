//! Data-quality checks for the form layer.
//!
//! These produce warnings for the examiner to see before generating the
//! report. The assembler never calls them and never refuses a record.

use chrono::NaiveDate;
use serde::Serialize;

use crate::record::{PhysicalField, Record, SectionId};

/// Entries shorter than this (but non-empty) are flagged as brief.
pub const BRIEF_ENTRY_CHARS: usize = 30;

/// Earliest accepted date of birth.
pub const DOB_FLOOR: (i32, u32, u32) = (1900, 1, 1);

/// Fields a report reviewer expects to be substantive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewedField {
    ChiefComplaint,
    Section(SectionId),
    ExamFindings,
}

impl ReviewedField {
    pub fn label(self) -> &'static str {
        match self {
            Self::ChiefComplaint => "Chief Complaint",
            Self::Section(id) => id.title(),
            Self::ExamFindings => "Exam Findings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrevityWarning {
    pub field: ReviewedField,
    pub chars: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateIssue {
    BirthBeforeFloor { date_of_birth: NaiveDate, floor: NaiveDate },
    BirthInFuture { date_of_birth: NaiveDate, today: NaiveDate },
}

const REVIEWED_SECTIONS: [SectionId; 4] = [
    SectionId::HistoryOfPresentIllness,
    SectionId::PastMedicalHistory,
    SectionId::ActivitiesOfDailyLiving,
    SectionId::AssessmentAndImpressions,
];

fn section_text(record: &Record, id: SectionId) -> &str {
    let narrative = record.narrative(id);
    if narrative.trim().is_empty() {
        record.notes(id)
    } else {
        narrative
    }
}

fn exam_findings(record: &Record) -> String {
    PhysicalField::ALL
        .iter()
        .map(|f| record.physical_exam.get(*f).trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flag key fields that are filled in but suspiciously short.
///
/// Sections are judged on their narrative when present, else on their notes.
pub fn brevity_warnings(record: &Record) -> Vec<BrevityWarning> {
    let mut entries: Vec<(ReviewedField, String)> =
        vec![(ReviewedField::ChiefComplaint, record.chief_complaint.clone())];
    entries.extend(
        REVIEWED_SECTIONS
            .iter()
            .map(|id| (ReviewedField::Section(*id), section_text(record, *id).to_string())),
    );
    entries.push((ReviewedField::ExamFindings, exam_findings(record)));

    entries
        .into_iter()
        .filter_map(|(field, text)| {
            let chars = text.trim().chars().count();
            (chars > 0 && chars < BRIEF_ENTRY_CHARS).then(|| BrevityWarning {
                field,
                chars,
                message: format!("'{}' appears brief, consider expanding.", field.label()),
            })
        })
        .collect()
}

/// Check the date of birth against the fixed floor and `today`.
pub fn check_dates(record: &Record, today: NaiveDate) -> Vec<DateIssue> {
    let Some(dob) = record.date_of_birth else {
        return Vec::new();
    };
    let (y, m, d) = DOB_FLOOR;
    let mut issues = Vec::new();

    if let Some(floor) = NaiveDate::from_ymd_opt(y, m, d) {
        if dob < floor {
            issues.push(DateIssue::BirthBeforeFloor { date_of_birth: dob, floor });
        }
    }
    if dob > today {
        issues.push(DateIssue::BirthInFuture { date_of_birth: dob, today });
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_record_has_no_warnings() {
        assert!(brevity_warnings(&Record::new()).is_empty());
        assert!(check_dates(&Record::new(), date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn short_chief_complaint_is_flagged() {
        let mut record = Record::new();
        record.chief_complaint = "Back pain".into();
        let warnings = brevity_warnings(&record);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, ReviewedField::ChiefComplaint);
        assert_eq!(warnings[0].chars, 9);
        assert!(warnings[0].message.contains("Chief Complaint"));
    }

    #[test]
    fn long_entries_are_not_flagged() {
        let mut record = Record::new();
        record.chief_complaint = "Chronic low back pain radiating to the left leg".into();
        record.set_notes(SectionId::HistoryOfPresentIllness, "LBP");
        record.set_narrative(
            SectionId::HistoryOfPresentIllness,
            "The claimant reports five years of low back pain.",
        );
        assert!(brevity_warnings(&record).is_empty());
    }

    #[test]
    fn notes_are_checked_when_no_narrative() {
        let mut record = Record::new();
        record.set_notes(SectionId::ActivitiesOfDailyLiving, "indep");
        let warnings = brevity_warnings(&record);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].field,
            ReviewedField::Section(SectionId::ActivitiesOfDailyLiving)
        );
    }

    #[test]
    fn unreviewed_sections_are_ignored() {
        let mut record = Record::new();
        record.set_narrative(SectionId::Skin, "Normal.");
        assert!(brevity_warnings(&record).is_empty());
    }

    #[test]
    fn short_exam_findings_are_flagged() {
        let mut record = Record::new();
        record.physical_exam.set(PhysicalField::Vitals, "BP 120/80");
        let warnings = brevity_warnings(&record);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, ReviewedField::ExamFindings);
    }

    #[test]
    fn dob_before_floor() {
        let mut record = Record::new();
        record.date_of_birth = Some(date(1899, 12, 31));
        let issues = check_dates(&record, date(2024, 1, 1));
        assert_eq!(
            issues,
            vec![DateIssue::BirthBeforeFloor {
                date_of_birth: date(1899, 12, 31),
                floor: date(1900, 1, 1),
            }]
        );
    }

    #[test]
    fn dob_in_future() {
        let mut record = Record::new();
        record.date_of_birth = Some(date(2030, 5, 1));
        let issues = check_dates(&record, date(2024, 1, 1));
        assert!(matches!(issues[..], [DateIssue::BirthInFuture { .. }]));
    }

    #[test]
    fn dob_bounds_are_inclusive() {
        let mut record = Record::new();
        record.date_of_birth = Some(date(1900, 1, 1));
        assert!(check_dates(&record, date(2024, 1, 1)).is_empty());
        record.date_of_birth = Some(date(2024, 1, 1));
        assert!(check_dates(&record, date(2024, 1, 1)).is_empty());
    }
}
