//! Report assembly: renders a [`Record`] into the fixed DDS report template.
//!
//! Layout, top to bottom:
//! 1. Header block: name, SSN (last 4), DOB, date of examination, single-spaced
//! 2. One blank line
//! 3. `Chief Complaint: ...`
//! 4. Titled sections (`Title:` in bold, then a plain body) in canonical order
//!
//! Assembly is total. Absent values render as empty strings and no field
//! content is validated here (see [`crate::review`] for UI-side checks).
//! PDF output via `printpdf` lives in [`pdf`].

pub mod document;
pub mod pdf;

pub use document::*;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{PhysicalExam, PhysicalField, Record, SectionId};

pub const REPORT_TITLE: &str = "DDS Examination Report";
pub const REPORT_SUFFIX: &str = "_DDS_Report";
pub const REPORT_EXTENSION: &str = "pdf";

/// Separator between sub-fields and between merged sources in a section body.
const BODY_SEPARATOR: &str = "\n\n";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Invalid report file name: {0}")]
    InvalidFilename(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Template ─────────────────────────────────────────────────────────────────

/// Where a section's body text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionBody {
    /// Narratives of these sections, joined by a blank line in this order.
    Narrative(&'static [SectionId]),
    /// The composite physical examination sub-fields.
    PhysicalExam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionTemplate {
    pub title: &'static str,
    pub body: SectionBody,
}

const fn narrative(id: &'static [SectionId; 1]) -> SectionTemplate {
    SectionTemplate {
        title: id[0].title(),
        body: SectionBody::Narrative(id),
    }
}

const PHYSICAL_EXAMINATION: SectionTemplate = SectionTemplate {
    title: "Physical Examination",
    body: SectionBody::PhysicalExam,
};

const STANDARD_SECTIONS: &[SectionTemplate] = &[
    narrative(&[SectionId::HistoryOfPresentIllness]),
    narrative(&[SectionId::PastMedicalHistory]),
    narrative(&[SectionId::FamilyHistory]),
    narrative(&[SectionId::SocialHistory]),
    narrative(&[SectionId::ReviewOfSystems]),
    narrative(&[SectionId::ActivitiesOfDailyLiving]),
    PHYSICAL_EXAMINATION,
    narrative(&[SectionId::Neuro]),
    narrative(&[SectionId::Skin]),
    narrative(&[SectionId::AssessmentAndImpressions]),
    narrative(&[SectionId::FunctionalCapacity]),
];

const CONDENSED_SECTIONS: &[SectionTemplate] = &[
    narrative(&[SectionId::HistoryOfPresentIllness]),
    narrative(&[SectionId::PastMedicalHistory]),
    SectionTemplate {
        title: "Social & Family History",
        body: SectionBody::Narrative(&[SectionId::SocialHistory, SectionId::FamilyHistory]),
    },
    narrative(&[SectionId::ReviewOfSystems]),
    narrative(&[SectionId::ActivitiesOfDailyLiving]),
    PHYSICAL_EXAMINATION,
    narrative(&[SectionId::Neuro]),
    narrative(&[SectionId::Skin]),
    SectionTemplate {
        title: "Assessment & Functional Capacity",
        body: SectionBody::Narrative(&[
            SectionId::AssessmentAndImpressions,
            SectionId::FunctionalCapacity,
        ]),
    },
];

/// Section sequence of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLayout {
    /// Every section under its own title.
    #[default]
    Standard,
    /// Social with family history and assessment with functional capacity
    /// merged under shared titles.
    Condensed,
}

impl ReportLayout {
    pub fn sections(self) -> &'static [SectionTemplate] {
        match self {
            Self::Standard => STANDARD_SECTIONS,
            Self::Condensed => CONDENSED_SECTIONS,
        }
    }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// An assembled report and the file name it downloads as.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub document: Document,
    pub filename: String,
}

impl Report {
    pub fn to_pdf(&self) -> Result<Vec<u8>, ReportError> {
        pdf::render_pdf(&self.document)
    }

    /// Render to PDF and write it into `dir`, replacing any same-named file.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let bytes = self.to_pdf()?;
        pdf::export_pdf_to_file(&bytes, &self.filename, dir)
    }
}

/// Output file name: whitespace in `name` becomes `_`, then the fixed suffix
/// and extension are appended.
pub fn report_filename(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}{REPORT_SUFFIX}.{REPORT_EXTENSION}")
}

pub fn assemble(record: &Record) -> Report {
    assemble_with_layout(record, ReportLayout::Standard)
}

pub fn assemble_with_layout(record: &Record, layout: ReportLayout) -> Report {
    let mut document = Document::new(REPORT_TITLE);

    document.push(Paragraph::tight(format!("Name: {}", record.name)));
    document.push(Paragraph::tight(format!("SSN (Last 4): {}", record.ssn_last4)));
    document.push(Paragraph::tight(format!("DOB: {}", format_date(record.date_of_birth))));
    document.push(Paragraph::tight(format!(
        "Date of Examination: {}",
        format_date(record.exam_date)
    )));
    document.push(Paragraph::tight(""));
    document.push(Paragraph::plain(format!(
        "Chief Complaint: {}",
        record.chief_complaint
    )));

    let sections = layout.sections();
    for section in sections {
        document.push(Paragraph::bold(format!("{}:", section.title)));
        document.push(Paragraph::plain(section_body(record, section.body)));
    }

    let filename = report_filename(&record.name);
    tracing::info!(
        filename = %filename,
        layout = ?layout,
        sections = sections.len(),
        "Report assembled"
    );

    Report { document, filename }
}

fn section_body(record: &Record, body: SectionBody) -> String {
    match body {
        SectionBody::Narrative(ids) => ids
            .iter()
            .map(|id| record.narrative(*id))
            .collect::<Vec<_>>()
            .join(BODY_SEPARATOR),
        SectionBody::PhysicalExam => physical_exam_body(&record.physical_exam),
    }
}

/// One `Label: value` line per sub-field, in fixed order, blank-line separated.
pub fn physical_exam_body(exam: &PhysicalExam) -> String {
    PhysicalField::ALL
        .iter()
        .map(|field| format!("{}: {}", field.label(), exam.get(*field)))
        .collect::<Vec<_>>()
        .join(BODY_SEPARATOR)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
