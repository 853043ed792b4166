//! Examination record: the caller-owned set of field values for one report.
//!
//! The UI layer creates an empty [`Record`], fills it from input widgets and
//! drafting results, then hands it to [`crate::report::assemble`]. Absent
//! values are simply empty; nothing here validates content.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::drafting::DraftOutcome;

// ─── Sections ─────────────────────────────────────────────────────────────────

/// Narrative sections of the report, declared in canonical render order.
///
/// The chief complaint precedes all of these and is rendered as a single
/// labelled line. The physical examination sits between activities of daily
/// living and neuro but is composed from [`PhysicalExam`] sub-fields, so it
/// has no narrative of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    HistoryOfPresentIllness,
    PastMedicalHistory,
    FamilyHistory,
    SocialHistory,
    ReviewOfSystems,
    ActivitiesOfDailyLiving,
    Neuro,
    Skin,
    AssessmentAndImpressions,
    FunctionalCapacity,
}

impl SectionId {
    pub const ALL: [SectionId; 10] = [
        Self::HistoryOfPresentIllness,
        Self::PastMedicalHistory,
        Self::FamilyHistory,
        Self::SocialHistory,
        Self::ReviewOfSystems,
        Self::ActivitiesOfDailyLiving,
        Self::Neuro,
        Self::Skin,
        Self::AssessmentAndImpressions,
        Self::FunctionalCapacity,
    ];

    /// Human-readable title, as printed in the report and sent to the drafter.
    pub const fn title(self) -> &'static str {
        match self {
            Self::HistoryOfPresentIllness => "History of Present Illness",
            Self::PastMedicalHistory => "Past Medical History",
            Self::FamilyHistory => "Family History",
            Self::SocialHistory => "Social History",
            Self::ReviewOfSystems => "Review of Systems",
            Self::ActivitiesOfDailyLiving => "Activities of Daily Living",
            Self::Neuro => "Neuro",
            Self::Skin => "Skin",
            Self::AssessmentAndImpressions => "Assessment and Impressions",
            Self::FunctionalCapacity => "Functional Capacity / Conclusion",
        }
    }

    /// Stable snake_case key, matching the serde representation.
    pub fn key(self) -> &'static str {
        match self {
            Self::HistoryOfPresentIllness => "history_of_present_illness",
            Self::PastMedicalHistory => "past_medical_history",
            Self::FamilyHistory => "family_history",
            Self::SocialHistory => "social_history",
            Self::ReviewOfSystems => "review_of_systems",
            Self::ActivitiesOfDailyLiving => "activities_of_daily_living",
            Self::Neuro => "neuro",
            Self::Skin => "skin",
            Self::AssessmentAndImpressions => "assessment_and_impressions",
            Self::FunctionalCapacity => "functional_capacity",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Raw notes plus the polished narrative drafted (or typed) from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub narrative: String,
}

// ─── Physical examination ─────────────────────────────────────────────────────

/// Sub-fields of the composite physical examination, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalField {
    GeneralObservations,
    Vitals,
    Heent,
    Respiratory,
    Cardiac,
    Digestive,
    UpperExtremities,
    LowerExtremities,
    Spine,
}

impl PhysicalField {
    pub const ALL: [PhysicalField; 9] = [
        Self::GeneralObservations,
        Self::Vitals,
        Self::Heent,
        Self::Respiratory,
        Self::Cardiac,
        Self::Digestive,
        Self::UpperExtremities,
        Self::LowerExtremities,
        Self::Spine,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::GeneralObservations => "General Observations",
            Self::Vitals => "Vitals",
            Self::Heent => "HEENT",
            Self::Respiratory => "Respiratory",
            Self::Cardiac => "Cardiac",
            Self::Digestive => "Digestive",
            Self::UpperExtremities => "Upper Extremities",
            Self::LowerExtremities => "Lower Extremities",
            Self::Spine => "Cervical/Thoracic Spine",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalExam {
    pub general_observations: String,
    pub vitals: String,
    pub heent: String,
    pub respiratory: String,
    pub cardiac: String,
    pub digestive: String,
    pub upper_extremities: String,
    pub lower_extremities: String,
    pub spine: String,
}

impl PhysicalExam {
    pub fn get(&self, field: PhysicalField) -> &str {
        match field {
            PhysicalField::GeneralObservations => &self.general_observations,
            PhysicalField::Vitals => &self.vitals,
            PhysicalField::Heent => &self.heent,
            PhysicalField::Respiratory => &self.respiratory,
            PhysicalField::Cardiac => &self.cardiac,
            PhysicalField::Digestive => &self.digestive,
            PhysicalField::UpperExtremities => &self.upper_extremities,
            PhysicalField::LowerExtremities => &self.lower_extremities,
            PhysicalField::Spine => &self.spine,
        }
    }

    pub fn set(&mut self, field: PhysicalField, value: impl Into<String>) {
        let slot = match field {
            PhysicalField::GeneralObservations => &mut self.general_observations,
            PhysicalField::Vitals => &mut self.vitals,
            PhysicalField::Heent => &mut self.heent,
            PhysicalField::Respiratory => &mut self.respiratory,
            PhysicalField::Cardiac => &mut self.cardiac,
            PhysicalField::Digestive => &mut self.digestive,
            PhysicalField::UpperExtremities => &mut self.upper_extremities,
            PhysicalField::LowerExtremities => &mut self.lower_extremities,
            PhysicalField::Spine => &mut self.spine,
        };
        *slot = value.into();
    }
}

// ─── Record ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    pub name: String,
    pub ssn_last4: String,
    pub date_of_birth: Option<NaiveDate>,
    pub exam_date: Option<NaiveDate>,
    pub chief_complaint: String,
    pub sections: BTreeMap<SectionId, SectionEntry>,
    pub physical_exam: PhysicalExam,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionEntry> {
        self.sections.get(&id)
    }

    pub fn section_mut(&mut self, id: SectionId) -> &mut SectionEntry {
        self.sections.entry(id).or_default()
    }

    pub fn notes(&self, id: SectionId) -> &str {
        self.section(id).map(|s| s.notes.as_str()).unwrap_or_default()
    }

    pub fn narrative(&self, id: SectionId) -> &str {
        self.section(id).map(|s| s.narrative.as_str()).unwrap_or_default()
    }

    pub fn set_notes(&mut self, id: SectionId, notes: impl Into<String>) {
        self.section_mut(id).notes = notes.into();
    }

    /// Manual edit of a section's narrative.
    pub fn set_narrative(&mut self, id: SectionId, narrative: impl Into<String>) {
        self.section_mut(id).narrative = narrative.into();
    }

    /// Stores a successful draft as the section narrative.
    ///
    /// A failed draft leaves the existing narrative untouched. Returns whether
    /// the narrative was replaced.
    pub fn apply_draft(&mut self, id: SectionId, outcome: &DraftOutcome) -> bool {
        if outcome.is_success() {
            self.set_narrative(id, outcome.text.clone());
            true
        } else {
            false
        }
    }
}
