use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Every field the intake boundary understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FirstName,
    LastName,
    Email,
    DateOfBirth,
    EducationDegree,
    ExperienceYears,
    CurrentOrganization,
    CurrentCtc,
    ExpectedCtc,
    NoticePeriod,
    ResumePayload,
}

impl Field {
    /// Fields that must be non-empty before a record may be persisted, in reporting order.
    pub const REQUIRED: [Field; 6] = [
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::DateOfBirth,
        Field::EducationDegree,
        Field::ResumePayload,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Email => "email",
            Field::DateOfBirth => "date_of_birth",
            Field::EducationDegree => "education_degree",
            Field::ExperienceYears => "experience_years",
            Field::CurrentOrganization => "current_organization",
            Field::CurrentCtc => "current_ctc",
            Field::ExpectedCtc => "expected_ctc",
            Field::NoticePeriod => "notice_period",
            Field::ResumePayload => "resume_payload",
        }
    }

    /// Resolve an intake key, accepting the legacy names older clients still send.
    pub fn from_key(key: &str) -> Option<Self> {
        let field = match key.trim().to_ascii_lowercase().as_str() {
            "first_name" => Field::FirstName,
            "last_name" => Field::LastName,
            "email" => Field::Email,
            "date_of_birth" | "dob" => Field::DateOfBirth,
            "education_degree" => Field::EducationDegree,
            "experience_years" | "experience" => Field::ExperienceYears,
            "current_organization" => Field::CurrentOrganization,
            "current_ctc" => Field::CurrentCtc,
            "expected_ctc" => Field::ExpectedCtc,
            "notice_period" => Field::NoticePeriod,
            "resume_payload" | "resume_pdf" | "resume" => Field::ResumePayload,
            _ => return None,
        };
        Some(field)
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw field values handed over by an intake adapter, before any validation.
///
/// Text values are kept verbatim; the résumé is already decoded to bytes. Adapters that fail to
/// decode a value record it with [`RawSubmission::mark_undecodable`] so the validator can report it
/// alongside everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubmission {
    text: BTreeMap<Field, String>,
    resume: Option<Vec<u8>>,
    undecodable: BTreeMap<Field, String>,
}

impl RawSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RawSubmission::set`].
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_resume(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.set_resume(bytes);
        self
    }

    /// Store a text value under an intake key. Unknown keys are ignored; the résumé key is
    /// ignored here because the résumé travels as bytes.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        match Field::from_key(key) {
            Some(Field::ResumePayload) | None => {}
            Some(field) => {
                self.undecodable.remove(&field);
                self.text.insert(field, value.into());
            }
        }
    }

    pub fn set_resume(&mut self, bytes: impl Into<Vec<u8>>) {
        self.undecodable.remove(&Field::ResumePayload);
        self.resume = Some(bytes.into());
    }

    /// Record that the adapter received a value for `field` but could not decode it.
    pub fn mark_undecodable(&mut self, field: Field, reason: impl Into<String>) {
        if field == Field::ResumePayload {
            self.resume = None;
        } else {
            self.text.remove(&field);
        }
        self.undecodable.insert(field, reason.into());
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.text.get(&field).map(String::as_str)
    }

    pub fn resume(&self) -> Option<&[u8]> {
        self.resume.as_deref()
    }

    pub fn undecodable(&self) -> impl Iterator<Item = (Field, &str)> {
        self.undecodable
            .iter()
            .map(|(field, reason)| (*field, reason.as_str()))
    }
}

/// Opaque résumé bytes. `Debug` prints the size only.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumePayload(Vec<u8>);

impl ResumePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ResumePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResumePayload({} bytes)", self.0.len())
    }
}

/// A validated application, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub education_degree: String,
    pub experience_years: u32,
    pub current_organization: Option<String>,
    pub current_ctc: Option<String>,
    pub expected_ctc: Option<String>,
    pub notice_period: Option<String>,
    pub resume_payload: ResumePayload,
}

/// Receipt returned by the store once a record has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoredApplication {
    /// Row id generated by the store, when the backend reports one.
    pub id: Option<i64>,
    pub submitted_at: DateTime<Utc>,
}
