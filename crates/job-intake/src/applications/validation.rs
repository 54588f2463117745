use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{ApplicationRecord, Field, RawSubmission, ResumePayload};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Every problem found in a submission, gathered in a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Required fields that were absent or blank, in [`Field::REQUIRED`] order.
    pub missing_fields: Vec<Field>,
    /// Fields that were supplied but could not be understood.
    pub invalid_fields: Vec<InvalidField>,
}

impl ValidationError {
    pub fn missing_labels(&self) -> Vec<&'static str> {
        self.missing_fields.iter().map(|field| field.label()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_fields.is_empty() {
            parts.push(format!(
                "missing required fields: {}",
                self.missing_labels().join(", ")
            ));
        }
        if !self.invalid_fields.is_empty() {
            let invalid: Vec<String> = self
                .invalid_fields
                .iter()
                .map(|invalid| format!("{} ({})", invalid.field, invalid.reason))
                .collect();
            parts.push(format!("invalid fields: {}", invalid.join(", ")));
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidField {
    pub field: Field,
    pub reason: String,
}

/// Turn raw intake values into an [`ApplicationRecord`].
///
/// Strings are trimmed before the emptiness check. Blank optional text becomes `None` and a
/// blank experience count becomes zero. Email format, date ranges and PDF content are not checked.
pub fn validate(raw: &RawSubmission) -> Result<ApplicationRecord, ValidationError> {
    let mut missing = Vec::new();
    let mut invalid: Vec<InvalidField> = raw
        .undecodable()
        .map(|(field, reason)| InvalidField {
            field,
            reason: reason.to_string(),
        })
        .collect();
    let undecodable: Vec<Field> = invalid.iter().map(|entry| entry.field).collect();

    let required_text = |field: Field, missing: &mut Vec<Field>| -> Option<String> {
        match trimmed(raw.text(field)) {
            Some(value) => Some(value),
            None => {
                if !undecodable.contains(&field) {
                    missing.push(field);
                }
                None
            }
        }
    };

    let first_name = required_text(Field::FirstName, &mut missing);
    let last_name = required_text(Field::LastName, &mut missing);
    let email = required_text(Field::Email, &mut missing);
    let date_of_birth = required_text(Field::DateOfBirth, &mut missing);
    let education_degree = required_text(Field::EducationDegree, &mut missing);

    let resume = match raw.resume() {
        Some(bytes) if !bytes.is_empty() => Some(ResumePayload::new(bytes.to_vec())),
        _ => {
            if !undecodable.contains(&Field::ResumePayload) {
                missing.push(Field::ResumePayload);
            }
            None
        }
    };

    let date_of_birth = date_of_birth.and_then(|value| {
        match NaiveDate::parse_from_str(&value, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                invalid.push(InvalidField {
                    field: Field::DateOfBirth,
                    reason: format!("'{value}' is not a YYYY-MM-DD date"),
                });
                None
            }
        }
    });

    let experience_years = match trimmed(raw.text(Field::ExperienceYears)) {
        None => Some(0),
        Some(value) => match value.parse::<u32>() {
            Ok(years) => Some(years),
            Err(_) => {
                invalid.push(InvalidField {
                    field: Field::ExperienceYears,
                    reason: format!("'{value}' is not a non-negative whole number"),
                });
                None
            }
        },
    };

    match (
        first_name,
        last_name,
        email,
        date_of_birth,
        education_degree,
        experience_years,
        resume,
    ) {
        (
            Some(first_name),
            Some(last_name),
            Some(email),
            Some(date_of_birth),
            Some(education_degree),
            Some(experience_years),
            Some(resume_payload),
        ) if missing.is_empty() && invalid.is_empty() => Ok(ApplicationRecord {
            first_name,
            last_name,
            email,
            date_of_birth,
            education_degree,
            experience_years,
            current_organization: trimmed(raw.text(Field::CurrentOrganization)),
            current_ctc: trimmed(raw.text(Field::CurrentCtc)),
            expected_ctc: trimmed(raw.text(Field::ExpectedCtc)),
            notice_period: trimmed(raw.text(Field::NoticePeriod)),
            resume_payload,
        }),
        _ => {
            invalid.sort_by_key(|entry| entry.field);
            Err(ValidationError {
                missing_fields: missing,
                invalid_fields: invalid,
            })
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
