use chrono::{DateTime, Utc};
use email_address::EmailAddress;

use super::domain::{
    Neighborhood, NewSubmission, Patch, Submission, SubmissionId, SubmissionPatch,
    SubmissionStatus,
};

/// Input constraint violations surfaced to callers before any store access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
    #[error("{field} cannot be cleared")]
    Required { field: &'static str },
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("hoursOffered must be between {min} and {max} (found {found})")]
    HoursOutOfRange { min: i64, max: i64, found: i64 },
}

const DEFAULT_TITLE_MIN: usize = 3;
const DEFAULT_DESCRIPTION_MIN: usize = 10;
const DEFAULT_HOURS_RANGE: (i64, i64) = (1, 1000);

/// Length and range limits enforced at the intake boundary.
#[derive(Debug, Clone)]
pub struct IntakeRules {
    title_min: usize,
    description_min: usize,
    hours_min: i64,
    hours_max: i64,
}

impl IntakeRules {
    fn check_title(&self, title: &str) -> Result<(), ValidationError> {
        check_min_chars("title", title, self.title_min)
    }

    fn check_description(&self, description: &str) -> Result<(), ValidationError> {
        check_min_chars("description", description, self.description_min)
    }

    fn check_hours(&self, hours: i64) -> Result<u32, ValidationError> {
        if hours < self.hours_min || hours > self.hours_max {
            return Err(ValidationError::HoursOutOfRange {
                min: self.hours_min,
                max: self.hours_max,
                found: hours,
            });
        }
        u32::try_from(hours).map_err(|_| ValidationError::HoursOutOfRange {
            min: self.hours_min,
            max: self.hours_max,
            found: hours,
        })
    }
}

impl Default for IntakeRules {
    fn default() -> Self {
        Self {
            title_min: DEFAULT_TITLE_MIN,
            description_min: DEFAULT_DESCRIPTION_MIN,
            hours_min: DEFAULT_HOURS_RANGE.0,
            hours_max: DEFAULT_HOURS_RANGE.1,
        }
    }
}

fn check_min_chars(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        Err(ValidationError::TooShort { field, min })
    } else {
        Ok(())
    }
}

/// Empty strings are stored as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|inner| !inner.is_empty())
}

fn check_email(email: Option<String>) -> Result<Option<String>, ValidationError> {
    match non_empty(email) {
        Some(address) if !EmailAddress::is_valid(&address) => {
            Err(ValidationError::InvalidEmail(address))
        }
        other => Ok(other),
    }
}

/// Guard responsible for turning raw input into stored `Submission` values.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    rules: IntakeRules,
}

impl IntakeGuard {
    /// Validate an intake payload and build the record to insert.
    pub fn submission_from_intake(
        &self,
        input: NewSubmission,
        id: SubmissionId,
        now: DateTime<Utc>,
    ) -> Result<Submission, ValidationError> {
        self.rules.check_title(&input.title)?;
        self.rules.check_description(&input.description)?;
        let contact_email = check_email(input.contact_email)?;
        let hours_offered = input
            .hours_offered
            .map(|hours| self.rules.check_hours(hours))
            .transpose()?;

        Ok(Submission {
            id,
            category: input.category,
            status: input.status.unwrap_or_default(),
            title: input.title,
            description: input.description,
            neighborhood: input.neighborhood,
            contact_name: non_empty(input.contact_name),
            contact_email,
            hours_offered,
            matched_with_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validate every field of `patch` without touching any stored record.
    pub fn check_patch(&self, patch: SubmissionPatch) -> Result<ValidatedPatch, ValidationError> {
        let SubmissionPatch {
            status,
            title,
            description,
            neighborhood,
            contact_name,
            contact_email,
            hours_offered,
            matched_with_id,
        } = patch;

        let status = required("status", status)?;
        let title = required("title", title)?;
        if let Some(title) = &title {
            self.rules.check_title(title)?;
        }
        let description = required("description", description)?;
        if let Some(description) = &description {
            self.rules.check_description(description)?;
        }

        let contact_email = match contact_email {
            Patch::Set(value) => match check_email(Some(value))? {
                Some(address) => Patch::Set(address),
                None => Patch::Clear,
            },
            other => other,
        };
        let contact_name = match contact_name {
            Patch::Set(value) if value.is_empty() => Patch::Clear,
            other => other,
        };
        let hours_offered = match hours_offered {
            Patch::Set(hours) => Patch::Set(self.rules.check_hours(hours)?),
            Patch::Keep => Patch::Keep,
            Patch::Clear => Patch::Clear,
        };

        Ok(ValidatedPatch {
            status,
            title,
            description,
            neighborhood,
            contact_name,
            contact_email,
            hours_offered,
            matched_with_id,
        })
    }
}

/// A patch whose every field already passed intake checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPatch {
    status: Option<SubmissionStatus>,
    title: Option<String>,
    description: Option<String>,
    neighborhood: Patch<Neighborhood>,
    contact_name: Patch<String>,
    contact_email: Patch<String>,
    hours_offered: Patch<u32>,
    matched_with_id: Patch<SubmissionId>,
}

impl ValidatedPatch {
    /// Write the patched fields and refresh `updated_at`.
    pub fn apply_to(self, record: &mut Submission, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        self.neighborhood.apply_to(&mut record.neighborhood);
        self.contact_name.apply_to(&mut record.contact_name);
        self.contact_email.apply_to(&mut record.contact_email);
        self.hours_offered.apply_to(&mut record.hours_offered);
        self.matched_with_id.apply_to(&mut record.matched_with_id);
        record.updated_at = now;
    }
}

fn required<T>(field: &'static str, patch: Patch<T>) -> Result<Option<T>, ValidationError> {
    match patch {
        Patch::Keep => Ok(None),
        Patch::Clear => Err(ValidationError::Required { field }),
        Patch::Set(value) => Ok(Some(value)),
    }
}
