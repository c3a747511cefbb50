use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::{Category, Submission, SubmissionStatus};

/// Weights for the engagement estimate. Illustrative, not measured.
const HOURS_WEIGHT: f64 = 0.6;
const NEED_WEIGHT: f64 = 2.0;
const IDEA_WEIGHT: f64 = 0.5;
const RESOLVED_WEIGHT: f64 = 3.0;

/// Dashboard summary over the whole submission set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_participants: u64,
    pub total_needs_reported: u64,
    pub total_volunteers_offered: u64,
    pub total_ideas_shared: u64,
    pub total_hours_offered: u64,
    pub estimated_citizen_hours: u64,
    pub resolved_count: u64,
    pub matched_count: u64,
}

impl DashboardStats {
    pub fn from_submissions(submissions: &[Submission]) -> Self {
        let mut stats = DashboardStats::default();
        let mut emails: HashSet<&str> = HashSet::new();

        for submission in submissions {
            match submission.category {
                Category::Need => stats.total_needs_reported += 1,
                Category::Offer => {
                    stats.total_volunteers_offered += 1;
                    stats.total_hours_offered += u64::from(submission.hours_offered.unwrap_or(0));
                }
                Category::Idea => stats.total_ideas_shared += 1,
            }

            match submission.status {
                SubmissionStatus::Resolved => stats.resolved_count += 1,
                SubmissionStatus::Matched => stats.matched_count += 1,
                SubmissionStatus::Open | SubmissionStatus::InProgress => {}
            }

            if let Some(email) = submission.contact_email.as_deref() {
                if !email.is_empty() {
                    emails.insert(email);
                }
            }
        }

        // No identified contacts: count submissions instead.
        stats.total_participants = if emails.is_empty() {
            submissions.len() as u64
        } else {
            emails.len() as u64
        };

        stats.estimated_citizen_hours = estimate_citizen_hours(
            stats.total_hours_offered,
            stats.total_needs_reported,
            stats.total_ideas_shared,
            stats.resolved_count,
        );

        stats
    }
}

/// Weighted engagement score, rounded once at the end (halves round up).
pub fn estimate_citizen_hours(hours: u64, needs: u64, ideas: u64, resolved: u64) -> u64 {
    let raw = hours as f64 * HOURS_WEIGHT
        + needs as f64 * NEED_WEIGHT
        + ideas as f64 * IDEA_WEIGHT
        + resolved as f64 * RESOLVED_WEIGHT;
    (raw + 0.5).floor() as u64
}
