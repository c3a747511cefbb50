use serde::{Deserialize, Serialize};

use super::domain::{Category, Neighborhood, Submission, SubmissionStatus};

/// Optional AND-combined constraints for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<Neighborhood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmissionStatus>,
}

impl SubmissionFilter {
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.neighborhood.is_none() && self.status.is_none()
    }

    pub fn matches(&self, submission: &Submission) -> bool {
        self.category.map_or(true, |c| submission.category == c)
            && self
                .neighborhood
                .map_or(true, |n| submission.neighborhood == Some(n))
            && self.status.map_or(true, |s| submission.status == s)
    }
}

/// Filter `submissions` (given in insertion order) and return them newest first.
///
/// Equal `created_at` values keep the most recently inserted record first.
pub fn apply_filter<'a, I>(submissions: I, filter: &SubmissionFilter) -> Vec<Submission>
where
    I: DoubleEndedIterator<Item = &'a Submission>,
{
    let mut selected: Vec<Submission> = submissions
        .rev()
        .filter(|submission| filter.matches(submission))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    selected
}
