use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Category, Submission, SubmissionId};

/// Maximum candidate offers listed under one need.
pub const MAX_CANDIDATES: usize = 3;

/// An unconfirmed pairing proposal: one open need and its candidate offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSuggestion {
    pub need: Submission,
    pub offers: Vec<Submission>,
}

/// Both sides of a confirmed match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub need: Submission,
    pub offer: Submission,
}

/// Raised when the identifiers given for a match are not a need and an offer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Can only match a need with an offer (got {need_category} and {offer_category})")]
pub struct CategoryMismatch {
    pub need_id: SubmissionId,
    pub need_category: &'static str,
    pub offer_id: SubmissionId,
    pub offer_category: &'static str,
}

/// Neighborhood soft constraint: only reject when both sides are tagged and differ.
fn neighborhood_compatible(need: &Submission, offer: &Submission) -> bool {
    match (need.neighborhood, offer.neighborhood) {
        (Some(wanted), Some(offered)) => wanted == offered,
        _ => true,
    }
}

/// Pair every available need with up to [`MAX_CANDIDATES`] available offers.
///
/// `submissions` must already be ordered newest first. Offers are not reserved: the
/// same offer can be proposed for several needs. Needs without candidates are omitted.
pub fn suggest_matches(submissions: &[Submission]) -> Vec<MatchSuggestion> {
    let offers: Vec<&Submission> = submissions
        .iter()
        .filter(|s| s.category == Category::Offer && s.is_available())
        .collect();

    submissions
        .iter()
        .filter(|s| s.category == Category::Need && s.is_available())
        .filter_map(|need| {
            let candidates: Vec<Submission> = offers
                .iter()
                .filter(|offer| neighborhood_compatible(need, offer))
                .take(MAX_CANDIDATES)
                .map(|offer| (*offer).clone())
                .collect();

            if candidates.is_empty() {
                None
            } else {
                Some(MatchSuggestion {
                    need: need.clone(),
                    offers: candidates,
                })
            }
        })
        .collect()
}

/// Check categories and link `need` and `offer` to each other in place.
///
/// Neither record is modified when the categories are wrong.
pub fn pair(
    need: &mut Submission,
    offer: &mut Submission,
    now: DateTime<Utc>,
) -> Result<(), CategoryMismatch> {
    if need.category != Category::Need || offer.category != Category::Offer {
        return Err(CategoryMismatch {
            need_id: need.id.clone(),
            need_category: need.category.label(),
            offer_id: offer.id.clone(),
            offer_category: offer.category.label(),
        });
    }

    need.pair_with(&offer.id, now);
    offer.pair_with(&need.id, now);
    Ok(())
}
