//! Citizen submissions: intake, filtering, dashboard statistics, and need/offer matching.

pub mod cache;
pub mod domain;
pub mod filter;
pub mod matching;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod tests;

pub use cache::{Mutation, QueryCache, QueryKey};
pub use domain::{
    Category, Neighborhood, NewSubmission, Patch, Submission, SubmissionId, SubmissionPatch,
    SubmissionStatus,
};
pub use filter::SubmissionFilter;
pub use matching::{suggest_matches, CategoryMismatch, MatchSuggestion, MatchedPair};
pub use repository::{RepositoryError, SubmissionRepository};
pub use router::submission_router;
pub use service::{SubmissionService, SubmissionServiceError};
pub use stats::DashboardStats;
pub use store::{InMemorySubmissionRepository, JsonFileSubmissionRepository};
pub use validation::{IntakeGuard, ValidationError};
