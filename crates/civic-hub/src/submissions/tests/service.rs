use super::common::*;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;

use crate::submissions::cache::{QueryCache, QueryKey};
use crate::submissions::domain::{
    Category, Neighborhood, Patch, SubmissionId, SubmissionPatch, SubmissionStatus,
};
use crate::submissions::filter::SubmissionFilter;
use crate::submissions::repository::{RepositoryError, SubmissionRepository};
use crate::submissions::service::{SubmissionService, SubmissionServiceError};
use crate::submissions::validation::ValidationError;

#[test]
fn create_assigns_id_status_and_timestamps() {
    let (service, repository) = build_service();

    let created = service
        .create(intake(Category::Need))
        .expect("valid submission");

    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.status, SubmissionStatus::Open);
    assert_eq!(created.created_at, created.updated_at);
    let stored = repository
        .fetch(&created.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored, created);
}

#[test]
fn create_rejects_short_title_without_writing() {
    let (service, repository) = build_service();
    let mut input = intake(Category::Idea);
    input.title = "ab".to_string();

    match service.create(input) {
        Err(SubmissionServiceError::Validation(ValidationError::TooShort { field, min })) => {
            assert_eq!(field, "title");
            assert_eq!(min, 3);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(repository.all().expect("list").is_empty());
}

#[test]
fn list_orders_newest_first_and_filters() {
    let (service, _) = build_service();
    let first = service.create(intake(Category::Need)).expect("create");
    let second = service.create(intake(Category::Offer)).expect("create");
    let third = service.create(intake(Category::Need)).expect("create");

    let all: Vec<_> = service
        .list(SubmissionFilter::default())
        .expect("list")
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(all, vec![third.id.clone(), second.id, first.id.clone()]);

    let needs: Vec<_> = service
        .list(SubmissionFilter::category(Category::Need))
        .expect("list")
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(needs, vec![third.id, first.id]);
}

#[test]
fn get_propagates_not_found() {
    let (service, _) = build_service();

    match service.get(&SubmissionId::from("missing")) {
        Err(SubmissionServiceError::NotFound(id)) => assert_eq!(id.as_str(), "missing"),
        other => panic!("expected not found error, got {other:?}"),
    }
}

#[test]
fn update_refreshes_updated_at_and_keeps_category() {
    let (service, _) = build_service();
    let created = service.create(intake(Category::Offer)).expect("create");

    let patch = SubmissionPatch {
        status: Patch::Set(SubmissionStatus::InProgress),
        neighborhood: Patch::Set(Neighborhood::Riverside),
        contact_email: Patch::Set(String::new()),
        ..SubmissionPatch::default()
    };
    let updated = service.update(&created.id, patch).expect("update");

    assert_eq!(updated.category, Category::Offer);
    assert_eq!(updated.status, SubmissionStatus::InProgress);
    assert_eq!(updated.neighborhood, Some(Neighborhood::Riverside));
    assert_eq!(updated.contact_email, None);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[test]
fn update_validates_before_looking_up_the_record() {
    let (service, _) = build_service();
    let patch = SubmissionPatch {
        description: Patch::Set("too short".to_string()),
        ..SubmissionPatch::default()
    };

    assert!(matches!(
        service.update(&SubmissionId::from("missing"), patch),
        Err(SubmissionServiceError::Validation(_))
    ));
}

#[test]
fn confirm_match_sets_reciprocal_links() {
    let (service, repository) = build_service();
    let need = service.create(intake(Category::Need)).expect("create");
    let offer = service.create(intake(Category::Offer)).expect("create");

    let pair = service
        .confirm_match(&need.id, &offer.id)
        .expect("match confirmed");

    assert_eq!(pair.need.status, SubmissionStatus::Matched);
    assert_eq!(pair.offer.status, SubmissionStatus::Matched);
    assert_eq!(pair.need.matched_with_id.as_ref(), Some(&offer.id));
    assert_eq!(pair.offer.matched_with_id.as_ref(), Some(&need.id));

    let stored_offer = repository
        .fetch(&offer.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored_offer, pair.offer);
}

#[test]
fn confirm_match_rejects_non_offer_and_leaves_records_alone() {
    let (service, repository) = build_service();
    let need = service.create(intake(Category::Need)).expect("create");
    let idea = service.create(intake(Category::Idea)).expect("create");

    match service.confirm_match(&need.id, &idea.id) {
        Err(SubmissionServiceError::InvalidPair(mismatch)) => {
            assert_eq!(mismatch.offer_category, "idea");
        }
        other => panic!("expected category mismatch, got {other:?}"),
    }

    assert_eq!(
        repository.fetch(&need.id).expect("fetch"),
        Some(need.clone())
    );
    assert_eq!(repository.fetch(&idea.id).expect("fetch"), Some(idea));
}

#[test]
fn confirm_match_reports_missing_side() {
    let (service, _) = build_service();
    let need = service.create(intake(Category::Need)).expect("create");

    assert!(matches!(
        service.confirm_match(&need.id, &SubmissionId::from("ghost")),
        Err(SubmissionServiceError::NotFound(_))
    ));
}

#[test]
fn failed_pair_write_leaves_both_sides_unmatched() {
    let repository = Arc::new(PairFailingRepository::default());
    let service = SubmissionService::new(repository.clone()).with_clock(stepping_clock());
    let need = service.create(intake(Category::Need)).expect("create");
    let offer = service.create(intake(Category::Offer)).expect("create");

    assert!(matches!(
        service.confirm_match(&need.id, &offer.id),
        Err(SubmissionServiceError::Repository(RepositoryError::Unavailable(_)))
    ));

    for id in [&need.id, &offer.id] {
        let stored = repository.fetch(id).expect("fetch").expect("present");
        assert_eq!(stored.status, SubmissionStatus::Open);
        assert_eq!(stored.matched_with_id, None);
    }
}

#[test]
fn stats_are_cached_until_a_mutation() {
    let (service, _) = build_service();
    service.create(intake(Category::Need)).expect("create");

    let before = service.stats().expect("stats");
    assert_eq!(before.total_needs_reported, 1);
    assert!(service.cache().contains(&QueryKey::Stats));

    let mut offer = intake(Category::Offer);
    offer.hours_offered = Some(10);
    service.create(offer).expect("create");
    assert!(!service.cache().contains(&QueryKey::Stats));

    let after = service.stats().expect("stats");
    assert_eq!(after.total_volunteers_offered, 1);
    assert_eq!(after.total_hours_offered, 10);
    // 0.6 * 10 + 2 * 1 = 8
    assert_eq!(after.estimated_citizen_hours, 8);
}

#[test]
fn match_invalidates_suggestions_and_cached_records() {
    let (service, _) = build_service();
    let need = service.create(intake(Category::Need)).expect("create");
    let offer = service.create(intake(Category::Offer)).expect("create");

    let suggestions = service.match_suggestions().expect("suggestions");
    assert_eq!(suggestions.len(), 1);
    service.get(&need.id).expect("get");

    service.confirm_match(&need.id, &offer.id).expect("match");

    assert!(!service.cache().contains(&QueryKey::Submission(need.id.clone())));
    assert!(service.match_suggestions().expect("suggestions").is_empty());
    assert_eq!(
        service.get(&need.id).expect("get").status,
        SubmissionStatus::Matched
    );
}

#[test]
fn disabled_cache_still_serves_fresh_reads() {
    let repository = Arc::new(crate::submissions::store::InMemorySubmissionRepository::default());
    let service = SubmissionService::with_cache(repository, QueryCache::disabled());
    service.create(intake(Category::Idea)).expect("create");

    assert_eq!(service.stats().expect("stats").total_ideas_shared, 1);
    assert!(service.cache().is_empty());
}

#[test]
fn storage_failures_surface_as_repository_errors() {
    let service = SubmissionService::new(Arc::new(UnavailableRepository));

    assert!(matches!(
        service.stats(),
        Err(SubmissionServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert!(matches!(
        service.create(intake(Category::Need)),
        Err(SubmissionServiceError::Repository(_))
    ));
}

#[test]
fn stats_read_overlapping_a_create_is_not_cached() {
    let repository = Arc::new(GatedRepository::default());
    let service = SubmissionService::new(repository.clone()).with_clock(stepping_clock());
    repository.armed.store(true, Ordering::SeqCst);

    thread::scope(|scope| {
        let reader = scope.spawn(|| service.stats().expect("stats"));

        repository.reached.wait();
        service.create(intake(Category::Need)).expect("create");
        repository.release.wait();

        let overlapped = reader.join().expect("reader thread");
        assert_eq!(overlapped.total_needs_reported, 0);
    });

    assert!(!service.cache().contains(&QueryKey::Stats));
    assert_eq!(service.stats().expect("stats").total_needs_reported, 1);
}

#[test]
fn concurrent_patches_keep_both_changes() {
    let (service, repository) = build_service();
    let created = service.create(intake(Category::Offer)).expect("create");

    for round in 0..20 {
        let title = format!("Snow crew round {round}");
        let contact = format!("Volunteer {round}");
        let start = Barrier::new(2);

        thread::scope(|scope| {
            scope.spawn(|| {
                start.wait();
                let patch = SubmissionPatch {
                    title: Patch::Set(title.clone()),
                    ..SubmissionPatch::default()
                };
                service.update(&created.id, patch).expect("title patch");
            });
            scope.spawn(|| {
                start.wait();
                let patch = SubmissionPatch {
                    contact_name: Patch::Set(contact.clone()),
                    hours_offered: Patch::Set(round + 1),
                    ..SubmissionPatch::default()
                };
                service.update(&created.id, patch).expect("contact patch");
            });
        });

        let stored = repository
            .fetch(&created.id)
            .expect("fetch")
            .expect("present");
        assert_eq!(stored.title, title);
        assert_eq!(stored.contact_name.as_deref(), Some(contact.as_str()));
        assert_eq!(stored.hours_offered, Some((round + 1) as u32));
    }
}

#[test]
fn patch_racing_a_match_keeps_the_pairing() {
    let (service, repository) = build_service();

    for round in 0..20 {
        let need = service.create(intake(Category::Need)).expect("create");
        let offer = service.create(intake(Category::Offer)).expect("create");
        let title = format!("Ride to the clinic, week {round}");
        let start = Barrier::new(2);

        thread::scope(|scope| {
            scope.spawn(|| {
                start.wait();
                service
                    .confirm_match(&need.id, &offer.id)
                    .expect("match confirmed");
            });
            scope.spawn(|| {
                start.wait();
                let patch = SubmissionPatch {
                    title: Patch::Set(title.clone()),
                    ..SubmissionPatch::default()
                };
                service.update(&need.id, patch).expect("title patch");
            });
        });

        let stored = repository.fetch(&need.id).expect("fetch").expect("present");
        assert_eq!(stored.title, title);
        assert_eq!(stored.status, SubmissionStatus::Matched);
        assert_eq!(stored.matched_with_id.as_ref(), Some(&offer.id));
    }
}
