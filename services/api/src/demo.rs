use crate::infra::{build_service, Storage};
use civic_hub::config::{AppConfig, StorageConfig};
use civic_hub::error::AppError;
use civic_hub::submissions::{
    Category, DashboardStats, InMemorySubmissionRepository, MatchSuggestion, Neighborhood,
    NewSubmission, Submission, SubmissionService, SubmissionStatus,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct SnapshotArgs {
    /// JSON snapshot to read. Defaults to APP_DATA_PATH.
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Stop after printing suggestions instead of confirming the first one.
    #[arg(long)]
    pub(crate) skip_match: bool,
}

fn open_snapshot(args: SnapshotArgs) -> Result<SubmissionService<Storage>, AppError> {
    let data_path = match args.data {
        Some(path) => Some(path),
        None => AppConfig::load()?.storage.data_path,
    };
    let config = StorageConfig {
        data_path,
        query_cache: false,
    };
    let service = build_service(&config)?;
    println!("Source: {}", service.repository().describe());
    Ok(service)
}

pub(crate) fn run_stats(args: SnapshotArgs) -> Result<(), AppError> {
    let service = open_snapshot(args)?;
    render_stats(&service.stats()?);
    Ok(())
}

pub(crate) fn run_suggest(args: SnapshotArgs) -> Result<(), AppError> {
    let service = open_snapshot(args)?;
    render_suggestions(&service.match_suggestions()?);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("Civic hub demo");
    let service = SubmissionService::new(Arc::new(InMemorySubmissionRepository::default()));
    let seeded = seed_sample_hub(&service)?;
    println!("Seeded {} submissions", seeded.len());
    for submission in &seeded {
        render_submission(submission);
    }

    render_stats(&service.stats()?);
    let suggestions = service.match_suggestions()?;
    render_suggestions(&suggestions);

    if args.skip_match {
        return Ok(());
    }

    let Some((need, offer)) = suggestions
        .first()
        .and_then(|suggestion| Some((&suggestion.need, suggestion.offers.first()?)))
    else {
        println!("\nNo match to confirm");
        return Ok(());
    };

    let pair = service.confirm_match(&need.id, &offer.id)?;
    println!("\nConfirmed match");
    render_submission(&pair.need);
    render_submission(&pair.offer);

    render_stats(&service.stats()?);
    render_suggestions(&service.match_suggestions()?);
    Ok(())
}

fn sample(
    category: Category,
    title: &str,
    description: &str,
    neighborhood: Option<Neighborhood>,
    hours_offered: Option<i64>,
) -> NewSubmission {
    NewSubmission {
        category,
        status: None,
        title: title.to_string(),
        description: description.to_string(),
        neighborhood,
        contact_name: None,
        contact_email: None,
        hours_offered,
    }
}

pub(crate) fn seed_sample_hub(
    service: &SubmissionService<InMemorySubmissionRepository>,
) -> Result<Vec<Submission>, AppError> {
    let mut snow = sample(
        Category::Need,
        "Snow shoveling for seniors",
        "Three households on Elm Street cannot clear their driveways",
        Some(Neighborhood::Riverside),
        None,
    );
    snow.contact_name = Some("Maria".to_string());
    snow.contact_email = Some("maria@example.org".to_string());

    let mut crew = sample(
        Category::Offer,
        "Weekend snow crew",
        "Four of us can shovel Saturday mornings after storms",
        Some(Neighborhood::Riverside),
        Some(12),
    );
    crew.contact_email = Some("crew@example.org".to_string());

    let mut garden = sample(
        Category::Need,
        "Garden cleanup",
        "Overgrown lot behind the library needs clearing",
        Some(Neighborhood::Hillcrest),
        None,
    );
    garden.status = Some(SubmissionStatus::Resolved);

    let intake = vec![
        snow,
        crew,
        sample(
            Category::Offer,
            "Handyman hours",
            "Small repairs around the house, bring your own parts",
            None,
            Some(6),
        ),
        sample(
            Category::Need,
            "Ride to the clinic",
            "Weekly ride to dialysis appointments on Tuesdays",
            Some(Neighborhood::Downtown),
            None,
        ),
        sample(
            Category::Offer,
            "Driving volunteer",
            "Retired bus driver with a free afternoon each week",
            Some(Neighborhood::Downtown),
            Some(8),
        ),
        sample(
            Category::Idea,
            "Community tool library",
            "Lend ladders and drills out of the old fire station",
            Some(Neighborhood::Oakwood),
            None,
        ),
        garden,
    ];

    let mut created = Vec::with_capacity(intake.len());
    for input in intake {
        created.push(service.create(input)?);
    }
    Ok(created)
}

fn render_submission(submission: &Submission) {
    let neighborhood = submission
        .neighborhood
        .map(Neighborhood::label)
        .unwrap_or("anywhere");
    let matched = match &submission.matched_with_id {
        Some(id) => format!(" | matched with {id}"),
        None => String::new(),
    };
    println!(
        "- [{}] {} | {} | {}{}",
        submission.category.label(),
        submission.title,
        neighborhood,
        submission.status.label(),
        matched
    );
}

fn render_stats(stats: &DashboardStats) {
    println!("\nDashboard");
    println!("- {} participants", stats.total_participants);
    println!(
        "- {} needs | {} offers | {} ideas",
        stats.total_needs_reported, stats.total_volunteers_offered, stats.total_ideas_shared
    );
    println!(
        "- {} hours offered | {} estimated citizen hours",
        stats.total_hours_offered, stats.estimated_citizen_hours
    );
    println!(
        "- {} resolved | {} matched",
        stats.resolved_count, stats.matched_count
    );
}

fn render_suggestions(suggestions: &[MatchSuggestion]) {
    if suggestions.is_empty() {
        println!("\nNo match suggestions");
        return;
    }

    println!("\nMatch suggestions");
    for suggestion in suggestions {
        println!("- {} ({})", suggestion.need.title, suggestion.need.id);
        for offer in &suggestion.offers {
            println!("    -> {} ({})", offer.title, offer.id);
        }
    }
}
