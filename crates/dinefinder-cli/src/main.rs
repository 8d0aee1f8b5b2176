//! dinefinder - an offline-first restaurant directory client.
//!
//! Reads are served from the local cache, seeded from the data server on
//! first use. Favorite toggles and new reviews are stored locally first;
//! the armed sync trigger drains before the command exits, and anything
//! that could not reach the server stays queued for a later `sync` run.

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dinefinder_core::models::{NewReview, RestaurantWithReviews};
use dinefinder_core::service::{DirectoryService, FILTER_ALL};
use dinefinder_core::sync::{drain_pending, ChannelScheduler};
use dinefinder_core::Config;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!("Usage: dinefinder <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  seed                                   fetch and cache server data");
    eprintln!("  list [cuisine] [neighborhood]          list restaurants ('all' skips a filter)");
    eprintln!("  cuisines                               list known cuisines");
    eprintln!("  neighborhoods                          list known neighborhoods");
    eprintln!("  show <id>                              one restaurant with its reviews");
    eprintln!("  favorite <id> <true|false>             set the favorite flag");
    eprintln!("  review <id> <name> <rating> <text...>  add a review");
    eprintln!("  sync                                   push pending local changes");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        print_usage();
        return Ok(());
    };

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Ok(url) = std::env::var("DINEFINDER_API_URL") {
        config.api_base_url = Some(url);
    }

    let (scheduler, mut rx) = ChannelScheduler::new();
    let service = DirectoryService::open(&config, Arc::new(scheduler))?;

    // Fill the cache on every start; a failed seed still leaves whatever
    // an earlier run cached.
    if let Err(e) = service.initialize().await {
        warn!(error = %e, "Network seed failed, serving cached data only");
    }

    match command {
        "seed" => {
            service.initialize().await.context("Seeding failed")?;
            let cached = service.list_by_filter(FILTER_ALL, FILTER_ALL).await;
            println!("{} restaurants cached", cached.len());
        }
        "list" => {
            let cuisine = args.get(1).map(String::as_str).unwrap_or(FILTER_ALL);
            let neighborhood = args.get(2).map(String::as_str).unwrap_or(FILTER_ALL);
            for r in service.list_by_filter(cuisine, neighborhood).await {
                let star = if r.is_favorite { "*" } else { " " };
                println!(
                    "{:>4} {} {} - {}, {}",
                    r.id, star, r.name, r.cuisine_type, r.neighborhood
                );
            }
        }
        "cuisines" => {
            for cuisine in service.distinct_cuisines().await {
                println!("{}", cuisine);
            }
        }
        "neighborhoods" => {
            for neighborhood in service.distinct_neighborhoods().await {
                println!("{}", neighborhood);
            }
        }
        "show" => {
            let id = parse_id(args.get(1))?;
            match service.restaurant_with_reviews(id).await {
                Some(joined) => print_restaurant(&joined),
                None => bail!("No restaurant with id {}", id),
            }
        }
        "favorite" => {
            let id = parse_id(args.get(1))?;
            let value = match args.get(2).map(String::as_str) {
                Some("true") => true,
                Some("false") => false,
                _ => bail!("Expected 'true' or 'false'"),
            };
            let restaurant = service.toggle_favorite(id, value).await?;
            if value {
                println!("{} added to favorites", restaurant.name);
            } else {
                println!("{} removed from favorites", restaurant.name);
            }
            drain_pending(&service, &mut rx).await;
        }
        "review" => {
            let id = parse_id(args.get(1))?;
            let Some(name) = args.get(2).cloned() else {
                bail!("Missing reviewer name");
            };
            let rating: u8 = match args.get(3) {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("Invalid rating: {}", raw))?,
                None => bail!("Missing rating (0-5)"),
            };
            let comments = args[4..].join(" ");

            let review = service
                .add_review(
                    id,
                    NewReview {
                        name,
                        rating,
                        comments,
                    },
                )
                .await?;
            println!("Review stored locally (id {})", review.id);
            drain_pending(&service, &mut rx).await;
        }
        "sync" => {
            let mut failures = false;
            match service.synchronize_restaurants().await {
                Ok(synced) => println!("Restaurants: {} synced", synced),
                Err(e) => {
                    failures = true;
                    eprintln!("Restaurants: {}", e);
                }
            }
            match service.synchronize_reviews().await {
                Ok(synced) => println!("Reviews: {} synced", synced),
                Err(e) => {
                    failures = true;
                    eprintln!("Reviews: {}", e);
                }
            }
            if failures {
                bail!("Some records failed to sync; they stay queued for the next run");
            }
        }
        _ => print_usage(),
    }

    Ok(())
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    match arg {
        Some(raw) => raw.parse().with_context(|| format!("Invalid id: {}", raw)),
        None => bail!("Missing id argument"),
    }
}

fn print_restaurant(joined: &RestaurantWithReviews) {
    let r = &joined.restaurant;
    println!("{} ({})", r.name, r.cuisine_type);
    println!("{}, {}", r.address, r.neighborhood);
    if r.is_favorite {
        println!("Favorite");
    }
    if !r.operating_hours.is_empty() {
        println!();
        for (day, hours) in &r.operating_hours {
            println!("  {}: {}", day, hours);
        }
    }
    if !joined.reviews.is_empty() {
        println!();
        println!("Reviews:");
        for review in &joined.reviews {
            println!(
                "  {} - {}/5 ({})",
                review.name,
                review.rating,
                format_review_date(review.created_at)
            );
            if !review.comments.is_empty() {
                println!("    {}", review.comments);
            }
        }
    }
}

fn format_review_date(epoch_millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_millis)
        .map(|dt| dt.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}
