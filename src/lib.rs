pub mod client;
pub mod config;
pub mod detail;
pub mod events;
pub mod expansion;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod models;
pub mod region;
pub mod report;

#[cfg(test)]
mod testing;

use anyhow::Context;
use tracing::info;

pub use config::AppConfig;
pub use detail::{extract_detail, DetailResolver, Role};
pub use events::EventListFetcher;
pub use expansion::{DetailState, ExpansionState, ItemState};
pub use feed::{Feed, FeedObserver};
pub use filter::{events_url, FilterCriteria};
pub use models::{DetailContent, Event, EventLocation};
pub use region::{derive_region, Region, RegionError};

/// Bootstraps logging and configuration, then fetches and logs the
/// unfiltered event list once.
pub fn run() -> anyhow::Result<()> {
    logging::init_logging();
    let config = AppConfig::load();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let feed = Feed::from_config(&config)?;
        feed.refresh().await;

        let events = feed.events();
        info!(count = events.len(), base = %config.base_url, "fetched event list");
        for event in &events {
            let mapped = event.region().is_some();
            info!(
                id = event.id,
                kind = %event.kind,
                mapped,
                "{}: {}",
                event.headline(),
                event.subtitle()
            );
        }
        Ok::<(), anyhow::Error>(())
    })
}
