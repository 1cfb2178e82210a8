use crate::date_util::{days_until, next_day};
use crate::error::Result;
use crate::source::{DayFetch, DurationSource};
use crate::storage::{AggregateStore, LoadedAggregate};
use crate::sync::{SyncOptions, SyncProgress, SyncReport, SyncStatus};

/// Walk every day from the aggregate's high-water-mark up to (excluding)
/// today, append each day's durations, then save the aggregate once.
///
/// A day whose fetch fails is logged and skipped; the walk still moves past
/// it. Load and save failures abort the run and nothing is persisted.
/// The high-water-mark never moves backwards, so a clock that runs behind
/// the stored mark performs no fetches and leaves it in place.
pub async fn sync_durations(
    source: &dyn DurationSource,
    store: &mut dyn AggregateStore,
    options: &SyncOptions,
    progress: &dyn SyncProgress,
) -> Result<SyncReport> {
    let today = options.today();

    let LoadedAggregate {
        location,
        created,
        mut aggregate,
    } = store.load().await.inspect_err(|e| log::error!("{e}"))?;
    if created {
        log::info!("Created new storage location {location}");
    }

    let start = aggregate.resume_from(today, options.days);
    if aggregate.high_water_mark.is_none() {
        log::warn!(
            "Aggregate in {location} has no high-water-mark, starting {} days back at {start}",
            options.days
        );
    }

    let total = days_until(start, today);
    log::info!("Syncing {total} day(s) from {start} up to {today}");

    let mut days_walked: u32 = 0;
    let mut days_with_data: u32 = 0;
    let mut days_failed: u32 = 0;
    let mut entries_added: u64 = 0;

    let mut cursor = start;
    while cursor < today {
        progress.on_day_start(cursor, days_walked as usize, total);
        match source.fetch_day(cursor).await {
            Ok(DayFetch::Records(records)) => {
                let added = aggregate.merge_day(records);
                log::debug!("{cursor}: merged {added} entries");
                entries_added += added as u64;
                days_with_data += 1;
                progress.on_day_fetched(cursor, added);
            }
            Ok(DayFetch::Empty) => {
                log::debug!("{cursor}: no data");
                progress.on_day_fetched(cursor, 0);
            }
            Err(e) => {
                log::warn!("Skipping {cursor}: {e}");
                days_failed += 1;
                progress.on_day_failed(cursor, &e);
            }
        }
        days_walked += 1;
        cursor = next_day(cursor);
    }

    let high_water_mark = aggregate
        .high_water_mark
        .map_or(today, |mark| mark.max(today));
    aggregate.high_water_mark = Some(high_water_mark);

    store
        .save(&aggregate)
        .await
        .inspect_err(|e| log::error!("{e}"))?;
    progress.on_saved(&location);
    log::info!(
        "Saved {} entries across {} project(s) to {location}, high-water-mark {high_water_mark}",
        aggregate.entry_count(),
        aggregate.projects.len()
    );

    Ok(SyncReport {
        location: Some(location),
        created_location: created,
        status: SyncStatus::Success,
        days_walked,
        days_with_data,
        days_failed,
        entries_added,
        high_water_mark: Some(high_water_mark),
        error: None,
    })
}
