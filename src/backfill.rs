/// Daily gap-fill aggregation.
///
/// Walks the calendar one day at a time from the resume point to the newest
/// complete day: fetch the day's observations, average the temperature,
/// append the raw samples, and write the day's summary row. Strictly
/// sequential and blocking; the append-only ledger is the only checkpoint,
/// so a run that dies mid-range is recovered by simply running again.
///
/// # Clock injection
/// `run` takes `now` as a parameter rather than reading the system clock,
/// so the day-window arithmetic is deterministic in tests.

use std::error::Error;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use chrono_tz::Tz;

use crate::analysis::gdd;
use crate::ingest::ObservationSource;
use crate::ledger::{self, ResumePoint, RowStore};
use crate::logging::{self, DataSource};
use crate::model::{DailySummary, GddError, STATION_TZ};

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Aggregation parameters plus courtesy pacing between external calls.
/// The pauses are politeness toward the upstream rate limit, not retries.
pub struct BackfillConfig {
    /// GDD base temperature threshold.
    pub base_temp: f64,
    /// Pause before the first device query of a run.
    pub startup_pause: Duration,
    /// Pause after each day's summary-row update.
    pub per_day_pause: Duration,
}

impl BackfillConfig {
    /// Production pacing: 2s before the first query, 1s between days.
    pub fn new(base_temp: f64) -> Self {
        BackfillConfig {
            base_temp,
            startup_pause: Duration::from_secs(2),
            per_day_pause: Duration::from_secs(1),
        }
    }

    /// No pacing. Use in tests against in-memory collaborators.
    pub fn without_pacing(base_temp: f64) -> Self {
        BackfillConfig {
            base_temp,
            startup_pause: Duration::ZERO,
            per_day_pause: Duration::ZERO,
        }
    }
}

/// What a completed run did, for the end-of-run log line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub days_processed: usize,
    pub last_date: Option<NaiveDate>,
    pub cumulative_gdd: f64,
}

// ---------------------------------------------------------------------------
// Day loop
// ---------------------------------------------------------------------------

/// Process every missing day from `resume.start_date` up to (exclusive) one
/// day before the day containing `now`.
///
/// The current day is always incomplete and the day before it may still be
/// settling upstream, so neither is processed: with `now` on Jan 3rd, the
/// newest day aggregated is Jan 1st.
pub fn run(
    source: &dyn ObservationSource,
    store: &mut dyn RowStore,
    config: &BackfillConfig,
    resume: ResumePoint,
    now: DateTime<Tz>,
) -> Result<RunSummary, Box<dyn Error>> {
    let cutoff = now
        .date_naive()
        .checked_sub_days(Days::new(1))
        .expect("now minus one day is representable");

    let mut day = resume.start_date;
    let mut cumulative = resume.cumulative_gdd;
    let mut row_index = resume.next_row_index;
    let mut summary = RunSummary {
        days_processed: 0,
        last_date: None,
        cumulative_gdd: cumulative,
    };

    if day >= cutoff {
        return Ok(summary);
    }
    thread::sleep(config.startup_pause);

    while day < cutoff {
        let mut observations = source.fetch_observations(end_of_day_ms(day)?)?;
        logging::debug(
            DataSource::Ambient,
            None,
            &format!("{}: fetched {} observations", day, observations.len()),
        );

        // The API returns newest-first; the raw log stores the day
        // oldest-first.
        observations.reverse();

        let mean = gdd::mean_temperature(day, &observations)?;

        let raw_rows = observations
            .iter()
            .map(ledger::raw_row)
            .collect::<Result<Vec<_>, _>>()?;
        store.append_rows(ledger::RAW_SHEET, raw_rows)?;

        let daily = gdd::round2(gdd::daily_gdd(mean, config.base_temp));
        cumulative = gdd::accumulate(cumulative, daily);

        let row = DailySummary {
            date: day,
            mean_temp: mean,
            gdd: daily,
            cumulative_gdd: cumulative,
        };
        store.update_row(ledger::SUMMARY_SHEET, row_index, ledger::summary_row(&row))?;

        logging::info(
            DataSource::System,
            None,
            &format!(
                "{}: mean temp {:.2}, GDD {:.2}, cumulative {:.2}",
                day, mean, daily, cumulative
            ),
        );

        summary.days_processed += 1;
        summary.last_date = Some(day);
        summary.cumulative_gdd = cumulative;

        row_index += 1;
        day = day
            .checked_add_days(Days::new(1))
            .expect("next calendar day is representable");
        thread::sleep(config.per_day_pause);
    }

    Ok(summary)
}

/// Epoch milliseconds of `day` 23:59:00 station-local: the cutoff handed to
/// the upstream fetch, which returns the samples preceding it.
pub fn end_of_day_ms(day: NaiveDate) -> Result<i64, GddError> {
    let end_of_day = day
        .and_hms_opt(23, 59, 0)
        .expect("23:59:00 is a valid wall-clock time");
    STATION_TZ
        .from_local_datetime(&end_of_day)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| GddError::ParseError(format!("{} 23:59 does not exist in {}", day, STATION_TZ)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
