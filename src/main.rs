/// Run entrypoint: load configuration, construct the two API clients, find
/// the resume point, and gap-fill the ledger up to the newest complete day.
///
/// Designed to be invoked once a day by external scheduling (cron). Exit
/// code 0 on success; any fatal error logs and exits 1.

use std::error::Error;
use std::process;
use std::time::Duration;

use chrono::Utc;

use gddmon_service::backfill::{self, BackfillConfig};
use gddmon_service::config::Config;
use gddmon_service::ingest::ambient::AmbientClient;
use gddmon_service::ledger::{self, sheets::SheetsClient};
use gddmon_service::logging::{self, DataSource, LogLevel};
use gddmon_service::model::STATION_TZ;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

fn main() {
    process::exit(match run() {
        Ok(()) => 0,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("Fatal: {}", e));
            1
        }
    });
}

fn run() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    logging::init_logger(LogLevel::Info, None);

    let config = Config::from_env()?;
    if config.log_file.is_some() {
        logging::init_logger(LogLevel::Info, config.log_file.as_deref());
    }

    let http = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()?;

    let ambient = AmbientClient::discover(
        http.clone(),
        &config.ambient_endpoint,
        &config.ambient_api_key,
        &config.ambient_application_key,
    )?;
    logging::info(
        DataSource::Ambient,
        Some(ambient.device_mac()),
        &format!(
            "Using device {}",
            ambient.device_name().unwrap_or("(unnamed)")
        ),
    );

    let mut store = SheetsClient::new(http, &config.spreadsheet_id, &config.sheets_token);
    ledger::ensure_sheet_structure(&mut store)?;

    let resume = ledger::find_resume_point(&mut store, config.default_start)?;
    logging::info(
        DataSource::Sheets,
        None,
        &format!(
            "Resuming at {} with cumulative GDD {:.2}",
            resume.start_date, resume.cumulative_gdd
        ),
    );

    let summary = backfill::run(
        &ambient,
        &mut store,
        &BackfillConfig::new(config.base_temp),
        resume,
        Utc::now().with_timezone(&STATION_TZ),
    )?;
    logging::log_run_summary(summary.days_processed, summary.cumulative_gdd);

    Ok(())
}
