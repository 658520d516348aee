// Visit Calendar
// Headless driver: search a patient, load a year and print the grid

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};

use visit_calendar::models::biomarker::{default_palette, A1cLevel, BiomarkerCategory, LegendTone};
use visit_calendar::models::calendar::YearGrid;
use visit_calendar::models::patient::SearchCriteria;
use visit_calendar::services::backend::{HttpPatientLookup, HttpVisitStore};
use visit_calendar::services::settings::SettingsService;
use visit_calendar::utils::date;
use visit_calendar::CalendarEngine;

struct Args {
    patient_number: Option<String>,
    year: Option<i32>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let patient_number = args.next();
    let year = args
        .next()
        .map(|raw| raw.parse::<i32>().with_context(|| format!("Invalid year '{}'", raw)))
        .transpose()?;
    Ok(Args {
        patient_number,
        year,
    })
}

fn print_palette() {
    let chips = default_palette()
        .into_iter()
        .map(|chip| format!("[{} {}: {}]", chip.payload.category.short_label(), chip.title, chip.tone.label()))
        .collect::<Vec<_>>()
        .join(" ");
    let legend = LegendTone::ALL
        .iter()
        .map(|tone| tone.label())
        .collect::<Vec<_>>()
        .join(" / ");
    println!("Palette: {}", chips);
    println!("Legend: {}", legend);
}

fn print_grid(engine: &CalendarEngine, grid: &YearGrid) {
    println!("Visits for {}", grid.year());
    for month in grid.months() {
        let name = engine.month_name(month.month_number).unwrap_or("?");
        println!("\n{}", name);
        for week in &month.weeks {
            let summary = week
                .summary()
                .into_iter()
                .map(|(category, value)| format!("{} {}", category.short_label(), value))
                .collect::<Vec<_>>()
                .join("  ");
            println!("  {:>5}  {}", week.start_date.label(), summary);
            for visit in week.visits() {
                match (visit.category, visit.value) {
                    (Some(BiomarkerCategory::Hba1c), Some(value)) => println!(
                        "         - {} ({}) {}",
                        visit.reason,
                        visit.date,
                        A1cLevel::for_value(value).label()
                    ),
                    _ => println!("         - {} ({})", visit.reason, visit.date),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    log::info!("Starting Visit Calendar");

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args = parse_args()?;
    let settings = SettingsService::from_default_location().load_or_default();

    let lookup = Arc::new(HttpPatientLookup::new(&settings)?);
    let store = Arc::new(HttpVisitStore::new(&settings)?);
    let year = args.year.unwrap_or_else(date::current_year);
    let mut engine = CalendarEngine::new(settings, lookup, store, year);

    let mut code = ExitCode::SUCCESS;
    if let Some(number) = args.patient_number {
        let criteria = SearchCriteria::by_patient_number(engine.on_patient_number_input(&number));
        if let Some(outcome) = engine.on_search_submit(&criteria).await {
            if let Err(e) = outcome.into_patient() {
                log::error!("{}", e);
                code = ExitCode::FAILURE;
            }
        }
    }

    print_palette();
    print_grid(&engine, engine.grid());
    if let Some(status) = engine.status() {
        println!("\n{} {}", status.kind.icon(), status.text);
    }

    Ok(code)
}
