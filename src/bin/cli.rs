#![cfg(not(tarpaulin_include))]

use chrono::Local;
use std::env;
use std::fs;
use std::time::Instant;

use tulong_admin::analytics::{TimeRange, dashboard_summary, geographic_analytics, time_analytics};
use tulong_admin::config::AdminConfig;
use tulong_admin::downloader::{to_csv, to_excel_csv};
use tulong_admin::loader::PaginatedUsers;
use tulong_admin::report::render_report;
use tulong_admin::store::JsonFileStore;
use tulong_admin::user::UserRecord;

const USAGE: &str = "Usage: {} <dump.json> <command>

Commands:
  summary              Dashboard headline numbers
  geo                  Top regions, provinces and cities
  time <7|30|90|all>   Registrations over time
  export-csv <file>    Write all users as CSV
  export-excel <file>  Write all users as Excel-compatible CSV
  report <file>        Write the printable HTML report";

fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replacen("{}", program, 1));
}

fn argument<'a>(args: &'a [String], index: usize, program: &str) -> Option<&'a str> {
    let value = args.get(index).map(String::as_str);
    if value.is_none() {
        print_usage(program);
    }
    value
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let s = Instant::now();
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("tulong-cli");

    if args.len() < 3 {
        print_usage(program);
        return Ok(());
    }

    let mut options = AdminConfig::load().loader;
    options.enable_realtime = false;

    let loader = PaginatedUsers::from_init(JsonFileStore::open(&args[1]), options);
    loader.load_initial().await?;
    loader.load_all().await?;
    let users: Vec<UserRecord> = loader.snapshot().users;
    let now = Local::now();

    match args[2].as_str() {
        "summary" => {
            let stats = dashboard_summary(&users, &now);
            println!("Total users:     {}", stats.total_users);
            println!("Today:           {}", stats.users_today);
            println!(
                "Last 7 days:     {} ({}% of all)",
                stats.users_last_7_days, stats.growth_7_days
            );
            println!("Last 30 days:    {}", stats.users_last_30_days);
            println!("Top region:      {} ({})", stats.top_region, stats.top_region_count);
        }
        "geo" => {
            let geo = geographic_analytics(&users);
            println!(
                "{} regions, {} provinces, {} cities",
                geo.stats.total_regions, geo.stats.total_provinces, geo.stats.total_cities
            );
            for (title, rows) in [
                ("Regions", &geo.top_regions),
                ("Provinces", &geo.top_provinces),
                ("Cities", &geo.top_cities),
            ] {
                println!("\n{title}:");
                for row in rows {
                    println!("  {:<30} {}", row.name, row.value);
                }
            }
        }
        "time" => {
            let Some(raw) = argument(&args, 3, program) else {
                return Ok(());
            };
            let range: TimeRange = raw.parse()?;
            let time = time_analytics(&users, range, &now);
            for day in &time.registrations_by_day {
                println!("{}  {}", day.full_date, day.users);
            }
            println!(
                "\n{} registrations in range, growth {}{}%",
                time.total_in_range,
                if time.is_positive_growth { "+" } else { "" },
                time.growth_percentage
            );
            if let Some(peak) = &time.peak_hour {
                println!("Peak hour: {} ({} users)", peak.hour, peak.users);
            }
        }
        "export-csv" | "export-excel" | "report" => {
            let Some(file) = argument(&args, 3, program) else {
                return Ok(());
            };
            let content = match args[2].as_str() {
                "export-csv" => to_csv(&users, &Local),
                "export-excel" => to_excel_csv(&users, &Local),
                _ => render_report(&users, &now)?,
            };
            fs::write(file, content)?;
            println!("Wrote {} users to {file}", users.len());
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage(program);
        }
    }

    let e = s.elapsed().as_secs_f64();
    eprintln!("Total elapsed time: {:.1} seconds", e);

    Ok(())
}
