use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelltrack_core::catalog::Catalog;
use shelltrack_core::config::{MarketOptions, Settings};
use shelltrack_core::domain::{Item, PriceAnalysis, PriceBounds};
use shelltrack_core::format;
use shelltrack_core::market;
use shelltrack_core::pricing;
use shelltrack_core::time::HourIndex;

mod calibrate;

#[derive(Debug, Parser)]
#[command(name = "shelltrack")]
struct Args {
    /// User the prices are generated for. Defaults to SHELLTRACK_USER_ID.
    #[arg(long, global = true)]
    user_id: Option<String>,

    /// Lower price bound in percent of base. Defaults to PRICE_MIN_PERCENT or 90.
    #[arg(long, global = true, allow_negative_numbers = true)]
    min_percent: Option<i32>,

    /// Upper price bound in percent of base. Defaults to PRICE_MAX_PERCENT or 110.
    #[arg(long, global = true, allow_negative_numbers = true)]
    max_percent: Option<i32>,

    /// Evaluate at this instant (RFC 3339) instead of now.
    #[arg(long, global = true)]
    at: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the catalog.
    Items,
    /// Price the user sees for an item this hour.
    Price {
        #[arg(long)]
        item: String,
    },
    /// Recover the base price behind an observed price and rate it.
    Analyze {
        #[arg(long)]
        item: String,
        #[arg(long)]
        observed: Option<u64>,
    },
    /// Prices for the coming hours.
    Predict {
        #[arg(long)]
        item: String,
        #[arg(long)]
        observed: Option<u64>,
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Cheapest hour in the coming window.
    BestTime {
        #[arg(long)]
        item: String,
        #[arg(long)]
        observed: Option<u64>,
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Full pricing report for the user across the catalog.
    Report,
    /// Lowest price sampled across synthetic users, per item.
    Global {
        /// Restrict to one item.
        #[arg(long)]
        item: Option<String>,
        #[arg(long)]
        users: Option<u32>,
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Reverse-engineer base prices from a JSON file of observed prices.
    Calibrate {
        #[arg(long)]
        input: PathBuf,
        /// Write results here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert a USD cost into shells.
    Shells {
        #[arg(long)]
        usd: f64,
        /// Dollars per hour of work. Defaults to DOLLARS_PER_HOUR or 10.
        #[arg(long, allow_negative_numbers = true)]
        rate: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(args, &settings);
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "command failed");
    }
    result
}

fn run(args: Args, settings: &Settings) -> anyhow::Result<()> {
    let now = resolve_now(args.at.as_deref())?;
    let catalog = Catalog::load(settings.catalog_path.as_deref())?;

    let mut options = MarketOptions::from_env();
    options.bounds = resolve_bounds(options.bounds, args.min_percent, args.max_percent);

    let user_id = || -> anyhow::Result<String> {
        match args.user_id.as_deref() {
            Some(u) => Ok(u.to_string()),
            None => Ok(settings.require_user_id()?.to_string()),
        }
    };

    match args.command {
        Command::Items => print_json(catalog.items()),
        Command::Price { item } => {
            let user_id = user_id()?;
            let item = randomized_item(&catalog, &item)?;
            let price = market::current_observed_price(
                &user_id,
                &item.id,
                item.base_price,
                options.bounds,
                now,
            )?;
            print_json(&serde_json::json!({
                "item_id": item.id,
                "price": price,
                "formatted": format::shells(price),
                "hour_index": HourIndex::from_datetime(now),
            }))
        }
        Command::Analyze { item, observed } => {
            let user_id = user_id()?;
            let item = randomized_item(&catalog, &item)?;
            let observed = observed_or_current(&user_id, item, observed, &options, now)?;
            let analysis = market::analyze(&user_id, &item.id, observed, options.bounds, now)?;
            print_json(&analysis_report(&analysis)?)
        }
        Command::Predict { item, observed, hours } => {
            let user_id = user_id()?;
            let item = randomized_item(&catalog, &item)?;
            let observed = observed_or_current(&user_id, item, observed, &options, now)?;
            let hours = hours.unwrap_or(options.hours_ahead);
            print_json(&market::predict_next_hours(
                &user_id,
                &item.id,
                observed,
                options.bounds,
                hours,
                now,
            )?)
        }
        Command::BestTime { item, observed, hours } => {
            let user_id = user_id()?;
            let item = randomized_item(&catalog, &item)?;
            let observed = observed_or_current(&user_id, item, observed, &options, now)?;
            let hours = hours.unwrap_or(options.hours_ahead);
            print_json(&market::best_time_to_buy(
                &user_id,
                &item.id,
                observed,
                options.bounds,
                hours,
                now,
            )?)
        }
        Command::Report => {
            let user_id = user_id()?;
            print_json(&market::user_pricing(&catalog, &user_id, &options, now)?)
        }
        Command::Global { item, users, hours } => {
            if let Some(n) = users {
                options.sample_users = n;
            }
            if let Some(n) = hours {
                options.hours_to_check = n;
            }
            let catalog = match item {
                Some(id) => Catalog::new(vec![catalog.find(&id)?.clone()]),
                None => catalog,
            };
            print_json(&market::global_market(&catalog, &options, now)?)
        }
        Command::Calibrate { input, output } => {
            let user_id = user_id()?;
            let observations = calibrate::read_observations(&input)?;
            let hour = HourIndex::from_datetime(now);
            let results =
                calibrate::calibrate_all(&catalog, &user_id, &observations, &options, hour)?;

            match output {
                Some(path) => {
                    let body = serde_json::to_string_pretty(&results)?;
                    std::fs::write(&path, body)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), items = results.len(), "calibration saved");
                    Ok(())
                }
                None => print_json(&results),
            }
        }
        Command::Shells { usd, rate } => {
            let rate = rate.unwrap_or(options.dollars_per_hour);
            let shells = pricing::shells_for_cost(usd, rate)?;
            print_json(&serde_json::json!({
                "usd": usd,
                "dollars_per_hour": rate,
                "shells": shells,
                "formatted": format::shells(shells),
            }))
        }
    }
}

fn randomized_item<'a>(catalog: &'a Catalog, item_id: &str) -> anyhow::Result<&'a Item> {
    let item = catalog.find(item_id)?;
    anyhow::ensure!(
        !item.is_fixed(),
        "{} ({}) has a fixed price; it does not change over time",
        item.name,
        item.id
    );
    Ok(item)
}

/// Analysis plus display strings for the price and its deviation from base.
fn analysis_report(analysis: &PriceAnalysis) -> anyhow::Result<serde_json::Value> {
    let mut report = serde_json::to_value(analysis)?;
    report["formatted_price"] = format::shells(analysis.current_price).into();
    report["deviation_from_base"] = format::percentage(analysis.percentage_from_base - 100.0).into();
    Ok(report)
}

fn observed_or_current(
    user_id: &str,
    item: &Item,
    observed: Option<u64>,
    options: &MarketOptions,
    now: DateTime<Utc>,
) -> anyhow::Result<u64> {
    match observed {
        Some(p) => Ok(p),
        None => Ok(market::current_observed_price(
            user_id,
            &item.id,
            item.base_price,
            options.bounds,
            now,
        )?),
    }
}

fn resolve_bounds(
    defaults: PriceBounds,
    min_percent: Option<i32>,
    max_percent: Option<i32>,
) -> PriceBounds {
    PriceBounds::new(
        min_percent.unwrap_or(defaults.min_percent),
        max_percent.unwrap_or(defaults.max_percent),
    )
}

fn resolve_now(at_arg: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match at_arg {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("--at must be RFC 3339 (got {s})"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_subcommands_and_global_flags() {
        let args = Args::try_parse_from([
            "shelltrack",
            "predict",
            "--item",
            "abc",
            "--hours",
            "12",
            "--user-id",
            "u1",
            "--min-percent",
            "-5",
        ])
        .unwrap();
        assert_eq!(args.user_id.as_deref(), Some("u1"));
        assert_eq!(args.min_percent, Some(-5));
        match args.command {
            Command::Predict { item, observed, hours } => {
                assert_eq!(item, "abc");
                assert_eq!(observed, None);
                assert_eq!(hours, Some(12));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn resolves_at_or_now() {
        let at = resolve_now(Some("2025-08-16T14:52:00+02:00")).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2025, 8, 16, 12, 52, 0).unwrap());
        assert!(resolve_now(Some("yesterday")).is_err());
        assert!(resolve_now(None).is_ok());
    }

    #[test]
    fn flags_override_bound_defaults() {
        let b = resolve_bounds(PriceBounds::default(), Some(80), None);
        assert_eq!(b, PriceBounds::new(80, 110));
    }

    #[test]
    fn analysis_report_adds_display_strings() {
        let analysis = PriceAnalysis {
            current_price: 1042,
            base_price: 1000,
            min_possible_price: 900,
            max_possible_price: 1100,
            percentage_from_base: 104.2,
            minutes_until_change: 30,
            recommendation: pricing::score(104.2, 30),
        };
        let report = analysis_report(&analysis).unwrap();
        assert_eq!(report["formatted_price"], "1,042 shells");
        assert_eq!(report["deviation_from_base"], "+4.2%");
        assert_eq!(report["base_price"], 1000);
    }

    #[test]
    fn fixed_items_are_refused_for_hourly_commands() {
        let catalog = Catalog::builtin().unwrap();
        assert!(randomized_item(&catalog, "cmdmch4xb056cqn01rc10afcq").is_err());
        assert!(randomized_item(&catalog, "cmebn7caq0118nv01spx78x4t").is_ok());
        assert!(randomized_item(&catalog, "missing").is_err());
    }
}
