//! Influencer dashboard: loads the session's tables from JSON row files,
//! validates them and prints one analytics report as JSON.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use influencer_core::{AppConfig, DatasetStore, TablePayload};
use influencer_reporting::breakdown::{payouts_over_time, TimeBucket};
use influencer_reporting::filter::filter_payouts_by_date;
use influencer_reporting::insights::top_influencers_by_payout;
use influencer_reporting::metrics::round_to;
use influencer_reporting::performance::{
    enrich_with_profiles, follower_bounds, store_influencer_performance, ProfileFilter,
};
use influencer_reporting::{
    campaign::store_campaign_roas, campaign_scope, generate_insights, portfolio_overview,
    FilterCriteria, Selection,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Report {
    Overview,
    Influencers,
    Campaigns,
    CampaignScope,
    Insights,
    Payouts,
}

#[derive(Parser, Debug)]
#[command(name = "influencer-dashboard")]
#[command(about = "Influencer campaign performance and ROAS reports")]
#[command(version)]
struct Cli {
    /// Optional TOML config file
    #[arg(long)]
    config: Option<String>,

    /// Directory holding the table files (overrides config)
    #[arg(long, env = "INFLUENCER_ANALYTICS__DATASET__DATA_DIR")]
    data_dir: Option<String>,

    #[arg(long, value_enum, default_value_t = Report::Overview)]
    report: Report,

    #[arg(long, default_value = "All")]
    brand: String,
    #[arg(long, default_value = "All")]
    platform: String,
    #[arg(long, default_value = "All")]
    campaign: String,
    #[arg(long, default_value = "All")]
    product: String,
    #[arg(long, default_value = "All")]
    category: String,

    /// Inclusive start date (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    #[arg(long)]
    min_followers: Option<u64>,
    #[arg(long)]
    max_followers: Option<u64>,

    /// Exit with an error when validation fails
    #[arg(long, default_value_t = false)]
    strict: bool,
}

impl Cli {
    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria {
            brand: Selection::from(self.brand.as_str()),
            platform: Selection::from(self.platform.as_str()),
            campaign: Selection::from(self.campaign.as_str()),
            product: Selection::from(self.product.as_str()),
            category: Selection::from(self.category.as_str()),
            date_range: None,
        };
        if let (Some(start), Some(end)) = (self.start, self.end) {
            criteria = criteria.between(start, end);
        }
        criteria
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "influencer_dashboard=info,influencer_core=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(dir) = &cli.data_dir {
        config.dataset.data_dir = dir.clone();
    }
    if cli.strict {
        config.dataset.strict = true;
    }

    info!(
        data_dir = %config.dataset.data_dir,
        report = ?cli.report,
        "Configuration loaded"
    );

    let mut store = DatasetStore::new();
    let payloads = read_tables(Path::new(&config.dataset.data_dir), &config.dataset.file_extension)?;
    let summary = store.load(payloads)?;
    info!(tables = summary.loaded.len(), ignored = summary.ignored.len(), "Dataset loaded");
    if !store.is_complete() {
        warn!(missing = ?store.missing_tables(), "Dataset is incomplete");
    }

    let validation = store.validate();
    if !validation.ok {
        for error in &validation.errors {
            warn!(%error, "Validation failed");
        }
        if config.dataset.strict {
            bail!("dataset failed validation: {}", validation.errors.join("; "));
        }
    }

    let precision = config.reporting.ratio_precision;
    match cli.report {
        Report::Overview => print_json(&portfolio_overview(&store)?),
        Report::Influencers => {
            let perf = store_influencer_performance(&store)?;
            let influencers = store.require_influencers()?;
            let bounds = follower_bounds(influencers);
            let followers = match (cli.min_followers, cli.max_followers, bounds) {
                (None, None, _) => None,
                (min, max, Some(b)) => {
                    Some(min.unwrap_or(*b.start())..=max.unwrap_or(*b.end()))
                }
                (min, max, None) => Some(min.unwrap_or(0)..=max.unwrap_or(u64::MAX)),
            };
            let filter = ProfileFilter {
                category: Selection::from(cli.category.as_str()),
                followers,
            };
            let mut rows = filter.apply(&enrich_with_profiles(&perf, influencers));
            for row in &mut rows {
                row.performance.roas = round_to(row.performance.roas, precision);
            }
            print_json(&rows)
        }
        Report::Campaigns => {
            let mut rows = store_campaign_roas(&store)?;
            for row in &mut rows {
                row.incremental_roas = round_to(row.incremental_roas, precision);
            }
            print_json(&rows)
        }
        Report::CampaignScope => {
            let mut view = campaign_scope(&store, &cli.criteria())?;
            for row in &mut view.influencers {
                row.roas = round_to(row.roas, precision);
            }
            print_json(&view)
        }
        Report::Insights => print_json(&generate_insights(&store, &config.reporting)?),
        Report::Payouts => {
            let payouts = store.require_payouts()?;
            let payouts = match (cli.start, cli.end) {
                (Some(start), Some(end)) => filter_payouts_by_date(payouts, start, end),
                _ => payouts.to_vec(),
            };
            print_json(&PayoutReport {
                monthly: payouts_over_time(&payouts, TimeBucket::Month),
                top_payees: top_influencers_by_payout(
                    &payouts,
                    store.require_influencers()?,
                    config.reporting.top_payees,
                ),
                records: payouts,
            })
        }
    }
}

#[derive(Serialize)]
struct PayoutReport {
    records: Vec<influencer_core::Payout>,
    monthly: Vec<influencer_reporting::breakdown::PeriodPayout>,
    top_payees: Vec<influencer_reporting::insights::RankedInfluencer>,
}

/// Read every `<table>*.<ext>` file in `dir` as a JSON array of rows, keyed
/// by file name. Files are read in name order so later files replace earlier
/// ones for the same table.
fn read_tables(dir: &Path, extension: &str) -> anyhow::Result<Vec<(String, TablePayload)>> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("reading data directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();
    paths.sort();

    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let rows: TablePayload = serde_json::from_str(&text)
            .with_context(|| format!("parsing {} as a JSON array of rows", path.display()))?;
        tables.push((name, rows));
    }
    Ok(tables)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
