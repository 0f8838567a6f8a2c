//! Session-scoped dataset store holding the influencer, post, tracking and
//! payout tables.
//!
//! Tables are replaced wholesale by [`DatasetStore::load`] and are read-only
//! afterwards; every analytical pipeline borrows them through the accessors.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{Influencer, InfluencerId, Payout, Post, TableKind, TrackingRecord};
use crate::views::{MergedPost, MergedTracking};

/// Rows of one table as handed over by the ingestion collaborator.
pub type TablePayload = Vec<serde_json::Value>;

pub const ORPHAN_POSTS_ERROR: &str = "Some posts reference non-existent influencers";

/// Tables replaced by a single [`DatasetStore::load`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub loaded: Vec<LoadedTable>,
    /// Identifiers that did not name any known table.
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedTable {
    pub table: TableKind,
    pub rows: usize,
}

impl LoadSummary {
    pub fn contains(&self, table: TableKind) -> bool {
        self.loaded.iter().any(|l| l.table == table)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<String>,
}

enum ParsedTable {
    Influencers(Vec<Influencer>),
    Posts(Vec<Post>),
    Tracking(Vec<TrackingRecord>),
    Payouts(Vec<Payout>),
}

#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    influencers: Option<Vec<Influencer>>,
    posts: Option<Vec<Post>>,
    tracking: Option<Vec<TrackingRecord>>,
    payouts: Option<Vec<Payout>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tables named by each identifier.
    ///
    /// Identifiers are matched to tables by case-insensitive prefix; unknown
    /// identifiers are skipped. Every payload is decoded before any table is
    /// swapped in, so a malformed row leaves the store untouched.
    pub fn load<I, K>(&mut self, tables: I) -> AnalyticsResult<LoadSummary>
    where
        I: IntoIterator<Item = (K, TablePayload)>,
        K: AsRef<str>,
    {
        let mut summary = LoadSummary::default();
        let mut parsed = Vec::new();

        for (identifier, rows) in tables {
            let identifier = identifier.as_ref();
            let Some(kind) = TableKind::from_identifier(identifier) else {
                debug!(identifier, "Ignoring unrecognized table identifier");
                summary.ignored.push(identifier.to_string());
                continue;
            };
            let row_count = rows.len();
            let table = match kind {
                TableKind::Influencers => ParsedTable::Influencers(decode_rows(kind, rows)?),
                TableKind::Posts => ParsedTable::Posts(decode_rows(kind, rows)?),
                TableKind::Tracking => ParsedTable::Tracking(decode_rows(kind, rows)?),
                TableKind::Payouts => ParsedTable::Payouts(decode_rows(kind, rows)?),
            };
            parsed.push(table);
            summary.loaded.push(LoadedTable {
                table: kind,
                rows: row_count,
            });
        }

        for table in parsed {
            match table {
                ParsedTable::Influencers(rows) => self.influencers = Some(rows),
                ParsedTable::Posts(rows) => self.posts = Some(rows),
                ParsedTable::Tracking(rows) => self.tracking = Some(rows),
                ParsedTable::Payouts(rows) => self.payouts = Some(rows),
            }
        }

        for loaded in &summary.loaded {
            metrics::counter!("dataset.rows_loaded", "table" => loaded.table.name())
                .increment(loaded.rows as u64);
            info!(table = %loaded.table, rows = loaded.rows, "Table loaded");
        }

        Ok(summary)
    }

    /// Install already-typed tables, replacing whatever was loaded before.
    /// Used by collaborators that build rows in memory, such as sample data
    /// generators.
    pub fn replace_all(
        &mut self,
        influencers: Vec<Influencer>,
        posts: Vec<Post>,
        tracking: Vec<TrackingRecord>,
        payouts: Vec<Payout>,
    ) {
        info!(
            influencers = influencers.len(),
            posts = posts.len(),
            tracking = tracking.len(),
            payouts = payouts.len(),
            "Replacing all tables"
        );
        self.influencers = Some(influencers);
        self.posts = Some(posts);
        self.tracking = Some(tracking);
        self.payouts = Some(payouts);
    }

    /// Check that all tables are present and that every post references a
    /// loaded influencer. Tracking and payout rows are not cross-checked.
    pub fn validate(&self) -> ValidationReport {
        let mut errors: Vec<String> = self
            .missing_tables()
            .into_iter()
            .map(|kind| AnalyticsError::MissingTable(kind).to_string())
            .collect();

        if errors.is_empty() {
            if let (Some(influencers), Some(posts)) = (&self.influencers, &self.posts) {
                let known: HashSet<InfluencerId> = influencers.iter().map(|i| i.id).collect();
                let orphans = posts
                    .iter()
                    .filter(|p| !known.contains(&p.influencer_id))
                    .count();
                if orphans > 0 {
                    warn!(orphans, "Posts reference unknown influencers");
                    errors.push(ORPHAN_POSTS_ERROR.to_string());
                }
            }
        }

        if !errors.is_empty() {
            metrics::counter!("dataset.validation_failures").increment(1);
        }

        ValidationReport {
            ok: errors.is_empty(),
            errors,
        }
    }

    pub fn missing_tables(&self) -> Vec<TableKind> {
        TableKind::ALL
            .into_iter()
            .filter(|kind| !self.has_table(*kind))
            .collect()
    }

    pub fn has_table(&self, kind: TableKind) -> bool {
        match kind {
            TableKind::Influencers => self.influencers.is_some(),
            TableKind::Posts => self.posts.is_some(),
            TableKind::Tracking => self.tracking.is_some(),
            TableKind::Payouts => self.payouts.is_some(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_tables().is_empty()
    }

    pub fn influencers(&self) -> Option<&[Influencer]> {
        self.influencers.as_deref()
    }

    pub fn posts(&self) -> Option<&[Post]> {
        self.posts.as_deref()
    }

    pub fn tracking(&self) -> Option<&[TrackingRecord]> {
        self.tracking.as_deref()
    }

    pub fn payouts(&self) -> Option<&[Payout]> {
        self.payouts.as_deref()
    }

    pub fn require_influencers(&self) -> AnalyticsResult<&[Influencer]> {
        self.influencers()
            .ok_or(AnalyticsError::MissingTable(TableKind::Influencers))
    }

    pub fn require_posts(&self) -> AnalyticsResult<&[Post]> {
        self.posts()
            .ok_or(AnalyticsError::MissingTable(TableKind::Posts))
    }

    pub fn require_tracking(&self) -> AnalyticsResult<&[TrackingRecord]> {
        self.tracking()
            .ok_or(AnalyticsError::MissingTable(TableKind::Tracking))
    }

    pub fn require_payouts(&self) -> AnalyticsResult<&[Payout]> {
        self.payouts()
            .ok_or(AnalyticsError::MissingTable(TableKind::Payouts))
    }

    pub fn influencer(&self, id: InfluencerId) -> Option<&Influencer> {
        self.influencers()?.iter().find(|i| i.id == id)
    }

    /// Posts left-joined with their influencer.
    pub fn merged_posts_view(&self) -> AnalyticsResult<Vec<MergedPost>> {
        let index = influencer_index(self.require_influencers()?);
        Ok(self
            .require_posts()?
            .iter()
            .map(|post| MergedPost::join(post, index.get(&post.influencer_id).copied()))
            .collect())
    }

    /// Tracking records left-joined with their influencer.
    pub fn merged_tracking_view(&self) -> AnalyticsResult<Vec<MergedTracking>> {
        let index = influencer_index(self.require_influencers()?);
        Ok(self
            .require_tracking()?
            .iter()
            .map(|record| MergedTracking::join(record, index.get(&record.influencer_id).copied()))
            .collect())
    }

    /// Drop every table, ending the session's dataset.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Index influencers by id. The first row wins when an id repeats, which
/// keeps the joins one-to-one.
pub fn influencer_index(influencers: &[Influencer]) -> HashMap<InfluencerId, &Influencer> {
    let mut index = HashMap::with_capacity(influencers.len());
    for influencer in influencers {
        index.entry(influencer.id).or_insert(influencer);
    }
    index
}

fn decode_rows<T: DeserializeOwned>(table: TableKind, rows: TablePayload) -> AnalyticsResult<Vec<T>> {
    rows.into_iter()
        .enumerate()
        .map(|(row, value)| {
            serde_json::from_value(value).map_err(|e| AnalyticsError::MalformedRow {
                table,
                row,
                reason: e.to_string(),
            })
        })
        .collect()
}
