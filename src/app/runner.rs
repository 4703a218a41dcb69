//! A single poll cycle: lock, load, fetch, resolve, normalize, deliver,
//! commit.
//!
//! Expected conditions ("not modified", nothing new, a failed delivery) end
//! the cycle normally and are described by the [`RunSummary`]. Errors are
//! reserved for conditions the next scheduled run cannot fix by itself or
//! for a failed fetch, which leaves state untouched.

use std::fmt;

use crate::app::{AppContext, Result};
use crate::delivery::{deliver_all, DeliveryReport};
use crate::fetcher::{ConditionalFetcher, FetchOutcome};
use crate::normalizer::normalize;
use crate::resolver::resolve;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Server answered "not modified"; nothing was touched.
    NotModified,
    /// Cold start: cursor placed on the newest entry, nothing delivered.
    Seeded { cursor: String },
    /// Every pending entry (possibly none) was delivered.
    Completed,
    /// A delivery failed; the remaining entries wait for the next run.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub delivered: Vec<String>,
    /// Entries left for the next run: the failed one, then the unattempted.
    pub deferred: Vec<String>,
    /// New entries deliberately not delivered (cold start or per-run cap).
    pub skipped: usize,
    pub failure: Option<String>,
}

impl RunSummary {
    fn new(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            delivered: Vec::new(),
            deferred: Vec::new(),
            skipped: 0,
            failure: None,
        }
    }

    fn from_report(report: DeliveryReport, skipped: usize) -> Self {
        let outcome = if report.is_complete() {
            RunOutcome::Completed
        } else {
            RunOutcome::Partial
        };

        let mut deferred = Vec::new();
        let mut failure = None;
        if let Some(failed) = report.failed {
            failure = Some(format!("{}: {}", failed.entry_id, failed.error));
            deferred.push(failed.entry_id);
        }
        deferred.extend(report.not_attempted);

        Self {
            outcome,
            delivered: report.delivered,
            deferred,
            skipped,
            failure,
        }
    }

    /// True unless a delivery failed.
    pub fn is_clean(&self) -> bool {
        self.outcome != RunOutcome::Partial
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            RunOutcome::NotModified => write!(f, "Feed not modified"),
            RunOutcome::Seeded { cursor } => write!(
                f,
                "Cold start: marked {} existing entries as seen (cursor: {})",
                self.skipped, cursor
            ),
            RunOutcome::Completed if self.delivered.is_empty() && self.skipped == 0 => {
                write!(f, "No new entries")
            }
            RunOutcome::Completed | RunOutcome::Partial => {
                write!(
                    f,
                    "Run complete: {} delivered, {} deferred, {} skipped",
                    self.delivered.len(),
                    self.deferred.len(),
                    self.skipped
                )?;
                if let Some(failure) = &self.failure {
                    write!(f, " (delivery failed for {})", failure)?;
                }
                Ok(())
            }
        }
    }
}

pub async fn run_cycle(ctx: &AppContext) -> Result<RunSummary> {
    let _lock = ctx.store.lock()?;
    let loaded = ctx.store.load()?;
    if loaded.is_cold() {
        tracing::info!(
            "No delivery cursor yet, cold start policy is {}",
            ctx.config.cold_start
        );
    }

    let outcome = ConditionalFetcher::new(ctx.fetcher.as_ref())
        .fetch(&ctx.config.feed_url, &loaded)
        .await?;

    let (document, etag, last_modified) = match outcome {
        FetchOutcome::NotModified => {
            tracing::info!("Feed {} not modified", ctx.config.feed_url);
            return Ok(RunSummary::new(RunOutcome::NotModified));
        }
        FetchOutcome::Modified {
            document,
            etag,
            last_modified,
        } => (document, etag, last_modified),
    };

    let delta = resolve(
        &document.entries,
        loaded.last_entry_id.as_deref(),
        ctx.config.resolve_options(),
    );
    tracing::info!(
        "{} entries in {}, {} to deliver",
        document.entries.len(),
        document.title.as_deref().unwrap_or(&ctx.config.feed_url),
        delta.pending.len()
    );

    if let Some(cursor) = delta.seed {
        let mut seeded = loaded;
        seeded.set_validators(etag, last_modified);
        seeded.advance_to(&cursor);
        ctx.store.save(&seeded)?;

        let mut summary = RunSummary::new(RunOutcome::Seeded { cursor });
        summary.skipped = delta.skipped;
        return Ok(summary);
    }

    let messages: Vec<_> = delta
        .pending
        .iter()
        .map(|entry| normalize(entry, ctx.sanitizer.as_ref()))
        .collect();

    // Per-message commits carry the validators this cycle started with, so a
    // failed or interrupted batch makes the next fetch return the full document.
    let mut state = loaded;
    let report = deliver_all(
        &messages,
        ctx.transport.as_ref(),
        &ctx.config.chat_id,
        ctx.store.as_ref(),
        &mut state,
    )
    .await?;

    if report.is_complete() {
        let committed = state.clone();
        state.set_validators(etag, last_modified);
        if state != committed {
            ctx.store.save(&state)?;
        }
    } else {
        tracing::warn!(
            "Delivery stopped after {} of {} entries; {} deferred to the next run",
            report.delivered.len(),
            messages.len(),
            report.deferred()
        );
    }

    Ok(RunSummary::from_report(report, delta.skipped))
}
