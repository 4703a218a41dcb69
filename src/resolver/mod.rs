//! Delta resolution: which entries of a freshly fetched document still need
//! to be delivered, and in what order.
//!
//! The feed's own listing order is not trusted. When every entry carries a
//! publish timestamp the entries are sorted by it; otherwise the listing is
//! taken to be newest-first and reversed. Walking from the newest entry
//! backwards, entries are collected until the cursor entry is met. The
//! result is always oldest-first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::FeedEntry;

/// What to do on a cold start, when no entry has ever been delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColdStartPolicy {
    /// Deliver nothing and move the cursor to the newest entry.
    #[default]
    Seed,
    /// Deliver only the newest entry.
    Latest,
    /// Deliver every entry in the document, oldest first.
    All,
}

impl FromStr for ColdStartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "seed" => Ok(Self::Seed),
            "latest" => Ok(Self::Latest),
            "all" => Ok(Self::All),
            other => Err(format!(
                "Invalid cold start policy: {}. Use 'seed', 'latest' or 'all'",
                other
            )),
        }
    }
}

impl fmt::Display for ColdStartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seed => "seed",
            Self::Latest => "latest",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

/// Resolver result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// Entries to deliver, oldest first.
    pub pending: Vec<FeedEntry>,
    /// Cursor to commit without delivering anything (cold-start seeding).
    pub seed: Option<String>,
    /// Undelivered entries dropped because of the per-run cap.
    pub skipped: usize,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.seed.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    pub cold_start: ColdStartPolicy,
    /// Upper bound on entries delivered in one run; the newest are kept.
    pub max_entries: Option<usize>,
}

/// Puts entries into chronological order (oldest first).
pub fn chronological(entries: &[FeedEntry]) -> Vec<FeedEntry> {
    let mut ordered = entries.to_vec();
    if !ordered.is_empty() && ordered.iter().all(|e| e.published_at.is_some()) {
        // Ties keep the reversed listing order.
        ordered.reverse();
        ordered.sort_by_key(|e| e.published_at);
    } else {
        ordered.reverse();
    }
    ordered
}

pub fn resolve(entries: &[FeedEntry], last_delivered_id: Option<&str>, options: ResolveOptions) -> Delta {
    let ordered = chronological(entries);

    let Some(newest_id) = ordered.last().map(|e| e.id.clone()) else {
        return Delta::default();
    };

    let Some(cursor) = last_delivered_id.map(str::trim).filter(|c| !c.is_empty()) else {
        return cold_start(ordered, newest_id, options);
    };

    let mut collected = Vec::new();
    let mut found = false;
    for entry in ordered.iter().rev() {
        if entry.id == cursor {
            found = true;
            break;
        }
        collected.push(entry.clone());
    }

    if !found {
        tracing::warn!(
            "Last delivered entry {} is no longer in the feed; treating all {} entries as new",
            cursor,
            collected.len()
        );
    }

    collected.reverse();
    capped(collected, options.max_entries)
}

fn cold_start(ordered: Vec<FeedEntry>, newest_id: String, options: ResolveOptions) -> Delta {
    match options.cold_start {
        ColdStartPolicy::Seed => {
            tracing::info!(
                "Cold start: seeding cursor at {} without delivering {} entries",
                newest_id,
                ordered.len()
            );
            Delta {
                pending: Vec::new(),
                seed: Some(newest_id),
                skipped: ordered.len(),
            }
        }
        ColdStartPolicy::Latest => {
            let skipped = ordered.len() - 1;
            let newest = ordered.into_iter().last();
            Delta {
                pending: newest.into_iter().collect(),
                seed: None,
                skipped,
            }
        }
        ColdStartPolicy::All => capped(ordered, options.max_entries),
    }
}

fn capped(mut pending: Vec<FeedEntry>, max_entries: Option<usize>) -> Delta {
    let skipped = match max_entries {
        Some(max) if pending.len() > max => {
            let skipped = pending.len() - max;
            tracing::warn!(
                "{} new entries exceed the per-run limit of {}; skipping the {} oldest",
                pending.len(),
                max,
                skipped
            );
            pending.drain(..skipped);
            skipped
        }
        _ => 0,
    };

    Delta {
        pending,
        seed: None,
        skipped,
    }
}
