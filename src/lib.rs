//! # feed-courier
//!
//! Polls a syndication feed and relays every new entry, exactly once and in
//! publication order, to a Telegram chat.
//!
//! ## Architecture
//!
//! ```text
//! Store ─load─▶ Fetcher ─▶ Resolver ─▶ Normalizer ─▶ Delivery ─commit─▶ Store
//! ```
//!
//! Each invocation runs one cycle and exits; an external scheduler (cron, a
//! systemd timer) provides the cadence and is the only source of retries.
//! All cross-run state is a small JSON file holding the conditional-fetch
//! validators and the id of the last delivered entry.
//!
//! ## Quick Start
//!
//! ```bash
//! export TELEGRAM_BOT_TOKEN=123456:ABC
//! export TELEGRAM_CHAT_ID=@my_channel
//! export RSS_FEED_URL=https://blog.rust-lang.org/feed.xml
//!
//! # One cycle; the first run only records where the feed currently is
//! feed-courier run
//!
//! # Inspect or reset the cursor
//! feed-courier state show
//! feed-courier state reset
//! ```

/// Application context, the poll cycle and error handling.
///
/// [`run_cycle`](app::run_cycle) drives one complete cycle against an
/// [`AppContext`](app::AppContext).
pub mod app;

/// Command-line interface using clap.
///
/// - `run` - Run one poll cycle (default)
/// - `state show` - Print persisted state
/// - `state reset` - Clear cursor and validators
pub mod cli;

/// Configuration from a TOML file and environment variables.
pub mod config;

/// Delivery driver and the Telegram transport.
///
/// - [`Transport`](delivery::Transport): Async trait for the messaging endpoint
/// - [`TelegramTransport`](delivery::TelegramTransport): Bot API implementation
/// - [`deliver_all`](delivery::deliver_all): Ordered delivery with per-message commits
pub mod delivery;

/// Core domain models.
///
/// - [`DeliveryState`](domain::DeliveryState): Persisted validators and cursor
/// - [`FeedEntry`](domain::FeedEntry): A parsed feed entry
/// - [`NotificationMessage`](domain::NotificationMessage): A message ready to send
pub mod domain;

/// HTTP fetching with conditional request support.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for raw conditional GETs
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`ConditionalFetcher`](fetcher::ConditionalFetcher): Validators in, parsed document out
pub mod fetcher;

/// Entry normalization and HTML sanitization.
pub mod normalizer;

/// Feed parsing.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into [`FeedEntry`](domain::FeedEntry) values.
pub mod parser;

/// Delta resolution against the delivery cursor.
pub mod resolver;

/// Persistence of [`DeliveryState`](domain::DeliveryState).
///
/// - [`StateStore`](store::StateStore): Trait defining load/save/lock
/// - [`JsonStateStore`](store::JsonStateStore): Atomic JSON file implementation
pub mod store;

#[cfg(test)]
mod testing;
