use crate::app::{run_cycle, AppContext, Result, RunOutcome, RunSummary};
use crate::domain::DeliveryState;
use crate::store::{JsonStateStore, StateError, StateStore};

pub async fn run(ctx: &AppContext) -> Result<RunSummary> {
    tracing::info!("Polling {}", ctx.config.feed_url);
    let summary = run_cycle(ctx).await?;

    println!("{}", summary);
    if summary.outcome == RunOutcome::Partial {
        for id in &summary.deferred {
            println!("  deferred: {}", id);
        }
    }

    Ok(summary)
}

pub fn show_state(store: &JsonStateStore) -> Result<()> {
    let state = match store.try_load() {
        Ok(Some(state)) => state,
        Ok(None) => {
            println!("No state file at {}", store.path().display());
            return Ok(());
        }
        Err(e @ StateError::Corrupt { .. }) => {
            println!("{} (the next run starts from empty state)", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let json = serde_json::to_string_pretty(&state).map_err(StateError::Serialize)?;
    println!("{}", json);
    Ok(())
}

/// Explicit operator reset: the only way the cursor ever moves backward.
pub fn reset_state(store: &JsonStateStore) -> Result<()> {
    let _lock = store.lock()?;
    store.save(&DeliveryState::default())?;
    tracing::info!("State reset at {}", store.path().display());
    println!("State reset: {}", store.path().display());
    Ok(())
}
