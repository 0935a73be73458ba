//! Startup purge of old completed tasks.

use crate::clock::Clock;
use crate::constants::MILLIS_PER_HOUR;
use crate::error::AppError;
use crate::store::Store;

/// Delete tasks completed more than `retention_millis` ago; returns the count.
///
/// Runs opportunistically at startup. Repeating it is a no-op once the old
/// rows are gone.
pub fn sweep(store: &Store, clock: &dyn Clock, retention_millis: i64) -> Result<usize, AppError> {
    let cutoff = clock.now_millis().saturating_sub(retention_millis);
    let purged = store.purge_completed_before(cutoff).wait()?;
    if purged > 0 {
        log::info!("Purged {purged} completed task(s) older than {}h", retention_millis / MILLIS_PER_HOUR);
    } else {
        log::debug!("Nothing to purge");
    }
    Ok(purged)
}
