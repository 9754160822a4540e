use anyhow::Result;
use rand::Rng;
use tracing::info;

use crate::{
    storage::{local_store::LocalStore, USER_ID_KEY},
    utils::clock::Clock,
};

/// Returns the identifier of this installation, creating and persisting one on first use. The id
/// has the form `user_{millis}_{0..=999}`. Collisions between installations are not handled.
pub fn get_or_create_user_id(store: &dyn LocalStore, clock: &dyn Clock) -> Result<String> {
    if let Some(existing) = store.get(USER_ID_KEY)? {
        if !existing.trim().is_empty() {
            return Ok(existing);
        }
    }

    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    let user_id = format!("user_{}_{}", clock.timestamp_millis(), suffix);
    store.set(USER_ID_KEY, &user_id)?;
    info!("Created user id {user_id}");
    Ok(user_id)
}
