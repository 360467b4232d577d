//! Clears the persisted "walkthrough seen" flag so the tour runs again on
//! the next start.
//!
//! Usage: tour_reset [STATE_PATH]

use anyhow::Result;

use lensdash::config::Config;
use lensdash::storage::SqliteFlagStore;

fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| Config::from_env().state_path);
    let mut store = SqliteFlagStore::open(&path)?;
    if store.clear()? {
        println!("walkthrough flag cleared in {}", path);
    } else {
        println!("walkthrough flag was not set in {}", path);
    }
    Ok(())
}
