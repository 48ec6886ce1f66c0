//! # Demo: events
//!
//! Watching the registry's event stream with the built-in [`LogWriter`].
//! Debug diagnostics are enabled through [`Config`], failure events are
//! always published.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Janitor::with_config(debug = true)
//!   ├─► spawn_listener(bus, LogWriter)
//!   ├─► add / set / overwrite           → [added] / [replaced] lines
//!   ├─► add(failing action) + clean()   → [discharge-failed] line
//!   └─► stop listener
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example events --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use janitor::{spawn_listener, Config, DischargeError, Janitor, LogWriter, Obligation};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Debug diagnostics on, small bus
    let mut cfg = Config::default();
    cfg.debug = true;
    cfg.bus_capacity = 256;
    let registry = Janitor::with_config(cfg);

    // 2. Attach the stdout subscriber
    let stop = CancellationToken::new();
    let worker = spawn_listener(registry.bus(), stop.clone(), Arc::new(LogWriter));

    // 3. Generate some lifecycle traffic
    registry.add_labeled(Obligation::action(|| {}), "cache")?;
    registry.set("conn", Obligation::action(|| {}))?;
    registry.set("conn", Obligation::action(|| {}))?; // replaces, discharges old

    // 4. A failing obligation shows up as [discharge-failed]
    registry.add(Obligation::try_action(|| {
        Err(DischargeError::failed("socket already closed"))
    }))?;

    registry.clean();

    // 5. Let the worker drain, then stop it
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop.cancel();
    let _ = worker.await;
    Ok(())
}
