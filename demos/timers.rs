//! # Demo: timers
//!
//! Cancellable background activities: a repeating interval, a deferred
//! discharge, and a tracked future.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► interval(300ms, tick)        repeats until the sweep cancels it
//!   ├─► delayed(600ms, action)       fires once mid-run
//!   ├─► delayed(10s, action) + cancel()   never fires
//!   ├─► adopt(spawned task)          key removed on settlement
//!   └─► clean()                      cancels the interval
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example timers
//! ```

use std::time::Duration;

use janitor::{Janitor, Obligation};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Janitor::new();

    // 1. Repeating activity; the sweep at the end cancels it
    registry.interval(Duration::from_millis(300), || async {
        println!("[interval] tick");
        Ok(())
    })?;

    // 2. One deferred discharge that has time to fire
    registry.delayed(
        Duration::from_millis(600),
        Obligation::action(|| println!("[delayed] fired")),
    )?;

    // 3. One deferred discharge cancelled before it can fire
    let doomed = registry.delayed(
        Duration::from_secs(10),
        Obligation::action(|| println!("[delayed] this line never prints")),
    )?;
    doomed.cancel();

    // 4. Track a spawned task until it settles
    let tracked = registry.adopt(tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        "payload"
    }));
    println!("tracking {} obligations", registry.len());

    let value = tracked.await?.expect("tracked task");
    println!("[adopt] settled with {value:?}");

    tokio::time::sleep(Duration::from_millis(500)).await;

    // 5. Sweep: cancels the interval and the spent delayed handles
    registry.clean();
    println!("registry swept clean");
    Ok(())
}
