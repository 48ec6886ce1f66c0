//! # Demo: basic
//!
//! Minimal walkthrough of the registry: anonymous and keyed registration,
//! replace-disposes-old, and a full sweep.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► add(action)                 anonymous, seq key
//!   ├─► set("conn", disposable)    keyed
//!   ├─► set("conn", disposable')   overwrites → old one disposed here
//!   ├─► set("feed", subscription)
//!   └─► clean()
//!         ├─► "feed" unsubscribed first
//!         └─► remaining entries drain
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use janitor::{DischargeError, Dispose, Janitor, Obligation};

struct Connection {
    name: &'static str,
}

impl Dispose for Connection {
    fn dispose(self: Box<Self>) -> Result<(), DischargeError> {
        println!("[conn] {} closed", self.name);
        Ok(())
    }
}

fn main() {
    // 1. Create an empty registry
    let registry = Janitor::new();

    // 2. Anonymous obligation under a generated key
    let key = registry
        .add_labeled(Obligation::action(|| println!("[cache] flushed")), "cache")
        .expect("registration");
    println!("cache flush registered under {key}");

    // 3. Keyed disposable; overwriting the key disposes the old value
    registry
        .set("conn", Obligation::disposable(Connection { name: "primary" }))
        .expect("registration");
    registry
        .set("conn", Obligation::disposable(Connection { name: "replica" }))
        .expect("registration"); // prints "[conn] primary closed"

    // 4. A subscription; sweeps silence these before anything else
    registry
        .set("feed", Obligation::subscription_fn(|| println!("[feed] unsubscribed")))
        .expect("registration");

    println!("tracking {} obligations: {:?}", registry.len(), registry.list());

    // 5. Sweep: feed first, then cache and replica in map order
    registry.clean();
    assert!(registry.is_empty());
    println!("registry swept clean");
}
