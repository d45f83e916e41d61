//! # Demo: dynamic_listeners
//!
//! Walks through the listener registry with both provenance channels and
//! shows that one misbehaving listener cannot break delivery to the rest.
//!
//! Shows how to:
//! - Register listeners explicitly and remove them by handle.
//! - Track a [`ServiceDirectory`] so discovered listeners join and leave the
//!   membership on their own.
//! - Observe per-listener fault isolation during an emit.
//!
//! ## Flow
//! ```text
//! add_explicit(console-a)                 ──► [console-a]
//! directory.register("listener", b)      ──► [console-a, console-b]
//! notify_message_arrived(...)            ──► both invoked
//! add_explicit(panicky)                  ──► [console-a, console-b, panicky]
//! notify_message_arrived(...)            ──► panicky caught+logged, others fine
//! directory.update(handle, c)            ──► b replaced by c
//! directory.deregister(handle)           ──► discovered entry gone
//! remove_explicit(a)                     ──► explicit entry gone
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example dynamic_listeners
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use edgelink::{DataServiceListener, DataServiceNotifier, ServiceDirectory, ServiceFilter};

/// Prints every message it sees.
struct Console {
    label: &'static str,
}

#[async_trait]
impl DataServiceListener for Console {
    async fn on_message_arrived(&self, topic: &str, payload: &[u8], qos: i32, retained: bool) {
        println!(
            "[{}] arrived topic={topic} bytes={} qos={qos} retained={retained}",
            self.label,
            payload.len()
        );
    }

    async fn on_connection_established(&self) {
        println!("[{}] connection established", self.label);
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

/// Panics on every message; the notifier must contain the blast.
struct Panicky;

#[async_trait]
impl DataServiceListener for Panicky {
    async fn on_message_arrived(&self, _: &str, _: &[u8], _: i32, _: bool) {
        panic!("panicky listener doing panicky things");
    }

    fn name(&self) -> &'static str {
        "panicky"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let notifier = DataServiceNotifier::new();
    let directory: ServiceDirectory<dyn DataServiceListener> = ServiceDirectory::new();

    // explicit provenance
    let console_a = notifier
        .registry()
        .add_explicit(Arc::new(Console { label: "console-a" }));

    // discovered provenance: registry follows the directory
    let cancel = CancellationToken::new();
    let watch = directory.watch(&ServiceFilter::name("listener"))?;
    let tracker = Arc::clone(notifier.registry()).track(watch, cancel.clone());

    let discovered = directory
        .register("listener", Arc::new(Console { label: "console-b" }))
        .expect("directory is open");
    settle().await;

    println!("--- both channels populated ---");
    notifier.notify_connection_established().await;
    notifier
        .notify_message_arrived("sensors/temp", &[0x01, 0x02], 0, false)
        .await;

    println!("--- a panicking listener joins; delivery still reaches the rest ---");
    let panicky = notifier.registry().add_explicit(Arc::new(Panicky));
    notifier
        .notify_message_arrived("sensors/temp", &[0x03], 0, false)
        .await;
    notifier.registry().remove_explicit(panicky);

    println!("--- the discovered listener is replaced in place ---");
    directory.update(discovered, Arc::new(Console { label: "console-c" }));
    settle().await;
    notifier
        .notify_message_arrived("sensors/humidity", &[0x04], 1, true)
        .await;

    println!("--- membership drains ---");
    directory.deregister(discovered);
    settle().await;
    notifier.registry().remove_explicit(console_a);
    // delivered to nobody; recorded as a drop, not an error
    notifier.notify_message_arrived("sensors/temp", &[], 0, false).await;

    cancel.cancel();
    tracker.await?;
    notifier.close();
    directory.close();
    Ok(())
}

/// Lets the tracking loop drain pending directory events.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
