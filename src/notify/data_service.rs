//! # Data-service event family: listener trait and notifier.
//!
//! [`DataServiceListener`] is the capability set observed by consumers of the
//! data service: connection lifecycle, inbound messages, and publish
//! confirmations correlated by plain message id.
//!
//! [`DataServiceNotifier`] owns the family's [`ListenerRegistry`] and fans
//! each event out per the rules in [`crate::notify`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::notify::fan_out;
use crate::registry::ListenerRegistry;

/// Capability set for data-service observers.
///
/// Every method has an empty default body, so implementors override only the
/// events they care about. Implementations may be called from any task; they
/// must not assume a particular thread.
#[async_trait]
pub trait DataServiceListener: Send + Sync + 'static {
    /// The connection to the remote endpoint was established.
    async fn on_connection_established(&self) {}

    /// An orderly disconnect is about to begin.
    async fn on_disconnecting(&self) {}

    /// An orderly disconnect completed.
    async fn on_disconnected(&self) {}

    /// The connection dropped unexpectedly.
    async fn on_connection_lost(&self, cause: &TransportError) {
        let _ = cause;
    }

    /// A message arrived from the remote endpoint.
    async fn on_message_arrived(&self, topic: &str, payload: &[u8], qos: i32, retained: bool) {
        let _ = (topic, payload, qos, retained);
    }

    /// A message left the local queue for the transport.
    async fn on_message_published(&self, message_id: u32, topic: &str) {
        let _ = (message_id, topic);
    }

    /// The transport confirmed delivery of a message.
    async fn on_message_confirmed(&self, message_id: u32, topic: &str) {
        let _ = (message_id, topic);
    }

    /// Human-readable name used in failure logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Fan-out notifier for the data-service event family.
///
/// Holds the membership both provenance channels feed; see
/// [`registry()`](DataServiceNotifier::registry) for explicit registration
/// and directory tracking.
pub struct DataServiceNotifier {
    registry: Arc<ListenerRegistry<dyn DataServiceListener>>,
}

impl DataServiceNotifier {
    /// Creates a notifier with an empty registry.
    pub fn new() -> Self {
        Self {
            registry: ListenerRegistry::new(),
        }
    }

    /// Returns the registry this notifier snapshots on every emit.
    pub fn registry(&self) -> &Arc<ListenerRegistry<dyn DataServiceListener>> {
        &self.registry
    }

    /// Releases the underlying registry; subsequent emits deliver to nobody.
    pub fn close(&self) {
        self.registry.close();
    }

    pub async fn notify_connection_established(&self) {
        fan_out(
            "on_connection_established",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_connection_established().await },
        )
        .await;
    }

    pub async fn notify_disconnecting(&self) {
        fan_out(
            "on_disconnecting",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_disconnecting().await },
        )
        .await;
    }

    pub async fn notify_disconnected(&self) {
        fan_out(
            "on_disconnected",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_disconnected().await },
        )
        .await;
    }

    pub async fn notify_connection_lost(&self, cause: &TransportError) {
        fan_out(
            "on_connection_lost",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_connection_lost(cause).await },
        )
        .await;
    }

    pub async fn notify_message_arrived(
        &self,
        topic: &str,
        payload: &[u8],
        qos: i32,
        retained: bool,
    ) {
        fan_out(
            "on_message_arrived",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_message_arrived(topic, payload, qos, retained).await },
        )
        .await;
    }

    pub async fn notify_message_published(&self, message_id: u32, topic: &str) {
        fan_out(
            "on_message_published",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_message_published(message_id, topic).await },
        )
        .await;
    }

    pub async fn notify_message_confirmed(&self, message_id: u32, topic: &str) {
        fan_out(
            "on_message_confirmed",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_message_confirmed(message_id, topic).await },
        )
        .await;
    }
}

impl Default for DataServiceNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistrationHandle;
    use std::sync::Mutex;

    /// Records every callback into a log shared across listeners, so tests
    /// can assert cross-listener delivery order.
    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DataServiceListener for Recorder {
        async fn on_connection_established(&self) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}: established", self.label));
        }

        async fn on_message_arrived(&self, topic: &str, payload: &[u8], qos: i32, retained: bool) {
            self.log.lock().unwrap().push(format!(
                "{}: arrived topic={topic} payload={payload:?} qos={qos} retained={retained}",
                self.label
            ));
        }

        fn name(&self) -> &'static str {
            self.label
        }
    }

    /// Always panics on message arrival.
    struct Faulty;

    #[async_trait]
    impl DataServiceListener for Faulty {
        async fn on_message_arrived(&self, _: &str, _: &[u8], _: i32, _: bool) {
            panic!("faulty listener");
        }

        fn name(&self) -> &'static str {
            "faulty"
        }
    }

    fn recorder(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Recorder> {
        Arc::new(Recorder {
            label,
            log: Arc::clone(log),
        })
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_delivery() {
        let notifier = DataServiceNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        // A throws on message_arrived; B and C must still each see the event
        // exactly once, with the exact arguments, in snapshot order.
        notifier.registry().add_explicit(Arc::new(Faulty));
        notifier.registry().add_explicit(recorder("b", &log));
        notifier.registry().add_explicit(recorder("c", &log));

        notifier
            .notify_message_arrived("sensors/temp", &[0x01, 0x02], 0, false)
            .await;

        let entries = log.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec![
                "b: arrived topic=sensors/temp payload=[1, 2] qos=0 retained=false",
                "c: arrived topic=sensors/temp payload=[1, 2] qos=0 retained=false",
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_listener_stays_registered() {
        let notifier = DataServiceNotifier::new();
        notifier.registry().add_explicit(Arc::new(Faulty));

        notifier.notify_message_arrived("t", &[], 0, false).await;
        notifier.notify_message_arrived("t", &[], 0, false).await;

        assert_eq!(
            notifier.registry().len(),
            1,
            "failure must not unregister the listener"
        );
    }

    #[tokio::test]
    async fn test_emit_with_no_listeners_is_not_an_error() {
        let notifier = DataServiceNotifier::new();
        notifier.notify_connection_established().await;
        notifier.notify_message_arrived("t", &[1], 1, true).await;
    }

    #[tokio::test]
    async fn test_back_to_back_emits_preserve_order() {
        let notifier = DataServiceNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        notifier.registry().add_explicit(recorder("a", &log));

        notifier.notify_message_arrived("t/1", &[], 0, false).await;
        notifier.notify_message_arrived("t/2", &[], 0, false).await;
        notifier.notify_connection_established().await;

        let entries = log.lock().unwrap().clone();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].contains("t/1"));
        assert!(entries[1].contains("t/2"));
        assert_eq!(entries[2], "a: established");
    }

    /// Unregisters itself from inside its own callback.
    struct SelfRemover {
        registry: Arc<ListenerRegistry<dyn DataServiceListener>>,
        handle: Mutex<Option<RegistrationHandle>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DataServiceListener for SelfRemover {
        async fn on_connection_established(&self) {
            self.log.lock().unwrap().push("remover".to_string());
            if let Some(handle) = self.handle.lock().unwrap().take() {
                self.registry.remove_explicit(handle);
            }
        }

        fn name(&self) -> &'static str {
            "self-remover"
        }
    }

    #[tokio::test]
    async fn test_listener_removing_itself_affects_next_snapshot_only() {
        let notifier = DataServiceNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let remover = Arc::new(SelfRemover {
            registry: Arc::clone(notifier.registry()),
            handle: Mutex::new(None),
            log: Arc::clone(&log),
        });
        let handle = notifier.registry().add_explicit(remover.clone());
        *remover.handle.lock().unwrap() = Some(handle);
        notifier.registry().add_explicit(recorder("after", &log));

        notifier.notify_connection_established().await;
        // in-flight snapshot already contained both listeners
        assert_eq!(*log.lock().unwrap(), vec!["remover", "after: established"]);

        notifier.notify_connection_established().await;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["remover", "after: established", "after: established"],
            "removed listener is absent from the next snapshot"
        );
    }

    #[tokio::test]
    async fn test_connection_lost_passes_cause_through() {
        struct CauseCheck {
            log: Arc<Mutex<Vec<String>>>,
        }

        #[async_trait]
        impl DataServiceListener for CauseCheck {
            async fn on_connection_lost(&self, cause: &TransportError) {
                self.log.lock().unwrap().push(cause.as_label().to_string());
            }
        }

        let notifier = DataServiceNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        notifier.registry().add_explicit(Arc::new(CauseCheck {
            log: Arc::clone(&log),
        }));

        notifier
            .notify_connection_lost(&TransportError::LinkDown {
                reason: "keepalive timeout".into(),
            })
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["transport_link_down"]);
    }

    #[tokio::test]
    async fn test_close_silences_the_notifier() {
        let notifier = DataServiceNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        notifier.registry().add_explicit(recorder("a", &log));

        notifier.close();
        notifier.notify_connection_established().await;
        assert!(log.lock().unwrap().is_empty());
    }
}
