//! # Data-transport event family: listener trait, delivery tokens, notifier.
//!
//! The transport family differs from the data-service family in two ways:
//! connection establishment reports whether the broker assigned a **new
//! session**, and confirmations are correlated by an opaque
//! [`DeliveryToken`] instead of a bare message id. It also observes
//! configuration changes (`on_configuration_updating`/`updated`), which the
//! data-service family does not.
//!
//! The two traits intentionally share no base type; their method sets
//! genuinely differ.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::notify::fan_out;
use crate::registry::ListenerRegistry;

/// Opaque delivery-correlation identifier.
///
/// Pairs the transport-assigned message id with the session it was published
/// in, so a confirmation arriving after a reconnect is distinguishable from
/// one for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryToken {
    message_id: u32,
    session_id: Arc<str>,
}

impl DeliveryToken {
    /// Creates a token for a message published within a session.
    pub fn new(message_id: u32, session_id: impl Into<Arc<str>>) -> Self {
        Self {
            message_id,
            session_id: session_id.into(),
        }
    }

    /// Transport-assigned message id.
    pub fn message_id(&self) -> u32 {
        self.message_id
    }

    /// Session the message was published in.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Capability set for data-transport observers.
///
/// Every method has an empty default body; implementors override the events
/// they care about.
#[async_trait]
pub trait DataTransportListener: Send + Sync + 'static {
    /// The transport connected; `new_session` is true when the broker did
    /// not resume a previous session.
    async fn on_connection_established(&self, new_session: bool) {
        let _ = new_session;
    }

    /// An orderly disconnect is about to begin.
    async fn on_disconnecting(&self) {}

    /// An orderly disconnect completed.
    async fn on_disconnected(&self) {}

    /// The transport configuration is about to be applied.
    async fn on_configuration_updating(&self, was_connected: bool) {
        let _ = was_connected;
    }

    /// The transport configuration was applied.
    async fn on_configuration_updated(&self, was_connected: bool) {
        let _ = was_connected;
    }

    /// The connection dropped unexpectedly.
    async fn on_connection_lost(&self, cause: &TransportError) {
        let _ = cause;
    }

    /// A message arrived from the remote endpoint.
    async fn on_message_arrived(&self, topic: &str, payload: &[u8], qos: i32, retained: bool) {
        let _ = (topic, payload, qos, retained);
    }

    /// The transport confirmed delivery of the message behind `token`.
    async fn on_message_confirmed(&self, token: &DeliveryToken) {
        let _ = token;
    }

    /// Human-readable name used in failure logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Fan-out notifier for the data-transport event family.
pub struct DataTransportNotifier {
    registry: Arc<ListenerRegistry<dyn DataTransportListener>>,
}

impl DataTransportNotifier {
    /// Creates a notifier with an empty registry.
    pub fn new() -> Self {
        Self {
            registry: ListenerRegistry::new(),
        }
    }

    /// Returns the registry this notifier snapshots on every emit.
    pub fn registry(&self) -> &Arc<ListenerRegistry<dyn DataTransportListener>> {
        &self.registry
    }

    /// Releases the underlying registry; subsequent emits deliver to nobody.
    pub fn close(&self) {
        self.registry.close();
    }

    pub async fn notify_connection_established(&self, new_session: bool) {
        fan_out(
            "on_connection_established",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_connection_established(new_session).await },
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

    pub async fn notify_configuration_updating(&self, was_connected: bool) {
        fan_out(
            "on_configuration_updating",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_configuration_updating(was_connected).await },
        )
        .await;
    }

    pub async fn notify_configuration_updated(&self, was_connected: bool) {
        fan_out(
            "on_configuration_updated",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_configuration_updated(was_connected).await },
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

    pub async fn notify_message_confirmed(&self, token: &DeliveryToken) {
        fan_out(
            "on_message_confirmed",
            self.registry.snapshot(),
            |l| l.name(),
            |l| async move { l.on_message_confirmed(token).await },
        )
        .await;
    }
}

impl Default for DataTransportNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DataTransportListener for Recorder {
        async fn on_connection_established(&self, new_session: bool) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}: established new_session={new_session}", self.label));
        }

        async fn on_configuration_updating(&self, was_connected: bool) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}: updating was_connected={was_connected}", self.label));
        }

        async fn on_configuration_updated(&self, was_connected: bool) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}: updated was_connected={was_connected}", self.label));
        }

        async fn on_message_confirmed(&self, token: &DeliveryToken) {
            self.log.lock().unwrap().push(format!(
                "{}: confirmed id={} session={}",
                self.label,
                token.message_id(),
                token.session_id()
            ));
        }

        fn name(&self) -> &'static str {
            self.label
        }
    }

    struct Faulty;

    #[async_trait]
    impl DataTransportListener for Faulty {
        async fn on_message_confirmed(&self, _: &DeliveryToken) {
            panic!("confirm handler broke");
        }

        fn name(&self) -> &'static str {
            "faulty"
        }
    }

    #[tokio::test]
    async fn test_configuration_cycle_reaches_all_listeners_in_order() {
        let notifier = DataTransportNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        notifier.registry().add_explicit(Arc::new(Recorder {
            label: "a",
            log: Arc::clone(&log),
        }));
        notifier.registry().add_explicit(Arc::new(Recorder {
            label: "b",
            log: Arc::clone(&log),
        }));

        notifier.notify_configuration_updating(true).await;
        notifier.notify_configuration_updated(false).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "a: updating was_connected=true",
                "b: updating was_connected=true",
                "a: updated was_connected=false",
                "b: updated was_connected=false",
            ]
        );
    }

    #[tokio::test]
    async fn test_confirmation_token_passes_through_unchanged() {
        let notifier = DataTransportNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        notifier.registry().add_explicit(Arc::new(Faulty));
        notifier.registry().add_explicit(Arc::new(Recorder {
            label: "ok",
            log: Arc::clone(&log),
        }));

        let token = DeliveryToken::new(42, "session-7");
        notifier.notify_message_confirmed(&token).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["ok: confirmed id=42 session=session-7"],
            "panicking listener must not block the confirmation"
        );
        assert_eq!(notifier.registry().len(), 2);
    }

    #[tokio::test]
    async fn test_new_session_flag_passes_through() {
        let notifier = DataTransportNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        notifier.registry().add_explicit(Arc::new(Recorder {
            label: "a",
            log: Arc::clone(&log),
        }));

        notifier.notify_connection_established(true).await;
        notifier.notify_connection_established(false).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "a: established new_session=true",
                "a: established new_session=false",
            ]
        );
    }
}
