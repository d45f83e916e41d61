//! Reference data-service listener that logs every callback.
//!
//! Enabled via the `logging` feature. Useful for demos and while wiring a
//! new consumer; production components implement [`DataServiceListener`]
//! themselves.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::notify::DataServiceListener;

/// Logs every data-service event at info level (warn for connection loss).
pub struct LogListener;

#[async_trait]
impl DataServiceListener for LogListener {
    async fn on_connection_established(&self) {
        log::info!("connection established");
    }

    async fn on_disconnecting(&self) {
        log::info!("disconnecting");
    }

    async fn on_disconnected(&self) {
        log::info!("disconnected");
    }

    async fn on_connection_lost(&self, cause: &TransportError) {
        log::warn!("connection lost: {cause}");
    }

    async fn on_message_arrived(&self, topic: &str, payload: &[u8], qos: i32, retained: bool) {
        log::info!(
            "message arrived on {topic}: {} bytes qos={qos} retained={retained}",
            payload.len()
        );
    }

    async fn on_message_published(&self, message_id: u32, topic: &str) {
        log::info!("published message {message_id} on {topic}");
    }

    async fn on_message_confirmed(&self, message_id: u32, topic: &str) {
        log::info!("confirmed message {message_id} on {topic}");
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
