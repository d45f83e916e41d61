//! # Cloud connectivity surface: publish capability and app-scoped sessions.
//!
//! [`CloudConnection`] is the interface the rest of the crate needs from the
//! underlying transport: an opaque publish capability plus a connectivity
//! probe. How the connection is established and encoded on the wire is the
//! transport's business.
//!
//! [`CloudSession`] is the derived resource a [`DependencyBinder`](crate::DependencyBinder) keeps in
//! step with a discovered connection: an application-scoped handle that
//! prefixes every publish with its application id, so two applications
//! sharing one connection cannot step on each other's topic space.

use std::sync::Arc;

use async_trait::async_trait;

use crate::binder::SessionFactory;
use crate::error::{BindError, TransportError};
use crate::message::Payload;

/// Opaque publish capability provided by an externally-managed connection.
#[async_trait]
pub trait CloudConnection: Send + Sync + 'static {
    /// Publishes a payload on a fully-qualified topic.
    ///
    /// Returns the transport-assigned message id.
    ///
    /// # Errors
    /// [`TransportError::NotConnected`] when there is no active connection,
    /// or [`TransportError::Rejected`] when the transport refuses the
    /// payload.
    async fn publish(
        &self,
        topic: &str,
        payload: Payload,
        qos: i32,
        retain: bool,
    ) -> Result<u32, TransportError>;

    /// Returns true while the connection is established.
    fn is_connected(&self) -> bool;
}

/// Application-scoped session over a [`CloudConnection`].
///
/// Built by a [`CloudSessionFactory`] whenever the underlying connection
/// appears or changes; owned by the binder that built it.
pub struct CloudSession {
    app_id: String,
    connection: Arc<dyn CloudConnection>,
}

impl CloudSession {
    /// Creates a session publishing under `app_id`.
    pub fn new(app_id: impl Into<String>, connection: Arc<dyn CloudConnection>) -> Self {
        Self {
            app_id: app_id.into(),
            connection,
        }
    }

    /// Application id this session publishes under.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Returns true while the underlying connection is established.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Publishes on `<app_id>/<app_topic>`.
    pub async fn publish(
        &self,
        app_topic: &str,
        payload: Payload,
        qos: i32,
        retain: bool,
    ) -> Result<u32, TransportError> {
        let topic = format!("{}/{}", self.app_id, app_topic);
        self.connection.publish(&topic, payload, qos, retain).await
    }
}

/// [`SessionFactory`] building [`CloudSession`]s for one application id.
pub struct CloudSessionFactory {
    app_id: String,
}

impl CloudSessionFactory {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }
}

#[async_trait]
impl SessionFactory for CloudSessionFactory {
    type Link = dyn CloudConnection;
    type Session = CloudSession;

    async fn build(&self, link: Arc<dyn CloudConnection>) -> Result<CloudSession, BindError> {
        Ok(CloudSession::new(self.app_id.clone(), link))
    }

    async fn teardown(&self, _session: &CloudSession) -> Result<(), BindError> {
        // a session holds no transport resources of its own; dropping the
        // connection reference is the release
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct FakeConnection {
        connected: AtomicBool,
        published: Mutex<Vec<(String, i32, bool)>>,
    }

    impl FakeConnection {
        fn new() -> Self {
            Self {
                connected: AtomicBool::new(true),
                published: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CloudConnection for FakeConnection {
        async fn publish(
            &self,
            topic: &str,
            _payload: Payload,
            qos: i32,
            retain: bool,
        ) -> Result<u32, TransportError> {
            if !self.is_connected() {
                return Err(TransportError::NotConnected);
            }
            let mut published = self.published.lock().unwrap();
            published.push((topic.to_string(), qos, retain));
            Ok(published.len() as u32)
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_session_scopes_topics_by_app_id() {
        let connection = Arc::new(FakeConnection::new());
        let session = CloudSession::new("heater", connection.clone());

        let id = session.publish("data", Payload::new(), 1, false).await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(
            *connection.published.lock().unwrap(),
            vec![("heater/data".to_string(), 1, false)]
        );
    }

    #[tokio::test]
    async fn test_publish_fails_without_connection() {
        let connection = Arc::new(FakeConnection::new());
        connection.connected.store(false, Ordering::SeqCst);
        let session = CloudSession::new("heater", connection);

        let err = session
            .publish("data", Payload::new(), 0, false)
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::NotConnected);
    }

    #[tokio::test]
    async fn test_factory_builds_sessions_for_its_app_id() {
        let factory = CloudSessionFactory::new("heater");
        let connection: Arc<dyn CloudConnection> = Arc::new(FakeConnection::new());
        let session = factory.build(connection).await.unwrap();
        assert_eq!(session.app_id(), "heater");
    }
}
