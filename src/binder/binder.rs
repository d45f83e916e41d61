//! # Dependency binder: one discovered dependency, one derived session.
//!
//! [`DependencyBinder`] holds a reference to at most one externally-managed
//! dependency instance and keeps a derived session synchronized with it:
//! every appearance, replacement or removal of the dependency tears the
//! session down and (except on removal) rebuilds it through the
//! [`SessionFactory`].
//!
//! ## State machine
//! ```text
//!                 Appeared(link) / Modified(link)
//!                 ┌──────────────────────────────┐
//!                 ▼                              │
//! Unbound ──► teardown old session ──► build ──► Bound { link, session }
//!    ▲            │                      │
//!    │            │                 build fails ──► Bound { link, session: None }
//!    │            │                                  (next notification retries)
//!    └── Removed: teardown session, clear link
//! ```
//!
//! ## Rules
//! - Exactly one transition is in flight at a time (the binding is behind an
//!   async mutex held across the factory calls).
//! - The session is non-empty only if it was built from exactly the current
//!   link.
//! - Teardown is best-effort cleanup: a teardown failure is logged and never
//!   prevents the rebuild.
//! - Build failures are recoverable: logged, returned to the caller, and the
//!   next Appeared/Modified notification gets another attempt.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::directory::{DirectoryEvent, ServiceDirectory, ServiceFilter};
use crate::error::{BindError, DirectoryError};

/// Seam between the binder and the derived resource it manages.
///
/// `Link` is the externally-managed dependency the directory hands out;
/// `Session` is the resource derived from it.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    /// Dependency instance type (typically a trait object).
    type Link: ?Sized + Send + Sync + 'static;
    /// Derived resource type.
    type Session: Send + Sync + 'static;

    /// Builds a fresh session from the given dependency instance.
    async fn build(&self, link: Arc<Self::Link>) -> Result<Self::Session, BindError>;

    /// Releases a session. Best-effort: the binder logs a failure here and
    /// proceeds.
    async fn teardown(&self, session: &Self::Session) -> Result<(), BindError>;
}

struct Binding<F: SessionFactory> {
    link: Option<Arc<F::Link>>,
    session: Option<Arc<F::Session>>,
}

struct WatchGuard {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Binds to at most one dependency instance and owns the session derived
/// from it.
pub struct DependencyBinder<F: SessionFactory> {
    factory: F,
    binding: Mutex<Binding<F>>,
    watch_guard: StdMutex<Option<WatchGuard>>,
}

impl<F: SessionFactory> DependencyBinder<F> {
    /// Creates an unbound binder.
    pub fn new(factory: F) -> Arc<Self> {
        Arc::new(Self {
            factory,
            binding: Mutex::new(Binding {
                link: None,
                session: None,
            }),
            watch_guard: StdMutex::new(None),
        })
    }

    /// A candidate dependency appeared (or superseded the current one):
    /// tear down the existing session, bind the new instance, build a fresh
    /// session.
    ///
    /// On build failure the new link is retained without a session and the
    /// error is returned; the next notification retries.
    pub async fn on_candidate_appeared(&self, link: Arc<F::Link>) -> Result<(), BindError> {
        let mut binding = self.binding.lock().await;
        self.release_session(&mut binding).await;
        binding.link = Some(Arc::clone(&link));
        match self.factory.build(link).await {
            Ok(session) => {
                binding.session = Some(Arc::new(session));
                Ok(())
            }
            Err(err) => {
                log::error!("session build failed: {err}");
                Err(err)
            }
        }
    }

    /// The bound dependency was replaced in place. Always tears down and
    /// rebuilds — the new instance may carry configuration the old session
    /// captured at construction time.
    pub async fn on_candidate_modified(&self, link: Arc<F::Link>) -> Result<(), BindError> {
        self.on_candidate_appeared(link).await
    }

    /// The bound dependency went away: tear down the session, clear the link.
    pub async fn on_candidate_removed(&self) {
        let mut binding = self.binding.lock().await;
        self.release_session(&mut binding).await;
        binding.link = None;
    }

    /// Returns the current session, if one is bound and built.
    pub async fn current_session(&self) -> Option<Arc<F::Session>> {
        self.binding.lock().await.session.clone()
    }

    /// Returns true if a dependency instance is currently bound (with or
    /// without a built session).
    pub async fn is_bound(&self) -> bool {
        self.binding.lock().await.link.is_some()
    }

    /// Opens a directory watch for dependencies matching `filter` and feeds
    /// its transitions into this binder.
    ///
    /// Calling this again **rebinds**: the previous watch is closed, the
    /// binding is cleared (Unbound transition), and a fresh watch is opened
    /// against the new filter. A rejected filter leaves the binder unbound
    /// but usable; retry with a corrected filter.
    pub async fn watch(
        self: Arc<Self>,
        directory: &ServiceDirectory<F::Link>,
        filter: &ServiceFilter,
    ) -> Result<(), DirectoryError> {
        self.detach().await;
        let mut watch = directory.watch(filter)?;

        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let me = Arc::clone(&self);
        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    ev = watch.recv() => match ev {
                        Some(DirectoryEvent::Appeared { instance, .. }) => {
                            let _ = me.on_candidate_appeared(instance).await;
                        }
                        Some(DirectoryEvent::Modified { instance, .. }) => {
                            let _ = me.on_candidate_modified(instance).await;
                        }
                        Some(DirectoryEvent::Removed { .. }) => {
                            me.on_candidate_removed().await;
                        }
                        None => break,
                    }
                }
            }
        });

        *self.watch_guard.lock().expect("watch lock poisoned") = Some(WatchGuard { cancel, join });
        Ok(())
    }

    /// Tears the binder down: closes the watch and releases the session.
    ///
    /// The session is owned exclusively by the binder and must be released
    /// here when the owning component deactivates.
    pub async fn shutdown(&self) {
        self.detach().await;
    }

    /// Cancels the current watch loop (if any) and runs the Unbound
    /// transition.
    async fn detach(&self) {
        let guard = self.watch_guard.lock().expect("watch lock poisoned").take();
        if let Some(WatchGuard { cancel, join }) = guard {
            cancel.cancel();
            if join.await.is_err() {
                log::warn!("binder watch loop panicked");
            }
        }
        self.on_candidate_removed().await;
    }

    /// Best-effort teardown of the current session, if any.
    async fn release_session(&self, binding: &mut Binding<F>) {
        if let Some(session) = binding.session.take() {
            if let Err(err) = self.factory.teardown(&session).await {
                log::warn!("session teardown failed: {err}");
            }
        }
    }
}
