//! # Demo: heater
//!
//! A simulated heater that publishes temperature readings through a cloud
//! session kept alive by a [`DependencyBinder`], while a [`LogListener`]
//! observes the data-service events.
//!
//! Shows how to:
//! - Read component options out of a [`Properties`] bag with defaults.
//! - Register a connection in the [`ServiceDirectory`] and let the binder
//!   build/rebuild the [`CloudSession`] as the connection appears, is
//!   replaced, and goes away.
//! - Publish periodic readings with metric metadata.
//!
//! ## Flow
//! ```text
//! Properties ──► HeaterOptions
//! SimCloud ──► directory.register("cloud.primary") ──► binder ──► CloudSession
//! every publish.rate seconds:
//!     temperature step toward set point ──► Payload ──► session.publish()
//!          └─► SimCloud notifies message_published / message_confirmed
//! tick 5: directory.update() ──► binder tears down and rebuilds the session
//! tick 8: options change cloud.service.name ──► binder.watch() rebinds to
//!         the backup connection
//! end:    directory.deregister() ──► binder unbinds; shutdown releases all
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example heater --features logging
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use edgelink::{
    CloudConnection, CloudSessionFactory, DataServiceNotifier, DependencyBinder, LogListener,
    MetricValue, Payload, Properties, PropertyValue, ServiceDirectory, ServiceFilter,
    TransportError,
};

const MODE_PROGRAM: &str = "Program";
const MODE_MANUAL: &str = "Manual";
const MODE_VACATION: &str = "Vacation";
const VACATION_SET_POINT: f64 = 6.0;

/// Typed view over the heater's property bag.
struct HeaterOptions {
    properties: Properties,
}

impl HeaterOptions {
    fn new(properties: Properties) -> Self {
        Self { properties }
    }

    fn cloud_service_name(&self) -> &str {
        self.properties.get_str("cloud.service.name", "cloud.primary")
    }

    fn app_id(&self) -> &str {
        self.properties.get_str("app.id", "heater")
    }

    fn publish_rate(&self) -> Duration {
        Duration::from_secs(self.properties.get_i64("publish.rate", 1).max(1) as u64)
    }

    fn publish_topic(&self) -> &str {
        self.properties.get_str("publish.topic", "data")
    }

    fn publish_qos(&self) -> i32 {
        self.properties.get_i64("publish.qos", 0) as i32
    }

    fn publish_retain(&self) -> bool {
        self.properties.get_bool("publish.retain", false)
    }

    fn mode(&self) -> &str {
        self.properties.get_str("mode", MODE_PROGRAM)
    }

    fn program_set_point(&self) -> f64 {
        self.properties.get_f64("program.setPoint", 20.5)
    }

    fn manual_set_point(&self) -> f64 {
        self.properties.get_f64("manual.setPoint", 15.0)
    }

    fn temperature_initial(&self) -> f64 {
        self.properties.get_f64("temperature.initial", 10.0)
    }

    fn temperature_increment(&self) -> f64 {
        self.properties.get_f64("temperature.increment", 0.25)
    }

    fn active_set_point(&self) -> f64 {
        match self.mode() {
            MODE_MANUAL => self.manual_set_point(),
            MODE_VACATION => VACATION_SET_POINT,
            _ => self.program_set_point(),
        }
    }
}

/// Simulated cloud connection: accepts every publish while "connected" and
/// reports it through the data-service notifier.
struct SimCloud {
    label: &'static str,
    connected: AtomicBool,
    next_id: AtomicU32,
    notifier: Arc<DataServiceNotifier>,
}

impl SimCloud {
    fn new(label: &'static str, notifier: Arc<DataServiceNotifier>) -> Arc<Self> {
        Arc::new(Self {
            label,
            connected: AtomicBool::new(true),
            next_id: AtomicU32::new(0),
            notifier,
        })
    }
}

#[async_trait]
impl CloudConnection for SimCloud {
    async fn publish(
        &self,
        topic: &str,
        payload: Payload,
        _qos: i32,
        _retain: bool,
    ) -> Result<u32, TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!(
            "[{}] publish #{id} on {topic} ({} metrics)",
            self.label,
            payload.metrics().count()
        );
        self.notifier.notify_message_published(id, topic).await;
        self.notifier.notify_message_confirmed(id, topic).await;
        Ok(id)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// One simulated reading: step the temperature toward the set point and
/// build the payload the original device publishes.
fn next_reading(temperature: &mut f64, options: &HeaterOptions) -> Payload {
    let increment = options.temperature_increment();
    if *temperature + increment < options.active_set_point() {
        *temperature += increment;
    } else {
        *temperature -= 4.0 * increment;
    }

    let mut rng = rand::thread_rng();
    let error_code = if rng.gen_range(0..5) == 0 {
        rng.gen::<i32>()
    } else {
        0
    };

    Payload::now()
        .with_metric("temperature_internal", MetricValue::F64(*temperature))
        .with_metric("temperature_external", MetricValue::F64(5.0))
        .with_metric("temperature_exhaust", MetricValue::F64(30.0))
        .with_metric("error_code", MetricValue::I32(error_code))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut properties = Properties::new();
    properties.insert("publish.rate", PropertyValue::I64(1));
    properties.insert("publish.topic", PropertyValue::Str("data".into()));
    properties.insert("mode", PropertyValue::Str(MODE_PROGRAM.into()));
    properties.insert("program.setPoint", PropertyValue::F64(20.5));
    let mut options = HeaterOptions::new(properties);

    let directory: ServiceDirectory<dyn CloudConnection> = ServiceDirectory::new();
    let notifier = Arc::new(DataServiceNotifier::new());
    notifier.registry().add_explicit(Arc::new(LogListener));

    // keep the session in step with whatever the directory holds under the
    // configured name
    let binder = DependencyBinder::new(CloudSessionFactory::new(options.app_id()));
    Arc::clone(&binder)
        .watch(&directory, &ServiceFilter::name(options.cloud_service_name()))
        .await?;

    let primary = SimCloud::new("primary", Arc::clone(&notifier));
    let handle = directory
        .register(options.cloud_service_name(), primary.clone())
        .expect("directory is open");
    directory
        .register("cloud.backup", SimCloud::new("backup", Arc::clone(&notifier)))
        .expect("directory is open");
    notifier.notify_connection_established().await;

    let mut temperature = options.temperature_initial();
    let mut ticker = tokio::time::interval(options.publish_rate());

    for tick in 0..10u32 {
        ticker.tick().await;

        // halfway through, the connection is replaced: the binder tears the
        // session down and rebuilds it against the new instance
        if tick == 5 {
            log::info!("replacing cloud connection");
            notifier.notify_disconnecting().await;
            notifier.notify_disconnected().await;
            let replacement = SimCloud::new("replacement", Arc::clone(&notifier));
            directory.update(handle, replacement);
            notifier.notify_connection_established().await;
        }

        // a configuration update points at the backup connection: re-read
        // the options and rebind the watch against the new filter target
        if tick == 8 {
            log::info!("configuration update: switching to cloud.backup");
            let mut updated = Properties::new();
            updated.insert("cloud.service.name", PropertyValue::Str("cloud.backup".into()));
            updated.insert("publish.rate", PropertyValue::I64(1));
            options = HeaterOptions::new(updated);
            Arc::clone(&binder)
                .watch(&directory, &ServiceFilter::name(options.cloud_service_name()))
                .await?;
        }

        let payload = next_reading(&mut temperature, &options);
        match binder.current_session().await {
            Some(session) => {
                if let Err(err) = session
                    .publish(
                        options.publish_topic(),
                        payload,
                        options.publish_qos(),
                        options.publish_retain(),
                    )
                    .await
                {
                    log::error!("cannot publish on {}: {err}", options.publish_topic());
                }
            }
            None => log::warn!("no session bound, skipping reading"),
        }
    }

    // the original connection goes away; the binder (now on the backup) is
    // released by its own shutdown
    directory.deregister(handle);
    notifier
        .notify_connection_lost(&TransportError::LinkDown {
            reason: "simulated shutdown".into(),
        })
        .await;

    binder.shutdown().await;
    notifier.close();
    directory.close();
    Ok(())
}
