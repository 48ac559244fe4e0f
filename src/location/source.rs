//! Live geolocation source adapter.
//!
//! Wraps a continuous device watch. Readings are validated against the
//! watch options; every failure is reported as a [`LiveEvent::Unavailable`]
//! and the watch stays registered so the device keeps retrying.

use super::{LocationError, PositionFix, WatchOptions};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Raw reading delivered by a device watch.
pub type DeviceReading = Result<PositionFix, LocationError>;

/// A registered continuous watch. Dropping it unregisters the watch.
#[derive(Debug)]
pub struct DeviceWatch {
    readings: mpsc::UnboundedReceiver<DeviceReading>,
}

impl DeviceWatch {
    pub fn new(readings: mpsc::UnboundedReceiver<DeviceReading>) -> Self {
        Self { readings }
    }
}

/// Trait for continuous position providers (device GPS, replay feeds).
pub trait DeviceLocation: Send {
    /// Register a continuous watch.
    fn watch_position(&mut self, options: &WatchOptions) -> Result<DeviceWatch, LocationError>;
}

/// Outcome of waiting on the live source.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// A reading that passed validation
    Fix(PositionFix),
    /// Permission, timeout or validation failure
    Unavailable(LocationError),
}

/// Live source: a device plus the currently registered watch.
pub struct LiveLocationSource<D: DeviceLocation> {
    device: D,
    options: WatchOptions,
    watch: Option<DeviceWatch>,
    /// When the pending reading times out. Only readings and timeouts move it.
    deadline: Option<Instant>,
}

impl<D: DeviceLocation> LiveLocationSource<D> {
    pub fn new(device: D, options: WatchOptions) -> Self {
        Self {
            device,
            options,
            watch: None,
            deadline: None,
        }
    }

    /// Register the device watch. Already-active sources are left alone.
    pub fn start(&mut self) -> Result<(), LocationError> {
        if self.watch.is_some() {
            return Ok(());
        }
        let watch = self.device.watch_position(&self.options)?;
        tracing::info!(
            "Live location watch registered (high_accuracy={}, timeout={}ms)",
            self.options.high_accuracy,
            self.options.timeout_ms
        );
        self.watch = Some(watch);
        self.arm_deadline();
        Ok(())
    }

    /// Drop the watch. No reading is delivered after this returns.
    pub fn stop(&mut self) {
        self.deadline = None;
        if self.watch.take().is_some() {
            tracing::info!("Live location watch released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.watch.is_some()
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Restart the per-reading timeout. A zero timeout disables it.
    fn arm_deadline(&mut self) {
        self.deadline = (self.options.timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(self.options.timeout_ms));
    }

    /// Wait for the next reading. Pends forever while no watch is registered.
    ///
    /// Cancel-safe: dropping the future keeps both the queued readings and
    /// the timeout deadline, so other events do not restart the timeout.
    pub async fn next_event(&mut self) -> LiveEvent {
        let timeout_ms = self.options.timeout_ms;
        let deadline = self.deadline;
        let Some(watch) = self.watch.as_mut() else {
            return std::future::pending().await;
        };

        let reading = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, watch.readings.recv()).await,
            None => Ok(watch.readings.recv().await),
        };
        self.arm_deadline();
        match reading {
            Err(_) => LiveEvent::Unavailable(LocationError::Timeout(timeout_ms)),
            Ok(None) => {
                self.watch = None;
                self.deadline = None;
                LiveEvent::Unavailable(LocationError::PositionUnavailable(
                    "device watch closed".to_string(),
                ))
            }
            Ok(Some(Err(e))) => LiveEvent::Unavailable(e),
            Ok(Some(Ok(fix))) => {
                let wall_now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
                match validate_fix(&self.options, fix, wall_now_ms) {
                    Ok(fix) => LiveEvent::Fix(fix),
                    Err(e) => LiveEvent::Unavailable(e),
                }
            }
        }
    }
}

/// Check a reading against the accuracy and staleness constraints.
pub fn validate_fix(
    options: &WatchOptions,
    fix: PositionFix,
    wall_now_ms: u64,
) -> Result<PositionFix, LocationError> {
    if !fix.latitude.is_finite()
        || !fix.longitude.is_finite()
        || fix.latitude.abs() > 90.0
        || fix.longitude.abs() > 180.0
    {
        return Err(LocationError::PositionUnavailable(format!(
            "invalid coordinate {},{}",
            fix.latitude, fix.longitude
        )));
    }

    if options.high_accuracy {
        if let Some(accuracy_m) = fix.accuracy_m {
            if accuracy_m > options.max_accuracy_m {
                return Err(LocationError::InaccurateFix {
                    accuracy_m,
                    limit_m: options.max_accuracy_m,
                });
            }
        }
    }

    if options.maximum_age_ms > 0 {
        let age_ms = wall_now_ms.saturating_sub(fix.timestamp_ms);
        if age_ms > options.maximum_age_ms {
            return Err(LocationError::StaleFix { age_ms });
        }
    }

    Ok(fix)
}

#[derive(Debug)]
struct FeederState {
    sender: Option<mpsc::UnboundedSender<DeviceReading>>,
    permission_granted: bool,
    watches_registered: u32,
}

/// In-process device whose readings are pushed through a [`DeviceFeeder`].
///
/// Used for replaying recorded fixes and for tests.
pub struct ChannelDevice {
    shared: Arc<Mutex<FeederState>>,
}

/// Pushes readings into the watch registered on a [`ChannelDevice`].
#[derive(Clone)]
pub struct DeviceFeeder {
    shared: Arc<Mutex<FeederState>>,
}

impl ChannelDevice {
    /// Create a device and its feeder. Permission starts granted.
    pub fn new() -> (Self, DeviceFeeder) {
        let shared = Arc::new(Mutex::new(FeederState {
            sender: None,
            permission_granted: true,
            watches_registered: 0,
        }));
        (
            Self {
                shared: shared.clone(),
            },
            DeviceFeeder { shared },
        )
    }
}

impl DeviceLocation for ChannelDevice {
    fn watch_position(&mut self, _options: &WatchOptions) -> Result<DeviceWatch, LocationError> {
        let mut state = self
            .shared
            .lock()
            .map_err(|_| LocationError::PositionUnavailable("device state poisoned".to_string()))?;
        if !state.permission_granted {
            return Err(LocationError::PermissionDenied);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.sender = Some(tx);
        state.watches_registered += 1;
        Ok(DeviceWatch::new(rx))
    }
}

impl DeviceFeeder {
    /// Deliver a fix. Returns false when no watch is listening.
    pub fn push_fix(&self, fix: PositionFix) -> bool {
        self.push(Ok(fix))
    }

    /// Deliver a device error. Returns false when no watch is listening.
    pub fn push_error(&self, error: LocationError) -> bool {
        self.push(Err(error))
    }

    fn push(&self, reading: DeviceReading) -> bool {
        let Ok(state) = self.shared.lock() else {
            return false;
        };
        match &state.sender {
            Some(tx) => tx.send(reading).is_ok(),
            None => false,
        }
    }

    /// Grant or revoke location permission for future watches.
    pub fn set_permission(&self, granted: bool) {
        if let Ok(mut state) = self.shared.lock() {
            state.permission_granted = granted;
        }
    }

    /// Whether a registered watch is still listening.
    pub fn is_watched(&self) -> bool {
        self.shared
            .lock()
            .map(|s| s.sender.as_ref().map(|tx| !tx.is_closed()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// How many times a watch has been registered.
    pub fn watches_registered(&self) -> u32 {
        self.shared.lock().map(|s| s.watches_registered).unwrap_or(0)
    }
}
