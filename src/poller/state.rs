use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use utoipa::ToSchema;

use crate::registry::{DeviceRegistry, LocationRecord, Upsert};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    AwaitingInit,
    Ready,
    SendingRequest,
    AwaitingReply,
    /// Polling is disabled and the registry has been cleared.
    Resetting,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollStatus {
    pub enabled: bool,
    pub state: SchedulerState,
    pub cursor: usize,
    pub last_report: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Shared {
    registry: DeviceRegistry,
    polling: bool,
    state: SchedulerState,
    cursor: usize,
    last_report: Option<DateTime<Utc>>,
}

/// State shared between the polling worker and the HTTP handlers.
///
/// The lock is only ever held for a single read or update, never across a
/// modem exchange.
#[derive(Debug, Clone)]
pub struct GatewayState {
    shared: Arc<Mutex<Shared>>,
}

impl GatewayState {
    pub fn new(roster: Vec<String>, polling: bool) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                registry: DeviceRegistry::new(roster),
                polling,
                state: SchedulerState::Idle,
                cursor: 0,
                last_report: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read_all(&self) -> Vec<LocationRecord> {
        self.lock().registry.records().to_vec()
    }

    pub fn read_poll_state(&self) -> bool {
        self.lock().polling
    }

    /// Takes effect on the worker's next tick.
    pub fn set_poll_state(&self, enabled: bool) {
        let mut locked = self.lock();
        if locked.polling != enabled {
            log::info!(
                "Polling {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        locked.polling = enabled;
    }

    pub fn status(&self) -> PollStatus {
        let locked = self.lock();
        PollStatus {
            enabled: locked.polling,
            state: locked.state,
            cursor: locked.cursor,
            last_report: locked.last_report,
        }
    }

    pub fn roster(&self) -> Vec<String> {
        self.lock().registry.roster().to_vec()
    }

    pub fn is_known(&self, device_id: &str) -> bool {
        self.lock().registry.contains(device_id)
    }

    pub fn record_report(&self, record: LocationRecord) -> Upsert {
        let mut locked = self.lock();
        locked.last_report = Some(Utc::now());
        locked.registry.upsert(record)
    }

    pub fn reset_registry(&self) {
        let mut locked = self.lock();
        locked.registry.reset();
        locked.last_report = None;
    }

    pub fn publish(&self, state: SchedulerState, cursor: usize) {
        let mut locked = self.lock();
        locked.state = state;
        locked.cursor = cursor;
    }
}
