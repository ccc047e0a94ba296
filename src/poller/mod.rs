mod error;
mod scheduler;
mod state;
mod worker;

pub use error::PollError;
pub use scheduler::{PollScheduler, SchedulerConfig, TickEvent};
pub use state::{GatewayState, PollStatus, SchedulerState};
pub use worker::{Poller, PollerError};
