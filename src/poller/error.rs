use thiserror::Error;

use crate::modem::ModemError;
use crate::reassembly::ReassemblyError;

/// Everything that can go wrong in one scheduler tick. None of these stop
/// the worker.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    TransportFault(#[from] ModemError),
    #[error("modem did not answer the wake probe")]
    ModemUnreachable,
    #[error("malformed report: {0}")]
    MalformedFragment(#[source] ReassemblyError),
    #[error("report from {0}, which is not on the roster")]
    UnknownDevice(String),
    #[error("no reply from {device} after {ticks} ticks")]
    ReplyTimeout { device: String, ticks: u32 },
}

impl From<ReassemblyError> for PollError {
    fn from(err: ReassemblyError) -> Self {
        match err {
            ReassemblyError::Modem(e) => PollError::TransportFault(e),
            other => PollError::MalformedFragment(other),
        }
    }
}
