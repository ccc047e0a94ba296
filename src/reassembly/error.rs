use thiserror::Error;

use crate::modem::{ModemError, ResponseClass};

#[derive(Debug, Error)]
pub enum ReassemblyError {
    #[error("stored message {index} unavailable ({reply})")]
    Unavailable { index: u8, reply: ResponseClass },
    #[error("no sender number in stored message 1")]
    MissingSender,
    #[error("stored message {index} has no body")]
    MissingBody { index: u8 },
    #[error("stored message {index} is not valid hex: {source}")]
    MalformedFragment {
        index: u8,
        #[source]
        source: hex::FromHexError,
    },
    #[error(transparent)]
    Modem(#[from] ModemError),
}
