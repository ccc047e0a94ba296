pub mod at;
mod command;
mod error;
#[cfg(test)]
pub mod fake;
mod init;
mod transport;

pub use command::{CommandDriver, Response, ResponseClass};
pub use error::ModemError;
pub use init::{initialize, ModemState};
pub use transport::{ModemTransport, SerialTransport};
