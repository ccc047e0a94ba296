use std::time::Duration;
use tokio::time::{sleep, Sleep};

use super::at;
use super::error::ModemError;
use super::transport::ModemTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResponseClass {
    Acknowledged,
    /// Modem is waiting for message text.
    Prompt,
    Error,
    Empty,
    Unrecognized,
}

impl ResponseClass {
    pub fn classify(raw: &str) -> Self {
        if raw.contains(at::ACK_TOKEN) {
            ResponseClass::Acknowledged
        } else if raw.contains(at::PROMPT_TOKEN) {
            ResponseClass::Prompt
        } else if raw.contains(at::ERROR_TOKEN) {
            ResponseClass::Error
        } else if raw.is_empty() {
            ResponseClass::Empty
        } else {
            ResponseClass::Unrecognized
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub raw: String,
    pub class: ResponseClass,
}

impl Response {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(bytes).into_owned();
        let class = ResponseClass::classify(&raw);
        Self { raw, class }
    }

    pub fn is_acknowledged(&self) -> bool {
        self.class == ResponseClass::Acknowledged
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Write-settle-read exchange with the modem.
///
/// The modem gives no framing we can rely on, so every command is followed by
/// a fixed settle wait before the buffered reply is collected.
pub struct CommandDriver<T> {
    transport: T,
    settle: Duration,
}

impl<T: ModemTransport> CommandDriver<T> {
    pub fn new(transport: T, settle: Duration) -> Self {
        Self { transport, settle }
    }

    pub async fn send(&mut self, command: &[u8]) -> Result<Response, ModemError> {
        log::debug!("modem <- {}", printable(command));
        self.transport.write(command)?;
        self.settle().await;
        let response = self.read_available()?;
        log::debug!(
            "modem -> [{}] {}",
            response.class,
            printable(response.raw.as_bytes())
        );
        Ok(response)
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), ModemError> {
        log::debug!("modem <- {}", printable(bytes));
        self.transport.write(bytes)?;
        Ok(())
    }

    pub fn read_available(&mut self) -> Result<Response, ModemError> {
        let bytes = self.transport.read_available()?;
        Ok(Response::from_bytes(&bytes))
    }

    pub fn flush(&mut self) -> Result<(), ModemError> {
        self.transport.flush()?;
        Ok(())
    }

    /// Waits the per-command settle interval.
    pub fn settle(&self) -> Sleep {
        sleep(self.settle)
    }

    pub fn wait(&self, duration: Duration) -> Sleep {
        sleep(duration)
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn printable(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim()
        .replace('\r', "\\r")
        .replace('\n', "\\n")
        .replace(at::CTRL_Z as char, "^Z")
}
