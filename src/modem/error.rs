use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModemError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("transport fault: {0}")]
    Transport(#[from] std::io::Error),
}
