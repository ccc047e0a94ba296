use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

use super::error::ModemError;

/// Byte-level access to the modem. The polling worker is the only owner.
pub trait ModemTransport: Send {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// Returns whatever is buffered right now, possibly nothing.
    fn read_available(&mut self) -> io::Result<Vec<u8>>;
    fn flush(&mut self) -> io::Result<()>;
}

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, ModemError> {
        log::info!("Opening modem on {} at {} baud", port_name, baud_rate);

        let mut builder = serialport::new(port_name, baud_rate).timeout(Duration::from_millis(500));
        #[cfg(unix)]
        {
            builder = builder
                .data_bits(serialport::DataBits::Eight)
                .stop_bits(serialport::StopBits::One)
                .parity(serialport::Parity::None);
        }
        let port = builder.open().map_err(|source| ModemError::Open {
            port: port_name.to_string(),
            source,
        })?;

        // Drop whatever the modem printed before we attached.
        port.clear(serialport::ClearBuffer::All)?;

        Ok(Self { port })
    }
}

impl ModemTransport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)
    }

    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let available = self.port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; available];
        let read = self.port.read(&mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}
