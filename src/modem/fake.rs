//! Scripted modem used by tests. It echoes commands the way a modem with
//! `ATE1` does, keeps a small SIM message store and can be told to stop
//! answering or to fail at the I/O level.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use super::at;
use super::transport::ModemTransport;

#[derive(Debug, Default)]
struct Inner {
    pending: Vec<u8>,
    line: Vec<u8>,
    commands: Vec<String>,
    entering_text: bool,
    stored: BTreeMap<u8, String>,
    next_index: u8,
    sent: Vec<(String, String)>,
    purges: usize,
    silent: bool,
    unplugged: bool,
    failing: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeModem {
    inner: Arc<Mutex<Inner>>,
}

impl FakeModem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A modem that never answers anything.
    pub fn silent() -> Self {
        let modem = Self::default();
        modem.inner.lock().unwrap().silent = true;
        modem
    }

    /// A modem left sitting at a `>` message prompt by a previous session.
    pub fn stuck_at_prompt() -> Self {
        let modem = Self::default();
        modem.inner.lock().unwrap().entering_text = true;
        modem
    }

    /// Answers `command` (without the trailing `\r`) with `ERROR` from now on.
    pub fn fail_command(&self, command: &str) {
        self.inner.lock().unwrap().failing.push(command.to_string());
    }

    pub fn set_unplugged(&self, unplugged: bool) {
        self.inner.lock().unwrap().unplugged = unplugged;
    }

    /// Stores a tracker report split over two messages without announcing it.
    pub fn store_report(&self, sender: &str, text: &str) {
        let split = text.len() / 2;
        let (first, second) = text.split_at(split);
        self.store_fragments(
            sender,
            &hex::encode_upper(first),
            &hex::encode_upper(second),
        );
    }

    pub fn store_fragments(&self, sender: &str, first_hex: &str, second_hex: &str) {
        self.store_message(sender, first_hex);
        self.store_message(sender, second_hex);
    }

    pub fn store_message(&self, sender: &str, body: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_index += 1;
        let index = inner.next_index;
        let message = format!(
            "+CMGR: \"REC UNREAD\",\"{}\",\"\",\"23/01/01,10:00:00+32\"\r\n{}",
            sender, body
        );
        inner.stored.insert(index, message);
    }

    /// Queues `count` unsolicited new-message lines in a single read.
    pub fn notify(&self, count: usize) {
        let mut inner = self.inner.lock().unwrap();
        for i in 0..count {
            let line = format!("\r\n+CMTI: \"SM\",{}\r\n", i + 1);
            inner.pending.extend_from_slice(line.as_bytes());
        }
    }

    pub fn inject(&self, text: &str) {
        self.inner
            .lock()
            .unwrap()
            .pending
            .extend_from_slice(text.as_bytes());
    }

    /// Every `\r`-terminated command line received, without the terminator.
    pub fn commands(&self) -> Vec<String> {
        self.inner.lock().unwrap().commands.clone()
    }

    /// `(number, body)` for each message sent with `AT+CMGS`.
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent_messages().into_iter().map(|(to, _)| to).collect()
    }

    pub fn purges(&self) -> usize {
        self.inner.lock().unwrap().purges
    }

    pub fn stored_count(&self) -> usize {
        self.inner.lock().unwrap().stored.len()
    }
}

impl Inner {
    fn accept(&mut self, byte: u8) {
        if self.entering_text {
            match byte {
                at::CTRL_Z => {
                    let body = String::from_utf8_lossy(&self.line).into_owned();
                    self.line.clear();
                    self.entering_text = false;
                    if let Some(last) = self.sent.last_mut() {
                        if last.1.is_empty() {
                            last.1 = body;
                        }
                    }
                    self.reply("\r\n+CMGS: 7\r\n\r\nOK\r\n");
                }
                b'\r' => {
                    self.line.push(byte);
                    self.reply("\r\n> ");
                }
                _ => self.line.push(byte),
            }
            return;
        }

        if byte == at::CTRL_Z {
            self.line.clear();
        } else if byte == b'\r' {
            let command = String::from_utf8_lossy(&self.line).into_owned();
            self.line.clear();
            self.respond(command);
        } else {
            self.line.push(byte);
        }
    }

    fn reply(&mut self, text: &str) {
        if !self.silent {
            self.pending.extend_from_slice(text.as_bytes());
        }
    }

    fn respond(&mut self, command: String) {
        self.commands.push(command.clone());
        let echo = format!("{}\r", command);

        let body = if self.failing.contains(&command) {
            "\r\nERROR\r\n".to_string()
        } else if command == "AT+CMGDA=\"DEL ALL\"" {
            self.stored.clear();
            self.next_index = 0;
            self.purges += 1;
            "\r\nOK\r\n".to_string()
        } else if let Some(index) = command.strip_prefix("AT+CMGR=") {
            match index.parse::<u8>().ok().and_then(|i| self.stored.get(&i)) {
                Some(message) => format!("\r\n{}\r\n\r\nOK\r\n", message),
                None => "\r\n+CMS ERROR: 321\r\n".to_string(),
            }
        } else if let Some(number) = command.strip_prefix("AT+CMGS=") {
            self.sent
                .push((number.trim_matches('"').to_string(), String::new()));
            self.entering_text = true;
            "\r\n> ".to_string()
        } else {
            match command.as_str() {
                "AT" | "AT+CNMI=1,1,0,0,0" | "AT+CPMS=\"SM\",\"SM\",\"SM\"" | "AT+CSAS"
                | "AT+CMGF=1" => "\r\nOK\r\n".to_string(),
                _ => "\r\nERROR\r\n".to_string(),
            }
        };

        self.reply(&format!("{}{}", echo, body));
    }
}

impl ModemTransport for FakeModem {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unplugged {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "modem unplugged"));
        }
        for &byte in bytes {
            inner.accept(byte);
        }
        Ok(())
    }

    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unplugged {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "modem unplugged"));
        }
        Ok(std::mem::take(&mut inner.pending))
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.inner.lock().unwrap().unplugged {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "modem unplugged"));
        }
        Ok(())
    }
}
