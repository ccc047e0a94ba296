use crate::modem::at;

use super::error::ReassemblyError;

/// A tracker report always arrives as this many stored messages.
pub const FRAGMENTS_PER_REPORT: u8 = 2;

/// Per-cycle reassembly state. Lives from the first `+CMTI` of a reply until
/// the cycle completes, fails or times out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FragmentBuffer {
    notifications: u8,
    fragment_one: String,
    fragment_two: String,
    sender: Option<String>,
    decoded: bool,
}

impl FragmentBuffer {
    /// Counts the notifications in one raw read. A batch of two or more
    /// completes the buffer outright; anything past two is not tracked.
    pub fn observe(&mut self, raw: &str) -> bool {
        if self.is_complete() {
            return true;
        }
        match count_notifications(raw) {
            0 => {}
            1 => self.notifications += 1,
            _ => self.notifications = FRAGMENTS_PER_REPORT,
        }
        self.notifications = self.notifications.min(FRAGMENTS_PER_REPORT);
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.notifications == FRAGMENTS_PER_REPORT
    }

    pub fn notifications(&self) -> u8 {
        self.notifications
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded
    }

    pub(crate) fn set_sender(&mut self, sender: &str) {
        self.sender = Some(sender.to_string());
    }

    pub(crate) fn set_fragment_one(&mut self, hex: &str) {
        self.fragment_one = hex.to_string();
    }

    pub(crate) fn set_fragment_two(&mut self, hex: &str) {
        self.fragment_two = hex.to_string();
    }

    pub(crate) fn mark_decoded(&mut self) {
        self.decoded = true;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn count_notifications(raw: &str) -> usize {
    raw.split_whitespace()
        .filter(|word| *word == at::NEW_MESSAGE_TOKEN)
        .count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFragment {
    pub sender: String,
    pub body: String,
}

/// Pulls the sender and hex body out of the `AT+CMGR=1` reply.
///
/// With echo on, the third `+` of the reply opens the sender number
/// (`AT+CMGR`, `+CMGR:`, then the number). The body is the line after the
/// header.
pub fn extract_first(raw: &str) -> Result<FirstFragment, ReassemblyError> {
    let (plus, _) = raw
        .match_indices('+')
        .nth(2)
        .ok_or(ReassemblyError::MissingSender)?;
    let number = &raw[plus + 1..];
    let close = number.find('"').ok_or(ReassemblyError::MissingSender)?;
    let digits = &number[..close];
    if digits.is_empty() {
        return Err(ReassemblyError::MissingSender);
    }

    let (_, rest) = number[close..]
        .split_once('\n')
        .ok_or(ReassemblyError::MissingBody { index: 1 })?;

    Ok(FirstFragment {
        sender: format!("+{}", digits),
        body: first_line(rest).to_string(),
    })
}

/// Pulls the hex body out of the `AT+CMGR=2` reply: the line after the echo
/// and the header.
pub fn extract_second(raw: &str) -> Result<String, ReassemblyError> {
    let mut lines = raw.splitn(3, '\n');
    let rest = lines
        .nth(2)
        .ok_or(ReassemblyError::MissingBody { index: 2 })?;
    Ok(first_line(rest).to_string())
}

fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default()
}

/// Decodes a fragment body two hex digits at a time.
///
/// `00` pairs are padding and dropped, as is an unpaired trailing digit.
pub fn decode_hex_body(body: &str, index: u8) -> Result<String, ReassemblyError> {
    let digits: Vec<u8> = body
        .trim()
        .as_bytes()
        .chunks_exact(2)
        .filter(|pair| *pair != b"00")
        .flatten()
        .copied()
        .collect();

    let bytes = hex::decode(&digits)
        .map_err(|source| ReassemblyError::MalformedFragment { index, source })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
