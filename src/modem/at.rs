//! AT command tokens understood by the SIM800-class modems the trackers
//! report through. These are sent byte for byte.

pub const WAKE: &[u8] = b"AT\r";
/// Store incoming SMS and announce them with an unsolicited `+CMTI` line.
pub const NOTIFY_ON_STORE: &[u8] = b"AT+CNMI=1,1,0,0,0\r";
pub const SELECT_STORAGE: &[u8] = b"AT+CPMS=\"SM\",\"SM\",\"SM\"\r";
pub const SAVE_SETTINGS: &[u8] = b"AT+CSAS\r";
pub const DELETE_ALL: &[u8] = b"AT+CMGDA=\"DEL ALL\"\r";
pub const TEXT_MODE: &[u8] = b"AT+CMGF=1\r";

/// Ends message entry after a `>` prompt.
pub const CTRL_Z: u8 = 0x1A;
/// Filler written into a stuck message prompt before the terminator.
pub const ABORT_TEXT: &[u8] = b"ERROR";
/// SMS body that makes a tracker answer with its last position.
pub const LOCATION_REQUEST: &[u8] = b"WHERE#";

pub const ACK_TOKEN: &str = "OK";
pub const PROMPT_TOKEN: &str = ">";
pub const ERROR_TOKEN: &str = "ERROR";
pub const NEW_MESSAGE_TOKEN: &str = "+CMTI:";
pub const UNREAD_MARKER: &str = "REC UNREAD";

pub fn read_message(index: u8) -> Vec<u8> {
    format!("AT+CMGR={}\r", index).into_bytes()
}

pub fn send_message(number: &str) -> Vec<u8> {
    format!("AT+CMGS=\"{}\"\r", number).into_bytes()
}

pub fn abort_sequence() -> Vec<u8> {
    let mut bytes = ABORT_TEXT.to_vec();
    bytes.push(CTRL_Z);
    bytes
}
