mod error;
mod fragment;
mod grammar;

pub use error::ReassemblyError;

use fragment::{decode_hex_body, extract_first, extract_second, FirstFragment, FragmentBuffer};
use grammar::parse_report;

use crate::modem::{at, CommandDriver, ModemTransport, Response};
use crate::registry::LocationRecord;

/// A decoded report plus whether its sender was already known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembled {
    pub record: LocationRecord,
    pub known_sender: bool,
}

/// Turns the `+CMTI` stream and the two stored messages of a tracker reply
/// into one location record.
#[derive(Debug, Default)]
pub struct MessageReassembler {
    buffer: FragmentBuffer,
}

impl MessageReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one raw read. Returns true once both fragments are announced.
    pub fn observe(&mut self, raw: &str) -> bool {
        self.buffer.observe(raw)
    }

    pub fn is_complete(&self) -> bool {
        self.buffer.is_complete()
    }

    pub fn notifications(&self) -> u8 {
        self.buffer.notifications()
    }

    /// Sender of the cycle's first fragment, once it has been read.
    pub fn sender(&self) -> Option<&str> {
        self.buffer.sender()
    }

    pub fn is_decoded(&self) -> bool {
        self.buffer.is_decoded()
    }

    pub fn reset(&mut self) {
        self.buffer.reset();
    }

    /// Reads stored messages 1 and 2 and decodes them.
    ///
    /// The buffer keeps its notification count on failure, so a transport
    /// fault can be retried on the next tick. Callers reset it once the
    /// cycle is over.
    pub async fn collect<T, F>(
        &mut self,
        driver: &mut CommandDriver<T>,
        is_known: F,
    ) -> Result<Reassembled, ReassemblyError>
    where
        T: ModemTransport,
        F: Fn(&str) -> bool,
    {
        let first = read_stored(driver, 1).await?;
        let FirstFragment { sender, body } = extract_first(&first.raw)?;
        let known_sender = is_known(&sender);
        self.buffer.set_sender(&sender);
        self.buffer.set_fragment_one(&body);
        let first_text = decode_hex_body(&body, 1)?;

        let second = read_stored(driver, 2).await?;
        let body = extract_second(&second.raw)?;
        self.buffer.set_fragment_two(&body);
        let second_text = decode_hex_body(&body, 2)?;

        let text = format!("{}{}", first_text, second_text);
        log::debug!("Report from {}: {}", sender, text);
        let parsed = parse_report(&text);
        self.buffer.mark_decoded();

        Ok(Reassembled {
            record: parsed.into_record(sender),
            known_sender,
        })
    }
}

async fn read_stored<T: ModemTransport>(
    driver: &mut CommandDriver<T>,
    index: u8,
) -> Result<Response, ReassemblyError> {
    let reply = driver.send(&at::read_message(index)).await?;
    if reply.is_acknowledged() && reply.raw.contains(at::UNREAD_MARKER) {
        Ok(reply)
    } else {
        Err(ReassemblyError::Unavailable {
            index,
            reply: reply.class,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::fake::FakeModem;
    use crate::registry::SENTINEL;
    use std::time::Duration;

    const REPORT: &str =
        "LastPosition!Lat:3.123,Lon:101.456,Course:90,Speed:12,DateTime:2023-01-01T10:00:00";

    fn driver(modem: &FakeModem) -> CommandDriver<FakeModem> {
        CommandDriver::new(modem.clone(), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn collects_a_two_part_report() {
        let modem = FakeModem::new();
        modem.store_report("+60133517176", REPORT);
        let mut reassembler = MessageReassembler::new();

        let out = reassembler
            .collect(&mut driver(&modem), |id| id == "+60133517176")
            .await
            .unwrap();

        assert!(out.known_sender);
        let record = out.record;
        assert_eq!(record.device_id, "+60133517176");
        assert_eq!(record.status, "LastPosition");
        assert_eq!(record.latitude, "3.123");
        assert_eq!(record.longitude, "101.456");
        assert_eq!(record.course, "90");
        assert_eq!(record.speed, "12");
        assert_eq!(record.timestamp, "2023-01-01T10:00:00");
        assert_eq!(
            modem.commands(),
            vec!["AT+CMGR=1".to_string(), "AT+CMGR=2".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_sender_still_decodes() {
        let modem = FakeModem::new();
        modem.store_report("+60199999999", REPORT);
        let mut reassembler = MessageReassembler::new();

        let out = reassembler
            .collect(&mut driver(&modem), |_| false)
            .await
            .unwrap();

        assert!(!out.known_sender);
        assert_eq!(out.record.device_id, "+60199999999");
    }

    #[tokio::test(start_paused = true)]
    async fn padding_bytes_are_dropped() {
        let modem = FakeModem::new();
        let first = format!("00{}00", hex::encode_upper("LastPosition!Lat:1"));
        let second = format!("{}0000", hex::encode_upper(",Lon:2"));
        modem.store_fragments("+60133517176", &first, &second);

        let out = MessageReassembler::new()
            .collect(&mut driver(&modem), |_| true)
            .await
            .unwrap();

        assert_eq!(out.record.latitude, "1");
        assert_eq!(out.record.longitude, "2");
        assert_eq!(out.record.course, SENTINEL);
    }

    #[tokio::test(start_paused = true)]
    async fn non_hex_body_aborts_the_cycle() {
        let modem = FakeModem::new();
        modem.store_fragments("+60133517176", "4C61ZZ", "4142");

        let err = MessageReassembler::new()
            .collect(&mut driver(&modem), |_| true)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReassemblyError::MalformedFragment { index: 1, .. }
        ));
        // Fragment 2 is never read after fragment 1 fails.
        assert_eq!(modem.commands(), vec!["AT+CMGR=1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_second_message_fails() {
        let modem = FakeModem::new();
        modem.store_message("+60133517176", &hex::encode_upper("LastPosition!"));

        let err = MessageReassembler::new()
            .collect(&mut driver(&modem), |_| true)
            .await
            .unwrap_err();

        assert!(matches!(err, ReassemblyError::Unavailable { index: 2, .. }));
    }

    #[test]
    fn batched_and_split_notifications_complete_alike() {
        let mut batched = MessageReassembler::new();
        assert!(batched.observe("\r\n+CMTI: \"SM\",1\r\n\r\n+CMTI: \"SM\",2\r\n"));

        let mut split = MessageReassembler::new();
        assert!(!split.observe("\r\n+CMTI: \"SM\",1\r\n"));
        assert!(split.observe("\r\n+CMTI: \"SM\",2\r\n"));

        assert_eq!(batched.notifications(), split.notifications());
    }
}
