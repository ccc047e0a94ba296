//! Lexer for the decoded tracker text:
//!
//! `<status>!Lat:<lat>,Lon:<lon>,Course:<course>,Speed:<speed>,DateTime:<rest>`
//!
//! Each `:` moves to the next field. Inside a value, commas and the letters of
//! the label that follows are skipped, so `3.123,Lon` yields `3.123`.

use crate::registry::{LocationRecord, SENTINEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Status,
    /// Between `!` and the `:` after `Lat`.
    LatitudeLabel,
    Latitude,
    Longitude,
    Course,
    Speed,
    DateTime,
}

impl Field {
    fn after_colon(self) -> Field {
        match self {
            Field::Status | Field::LatitudeLabel => Field::Latitude,
            Field::Latitude => Field::Longitude,
            Field::Longitude => Field::Course,
            Field::Course => Field::Speed,
            Field::Speed | Field::DateTime => Field::DateTime,
        }
    }

    /// Label text that trails this field's value in the blob.
    fn next_label(self) -> &'static str {
        match self {
            Field::Latitude => "Lon",
            Field::Longitude => "Course",
            Field::Course => "Speed",
            Field::Speed => "DateTime",
            _ => "",
        }
    }

    fn keeps(self, ch: char) -> bool {
        match self {
            Field::LatitudeLabel => false,
            Field::Status | Field::DateTime => true,
            _ => ch != ',' && !self.next_label().contains(ch),
        }
    }
}

/// Field values found in a report. `None` means the lexer never reached the
/// field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub status: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub course: Option<String>,
    pub speed: Option<String>,
    pub timestamp: Option<String>,
}

impl ParsedReport {
    fn slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Status => Some(&mut self.status),
            Field::LatitudeLabel => None,
            Field::Latitude => Some(&mut self.latitude),
            Field::Longitude => Some(&mut self.longitude),
            Field::Course => Some(&mut self.course),
            Field::Speed => Some(&mut self.speed),
            Field::DateTime => Some(&mut self.timestamp),
        }
    }

    fn open(&mut self, field: Field) {
        if let Some(slot) = self.slot(field) {
            slot.get_or_insert_with(String::new);
        }
    }

    fn push(&mut self, field: Field, ch: char) {
        if let Some(value) = self.slot(field).and_then(|slot| slot.as_mut()) {
            value.push(ch);
        }
    }

    /// Builds the registry record; fields never reached keep the sentinel.
    pub fn into_record(self, device_id: String) -> LocationRecord {
        let or_sentinel = |v: Option<String>| v.unwrap_or_else(|| SENTINEL.to_string());
        LocationRecord {
            device_id,
            latitude: or_sentinel(self.latitude),
            longitude: or_sentinel(self.longitude),
            course: or_sentinel(self.course),
            speed: or_sentinel(self.speed),
            status: or_sentinel(self.status),
            timestamp: or_sentinel(self.timestamp),
        }
    }
}

pub fn parse_report(text: &str) -> ParsedReport {
    let mut report = ParsedReport::default();
    let mut field = Field::Status;
    report.open(field);

    for ch in text.chars() {
        match (field, ch) {
            (Field::Status, '!') => field = Field::LatitudeLabel,
            (Field::Status, _) => report.push(field, ch),
            (Field::DateTime, _) => report.push(field, ch),
            (_, ':') => {
                field = field.after_colon();
                report.open(field);
            }
            _ if field.keeps(ch) => report.push(field, ch),
            _ => {}
        }
    }

    report
}
