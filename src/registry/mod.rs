mod record;
mod roster;

pub use record::{LocationRecord, SENTINEL};
pub use roster::load_roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Updated,
    Created,
}

/// Latest known location per device, in roster order. Devices that report
/// without being on the roster are appended.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    roster: Vec<String>,
    records: Vec<LocationRecord>,
}

impl DeviceRegistry {
    pub fn new(roster: Vec<String>) -> Self {
        let mut registry = Self {
            roster,
            records: Vec::new(),
        };
        registry.reset();
        registry
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn lookup(&self, device_id: &str) -> Option<&LocationRecord> {
        self.records.iter().find(|r| r.device_id == device_id)
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.lookup(device_id).is_some()
    }

    pub fn upsert(&mut self, record: LocationRecord) -> Upsert {
        match self
            .records
            .iter_mut()
            .find(|r| r.device_id == record.device_id)
        {
            Some(existing) => {
                *existing = record;
                Upsert::Updated
            }
            None => {
                self.records.push(record);
                Upsert::Created
            }
        }
    }

    /// Drops every report and any off-roster device.
    pub fn reset(&mut self) {
        self.records.clear();
        for device_id in &self.roster {
            if !self.records.iter().any(|r| &r.device_id == device_id) {
                self.records.push(LocationRecord::unknown(device_id));
            }
        }
    }
}
