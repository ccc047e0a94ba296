use serde::Serialize;
use utoipa::ToSchema;

/// Field value until a device has reported.
pub const SENTINEL: &str = "unknown";

/// Last decoded report of one tracker. Serialized with the field names
/// existing dashboards expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LocationRecord {
    #[serde(rename = "gpsid")]
    pub device_id: String,
    pub latitude: String,
    pub longitude: String,
    pub course: String,
    pub speed: String,
    pub status: String,
    #[serde(rename = "datetime")]
    pub timestamp: String,
}

impl LocationRecord {
    pub fn unknown(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            latitude: SENTINEL.to_string(),
            longitude: SENTINEL.to_string(),
            course: SENTINEL.to_string(),
            speed: SENTINEL.to_string(),
            status: SENTINEL.to_string(),
            timestamp: SENTINEL.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        [
            &self.latitude,
            &self.longitude,
            &self.course,
            &self.speed,
            &self.status,
            &self.timestamp,
        ]
        .iter()
        .all(|v| v.as_str() == SENTINEL)
    }
}
