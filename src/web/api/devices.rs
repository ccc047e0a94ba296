use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::registry::LocationRecord;
use crate::web::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct GpsInfoResponse {
    #[serde(rename = "GPSInfo")]
    pub gps_info: Vec<LocationRecord>,
}

#[utoipa::path(
    get,
    path = "/gpsinfo",
    responses(
        (status = 200, description = "Last known location of every device", body = GpsInfoResponse)
    ),
    tag = "devices"
)]
pub async fn gps_info(State(state): State<AppState>) -> Json<GpsInfoResponse> {
    Json(GpsInfoResponse {
        gps_info: state.gateway.read_all(),
    })
}
