use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::poller::{PollStatus, SchedulerState};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::AppState;

/// The gateway exposes a single poll configuration under this id.
pub const POLL_CONFIG_ID: &str = "000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PollSetting {
    Enable,
    Disable,
}

impl PollSetting {
    fn from_enabled(enabled: bool) -> Self {
        if enabled {
            PollSetting::Enable
        } else {
            PollSetting::Disable
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PollConfigEntry {
    pub id: String,
    pub poll: PollSetting,
    pub state: SchedulerState,
    pub cursor: usize,
    pub last_report: Option<DateTime<Utc>>,
}

impl From<PollStatus> for PollConfigEntry {
    fn from(status: PollStatus) -> Self {
        PollConfigEntry {
            id: POLL_CONFIG_ID.to_string(),
            poll: PollSetting::from_enabled(status.enabled),
            state: status.state,
            cursor: status.cursor,
            last_report: status.last_report,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SmsGwInfoResponse {
    #[serde(rename = "SMSGWInfo")]
    pub sms_gw_info: Vec<PollConfigEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PollUpdate {
    pub poll: Option<PollSetting>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PollConfigResponse {
    #[serde(rename = "pollconfig")]
    pub poll_config: Vec<PollConfigEntry>,
}

#[utoipa::path(
    get,
    path = "/smsgwinfo",
    responses(
        (status = 200, description = "Gateway polling status", body = SmsGwInfoResponse)
    ),
    tag = "poll"
)]
pub async fn sms_gw_info(State(state): State<AppState>) -> Json<SmsGwInfoResponse> {
    Json(SmsGwInfoResponse {
        sms_gw_info: vec![state.gateway.status().into()],
    })
}

#[utoipa::path(
    put,
    path = "/pollgps/{id}",
    params(
        ("id" = String, Path, description = "Poll configuration id, always \"000\"")
    ),
    request_body = PollUpdate,
    responses(
        (status = 200, description = "Polling updated", body = PollConfigResponse),
        (status = 400, description = "Missing poll setting", body = ErrorResponse),
        (status = 404, description = "Unknown configuration id", body = ErrorResponse)
    ),
    tag = "poll"
)]
pub async fn update_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<PollUpdate>,
) -> ApiResult<Json<PollConfigResponse>> {
    if id != POLL_CONFIG_ID {
        return Err(ApiError::NotFound("poll_config_not_found"));
    }
    let setting = update
        .poll
        .ok_or_else(|| ApiError::Validation("poll must be ENABLE or DISABLE".into()))?;

    state
        .gateway
        .set_poll_state(setting == PollSetting::Enable);

    Ok(Json(PollConfigResponse {
        poll_config: vec![state.gateway.status().into()],
    }))
}
