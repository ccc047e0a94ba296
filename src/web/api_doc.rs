use utoipa::OpenApi;

use super::api::devices::GpsInfoResponse;
use super::api::error::ErrorResponse;
use super::api::poll::{
    PollConfigEntry, PollConfigResponse, PollSetting, PollUpdate, SmsGwInfoResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::devices::gps_info,
        super::api::poll::sms_gw_info,
        super::api::poll::update_poll,
    ),
    components(
        schemas(
            GpsInfoResponse,
            SmsGwInfoResponse,
            PollConfigEntry,
            PollConfigResponse,
            PollSetting,
            PollUpdate,
            ErrorResponse,
            crate::registry::LocationRecord,
            crate::poller::SchedulerState,
        )
    ),
    info(
        title = "SMS GPS Gateway API",
        description = "Tracker locations and polling control",
        version = "0.1.0"
    ),
    tags(
        (name = "devices", description = "Tracker locations"),
        (name = "poll", description = "Polling control")
    )
)]
pub struct ApiDoc;
