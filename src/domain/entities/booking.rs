use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub contact_id: String,

    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,

    /// `HH:MM`, 24-hour clock
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub message: String,
    pub reference: Uuid,
}
