use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

pub const FRAME_MEDIA_TYPE: &str = "image/jpeg";

/// One still image captured from the source video.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Bare base64 JPEG payload, no data-URI prefix.
    pub data: String,
    pub mime_type: String,
    /// Actual post-seek position, which may differ from the requested offset.
    pub timestamp_secs: f64,
}

impl Frame {
    pub fn from_jpeg(jpeg: &[u8], timestamp_secs: f64) -> Self {
        Self {
            data: STANDARD.encode(jpeg),
            mime_type: FRAME_MEDIA_TYPE.to_string(),
            timestamp_secs,
        }
    }

    pub fn decoded_bytes(&self) -> Option<Vec<u8>> {
        STANDARD.decode(self.data.as_bytes()).ok()
    }

    /// `m:ss` label used when the frame is handed to the model.
    pub fn timestamp_label(&self) -> String {
        format_timestamp(self.timestamp_secs)
    }
}

pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}
