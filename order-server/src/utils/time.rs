//! Business time zone helpers
//!
//! Handlers turn dates into Unix millis here; repositories only see `i64`.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// Parse an IANA zone name (e.g. "Asia/Jakarta")
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>().map_err(|_| {
        AppError::with_message(
            super::ErrorCode::ConfigError,
            format!("Unknown time zone: {}", name),
        )
    })
}

/// Current instant in the business time zone
pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}
