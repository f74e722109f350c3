use time::{macros::format_description, OffsetDateTime};

/// Renders a unix timestamp as UTC `YYYY-MM-DD hh:mm:ss`.
pub fn format_time(timestamp: u64) -> Option<String> {
    let dt = OffsetDateTime::from_unix_timestamp(i64::try_from(timestamp).ok()?).ok()?;
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    dt.format(format).ok()
}
