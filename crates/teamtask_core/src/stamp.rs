use crate::error::AppError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Identifiers are a prefix plus the creation instant in nanoseconds,
/// which also makes them sortable by creation order.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", OffsetDateTime::now_utc().unix_timestamp_nanos())
}

pub fn now_rfc3339() -> Result<String, AppError> {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, AppError> {
    value
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn parse_rfc3339(value: &str, field: &str) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|_| AppError::invalid_data(format!("{field} must be RFC3339")))
}
