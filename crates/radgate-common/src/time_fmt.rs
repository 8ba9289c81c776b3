//! RFC3339 timestamp helpers for AG-UI events (spec §3): events are
//! written with nanosecond precision but parsers must tolerate
//! second-precision input from other emitters.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Render `ts` as RFC3339 with nanosecond precision.
pub fn to_rfc3339_nanos(ts: OffsetDateTime) -> String {
    // `Rfc3339` already emits the minimal fractional digits needed to
    // round-trip; nanosecond-precision `OffsetDateTime` values format
    // with nanosecond fractional seconds.
    ts.format(&Rfc3339)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

/// Parse an RFC3339 timestamp at either nanosecond or second
/// precision (both are valid RFC3339).
pub fn parse_rfc3339(input: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(input, &Rfc3339)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_nanosecond_precision() {
        let now = OffsetDateTime::now_utc();
        let rendered = to_rfc3339_nanos(now);
        let parsed = parse_rfc3339(&rendered).unwrap();
        assert_eq!(parsed.unix_timestamp(), now.unix_timestamp());
    }

    #[test]
    fn accepts_second_precision_input() {
        let parsed = parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(parsed.unix_timestamp(), 1704067200);
    }

    #[test]
    fn accepts_nanosecond_precision_input() {
        let parsed = parse_rfc3339("2024-01-01T00:00:00.123456789Z").unwrap();
        assert_eq!(parsed.unix_timestamp(), 1704067200);
        assert_eq!(parsed.nanosecond(), 123_456_789);
    }
}
