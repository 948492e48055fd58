use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Parses provider timestamps such as `2024-09-12T15:04:05.123Z` or `+02:00` offsets into UTC.
pub(crate) fn parse_rfc3339_utc(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).map(|parsed| parsed.to_offset(UtcOffset::UTC))
}

/// Whole seconds from `started` to `ended`, never negative.
pub(crate) fn elapsed_seconds(started: OffsetDateTime, ended: OffsetDateTime) -> i32 {
    let seconds = (ended - started).whole_seconds().max(0);
    i32::try_from(seconds).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn parse_rfc3339_normalises_offsets() {
        let zulu = parse_rfc3339_utc("2024-09-12T10:00:00Z").unwrap();
        let shifted = parse_rfc3339_utc("2024-09-12T12:00:00+02:00").unwrap();
        assert_eq!(zulu, shifted);
        assert_eq!(shifted.offset(), UtcOffset::UTC);
    }

    #[test]
    fn elapsed_seconds_clamps_negative_spans() {
        let start = parse_rfc3339_utc("2024-09-12T10:00:30.900Z").unwrap();
        let end = parse_rfc3339_utc("2024-09-12T10:01:00Z").unwrap();
        assert_eq!(elapsed_seconds(start, end), 29);
        assert_eq!(elapsed_seconds(end, start), 0);
    }
}
