//! Canonical timestamp text, `2025-01-01 08:00:00` form. Every surface that
//! reads or writes readings as text goes through these helpers so the log,
//! the API, and the exports all agree on one shape.

use time::{format_description::BorrowedFormatItem, macros::format_description, Date, PrimitiveDateTime};

pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(s.trim(), TIMESTAMP_FORMAT)
}

pub fn format_timestamp(t: PrimitiveDateTime) -> String {
    format!(
        "{} {:02}:{:02}:{:02}",
        format_date(t.date()),
        t.hour(),
        t.minute(),
        t.second()
    )
}

pub fn format_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn parses_the_canonical_form() {
        let parsed = parse_timestamp("2025-01-01 08:00:00").unwrap();
        assert_eq!(parsed, datetime!(2025-01-01 08:00));
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let parsed = parse_timestamp("  2025-01-01 08:00:00 ").unwrap();
        assert_eq!(parsed, datetime!(2025-01-01 08:00));
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_timestamp("2025-01-01T08:00:00").is_err());
        assert!(parse_timestamp("01/01/2025 08:00").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn formats_back_to_the_canonical_form() {
        assert_eq!(format_timestamp(datetime!(2025-01-01 08:00)), "2025-01-01 08:00:00");
        assert_eq!(format_timestamp(datetime!(2025-12-31 23:59:07)), "2025-12-31 23:59:07");
    }

    #[test]
    fn formats_dates_zero_padded() {
        assert_eq!(format_date(date!(2025-03-05)), "2025-03-05");
    }
}
