//! Text helpers: trimming and lenient date/time normalization.
//!
//! Input accepts `-` or `.` between date fields and `:` or `.` between time
//! fields, with one or two digits per field. Output is always the canonical
//! zero-padded form (`YYYY-MM-DD`, `HH:MM`, `YYYY-MM-DD HH:MM`).

use crate::error::{Error, Result};
use regex_lite::Regex;
use std::sync::LazyLock;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[:.](\d{1,2})$").expect("valid time regex"));

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)[-.](\d{1,2})[-.](\d{1,2})$").expect("valid date regex")
});

static DATE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)[-.](\d{1,2})[-.](\d{1,2})\s+(\d{1,2})[:.](\d{1,2})$")
        .expect("valid date time regex")
});

/// Trim leading and trailing whitespace (space, tab, CR, LF, FF, VT).
pub fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| matches!(c, ' ' | '\n' | '\r' | '\t' | '\x0c' | '\x0b'))
}

fn pad2(field: &str) -> String {
    format!("{:0>2}", field)
}

/// `9:5` / `9.05` -> `09:05`.
pub fn normalize_time(input: &str) -> Result<String> {
    let caps = TIME_RE
        .captures(input)
        .ok_or_else(|| Error::unknown_format("time", input))?;
    Ok(format!("{}:{}", pad2(&caps[1]), pad2(&caps[2])))
}

/// `2022.2.20` / `2022-2-20` -> `2022-02-20`. The year is left as typed.
pub fn normalize_date(input: &str) -> Result<String> {
    let caps = DATE_RE
        .captures(input)
        .ok_or_else(|| Error::unknown_format("date", input))?;
    Ok(format!("{}-{}-{}", &caps[1], pad2(&caps[2]), pad2(&caps[3])))
}

/// `2022.4.20  9.15` -> `2022-04-20 09:15`.
pub fn normalize_date_time(input: &str) -> Result<String> {
    let caps = DATE_TIME_RE
        .captures(input)
        .ok_or_else(|| Error::unknown_format("date time", input))?;
    Ok(format!(
        "{}-{}-{} {}:{}",
        &caps[1],
        pad2(&caps[2]),
        pad2(&caps[3]),
        pad2(&caps[4]),
        pad2(&caps[5])
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_trim() {
        assert_eq!(trim("  hello \t\r\n"), "hello");
        assert_eq!(trim("\x0b\x0c"), "");
        assert_eq!(trim("a b"), "a b");
    }

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("9:5").unwrap(), "09:05");
        assert_eq!(normalize_time("9.5").unwrap(), "09:05");
        assert_eq!(normalize_time("9:50").unwrap(), "09:50");
        assert_eq!(normalize_time("19:50").unwrap(), "19:50");
        assert_eq!(normalize_time("19.50").unwrap(), "19:50");

        let err = normalize_time("09 50").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFormat);
        assert_eq!(err.message, "Unknown time format: 09 50");
    }

    #[test]
    fn test_normalize_time_rejects_garbage() {
        assert!(normalize_time("").is_err());
        assert!(normalize_time("9:").is_err());
        assert!(normalize_time("123:45").is_err());
        assert!(normalize_time("ab:cd").is_err());
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2022-5-3").unwrap(), "2022-05-03");
        assert_eq!(normalize_date("2022-4-27").unwrap(), "2022-04-27");
        assert_eq!(normalize_date("2022.2.20").unwrap(), "2022-02-20");

        let err = normalize_date("2022-a-20").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFormat);
    }

    #[test]
    fn test_normalize_date_time() {
        assert_eq!(
            normalize_date_time("2022-4-20 9:15").unwrap(),
            "2022-04-20 09:15"
        );
        assert_eq!(
            normalize_date_time("2022.04.20   09.15").unwrap(),
            "2022-04-20 09:15"
        );
        assert!(normalize_date_time("2022-04-20").is_err());
        assert!(normalize_date_time("2022-04-2009:15").is_err());
    }

    #[test]
    fn normalizers_are_idempotent_on_canonical_input() {
        for t in ["00:00", "09:05", "23:59"] {
            assert_eq!(normalize_time(t).unwrap(), t);
        }
        for d in ["2022-02-20", "1999-12-31"] {
            assert_eq!(normalize_date(d).unwrap(), d);
        }
        let dt = "2022-04-20 09:15";
        assert_eq!(normalize_date_time(dt).unwrap(), dt);
    }
}
