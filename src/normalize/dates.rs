use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};

use crate::error::MessageError;

/// `yyyy-MM-dd'T'HH:mm:ss'Z'`, the form every timestamp is rendered to
/// before normalization.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Two-digit years land within 80 years before and 20 years after this year.
const SHORT_YEAR_LOOKBACK: i32 = 80;

/// Expands `yy` to the single year in `[current - 80, current + 20)` ending
/// in those two digits.
pub fn expand_short_year(yy: i32, current_year: i32) -> i32 {
    let start = current_year - SHORT_YEAR_LOOKBACK;
    let year = start - start.rem_euclid(100) + yy;
    if year < start { year + 100 } else { year }
}

/// Parse patterns accepted for incoming timestamp strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePattern {
    /// A literal `00` followed by a two-digit year, e.g. `0099-12-25T00:00:00Z`.
    ZeroPrefixedShortYear,
    /// A plain four-digit year, e.g. `1999-12-25T00:00:00Z`.
    FourDigitYear,
}

impl DatePattern {
    pub fn for_input(input: &str) -> Self {
        if input.starts_with("00") {
            DatePattern::ZeroPrefixedShortYear
        } else {
            DatePattern::FourDigitYear
        }
    }

    pub fn parse(self, input: &str) -> Result<DateTime<Utc>, MessageError> {
        let fail = |reason: String| MessageError::DateParse {
            input: input.to_string(),
            reason,
        };

        let naive = match self {
            DatePattern::ZeroPrefixedShortYear => {
                let rest = input
                    .strip_prefix("00")
                    .ok_or_else(|| fail("expected a literal 00 prefix".to_string()))?;
                let yy = rest
                    .get(..2)
                    .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|d| d.parse::<i32>().ok())
                    .ok_or_else(|| fail("expected a two-digit year".to_string()))?;
                let year = expand_short_year(yy, Utc::now().year());
                NaiveDateTime::parse_from_str(&format!("{year:04}{}", &rest[2..]), CANONICAL_FORMAT)
            }
            DatePattern::FourDigitYear => {
                let year = input.as_bytes().get(..5).unwrap_or_default();
                let four_digits = year.len() == 5
                    && year[..4].iter().all(u8::is_ascii_digit)
                    && year[0] != b'0'
                    && year[4] == b'-';
                if !four_digits {
                    return Err(fail("expected a four-digit year".to_string()));
                }
                NaiveDateTime::parse_from_str(input, CANONICAL_FORMAT)
            }
        }
        .map_err(|e| fail(e.to_string()))?;

        Ok(Utc.from_utc_datetime(&naive))
    }
}

/// Day and minute of a normalized timestamp, both UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDate {
    /// `yyyyMMdd`
    pub day: String,
    /// `HH:mm`
    pub time: String,
}

/// Empty input is not an error, there is simply nothing to normalize.
pub fn normalize_date(input: &str) -> Result<Option<NormalizedDate>, MessageError> {
    if input.is_empty() {
        return Ok(None);
    }
    let instant = DatePattern::for_input(input).parse(input)?;
    Ok(Some(NormalizedDate {
        day: instant.format("%Y%m%d").to_string(),
        time: instant.format("%H:%M").to_string(),
    }))
}

pub fn canonical(instant: &DateTime<Utc>) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}

/// `yyyy-MM-dd` in UTC.
pub fn creation_date(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}
