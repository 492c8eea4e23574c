use std::time::Duration;

use crate::error::{DurationError, DurationResult};

/// Parses a human readable duration such as `30s`, `1m30s` or `250ms`.
///
/// Accepted units are `ms`, `s`, `m`, `h` and `d`. Every number must carry a
/// unit, and segments are summed in the order they appear.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use webfeat_utils::time::parse_duration;
///
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// ```
pub fn parse_duration(input: &str) -> DurationResult<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let mut total: u64 = 0;
    let mut chars = trimmed.chars().peekable();

    while chars.peek().is_some() {
        let mut number_str = String::new();
        while let Some(c) = chars.peek().copied() {
            if c.is_ascii_digit() {
                number_str.push(c);
                chars.next();
            } else {
                break;
            }
        }

        if number_str.is_empty() {
            return Err(DurationError::MissingNumber {
                input: input.to_string(),
            });
        }

        let mut unit = String::new();
        while let Some(c) = chars.peek().copied() {
            if c.is_ascii_alphabetic() {
                unit.push(c);
                chars.next();
            } else {
                break;
            }
        }

        let multiplier: u64 = match unit.as_str() {
            "ms" => 1,
            "s" => 1000,
            "m" => 60 * 1000,
            "h" => 60 * 60 * 1000,
            "d" => 24 * 60 * 60 * 1000,
            _ => {
                return Err(DurationError::UnknownUnit {
                    unit,
                    input: input.to_string(),
                })
            }
        };

        let overflow = || DurationError::Overflow {
            input: input.to_string(),
        };
        let number: u64 = number_str.parse().map_err(|_| overflow())?;
        total = number
            .checked_mul(multiplier)
            .and_then(|ms| total.checked_add(ms))
            .ok_or_else(overflow)?;
    }

    Ok(Duration::from_millis(total))
}
