//! Numeric cell parsing.
//!
//! Sports-reference prints percentages with a bare leading dot (`.452`) and
//! occasionally uses thousands separators; both are accepted.

/// Strips surrounding whitespace and thousands separators.
fn digits(s: &str) -> std::borrow::Cow<'_, str> {
    let trimmed = s.trim();
    if trimmed.contains(',') {
        std::borrow::Cow::Owned(trimmed.replace(',', ""))
    } else {
        std::borrow::Cow::Borrowed(trimmed)
    }
}

/// Parses an integer cell. Returns `None` if the text isn't an integer.
#[must_use]
pub fn parse_integer(s: &str) -> Option<i32> {
    digits(s).parse::<i32>().ok()
}

/// Parses a floating point cell. Returns `None` if the text isn't a finite
/// number (`"inf"` and `"NaN"` are rejected).
#[must_use]
pub fn parse_float(s: &str) -> Option<f64> {
    digits(s).parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers() {
        assert_eq!(parse_integer("25"), Some(25));
        assert_eq!(parse_integer(" 82 "), Some(82));
        assert_eq!(parse_integer("1,234"), Some(1234));
    }

    #[test]
    fn rejects_non_integers() {
        assert_eq!(parse_integer("25.5"), None);
        assert_eq!(parse_integer("Age"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[test]
    fn parses_leading_dot_floats() {
        let v = parse_float(".452").unwrap();
        assert!((v - 0.452).abs() < f64::EPSILON);
        let v = parse_float("18.4").unwrap();
        assert!((v - 18.4).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_finite_floats() {
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("n/a"), None);
    }
}
