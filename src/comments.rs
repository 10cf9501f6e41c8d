use crate::error::{Result, TruncateError};

const PERIOD_TAG: &str = "Period = ";

/// Driving period recorded in a dataset's free-text comments.
///
/// Only the literal, case-sensitive `Period = <number>` form is recognised.
/// When the tag appears more than once the first occurrence followed by a
/// parseable number wins.
pub fn period_from_comments(comments: &str) -> Result<f64> {
    for (pos, _) in comments.match_indices(PERIOD_TAG) {
        let rest = &comments[pos + PERIOD_TAG.len()..];
        if let Some(period) = leading_number(rest) {
            return Ok(period);
        }
    }
    Err(TruncateError::MissingPeriod)
}

fn leading_number(s: &str) -> Option<f64> {
    let chars: Vec<char> = s.chars().collect();
    let mut end = 0;
    while end < chars.len() {
        let c = chars[end];
        let accepted = c.is_ascii_digit()
            || c == '.'
            || ((c == '-' || c == '+') && (end == 0 || matches!(chars[end - 1], 'e' | 'E')))
            || ((c == 'e' || c == 'E') && end > 0);
        if !accepted {
            break;
        }
        end += 1;
    }

    // Back off trailing characters that cannot end a number ("15.0e", "3-").
    while end > 0 {
        let token: String = chars[..end].iter().collect();
        if let Ok(val) = token.parse::<f64>() {
            return Some(val);
        }
        end -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_from_comments() {
        assert_eq!(period_from_comments("Period = 15.0"), Ok(15.0));
        assert_eq!(period_from_comments("run 3, Comments: Period = 15.0"), Ok(15.0));
        assert_eq!(period_from_comments("Period = 60s, amplitude 2"), Ok(60.0));
        assert_eq!(period_from_comments("Period = 1.5e1"), Ok(15.0));
    }

    #[test]
    fn test_missing_period() {
        assert_eq!(period_from_comments("Frequency = 0.1"), Err(TruncateError::MissingPeriod));
        assert_eq!(period_from_comments("period = 15"), Err(TruncateError::MissingPeriod));
        assert_eq!(period_from_comments("Period = unknown"), Err(TruncateError::MissingPeriod));
        assert_eq!(period_from_comments(""), Err(TruncateError::MissingPeriod));
    }

    #[test]
    fn test_first_parseable_occurrence_wins() {
        assert_eq!(period_from_comments("Period = ?, Period = 20"), Ok(20.0));
        assert_eq!(period_from_comments("Period = 10 Period = 20"), Ok(10.0));
    }

    #[test]
    fn test_trailing_junk_is_ignored() {
        assert_eq!(period_from_comments("Period = 15.0e"), Ok(15.0));
        assert_eq!(period_from_comments("Period = 30-ish"), Ok(30.0));
    }
}
