use thiserror::Error;

/// Contract violations raised by the truncators.
///
/// Everything else (short data, too few cycles, no stabilisation) is reported
/// through [`crate::transient::Outcome::NoCut`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TruncateError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No period given and none found in comments (expected \"Period = <number>\")")]
    MissingPeriod,
}

pub type Result<T> = std::result::Result<T, TruncateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TruncateError::InvalidInput("t and y differ in length".to_string());
        assert_eq!(err.to_string(), "Invalid input: t and y differ in length");
        assert!(TruncateError::MissingPeriod.to_string().contains("Period = "));
    }
}
