use std::fmt;

/// Money is represented as an `f64`, matching the flat-file record format the
/// store reads and writes. This is lossy for amounts that don't fit a binary
/// fraction; comparisons against zero therefore go through [`BALANCE_EPSILON`]
/// rather than exact equality. Do not swap this for a decimal type without
/// migrating the stored records.
pub type Amount = f64;

/// Tolerance used when deciding whether a balance counts as zero
/// (account closure accepts |balance| <= 0.01 in either direction).
pub const BALANCE_EPSILON: Amount = 0.01;

/// Returns true when a balance is close enough to zero for closure purposes.
pub fn is_settled(balance: Amount) -> bool {
    balance.abs() <= BALANCE_EPSILON
}

/// Format an amount with two decimal places, e.g. `1234.5` -> "1234.50".
pub fn format_amount(amount: Amount) -> String {
    format!("{:.2}", amount)
}

/// Parse a decimal string into an amount.
/// Example: "50.00" -> 50.0, "12.5" -> 12.5, "100" -> 100.0
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::InvalidFormat);
    }
    input
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ParseAmountError::InvalidFormat)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
