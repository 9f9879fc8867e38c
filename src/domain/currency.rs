use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Amount;

/// The fixed set of currencies the bank deals in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ron,
    Eur,
    Usd,
    Gbp,
}

pub const CURRENCIES: [Currency; 4] = [Currency::Ron, Currency::Eur, Currency::Usd, Currency::Gbp];

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Ron => "RON",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RON" => Some(Currency::Ron),
            "EUR" => Some(Currency::Eur),
            "USD" => Some(Currency::Usd),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }

    /// Position of this currency in the rate matrix.
    fn index(&self) -> usize {
        match self {
            Currency::Ron => 0,
            Currency::Eur => 1,
            Currency::Usd => 2,
            Currency::Gbp => 3,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a conversion through the rate table.
///
/// An unset pair is not an error: the amount passes through unchanged, but the
/// caller can tell the two cases apart and apply its own policy (the Bank
/// treats a missing rate on a transfer as a hard failure, while a currency
/// change degrades gracefully).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    Converted(Amount),
    /// No rate configured for this pair; carries the amount unconverted.
    MissingRate(Amount),
}

impl Conversion {
    /// The resulting amount, converted or not.
    pub fn amount(&self) -> Amount {
        match *self {
            Conversion::Converted(a) | Conversion::MissingRate(a) => a,
        }
    }

    pub fn is_missing_rate(&self) -> bool {
        matches!(self, Conversion::MissingRate(_))
    }
}

/// Square conversion matrix over the fixed currency set.
///
/// `rate[from][to]` is the multiplicative factor converting one unit of `from`
/// into `to`. The diagonal is always 1.0; an off-diagonal 0.0 means "no rate
/// known". Rates are written one direction at a time; the table is not
/// auto-inverted and not guaranteed symmetric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    rates: [[f64; 4]; 4],
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTable {
    /// Identity table: 1.0 on the diagonal, 0.0 (unset) everywhere else.
    pub fn new() -> Self {
        let mut rates = [[0.0; 4]; 4];
        for (i, row) in rates.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { rates }
    }

    /// Raw rate for a pair; 0.0 when unset.
    pub fn rate(&self, from: Currency, to: Currency) -> f64 {
        self.rates[from.index()][to.index()]
    }

    /// Single-direction, single-cell write. Writing the inverse pair is the
    /// caller's responsibility.
    pub fn set_rate(&mut self, from: Currency, to: Currency, value: f64) {
        self.rates[from.index()][to.index()] = value;
    }

    /// Convert an amount between currencies.
    ///
    /// Same-currency conversion returns the amount with no table lookup. An
    /// unset pair returns [`Conversion::MissingRate`] with the amount
    /// unchanged and emits a diagnostic.
    pub fn convert(&self, amount: Amount, from: Currency, to: Currency) -> Conversion {
        if from == to {
            return Conversion::Converted(amount);
        }
        let rate = self.rate(from, to);
        if rate == 0.0 {
            warn!(%from, %to, "no conversion rate set for pair");
            return Conversion::MissingRate(amount);
        }
        Conversion::Converted(amount * rate)
    }
}
