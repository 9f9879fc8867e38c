use crate::domain::Amount;

use super::BankError;

const MIN_PASSWORD_LEN: usize = 4;

/// An email needs at least an '@' and a '.' to be accepted.
pub fn validate_email(email: &str) -> Result<(), BankError> {
    if email.contains('@') && email.contains('.') {
        Ok(())
    } else {
        Err(BankError::InvalidEmail(email.to_string()))
    }
}

pub fn validate_password(password: &str) -> Result<(), BankError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BankError::PasswordTooShort);
    }
    Ok(())
}

/// Operation amounts must be strictly positive and finite.
pub fn validate_amount(amount: Amount) -> Result<(), BankError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(BankError::InvalidAmount(amount));
    }
    Ok(())
}

/// Opening balances must be finite and at or above `floor`: zero for
/// ordinary accounts, the credit limit for credit accounts, which may
/// open already in debt.
pub fn validate_opening_balance(balance: Amount, floor: Amount) -> Result<(), BankError> {
    if !balance.is_finite() || balance < floor {
        return Err(BankError::InvalidAmount(balance));
    }
    Ok(())
}
