use serde::{Deserialize, Serialize};

pub type ClientId = u32;

/// A registered client of the bank.
///
/// The password is stored as an opaque plaintext string to stay compatible
/// with the flat client records; treat it as a pluggable credential field,
/// not a security mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    /// Unique across all clients, compared case-insensitively.
    pub email: String,
    pub password: String,
    pub loyalty_score: i32,
    pub admin: bool,
}

impl Client {
    pub fn new(id: ClientId, name: String, email: String, password: String) -> Self {
        Self {
            id,
            name,
            email,
            password,
            loyalty_score: 0,
            admin: false,
        }
    }

    /// Case-insensitive email match.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

impl std::fmt::Display for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | {} | {}", self.id, self.name, self.email)
    }
}
