use super::{AddressId, UserId};
use serde::{Deserialize, Serialize};

/// A buyer's shipping destination. Owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub owner_id: UserId,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    /// UAE emirate, used by carriers for zone pricing.
    #[serde(default)]
    pub emirate: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub country: String,
}

impl Address {
    pub fn belongs_to(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}
