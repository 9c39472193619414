use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DonationType {
    Money,
    Food,
    Clothing,
    Books,
    Toys,
    Electronics,
    Furniture,
    Medical,
    Other,
}

impl DonationType {
    pub const ALL: [DonationType; 9] = [
        DonationType::Money,
        DonationType::Food,
        DonationType::Clothing,
        DonationType::Books,
        DonationType::Toys,
        DonationType::Electronics,
        DonationType::Furniture,
        DonationType::Medical,
        DonationType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DonationType::Money => "money",
            DonationType::Food => "food",
            DonationType::Clothing => "clothing",
            DonationType::Books => "books",
            DonationType::Toys => "toys",
            DonationType::Electronics => "electronics",
            DonationType::Furniture => "furniture",
            DonationType::Medical => "medical",
            DonationType::Other => "other",
        }
    }

    /// Display label, e.g. "Electronics".
    pub fn label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for DonationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown donation type: {0}")]
pub struct UnknownDonationType(pub String);

impl FromStr for DonationType {
    type Err = UnknownDonationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        DonationType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownDonationType(s.to_string()))
    }
}

/// A donation record as held by the external service. Negative ids mark
/// records that have not been confirmed by the server yet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Donation {
    pub id: i64,
    pub donor_name: String,
    pub donation_type: DonationType,
    pub amount: f64,
    pub date: NaiveDate,
}

impl Donation {
    pub fn from_new(id: i64, donation: NewDonation) -> Self {
        Self {
            id,
            donor_name: donation.donor_name,
            donation_type: donation.donation_type,
            amount: donation.amount,
            date: donation.date,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.id < 0
    }
}

/// Request body for create and update: a donation without its id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewDonation {
    pub donor_name: String,
    pub donation_type: DonationType,
    pub amount: f64,
    pub date: NaiveDate,
}

impl From<&Donation> for NewDonation {
    fn from(d: &Donation) -> Self {
        Self {
            donor_name: d.donor_name.clone(),
            donation_type: d.donation_type,
            amount: d.amount,
            date: d.date,
        }
    }
}
