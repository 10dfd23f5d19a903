//! Structured contract fields

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

/// Value stored for any field that could not be located
pub const NOT_MENTIONED: &str = "Not mentioned";

/// The fixed schema of fields extracted from a rental contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractField {
    /// Monthly rent
    RentAmount,
    /// Lease term
    LeaseDuration,
    /// Security deposit
    SecurityDeposit,
    /// Day rent is due
    PaymentDueDate,
    /// Late payment fee or penalty
    LateFee,
    /// Pet policy
    PetPolicy,
    /// Maintenance responsibilities
    Maintenance,
    /// Early termination conditions
    Termination,
    /// Utility responsibilities
    Utilities,
    /// Parking arrangements
    Parking,
}

impl ContractField {
    /// Every field, in schema order
    pub const ALL: [ContractField; 10] = [
        ContractField::RentAmount,
        ContractField::LeaseDuration,
        ContractField::SecurityDeposit,
        ContractField::PaymentDueDate,
        ContractField::LateFee,
        ContractField::PetPolicy,
        ContractField::Maintenance,
        ContractField::Termination,
        ContractField::Utilities,
        ContractField::Parking,
    ];

    /// Schema key, as used in JSON
    pub fn key(&self) -> &'static str {
        match self {
            ContractField::RentAmount => "rent_amount",
            ContractField::LeaseDuration => "lease_duration",
            ContractField::SecurityDeposit => "security_deposit",
            ContractField::PaymentDueDate => "payment_due_date",
            ContractField::LateFee => "late_fee",
            ContractField::PetPolicy => "pet_policy",
            ContractField::Maintenance => "maintenance",
            ContractField::Termination => "termination",
            ContractField::Utilities => "utilities",
            ContractField::Parking => "parking",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ContractField::RentAmount => "Rent Amount",
            ContractField::LeaseDuration => "Lease Duration",
            ContractField::SecurityDeposit => "Security Deposit",
            ContractField::PaymentDueDate => "Payment Due Date",
            ContractField::LateFee => "Late Fee",
            ContractField::PetPolicy => "Pet Policy",
            ContractField::Maintenance => "Maintenance",
            ContractField::Termination => "Termination",
            ContractField::Utilities => "Utilities",
            ContractField::Parking => "Parking",
        }
    }

    /// Targeted question used to recover the field from the document
    pub fn query(&self) -> &'static str {
        match self {
            ContractField::RentAmount => "What is the monthly rent amount?",
            ContractField::LeaseDuration => "What is the lease duration or term?",
            ContractField::SecurityDeposit => "What is the security deposit amount?",
            ContractField::PaymentDueDate => "When is rent due each month?",
            ContractField::LateFee => "What is the late payment fee or penalty?",
            ContractField::PetPolicy => "What is the pet policy?",
            ContractField::Maintenance => "What are the maintenance responsibilities?",
            ContractField::Termination => "What are the early termination conditions?",
            ContractField::Utilities => "Who is responsible for utilities?",
            ContractField::Parking => "What are the parking arrangements?",
        }
    }
}

impl fmt::Display for ContractField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ContractField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContractField::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| format!("Unknown contract field: {}", s))
    }
}

/// Field name to value-or-sentinel mapping over the fixed schema
///
/// Every field is always present; fields that were not located hold
/// [`NOT_MENTIONED`].
///
/// # Examples
///
/// ```
/// use leasewise_domain::{ContractField, ExtractionRecord, NOT_MENTIONED};
///
/// let mut record = ExtractionRecord::new();
/// record.set(ContractField::RentAmount, "$2,500");
/// assert_eq!(&record[ContractField::RentAmount], "$2,500");
/// assert_eq!(record.get("parking"), Some(NOT_MENTIONED));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    fields: BTreeMap<ContractField, String>,
}

impl ExtractionRecord {
    /// A record with every field set to the sentinel
    pub fn new() -> Self {
        Self {
            fields: ContractField::ALL
                .into_iter()
                .map(|f| (f, NOT_MENTIONED.to_string()))
                .collect(),
        }
    }

    /// Set a field; blank values are stored as the sentinel
    pub fn set(&mut self, field: ContractField, value: impl Into<String>) {
        let value = value.into();
        let value = if value.trim().is_empty() {
            NOT_MENTIONED.to_string()
        } else {
            value.trim().to_string()
        };
        self.fields.insert(field, value);
    }

    /// Look a field up by its schema key
    pub fn get(&self, key: &str) -> Option<&str> {
        key.parse::<ContractField>()
            .ok()
            .map(|field| &self[field])
    }

    /// Whether the field still holds the sentinel
    pub fn is_missing(&self, field: ContractField) -> bool {
        &self[field] == NOT_MENTIONED
    }

    /// Fields still holding the sentinel, in schema order
    pub fn missing_fields(&self) -> Vec<ContractField> {
        ContractField::ALL
            .into_iter()
            .filter(|f| self.is_missing(*f))
            .collect()
    }

    /// Iterate (field, value) in schema order
    pub fn iter(&self) -> impl Iterator<Item = (ContractField, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

impl Default for ExtractionRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<ContractField> for ExtractionRecord {
    type Output = str;

    fn index(&self, field: ContractField) -> &str {
        self.fields
            .get(&field)
            .map(String::as_str)
            .unwrap_or(NOT_MENTIONED)
    }
}
