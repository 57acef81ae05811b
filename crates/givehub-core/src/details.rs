//! # Donation Details
//!
//! Kind-specific detail records for donation listings, modeled as one
//! explicit tagged union instead of six optional sub-objects.
//!
//! ## Why a Tagged Union?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Six optional sub-records keyed by a string kind invite drift:          │
//! │  a "blood" donation carrying foodDetails, or no details at all.         │
//! │                                                                         │
//! │  DonationDetails makes the kind and its payload one value:              │
//! │    DonationDetails::Blood { blood_group, ... }                          │
//! │                                                                         │
//! │  - The variant IS the kind (no mismatch possible)                       │
//! │  - Required sub-fields are non-Option struct fields                     │
//! │  - validate() applies the same bar to every variant                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Serialized as internally-tagged JSON (`{"kind": "blood", ...}`) and stored
//! in a single TEXT column.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::DonationKind;

// =============================================================================
// Variant Sub-Enums
// =============================================================================

/// ABO/Rh blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

/// How a cash donation is handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Paypal,
}

/// Storage class of donated food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodType {
    Perishable,
    NonPerishable,
    Cooked,
    Packaged,
}

/// Food category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Vegetables,
    Fruits,
    Grains,
    Dairy,
    Meat,
    BakedGoods,
}

/// Condition scale for donated books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookCondition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

/// Condition scale for donated goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoodsCondition {
    New,
    LikeNew,
    Good,
    Fair,
    NeedsRepair,
}

/// Category for donated goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsCategory {
    Clothing,
    Electronics,
    Furniture,
    Other,
}

/// Teaching proficiency for knowledge donations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Delivery format for knowledge sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFormat {
    Online,
    InPerson,
    Hybrid,
}

// =============================================================================
// DonationDetails
// =============================================================================

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

/// Kind-specific details for a donation, discriminated by the donation kind.
///
/// Required sub-fields are plain struct fields; optional extras are Options.
/// The variant name serializes to the same lowercase kind string as
/// [`DonationKind`], so `details.kind()` always matches the parent listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DonationDetails {
    Blood {
        blood_group: BloodGroup,
        #[serde(default)]
        last_donation_date: Option<NaiveDate>,
        #[serde(default)]
        health_conditions: Vec<String>,
        #[serde(default)]
        hemoglobin_level: Option<f64>,
        #[serde(default = "default_true")]
        eligible_to_donate: bool,
    },
    Cash {
        amount_cents: i64,
        #[serde(default = "default_currency")]
        currency: String,
        #[serde(default)]
        payment_method: Option<PaymentMethod>,
    },
    Food {
        food_type: FoodType,
        #[serde(default)]
        category: Option<FoodCategory>,
        #[serde(default)]
        expiration_date: Option<NaiveDate>,
        #[serde(default)]
        servings: Option<i64>,
        #[serde(default)]
        dietary_restrictions: Vec<String>,
    },
    Books {
        book_title: String,
        #[serde(default)]
        author: Option<String>,
        #[serde(default)]
        isbn: Option<String>,
        #[serde(default)]
        genre: Option<String>,
        #[serde(default)]
        condition: Option<BookCondition>,
    },
    Knowledge {
        subject: String,
        #[serde(default)]
        expertise_level: Option<ExpertiseLevel>,
        #[serde(default)]
        duration_hours: Option<i64>,
        #[serde(default)]
        format: Option<SessionFormat>,
    },
    Items {
        condition: GoodsCondition,
        #[serde(default)]
        brand: Option<String>,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        estimated_value_cents: Option<i64>,
        #[serde(default)]
        category: Option<GoodsCategory>,
    },
}

impl DonationDetails {
    /// The donation kind this variant corresponds to.
    pub fn kind(&self) -> DonationKind {
        match self {
            DonationDetails::Blood { .. } => DonationKind::Blood,
            DonationDetails::Cash { .. } => DonationKind::Cash,
            DonationDetails::Food { .. } => DonationKind::Food,
            DonationDetails::Books { .. } => DonationKind::Books,
            DonationDetails::Knowledge { .. } => DonationKind::Knowledge,
            DonationDetails::Items { .. } => DonationKind::Items,
        }
    }

    /// The monetary amount for cash donations, in cents.
    pub fn cash_amount_cents(&self) -> Option<i64> {
        match self {
            DonationDetails::Cash { amount_cents, .. } => Some(*amount_cents),
            _ => None,
        }
    }

    /// Validates variant fields beyond what the type system enforces.
    ///
    /// ## Rules
    /// - Cash amounts must be non-negative
    /// - Book title and knowledge subject must be non-empty after trimming
    /// - Servings, session duration and estimated value must be positive
    /// - Hemoglobin level, when present, must lie in a plausible range
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            DonationDetails::Blood {
                hemoglobin_level, ..
            } => {
                if let Some(level) = hemoglobin_level {
                    // g/dL; outside this window the value is a data entry error
                    if !(*level >= 3.0 && *level <= 25.0) {
                        return Err(ValidationError::OutOfRange {
                            field: "hemoglobin_level".to_string(),
                            min: 3,
                            max: 25,
                        });
                    }
                }
                Ok(())
            }
            DonationDetails::Cash {
                amount_cents,
                currency,
                ..
            } => {
                if *amount_cents < 0 {
                    return Err(ValidationError::OutOfRange {
                        field: "amount".to_string(),
                        min: 0,
                        max: i64::MAX,
                    });
                }
                if currency.trim().is_empty() {
                    return Err(ValidationError::Required {
                        field: "currency".to_string(),
                    });
                }
                Ok(())
            }
            DonationDetails::Food { servings, .. } => {
                if let Some(s) = servings {
                    if *s <= 0 {
                        return Err(ValidationError::MustBePositive {
                            field: "servings".to_string(),
                        });
                    }
                }
                Ok(())
            }
            DonationDetails::Books { book_title, .. } => {
                if book_title.trim().is_empty() {
                    return Err(ValidationError::Required {
                        field: "book_title".to_string(),
                    });
                }
                Ok(())
            }
            DonationDetails::Knowledge {
                subject,
                duration_hours,
                ..
            } => {
                if subject.trim().is_empty() {
                    return Err(ValidationError::Required {
                        field: "subject".to_string(),
                    });
                }
                if let Some(d) = duration_hours {
                    if *d <= 0 {
                        return Err(ValidationError::MustBePositive {
                            field: "duration_hours".to_string(),
                        });
                    }
                }
                Ok(())
            }
            DonationDetails::Items {
                estimated_value_cents,
                ..
            } => {
                if let Some(v) = estimated_value_cents {
                    if *v < 0 {
                        return Err(ValidationError::OutOfRange {
                            field: "estimated_value".to_string(),
                            min: 0,
                            max: i64::MAX,
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let details = DonationDetails::Blood {
            blood_group: BloodGroup::OPositive,
            last_donation_date: None,
            health_conditions: vec![],
            hemoglobin_level: None,
            eligible_to_donate: true,
        };
        assert_eq!(details.kind(), DonationKind::Blood);
    }

    #[test]
    fn test_serde_tagging() {
        let details = DonationDetails::Blood {
            blood_group: BloodGroup::OPositive,
            last_donation_date: None,
            health_conditions: vec![],
            hemoglobin_level: None,
            eligible_to_donate: true,
        };
        let json = serde_json::to_string(&details).unwrap();
        assert!(json.contains("\"kind\":\"blood\""));
        assert!(json.contains("\"blood_group\":\"O+\""));

        let back: DonationDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(back, details);
    }

    #[test]
    fn test_blood_group_required() {
        // Missing blood_group must fail to deserialize
        let err = serde_json::from_str::<DonationDetails>(r#"{"kind":"blood"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_cash_defaults_and_validation() {
        let details: DonationDetails =
            serde_json::from_str(r#"{"kind":"cash","amount_cents":5000}"#).unwrap();
        match &details {
            DonationDetails::Cash { currency, .. } => assert_eq!(currency, "USD"),
            _ => panic!("wrong variant"),
        }
        assert!(details.validate().is_ok());
        assert_eq!(details.cash_amount_cents(), Some(5000));

        let negative = DonationDetails::Cash {
            amount_cents: -1,
            currency: "USD".into(),
            payment_method: None,
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_items_round_trip() {
        let details = DonationDetails::Items {
            condition: GoodsCondition::NeedsRepair,
            brand: Some("Acme".into()),
            model: None,
            estimated_value_cents: Some(2500),
            category: Some(GoodsCategory::Electronics),
        };
        let json = serde_json::to_string(&details).unwrap();
        assert!(json.contains("\"condition\":\"needs-repair\""));
        let back: DonationDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(back, details);
    }

    #[test]
    fn test_knowledge_requires_subject() {
        let blank = DonationDetails::Knowledge {
            subject: "   ".into(),
            expertise_level: None,
            duration_hours: None,
            format: None,
        };
        assert!(blank.validate().is_err());

        let bad_duration = DonationDetails::Knowledge {
            subject: "Algebra".into(),
            expertise_level: Some(ExpertiseLevel::Advanced),
            duration_hours: Some(0),
            format: Some(SessionFormat::Online),
        };
        assert!(bad_duration.validate().is_err());
    }
}
