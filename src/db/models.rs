use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Days ahead of today, inclusive, in which a medicine counts as near expiry.
pub const NEAR_EXPIRY_DAYS: i64 = 90;

pub const NAME_MAX_LEN: usize = 200;
pub const COMPOSITION_MAX_LEN: usize = 255;
pub const CATEGORY_MAX_LEN: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },
    #[error("{field} has an invalid value `{value}`")]
    Invalid { field: &'static str, value: String },
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdministrationType {
    #[default]
    Oral,
    #[sqlx(rename = "inj")]
    #[serde(rename = "inj")]
    Injection,
    Topical,
    #[sqlx(rename = "inhal")]
    #[serde(rename = "inhal")]
    Inhalation,
}

static ADMINISTRATION_TYPES: phf::Map<&'static str, AdministrationType> = phf_map! {
    "oral" => AdministrationType::Oral,
    "inj" => AdministrationType::Injection,
    "injection" => AdministrationType::Injection,
    "topical" => AdministrationType::Topical,
    "inhal" => AdministrationType::Inhalation,
    "inhalation" => AdministrationType::Inhalation,
};

impl AdministrationType {
    /// Code stored in the database.
    pub fn code(self) -> &'static str {
        match self {
            Self::Oral => "oral",
            Self::Injection => "inj",
            Self::Topical => "topical",
            Self::Inhalation => "inhal",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Oral => "Oral",
            Self::Injection => "Injection",
            Self::Topical => "Topical",
            Self::Inhalation => "Inhalation",
        }
    }
}

impl FromStr for AdministrationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ADMINISTRATION_TYPES
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| ValidationError::Invalid {
                field: "administration_type",
                value: s.to_string(),
            })
    }
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CountType {
    #[default]
    Tablet,
    Capsule,
    Ampoule,
    Vial,
    Bottle,
    Tube,
}

static COUNT_TYPES: phf::Map<&'static str, CountType> = phf_map! {
    "tablet" => CountType::Tablet,
    "capsule" => CountType::Capsule,
    "ampoule" => CountType::Ampoule,
    "vial" => CountType::Vial,
    "bottle" => CountType::Bottle,
    "tube" => CountType::Tube,
};

impl CountType {
    pub fn code(self) -> &'static str {
        match self {
            Self::Tablet => "tablet",
            Self::Capsule => "capsule",
            Self::Ampoule => "ampoule",
            Self::Vial => "vial",
            Self::Bottle => "bottle",
            Self::Tube => "tube",
        }
    }
}

impl FromStr for CountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COUNT_TYPES
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| ValidationError::Invalid {
                field: "count_type",
                value: s.to_string(),
            })
    }
}

/// Expiry status of a medicine relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    Expired,
    NearExpiry,
    InDate,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub composition: String,
    pub administration_type: AdministrationType,
    pub category: String,
    pub count_type: CountType,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    pub expiration_date: NaiveDate,
    pub remarks: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Medicine {
    /// A medicine expiring today is still in date.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiration_date < today
    }

    pub fn is_near_expiry_on(&self, today: NaiveDate) -> bool {
        !self.is_expired_on(today) && self.expiration_date <= near_expiry_horizon(today)
    }

    pub fn status_on(&self, today: NaiveDate) -> ExpiryStatus {
        if self.is_expired_on(today) {
            ExpiryStatus::Expired
        } else if self.is_near_expiry_on(today) {
            ExpiryStatus::NearExpiry
        } else {
            ExpiryStatus::InDate
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_on(crate::utils::today())
    }

    pub fn is_near_expiry(&self) -> bool {
        self.is_near_expiry_on(crate::utils::today())
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

impl fmt::Display for Medicine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.composition)
    }
}

/// Last day of the near-expiry window starting at `today`.
pub fn near_expiry_horizon(today: NaiveDate) -> NaiveDate {
    today + Duration::days(NEAR_EXPIRY_DAYS)
}

/// Editable fields of a medicine, as accepted at the administrative write
/// boundary. Call [`NewMedicine::validate`] before persisting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewMedicine {
    pub name: String,
    pub composition: String,
    pub administration_type: AdministrationType,
    pub category: String,
    pub count_type: CountType,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    pub expiration_date: NaiveDate,
    pub remarks: Option<String>,
}

impl NewMedicine {
    pub fn new(
        name: impl Into<String>,
        composition: impl Into<String>,
        category: impl Into<String>,
        low_stock_threshold: i64,
        expiration_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            composition: composition.into(),
            administration_type: AdministrationType::default(),
            category: category.into(),
            count_type: CountType::default(),
            quantity: 0,
            low_stock_threshold,
            expiration_date,
            remarks: None,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_administration_type(mut self, administration_type: AdministrationType) -> Self {
        self.administration_type = administration_type;
        self
    }

    pub fn with_count_type(mut self, count_type: CountType) -> Self {
        self.count_type = count_type;
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    /// Checks the record invariants and returns a normalized copy: text
    /// fields trimmed, blank remarks dropped.
    pub fn validate(&self) -> Result<NewMedicine, ValidationError> {
        let name = required_text("name", &self.name, NAME_MAX_LEN)?;
        let composition = required_text("composition", &self.composition, COMPOSITION_MAX_LEN)?;
        let category = required_text("category", &self.category, CATEGORY_MAX_LEN)?;
        non_negative("quantity", self.quantity)?;
        non_negative("low_stock_threshold", self.low_stock_threshold)?;

        let remarks = self
            .remarks
            .as_deref()
            .map(str::trim)
            .filter(|remarks| !remarks.is_empty())
            .map(str::to_string);

        Ok(NewMedicine {
            name,
            composition,
            category,
            remarks,
            ..self.clone()
        })
    }
}

impl From<&Medicine> for NewMedicine {
    fn from(medicine: &Medicine) -> Self {
        Self {
            name: medicine.name.clone(),
            composition: medicine.composition.clone(),
            administration_type: medicine.administration_type,
            category: medicine.category.clone(),
            count_type: medicine.count_type,
            quantity: medicine.quantity,
            low_stock_threshold: medicine.low_stock_threshold,
            expiration_date: medicine.expiration_date,
            remarks: medicine.remarks.clone(),
        }
    }
}

fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}

fn non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}
