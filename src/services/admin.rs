//! Administrative writes: validated single-record CRUD and the bulk
//! "mark out of stock" action.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use thiserror::Error;
use url::form_urlencoded;

use crate::db::models::{Medicine, NewMedicine, ValidationError};
use crate::db::{fold, DatabaseError};
use crate::utils;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Invalid medicine: {0}")]
    Validation(#[from] ValidationError),
    #[error("Medicine {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for AdminError {
    fn from(err: sqlx::Error) -> Self {
        AdminError::Database(DatabaseError::Sqlx(err))
    }
}

pub async fn create_medicine(
    pool: &SqlitePool,
    input: &NewMedicine,
) -> Result<Medicine, AdminError> {
    let input = input.validate()?;
    let now = utils::now();

    let medicine = sqlx::query_as::<_, Medicine>(
        "INSERT INTO medicines (name, composition, administration_type, category, count_type, \
         quantity, low_stock_threshold, expiration_date, remarks, created_at, updated_at, \
         name_folded, composition_folded, category_folded) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, ?11, ?12, ?13) RETURNING *",
    )
    .bind(&input.name)
    .bind(&input.composition)
    .bind(input.administration_type)
    .bind(&input.category)
    .bind(input.count_type)
    .bind(input.quantity)
    .bind(input.low_stock_threshold)
    .bind(input.expiration_date)
    .bind(&input.remarks)
    .bind(now)
    .bind(fold(&input.name))
    .bind(fold(&input.composition))
    .bind(fold(&input.category))
    .fetch_one(pool)
    .await?;

    log::info!("Created medicine {} `{}`", medicine.id, medicine);
    Ok(medicine)
}

pub async fn get_medicine(pool: &SqlitePool, id: i64) -> Result<Medicine, AdminError> {
    sqlx::query_as::<_, Medicine>("SELECT * FROM medicines WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AdminError::NotFound(id))
}

/// Replaces every editable field of medicine `id`. `created_at` is left
/// untouched and `updated_at` is refreshed.
pub async fn update_medicine(
    pool: &SqlitePool,
    id: i64,
    input: &NewMedicine,
) -> Result<Medicine, AdminError> {
    let input = input.validate()?;

    let medicine = sqlx::query_as::<_, Medicine>(
        "UPDATE medicines SET name = ?1, composition = ?2, administration_type = ?3, \
         category = ?4, count_type = ?5, quantity = ?6, low_stock_threshold = ?7, \
         expiration_date = ?8, remarks = ?9, updated_at = MAX(?10, created_at), \
         name_folded = ?12, composition_folded = ?13, category_folded = ?14 \
         WHERE id = ?11 RETURNING *",
    )
    .bind(&input.name)
    .bind(&input.composition)
    .bind(input.administration_type)
    .bind(&input.category)
    .bind(input.count_type)
    .bind(input.quantity)
    .bind(input.low_stock_threshold)
    .bind(input.expiration_date)
    .bind(&input.remarks)
    .bind(utils::now())
    .bind(id)
    .bind(fold(&input.name))
    .bind(fold(&input.composition))
    .bind(fold(&input.category))
    .fetch_optional(pool)
    .await?
    .ok_or(AdminError::NotFound(id))?;

    log::info!("Updated medicine {} `{}`", medicine.id, medicine);
    Ok(medicine)
}

pub async fn delete_medicine(pool: &SqlitePool, id: i64) -> Result<(), AdminError> {
    let result = sqlx::query("DELETE FROM medicines WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AdminError::NotFound(id));
    }

    log::info!("Deleted medicine {}", id);
    Ok(())
}

/// Sets `quantity = 0` on every medicine in `ids` as a single batch.
///
/// Duplicate ids are collapsed. If any id does not exist, or any update
/// fails, the transaction is rolled back and no record is changed. Returns
/// the number of medicines updated.
pub async fn mark_out_of_stock(pool: &SqlitePool, ids: &[i64]) -> Result<u64, AdminError> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(0);
    }

    let now = utils::now();
    let mut transaction = pool.begin().await?;

    for &id in &ids {
        let result = sqlx::query(
            "UPDATE medicines SET quantity = 0, updated_at = MAX(?1, created_at) WHERE id = ?2",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *transaction)
        .await?;

        if result.rows_affected() == 0 {
            log::warn!("Bulk out-of-stock aborted: medicine {} not found", id);
            transaction.rollback().await?;
            return Err(AdminError::NotFound(id));
        }
    }

    transaction.commit().await?;

    log::info!("Marked {} medicines out of stock", ids.len());
    Ok(ids.len() as u64)
}

/// Distinct categories with the number of medicines in each, by category.
pub async fn category_counts(pool: &SqlitePool) -> Result<Vec<(String, i64)>, AdminError> {
    let counts = sqlx::query_as::<_, (String, i64)>(
        "SELECT category, COUNT(*) FROM medicines GROUP BY category ORDER BY category",
    )
    .fetch_all(pool)
    .await?;
    Ok(counts)
}

/// `key=value&...` input for creating or editing a medicine.
///
/// Accepted keys: `name`, `composition`, `category`, `administration`
/// (`administration_type`), `count` (`count_type`), `quantity`, `threshold`
/// (`low_stock_threshold`), `expires` (`expiration_date`, `YYYY-MM-DD`) and
/// `remarks`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicineForm {
    fields: HashMap<String, String>,
}

impl MedicineForm {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let mut fields = HashMap::new();
        for (key, value) in form_urlencoded::parse(input.trim().as_bytes()) {
            let key = canonical_key(key.trim()).ok_or_else(|| ValidationError::Invalid {
                field: "form",
                value: key.to_string(),
            })?;
            fields.insert(key.to_string(), value.into_owned());
        }
        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds the record to write. Without `base` every required field must
    /// be present; with `base`, absent fields keep the existing values.
    pub fn into_new_medicine(self, base: Option<&Medicine>) -> Result<NewMedicine, ValidationError> {
        let current = base.map(NewMedicine::from);

        let text = |field: &'static str, fallback: Option<&String>| {
            self.fields
                .get(field)
                .or(fallback)
                .cloned()
                .ok_or(ValidationError::Missing { field })
        };

        let name = text("name", current.as_ref().map(|c| &c.name))?;
        let composition = text("composition", current.as_ref().map(|c| &c.composition))?;
        let category = text("category", current.as_ref().map(|c| &c.category))?;

        let administration_type = match self.fields.get("administration_type") {
            Some(value) => value.parse()?,
            None => current
                .as_ref()
                .map(|c| c.administration_type)
                .unwrap_or_default(),
        };

        let count_type = match self.fields.get("count_type") {
            Some(value) => value.parse()?,
            None => current.as_ref().map(|c| c.count_type).unwrap_or_default(),
        };

        let quantity = match self.fields.get("quantity") {
            Some(value) => parse_integer("quantity", value)?,
            None => current.as_ref().map_or(0, |c| c.quantity),
        };

        let low_stock_threshold = match self.fields.get("low_stock_threshold") {
            Some(value) => parse_integer("low_stock_threshold", value)?,
            None => current
                .as_ref()
                .map(|c| c.low_stock_threshold)
                .ok_or(ValidationError::Missing {
                    field: "low_stock_threshold",
                })?,
        };

        let expiration_date = match self.fields.get("expiration_date") {
            Some(value) => parse_date("expiration_date", value)?,
            None => current
                .as_ref()
                .map(|c| c.expiration_date)
                .ok_or(ValidationError::Missing {
                    field: "expiration_date",
                })?,
        };

        let remarks = match self.fields.get("remarks") {
            Some(value) => Some(value.clone()),
            None => current.as_ref().and_then(|c| c.remarks.clone()),
        };

        NewMedicine {
            name,
            composition,
            administration_type,
            category,
            count_type,
            quantity,
            low_stock_threshold,
            expiration_date,
            remarks,
        }
        .validate()
    }
}

fn canonical_key(key: &str) -> Option<&'static str> {
    match key {
        "name" => Some("name"),
        "composition" => Some("composition"),
        "category" => Some("category"),
        "administration" | "administration_type" => Some("administration_type"),
        "count" | "count_type" => Some("count_type"),
        "quantity" | "qty" => Some("quantity"),
        "threshold" | "low_stock_threshold" => Some("low_stock_threshold"),
        "expires" | "expiration_date" => Some("expiration_date"),
        "remarks" => Some("remarks"),
        _ => None,
    }
}

fn parse_integer(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    value.trim().parse().map_err(|_| ValidationError::Invalid {
        field,
        value: value.to_string(),
    })
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::Invalid {
        field,
        value: value.to_string(),
    })
}
