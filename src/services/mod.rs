use chrono::NaiveDate;

use crate::db::DatabaseError;

pub mod admin;
pub mod query;
pub mod store;

use query::{ListParams, MedicinePage, MedicineQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use store::MedicineStore;

/// Settings shared by every list request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListSettings {
    pub page_size: u32,
}

impl ListSettings {
    /// Clamps `page_size` into `1..=MAX_PAGE_SIZE`.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for ListSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Lists medicines for raw request parameters.
///
/// Parameters are composed into a [`MedicineQuery`] against `today`, then the
/// matching page is read from `store`. A page past the end comes back empty
/// with the total still filled in.
pub async fn list_medicines<S: MedicineStore>(
    store: &S,
    params: &ListParams,
    settings: ListSettings,
    today: NaiveDate,
) -> Result<MedicinePage, DatabaseError> {
    let query = MedicineQuery::compose(params, today);
    run_query(store, query, settings).await
}

/// Executes an already composed query.
pub async fn run_query<S: MedicineStore>(
    store: &S,
    query: MedicineQuery,
    settings: ListSettings,
) -> Result<MedicinePage, DatabaseError> {
    let page_size = settings.page_size;
    let offset = query.offset(page_size);
    let (total, items) = store
        .fetch_page(&query, i64::from(page_size), offset)
        .await?;

    log::debug!(
        "Listed {} of {} medicines for `{}` page {}",
        items.len(),
        total,
        query.to_query_string(),
        query.page
    );

    Ok(MedicinePage {
        items,
        total,
        page: query.page,
        page_size,
        query,
    })
}
