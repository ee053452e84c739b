//! Collection backends that execute a [`MedicineQuery`].

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::db::models::{near_expiry_horizon, Medicine};
use crate::db::{fold, DatabaseError};
use crate::services::query::{MedicineQuery, StockFilter};

/// Read access to the medicine collection: predicate filtering,
/// case-insensitive substring search, ordering and offset/limit paging.
#[allow(async_fn_in_trait)]
pub trait MedicineStore {
    /// Number of records matching the query's filter and search.
    async fn count(&self, query: &MedicineQuery) -> Result<i64, DatabaseError>;

    /// Matching records in query order, skipping `offset` and returning at
    /// most `limit`.
    async fn fetch(
        &self,
        query: &MedicineQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Medicine>, DatabaseError>;

    /// Total plus one page of records. Records are only read when `offset`
    /// falls inside the total.
    async fn fetch_page(
        &self,
        query: &MedicineQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(i64, Vec<Medicine>), DatabaseError> {
        let total = self.count(query).await?;
        let items = if offset < total {
            self.fetch(query, limit, offset).await?
        } else {
            Vec::new()
        };
        Ok((total, items))
    }
}

/// SQLite-backed store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MedicineStore for SqliteStore {
    async fn count(&self, query: &MedicineQuery) -> Result<i64, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        count_matching(&mut conn, query).await
    }

    async fn fetch(
        &self,
        query: &MedicineQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Medicine>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        fetch_matching(&mut conn, query, limit, offset).await
    }

    /// Counts and reads inside one transaction so the total and the page
    /// come from the same snapshot.
    async fn fetch_page(
        &self,
        query: &MedicineQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(i64, Vec<Medicine>), DatabaseError> {
        let mut transaction = self.pool.begin().await?;

        let total = count_matching(&mut transaction, query).await?;
        let items = if offset < total {
            fetch_matching(&mut transaction, query, limit, offset).await?
        } else {
            Vec::new()
        };

        transaction.commit().await?;
        Ok((total, items))
    }
}

async fn count_matching(
    conn: &mut SqliteConnection,
    query: &MedicineQuery,
) -> Result<i64, DatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM medicines");
    push_conditions(&mut builder, query);

    let total = builder
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;
    Ok(total)
}

async fn fetch_matching(
    conn: &mut SqliteConnection,
    query: &MedicineQuery,
    limit: i64,
    offset: i64,
) -> Result<Vec<Medicine>, DatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM medicines");
    push_conditions(&mut builder, query);

    builder
        .push(" ORDER BY ")
        .push(query.sort.column())
        .push(" ")
        .push(query.direction.sql())
        .push(", name ASC, composition ASC, id ASC");

    builder
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let medicines = builder
        .build_query_as::<Medicine>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(medicines)
}

fn push_conditions(builder: &mut QueryBuilder<'_, Sqlite>, query: &MedicineQuery) {
    let mut has_where = false;

    if let Some(filter) = query.filter {
        start_clause(builder, &mut has_where);
        match filter {
            StockFilter::NearExpiry => builder
                .push("expiration_date BETWEEN ")
                .push_bind(query.today)
                .push(" AND ")
                .push_bind(near_expiry_horizon(query.today)),
            StockFilter::Expired => builder.push("expiration_date < ").push_bind(query.today),
            StockFilter::OutOfStock => builder.push("quantity = 0"),
            StockFilter::LowStock => builder.push("quantity <= low_stock_threshold"),
        };
    }

    if let Some(category) = &query.category {
        start_clause(builder, &mut has_where);
        builder.push("category = ").push_bind(category.clone());
    }

    if let Some(administration) = query.administration {
        start_clause(builder, &mut has_where);
        builder.push("administration_type = ").push_bind(administration);
    }

    if let Some(count_type) = query.count_type {
        start_clause(builder, &mut has_where);
        builder.push("count_type = ").push_bind(count_type);
    }

    if let Some(window) = query.expires {
        let (start, end) = window.bounds(query.today);
        start_clause(builder, &mut has_where);
        builder
            .push("expiration_date >= ")
            .push_bind(start)
            .push(" AND expiration_date < ")
            .push_bind(end);
    }

    // Folded columns hold Unicode-lowercased copies; SQLite LIKE only folds
    // ASCII.
    if let Some(search) = query.search.as_deref() {
        let pattern = like_pattern(&fold(search));
        start_clause(builder, &mut has_where);
        builder.push("(");
        for (i, column) in ["name_folded", "composition_folded", "category_folded"]
            .iter()
            .enumerate()
        {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push(*column)
                .push(" LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\'");
        }
        builder.push(")");
    }
}

fn start_clause(builder: &mut QueryBuilder<'_, Sqlite>, has_where: &mut bool) {
    builder.push(if *has_where { " AND " } else { " WHERE " });
    *has_where = true;
}

/// `%text%` with LIKE wildcards in `text` escaped so they match literally.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// In-memory store over an owned list of records.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    medicines: Vec<Medicine>,
}

impl MemoryStore {
    pub fn new(medicines: Vec<Medicine>) -> Self {
        Self { medicines }
    }

    fn matching(&self, query: &MedicineQuery) -> Vec<&Medicine> {
        self.medicines
            .iter()
            .filter(|medicine| query.matches(medicine))
            .collect()
    }
}

impl MedicineStore for MemoryStore {
    async fn count(&self, query: &MedicineQuery) -> Result<i64, DatabaseError> {
        Ok(self.matching(query).len() as i64)
    }

    async fn fetch(
        &self,
        query: &MedicineQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Medicine>, DatabaseError> {
        let mut matching = self.matching(query);
        matching.sort_by(|a, b| query.compare(a, b));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
