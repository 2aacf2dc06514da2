use sqlx::{self, postgres::PgRow, FromRow, PgPool};

use crate::database::query::SelectQuery;
use crate::database::StoreError;

/// Thin typed read access over a single table. Row structs derive FromRow;
/// anything beyond equality/IN/order goes through explicit SQL instead.
pub struct Repository<T> {
    table: String,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table: impl Into<String>, pool: PgPool) -> Self {
        Self {
            table: table.into(),
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_all(&self, order_by: &str) -> Result<Vec<T>, StoreError> {
        SelectQuery::new(&self.table)
            .order_by(order_by)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn select_by_id(&self, id: i32) -> Result<Option<T>, StoreError> {
        SelectQuery::new(&self.table)
            .filter("id", id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Batch lookup for hierarchy assembly; one query no matter how many ids.
    pub async fn select_by_ids(&self, ids: &[i32]) -> Result<Vec<T>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        SelectQuery::new(&self.table)
            .filter_in("id", ids.to_vec())
            .fetch_all(&self.pool)
            .await
    }
}
