use serde_json::Value;
use sqlx::{self, postgres::PgArguments, FromRow, PgPool};

use crate::database::StoreError;

/// Builder for the narrow slice of SQL this layer needs: equality filters,
/// batch `IN` filters, and ordering. Writes stay as explicit SQL at the call
/// sites.
pub struct SelectQuery<T> {
    table: String,
    eq: Vec<(String, Value)>,
    in_ids: Option<(String, Vec<i32>)>,
    order_by: Option<String>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> SelectQuery<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            eq: Vec::new(),
            in_ids: None,
            order_by: None,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    pub fn filter_in(mut self, column: impl Into<String>, ids: Vec<i32>) -> Self {
        self.in_ids = Some((column.into(), ids));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    pub async fn fetch_all(self, pool: &PgPool) -> Result<Vec<T>, StoreError> {
        let (sql, params) = self.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn fetch_optional(self, pool: &PgPool) -> Result<Option<T>, StoreError> {
        let (sql, params) = self.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        let row = q.fetch_optional(pool).await?;
        Ok(row)
    }

    fn to_sql(&self) -> Result<(String, Vec<Value>), StoreError> {
        validate_identifier(&self.table)?;

        let mut sql = format!("SELECT * FROM \"{}\"", self.table);
        let mut params: Vec<Value> = Vec::new();
        let mut clauses: Vec<String> = Vec::new();

        for (column, value) in &self.eq {
            validate_identifier(column)?;
            params.push(value.clone());
            clauses.push(format!("\"{}\" = ${}", column, params.len()));
        }

        if let Some((column, ids)) = &self.in_ids {
            validate_identifier(column)?;
            let mut placeholders = Vec::with_capacity(ids.len());
            for id in ids {
                params.push(Value::from(*id));
                placeholders.push(format!("${}", params.len()));
            }
            clauses.push(format!("\"{}\" IN ({})", column, placeholders.join(", ")));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some(column) = &self.order_by {
            validate_identifier(column)?;
            sql.push_str(&format!(" ORDER BY \"{}\"", column));
        }

        Ok((sql, params))
    }
}

/// Table and column names must be plain snake_case identifiers; everything
/// else is rejected before it reaches SQL text.
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name.chars().next().map(|c| c.is_ascii_lowercase()).unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

pub fn bind_value<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

/// Same binding rules for untyped queries (used by the admin table surface).
pub fn bind_value_raw<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
