use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{MySql, MySqlExecutor};

use crate::error::{EngineError, EngineResult};
use crate::model::payroll::PaymentUpdate;

/// Columns computed by the database; no write path may name them.
pub const DERIVED_COLUMNS: &[&str] = &["is_paid"];

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    U64(u64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug, PartialEq)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Reject a JSON payload that tries to write a derived column.
pub fn reject_derived_fields(payload: &Value) -> EngineResult<()> {
    let obj = payload
        .as_object()
        .ok_or_else(|| EngineError::validation("Payload must be a JSON object"))?;

    let violations: Vec<String> = obj
        .keys()
        .filter(|k| DERIVED_COLUMNS.contains(&k.as_str()))
        .map(|k| format!("{k} is derived and cannot be written"))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation { violations })
    }
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
pub fn build_update_sql(
    table: &str,
    assignments: Vec<(&str, SqlValue)>,
    id_column: &str,
    id_value: u64,
) -> EngineResult<SqlUpdate> {
    if assignments.is_empty() {
        return Err(EngineError::validation("No fields provided for update"));
    }

    if let Some((column, _)) = assignments
        .iter()
        .find(|(c, _)| DERIVED_COLUMNS.contains(c))
    {
        return Err(EngineError::validation(format!(
            "{column} is derived and cannot be written"
        )));
    }

    // Build SET clause
    let set_clause = assignments
        .iter()
        .map(|(k, _)| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<SqlValue> = assignments.into_iter().map(|(_, v)| v).collect();

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// Column assignments for a payment update; unset channels are left out.
pub fn payment_assignments(update: &PaymentUpdate) -> Vec<(&'static str, SqlValue)> {
    let date = |paid: bool, d: Option<NaiveDate>| match (paid, d) {
        (true, Some(d)) => SqlValue::Date(d),
        _ => SqlValue::Null,
    };

    let mut out = Vec::with_capacity(4);
    if let Some(paid) = update.is_paid_hand {
        out.push(("is_paid_hand", SqlValue::Bool(paid)));
        out.push(("hand_payment_date", date(paid, update.hand_payment_date)));
    }
    if let Some(paid) = update.is_paid_bank {
        out.push(("is_paid_bank", SqlValue::Bool(paid)));
        out.push(("bank_payment_date", date(paid, update.bank_payment_date)));
    }
    out
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update<'e, E>(executor: E, update: SqlUpdate) -> Result<u64, sqlx::Error>
where
    E: MySqlExecutor<'e>,
{
    let mut query = sqlx::query::<MySql>(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<NaiveDate>),
        };
    }

    let result = query.execute(executor).await?;
    Ok(result.rows_affected())
}
