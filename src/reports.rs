use chrono::NaiveDate;
use rusqlite::Connection;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Per-category totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotals {
    pub category: String,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub count: i64,
}

/// Per-category inflow/outflow/count within a date range. Transactions
/// without a category roll up under "Uncategorized". Pure read; an empty
/// range yields an empty result.
pub fn category_totals(conn: &Connection, from: NaiveDate, to: NaiveDate) -> Result<Vec<CategoryTotals>> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(c.name, 'Uncategorized') AS category, \
                SUM(CASE WHEN t.amount_cents > 0 THEN t.amount_cents ELSE 0 END) AS income, \
                SUM(CASE WHEN t.amount_cents < 0 THEN -t.amount_cents ELSE 0 END) AS expense, \
                COUNT(*) AS n \
         FROM transactions t LEFT JOIN categories c ON t.category_id = c.id \
         WHERE t.created_at BETWEEN ?1 AND ?2 \
         GROUP BY category ORDER BY expense DESC, category",
    )?;
    let rows = stmt.query_map(
        rusqlite::params![
            from.format("%Y-%m-%d").to_string(),
            to.format("%Y-%m-%d").to_string()
        ],
        |row| {
            Ok(CategoryTotals {
                category: row.get(0)?,
                income_cents: row.get(1)?,
                expense_cents: row.get(2)?,
                count: row.get(3)?,
            })
        },
    )?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Monthly outflow trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyOutflow {
    /// Calendar month, "YYYY-MM".
    pub month: String,
    pub category: String,
    pub outflow_cents: i64,
}

/// Per-(month, category) outflow totals within a date range, for trend
/// display. Inflows are excluded entirely.
pub fn monthly_outflows(conn: &Connection, from: NaiveDate, to: NaiveDate) -> Result<Vec<MonthlyOutflow>> {
    let mut stmt = conn.prepare(
        "SELECT SUBSTR(t.created_at, 1, 7) AS month, \
                COALESCE(c.name, 'Uncategorized') AS category, \
                SUM(-t.amount_cents) AS outflow \
         FROM transactions t LEFT JOIN categories c ON t.category_id = c.id \
         WHERE t.created_at BETWEEN ?1 AND ?2 AND t.amount_cents < 0 \
         GROUP BY month, category ORDER BY month, category",
    )?;
    let rows = stmt.query_map(
        rusqlite::params![
            from.format("%Y-%m-%d").to_string(),
            to.format("%Y-%m-%d").to_string()
        ],
        |row| {
            Ok(MonthlyOutflow {
                month: row.get(0)?,
                category: row.get(1)?,
                outflow_cents: row.get(2)?,
            })
        },
    )?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}
