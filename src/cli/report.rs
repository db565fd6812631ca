use chrono::NaiveDate;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{FinError, Result};
use crate::money::euros;
use crate::reports;
use crate::settings::db_path;

fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<(NaiveDate, NaiveDate)> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| FinError::Validation(format!("cannot parse date '{s}' (expected YYYY-MM-DD)")))
    };
    // Unbounded when omitted.
    let from = match from {
        Some(s) => parse(s)?,
        None => NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
    };
    let to = match to {
        Some(s) => parse(s)?,
        None => NaiveDate::from_ymd_opt(9999, 12, 31).unwrap(),
    };
    Ok((from, to))
}

pub fn categories(from: Option<&str>, to: Option<&str>) -> Result<()> {
    let (from, to) = parse_range(from, to)?;
    let conn = get_connection(&db_path())?;
    let totals = reports::category_totals(&conn, from, to)?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Income", "Expenses", "Transactions"]);
    for row in totals {
        table.add_row(vec![
            Cell::new(row.category),
            Cell::new(euros(row.income_cents)),
            Cell::new(euros(row.expense_cents)),
            Cell::new(row.count),
        ]);
    }
    println!("Category totals\n{table}");
    Ok(())
}

pub fn monthly(from: Option<&str>, to: Option<&str>) -> Result<()> {
    let (from, to) = parse_range(from, to)?;
    let conn = get_connection(&db_path())?;
    let rows = reports::monthly_outflows(&conn, from, to)?;

    let mut table = Table::new();
    table.set_header(vec!["Month", "Category", "Outflow"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.month),
            Cell::new(row.category),
            Cell::new(euros(row.outflow_cents)),
        ]);
    }
    println!("Monthly outflows\n{table}");
    Ok(())
}
