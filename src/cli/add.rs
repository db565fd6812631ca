use chrono::NaiveDate;

use crate::db::{add_manual_transaction, get_connection};
use crate::error::{FinError, Result};
use crate::money::{euros, parse_statement_cents};
use crate::settings::db_path;

pub fn run(
    description: &str,
    amount: &str,
    account: &str,
    date: Option<&str>,
    category: Option<&str>,
) -> Result<()> {
    let amount_cents = parse_statement_cents(amount)
        .ok_or_else(|| FinError::Validation(format!("cannot parse amount '{amount}'")))?;
    let date = match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| FinError::Validation(format!("cannot parse date '{d}' (expected YYYY-MM-DD)")))?,
        None => chrono::Local::now().date_naive(),
    };

    let conn = get_connection(&db_path())?;
    let id = add_manual_transaction(&conn, account, date, description, amount_cents, category)?;
    println!("Added transaction #{id}: {description} {}", euros(amount_cents));
    Ok(())
}
