use comfy_table::{Cell, Table};

use crate::db::{
    get_account_by_name, get_category_by_name, get_connection, get_transactions_by_account,
    get_transactions_by_category, get_transactions_by_import,
};
use crate::error::{FinError, Result};
use crate::models::Transaction;
use crate::money::euros;
use crate::settings::db_path;

pub fn list(account: Option<&str>, category: Option<&str>, import: Option<i64>) -> Result<()> {
    let conn = get_connection(&db_path())?;

    let transactions: Vec<Transaction> = match (account, category, import) {
        (Some(name), None, None) => {
            let account = get_account_by_name(&conn, name)?
                .ok_or_else(|| FinError::UnknownAccount(name.to_string()))?;
            get_transactions_by_account(&conn, account.id)?
        }
        (None, Some(name), None) => {
            let category = get_category_by_name(&conn, name)?
                .ok_or_else(|| FinError::UnknownCategory(name.to_string()))?;
            get_transactions_by_category(&conn, category.id)?
        }
        (None, None, Some(id)) => get_transactions_by_import(&conn, id)?,
        _ => {
            return Err(FinError::Validation(
                "pass exactly one of --account, --category, --import".to_string(),
            ));
        }
    };

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount"]);
    for t in &transactions {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.created_at),
            Cell::new(&t.description),
            Cell::new(euros(t.amount_cents)),
        ]);
    }
    println!("Transactions ({})\n{table}", transactions.len());
    Ok(())
}
