use comfy_table::{Cell, Table};

use crate::db::{find_or_create_account, get_connection};
use crate::error::{FinError, Result};
use crate::models::AccountKind;
use crate::settings::db_path;

pub fn add(name: &str, kind: &str) -> Result<()> {
    let kind = AccountKind::parse(kind)
        .ok_or_else(|| FinError::Validation(format!("unknown account kind '{kind}' (cash, credit, bank)")))?;
    let conn = get_connection(&db_path())?;
    let account = find_or_create_account(&conn, name, kind)?;
    println!("Account '{}' (id {})", account.name, account.id);
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare("SELECT id, name, kind FROM accounts ORDER BY name")?;
    let rows: Vec<(i64, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Kind"]);
    for (id, name, kind) in rows {
        table.add_row(vec![Cell::new(id), Cell::new(name), Cell::new(kind)]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
