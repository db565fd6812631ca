use comfy_table::{Cell, Table};

use crate::db::{find_or_create_category, get_connection, rename_category};
use crate::error::Result;
use crate::settings::db_path;

pub fn add(name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let category = find_or_create_category(&conn, name)?;
    println!("Category '{}' (id {})", category.name, category.id);
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, COUNT(t.id) FROM categories c \
         LEFT JOIN transactions t ON t.category_id = c.id \
         GROUP BY c.id, c.name ORDER BY c.name",
    )?;
    let rows: Vec<(i64, String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Transactions"]);
    for (id, name, count) in rows {
        table.add_row(vec![Cell::new(id), Cell::new(name), Cell::new(count)]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn rename(name: &str, new_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    rename_category(&conn, name, new_name)?;
    println!("Renamed category '{name}' to '{new_name}'");
    Ok(())
}
