use crate::db::get_connection;
use crate::error::Result;
use crate::settings::db_path;

pub fn run() -> Result<()> {
    let path = db_path();
    let conn = get_connection(&path)?;

    let count = |sql: &str| -> Result<i64> {
        Ok(conn.query_row(sql, [], |r| r.get(0))?)
    };

    let accounts = count("SELECT count(*) FROM accounts")?;
    let categories = count("SELECT count(*) FROM categories")?;
    let imports = count("SELECT count(*) FROM imports")?;
    let transactions = count("SELECT count(*) FROM transactions")?;
    let uncategorized = count("SELECT count(*) FROM transactions WHERE category_id IS NULL")?;

    println!("Database: {}", path.display());
    println!("Accounts: {accounts}");
    println!("Categories: {categories}");
    println!("Imports: {imports}");
    println!("Transactions: {transactions} ({uncategorized} uncategorized)");
    Ok(())
}
