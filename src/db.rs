use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{FinError, Result};
use crate::models::{Account, AccountKind, Category, Import, Transaction};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL CHECK (kind IN ('cash', 'credit', 'bank')),
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    file_name TEXT NOT NULL,
    sha256 TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS recurring_rules (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    amount_cents INTEGER NOT NULL,
    category_id INTEGER REFERENCES categories(id),
    account_id INTEGER REFERENCES accounts(id),
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    created_at TEXT NOT NULL,
    description TEXT NOT NULL,
    amount_cents INTEGER NOT NULL,
    category_id INTEGER REFERENCES categories(id),
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    import_id INTEGER REFERENCES imports(id),
    recurring_rule_id INTEGER REFERENCES recurring_rules(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Accounts and categories: explicit per-entity create-or-find. Creating with
// a name that already exists returns the existing row instead of erroring.
// ---------------------------------------------------------------------------

pub fn get_account_by_name(conn: &Connection, name: &str) -> Result<Option<Account>> {
    let row = conn
        .query_row(
            "SELECT id, name, kind FROM accounts WHERE name = ?1",
            [name],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
        )
        .optional()?;
    Ok(row.map(|(id, name, kind)| Account {
        id,
        name,
        kind: AccountKind::parse(&kind).unwrap_or(AccountKind::Bank),
    }))
}

pub fn find_or_create_account(conn: &Connection, name: &str, kind: AccountKind) -> Result<Account> {
    if name.trim().is_empty() {
        return Err(FinError::Validation("account name must not be empty".to_string()));
    }
    if let Some(existing) = get_account_by_name(conn, name)? {
        return Ok(existing);
    }
    conn.execute(
        "INSERT INTO accounts (name, kind) VALUES (?1, ?2)",
        rusqlite::params![name, kind.as_str()],
    )?;
    Ok(Account {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        kind,
    })
}

pub fn get_category_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    let row = conn
        .query_row(
            "SELECT id, name FROM categories WHERE name = ?1",
            [name],
            |row| Ok(Category { id: row.get(0)?, name: row.get(1)? }),
        )
        .optional()?;
    Ok(row)
}

pub fn find_or_create_category(conn: &Connection, name: &str) -> Result<Category> {
    if name.trim().is_empty() {
        return Err(FinError::Validation("category name must not be empty".to_string()));
    }
    if let Some(existing) = get_category_by_name(conn, name)? {
        return Ok(existing);
    }
    conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
    Ok(Category {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub fn rename_category(conn: &Connection, name: &str, new_name: &str) -> Result<()> {
    if new_name.trim().is_empty() {
        return Err(FinError::Validation("category name must not be empty".to_string()));
    }
    let updated = conn.execute(
        "UPDATE categories SET name = ?1 WHERE name = ?2",
        rusqlite::params![new_name, name],
    )?;
    if updated == 0 {
        return Err(FinError::UnknownCategory(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Imports: create with uniqueness enforcement, fail-if-exists by hash.
// ---------------------------------------------------------------------------

pub fn get_import_by_sha256(conn: &Connection, sha256: &str) -> Result<Option<Import>> {
    let row = conn
        .query_row(
            "SELECT id, file_name, sha256 FROM imports WHERE sha256 = ?1",
            [sha256],
            |row| {
                Ok(Import {
                    id: row.get(0)?,
                    file_name: row.get(1)?,
                    sha256: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn register_import(conn: &Connection, file_name: &str, sha256: &str) -> Result<Import> {
    if let Some(existing) = get_import_by_sha256(conn, sha256)? {
        return Err(FinError::DuplicateImport {
            file_name: file_name.to_string(),
            original: existing.file_name,
        });
    }
    conn.execute(
        "INSERT INTO imports (file_name, sha256) VALUES (?1, ?2)",
        rusqlite::params![file_name, sha256],
    )?;
    Ok(Import {
        id: conn.last_insert_rowid(),
        file_name: file_name.to_string(),
        sha256: sha256.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

pub fn insert_transaction(
    conn: &Connection,
    date: NaiveDate,
    description: &str,
    amount_cents: i64,
    account_id: i64,
    category_id: Option<i64>,
    import_id: Option<i64>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (created_at, description, amount_cents, account_id, category_id, import_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            date.format("%Y-%m-%d").to_string(),
            description,
            amount_cents,
            account_id,
            category_id,
            import_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Manual single-transaction entry. Validates before any write: manual entries
/// must carry a description and a non-zero amount, and have no import_id.
pub fn add_manual_transaction(
    conn: &Connection,
    account_name: &str,
    date: NaiveDate,
    description: &str,
    amount_cents: i64,
    category_name: Option<&str>,
) -> Result<i64> {
    if description.trim().is_empty() {
        return Err(FinError::Validation("description must not be empty".to_string()));
    }
    if amount_cents == 0 {
        return Err(FinError::Validation("amount must not be zero".to_string()));
    }
    let account = get_account_by_name(conn, account_name)?
        .ok_or_else(|| FinError::UnknownAccount(account_name.to_string()))?;
    let category_id = match category_name {
        Some(name) => Some(
            get_category_by_name(conn, name)?
                .ok_or_else(|| FinError::UnknownCategory(name.to_string()))?
                .id,
        ),
        None => None,
    };
    insert_transaction(conn, date, description, amount_cents, account.id, category_id, None)
}

fn transaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        created_at: row.get(1)?,
        description: row.get(2)?,
        amount_cents: row.get(3)?,
        category_id: row.get(4)?,
        account_id: row.get(5)?,
        import_id: row.get(6)?,
        recurring_rule_id: row.get(7)?,
    })
}

const TXN_COLUMNS: &str =
    "id, created_at, description, amount_cents, category_id, account_id, import_id, recurring_rule_id";

pub fn get_transactions_by_account(conn: &Connection, account_id: i64) -> Result<Vec<Transaction>> {
    let sql = format!("SELECT {TXN_COLUMNS} FROM transactions WHERE account_id = ?1 ORDER BY created_at");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([account_id], transaction_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn get_transactions_by_category(conn: &Connection, category_id: i64) -> Result<Vec<Transaction>> {
    let sql = format!("SELECT {TXN_COLUMNS} FROM transactions WHERE category_id = ?1 ORDER BY created_at");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([category_id], transaction_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn get_transactions_by_import(conn: &Connection, import_id: i64) -> Result<Vec<Transaction>> {
    let sql = format!("SELECT {TXN_COLUMNS} FROM transactions WHERE import_id = ?1 ORDER BY created_at");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([import_id], transaction_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}
