use comfy_table::{Cell, Table};

use crate::categorizer;
use crate::db::get_connection;
use crate::error::{FinError, Result};
use crate::money::euros;
use crate::settings::db_path;

pub fn assign(ids: &[i64], category: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let updated = categorizer::assign_category(&conn, ids, category)?;
    println!("Assigned '{category}' to {updated} transactions");
    Ok(())
}

pub fn merchants(all: bool) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let groups = categorizer::merchant_groups(&conn, !all)?;

    let mut table = Table::new();
    table.set_header(vec!["Merchant", "Transactions", "Total"]);
    for group in groups {
        table.add_row(vec![
            Cell::new(group.key),
            Cell::new(group.count),
            Cell::new(euros(group.total_cents)),
        ]);
    }
    println!("Merchant groups\n{table}");
    Ok(())
}

pub fn merchant(key: &str, category: &str, all: bool) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let updated = categorizer::assign_merchant(&conn, key, category, all)?;
    println!("Assigned '{category}' to {updated} transactions starting with '{key}'");
    Ok(())
}

pub fn rule(
    pattern: &str,
    category: Option<&str>,
    case_sensitive: bool,
    all: bool,
    preview: bool,
) -> Result<()> {
    let conn = get_connection(&db_path())?;
    if preview {
        let matches = categorizer::count_pattern_matches(&conn, pattern, case_sensitive, all)?;
        let scope = if all { "transactions" } else { "uncategorized transactions" };
        println!("Pattern '{pattern}' matches {matches} {scope}");
        return Ok(());
    }
    let category = category
        .ok_or_else(|| FinError::Validation("--category is required to apply a rule".to_string()))?;
    let updated = categorizer::apply_pattern_rule(&conn, pattern, category, case_sensitive, all)?;
    println!("Categorized {updated} transactions as '{category}'");
    Ok(())
}

pub fn suggest() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let suggestions = categorizer::suggest_patterns(&conn)?;
    if suggestions.is_empty() {
        println!("No recurring patterns among uncategorized transactions.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Pattern", "Transactions"]);
    for s in suggestions {
        table.add_row(vec![Cell::new(s.pattern), Cell::new(s.count)]);
    }
    println!("Suggested patterns\n{table}");
    Ok(())
}
