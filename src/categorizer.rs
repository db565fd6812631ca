use std::collections::HashMap;

use rusqlite::Connection;

use crate::db;
use crate::error::{FinError, Result};

/// Length of the description prefix used as a merchant grouping key.
pub const MERCHANT_KEY_LEN: usize = 20;
/// Prefix length for the fallback suggestion bucket.
const SUGGESTION_PREFIX_LEN: usize = 10;
const MAX_SUGGESTIONS: usize = 8;
const MIN_SUGGESTION_MEMBERS: i64 = 2;

// Short hard-coded vocabulary for the suggestion heuristic. First bucket
// whose needles match wins; everything else falls back to a prefix bucket.
const KNOWN_MERCHANTS: &[(&str, &[&str])] = &[
    ("AMAZON", &["AMAZON"]),
    ("STARBUCKS", &["STARBUCKS"]),
    ("UBER", &["UBER"]),
    ("GROCERY/MARKET", &["GROCERY", "MARKET"]),
    ("RESTAURANTS", &["RESTAURANT", "CAFE"]),
    ("GAS/FUEL", &["GAS", "FUEL"]),
];

pub fn merchant_key(description: &str) -> String {
    description
        .chars()
        .take(MERCHANT_KEY_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}

fn pattern_matches(description: &str, pattern: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        description.contains(pattern)
    } else {
        description.to_lowercase().contains(&pattern.to_lowercase())
    }
}

fn resolve_category(conn: &Connection, category_name: &str) -> Result<i64> {
    Ok(db::get_category_by_name(conn, category_name)?
        .ok_or_else(|| FinError::UnknownCategory(category_name.to_string()))?
        .id)
}

fn load_descriptions(conn: &Connection, uncategorized_only: bool) -> Result<Vec<(i64, String)>> {
    let sql = if uncategorized_only {
        "SELECT id, description FROM transactions WHERE category_id IS NULL"
    } else {
        "SELECT id, description FROM transactions"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn set_category(conn: &Connection, ids: &[i64], category_id: i64) -> Result<usize> {
    let mut updated = 0;
    for id in ids {
        updated += conn.execute(
            "UPDATE transactions SET category_id = ?1 WHERE id = ?2",
            rusqlite::params![category_id, id],
        )?;
    }
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Direct assignment
// ---------------------------------------------------------------------------

/// Assign a category to an explicit set of transaction ids. Unknown ids are
/// silent no-ops so that re-running an assignment stays idempotent even if
/// some transactions were deleted in between. Returns rows actually updated.
pub fn assign_category(conn: &Connection, transaction_ids: &[i64], category_name: &str) -> Result<usize> {
    let category_id = resolve_category(conn, category_name)?;
    set_category(conn, transaction_ids, category_id)
}

// ---------------------------------------------------------------------------
// Merchant grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MerchantGroup {
    pub key: String,
    pub count: i64,
    /// Aggregate absolute amount, in cents.
    pub total_cents: i64,
}

/// Group transactions by the trimmed fixed-length description prefix,
/// largest groups first.
pub fn merchant_groups(conn: &Connection, uncategorized_only: bool) -> Result<Vec<MerchantGroup>> {
    let sql = if uncategorized_only {
        "SELECT description, amount_cents FROM transactions WHERE category_id IS NULL"
    } else {
        "SELECT description, amount_cents FROM transactions"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut groups: HashMap<String, (i64, i64)> = HashMap::new();
    for row in rows {
        let (description, amount_cents) = row?;
        let entry = groups.entry(merchant_key(&description)).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += amount_cents.abs();
    }

    let mut out: Vec<MerchantGroup> = groups
        .into_iter()
        .map(|(key, (count, total_cents))| MerchantGroup { key, count, total_cents })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    Ok(out)
}

/// Apply a category to every transaction whose description starts with the
/// merchant key. By default only uncategorized transactions are touched.
pub fn assign_merchant(
    conn: &Connection,
    merchant: &str,
    category_name: &str,
    all_transactions: bool,
) -> Result<usize> {
    let category_id = resolve_category(conn, category_name)?;
    let ids: Vec<i64> = load_descriptions(conn, !all_transactions)?
        .into_iter()
        .filter(|(_, description)| description.starts_with(merchant))
        .map(|(id, _)| id)
        .collect();
    set_category(conn, &ids, category_id)
}

// ---------------------------------------------------------------------------
// Pattern rules
// ---------------------------------------------------------------------------

/// Preview how many transactions a pattern rule would touch, without
/// mutating anything. Matching is plain substring containment, no wildcards.
pub fn count_pattern_matches(
    conn: &Connection,
    pattern: &str,
    case_sensitive: bool,
    all_transactions: bool,
) -> Result<usize> {
    Ok(load_descriptions(conn, !all_transactions)?
        .iter()
        .filter(|(_, description)| pattern_matches(description, pattern, case_sensitive))
        .count())
}

/// Apply a pattern rule: categorize every matching transaction, returning the
/// count actually updated. In uncategorized-only mode a second application
/// updates nothing, since no uncategorized matches remain.
pub fn apply_pattern_rule(
    conn: &Connection,
    pattern: &str,
    category_name: &str,
    case_sensitive: bool,
    all_transactions: bool,
) -> Result<usize> {
    let category_id = resolve_category(conn, category_name)?;
    let ids: Vec<i64> = load_descriptions(conn, !all_transactions)?
        .into_iter()
        .filter(|(_, description)| pattern_matches(description, pattern, case_sensitive))
        .map(|(id, _)| id)
        .collect();
    set_category(conn, &ids, category_id)
}

// ---------------------------------------------------------------------------
// Pattern suggestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PatternSuggestion {
    pub pattern: String,
    pub count: i64,
}

fn suggestion_bucket(description: &str) -> String {
    let upper = description.to_uppercase();
    for (bucket, needles) in KNOWN_MERCHANTS {
        if needles.iter().any(|needle| upper.contains(needle)) {
            return (*bucket).to_string();
        }
    }
    description
        .chars()
        .take(SUGGESTION_PREFIX_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Heuristic convenience: bucket uncategorized descriptions into a small set
/// of known-merchant buckets (prefix fallback otherwise) and report the
/// recurring ones, biggest first. Not a classifier and not a guarantee.
pub fn suggest_patterns(conn: &Connection) -> Result<Vec<PatternSuggestion>> {
    let mut buckets: HashMap<String, i64> = HashMap::new();
    for (_, description) in load_descriptions(conn, true)? {
        *buckets.entry(suggestion_bucket(&description)).or_insert(0) += 1;
    }

    let mut out: Vec<PatternSuggestion> = buckets
        .into_iter()
        .filter(|(_, count)| *count >= MIN_SUGGESTION_MEMBERS)
        .map(|(pattern, count)| PatternSuggestion { pattern, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.pattern.cmp(&b.pattern)));
    out.truncate(MAX_SUGGESTIONS);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::db::{find_or_create_account, find_or_create_category};
    use crate::models::AccountKind;

    fn seed_transactions(conn: &Connection, descriptions: &[&str]) -> Vec<i64> {
        let account = find_or_create_account(conn, "Test", AccountKind::Bank).unwrap();
        let mut ids = Vec::new();
        for desc in descriptions {
            conn.execute(
                "INSERT INTO transactions (created_at, description, amount_cents, account_id) \
                 VALUES ('2024-03-01', ?1, -1000, ?2)",
                rusqlite::params![desc, account.id],
            )
            .unwrap();
            ids.push(conn.last_insert_rowid());
        }
        ids
    }

    fn category_of(conn: &Connection, id: i64) -> Option<String> {
        conn.query_row(
            "SELECT c.name FROM transactions t LEFT JOIN categories c ON t.category_id = c.id \
             WHERE t.id = ?1",
            [id],
            |r| r.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_assign_category() {
        let (_dir, conn) = test_db();
        let ids = seed_transactions(&conn, &["COFFEE SHOP", "BAKERY"]);
        find_or_create_category(&conn, "Food").unwrap();
        let updated = assign_category(&conn, &ids, "Food").unwrap();
        assert_eq!(updated, 2);
        assert_eq!(category_of(&conn, ids[0]).as_deref(), Some("Food"));
    }

    #[test]
    fn test_assign_category_unknown_name_fails() {
        let (_dir, conn) = test_db();
        let ids = seed_transactions(&conn, &["COFFEE SHOP"]);
        let err = assign_category(&conn, &ids, "Nope").unwrap_err();
        assert!(matches!(err, FinError::UnknownCategory(name) if name == "Nope"));
    }

    #[test]
    fn test_assign_category_missing_ids_are_noops() {
        let (_dir, conn) = test_db();
        let ids = seed_transactions(&conn, &["COFFEE SHOP"]);
        find_or_create_category(&conn, "Food").unwrap();
        let updated = assign_category(&conn, &[ids[0], 9999], "Food").unwrap();
        assert_eq!(updated, 1);
    }

    #[test]
    fn test_merchant_key_is_trimmed_prefix() {
        assert_eq!(merchant_key("CONTINENTE LOJA 042 LISBOA"), "CONTINENTE LOJA 042");
        assert_eq!(merchant_key("ATM"), "ATM");
    }

    #[test]
    fn test_merchant_groups_counts_and_totals() {
        let (_dir, conn) = test_db();
        // Three sharing a 20-char prefix, one different.
        seed_transactions(
            &conn,
            &[
                "CONTINENTE LOJA 042 LISBOA",
                "CONTINENTE LOJA 042 PORTO",
                "CONTINENTE LOJA 042 FARO",
                "GALP ENERGIA",
            ],
        );
        let groups = merchant_groups(&conn, true).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "CONTINENTE LOJA 042");
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].total_cents, 3000);
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn test_assign_merchant_respects_uncategorized_flag() {
        let (_dir, conn) = test_db();
        let ids = seed_transactions(&conn, &["GALP ENERGIA A", "GALP ENERGIA B", "OTHER"]);
        find_or_create_category(&conn, "Fuel").unwrap();
        find_or_create_category(&conn, "Misc").unwrap();
        assign_category(&conn, &[ids[0]], "Misc").unwrap();

        // Uncategorized-only: the already-categorized one is left alone.
        let updated = assign_merchant(&conn, "GALP ENERGIA", "Fuel", false).unwrap();
        assert_eq!(updated, 1);
        assert_eq!(category_of(&conn, ids[0]).as_deref(), Some("Misc"));

        // All-transactions mode overrides.
        let updated = assign_merchant(&conn, "GALP ENERGIA", "Fuel", true).unwrap();
        assert_eq!(updated, 2);
        assert_eq!(category_of(&conn, ids[0]).as_deref(), Some("Fuel"));
        assert_eq!(category_of(&conn, ids[2]), None);
    }

    #[test]
    fn test_pattern_rule_preview_and_apply() {
        let (_dir, conn) = test_db();
        seed_transactions(&conn, &["UBER *TRIP", "uber eats", "TAXI"]);
        find_or_create_category(&conn, "Transport").unwrap();

        assert_eq!(count_pattern_matches(&conn, "UBER", false, false).unwrap(), 2);
        assert_eq!(count_pattern_matches(&conn, "UBER", true, false).unwrap(), 1);

        let updated = apply_pattern_rule(&conn, "UBER", "Transport", false, false).unwrap();
        assert_eq!(updated, 2);
    }

    #[test]
    fn test_pattern_rule_is_idempotent() {
        let (_dir, conn) = test_db();
        seed_transactions(&conn, &["UBER *TRIP", "UBER EATS"]);
        find_or_create_category(&conn, "Transport").unwrap();

        let first = apply_pattern_rule(&conn, "UBER", "Transport", false, false).unwrap();
        assert_eq!(first, 2);
        // No uncategorized matches remain, so the second run updates nothing.
        let second = apply_pattern_rule(&conn, "UBER", "Transport", false, false).unwrap();
        assert_eq!(second, 0);

        let categorized: i64 = conn
            .query_row(
                "SELECT count(*) FROM transactions WHERE category_id IS NOT NULL",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(categorized, 2);
    }

    #[test]
    fn test_suggestions_bucket_known_merchants() {
        let (_dir, conn) = test_db();
        seed_transactions(
            &conn,
            &[
                "AMAZON MKTP PT*1A2B3",
                "AMAZON.ES",
                "Uber *Trip",
                "UBER EATS LISBOA",
                "UBER EATS PORTO",
                "FARMACIA CENTRAL",
            ],
        );
        let suggestions = suggest_patterns(&conn).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].pattern, "UBER");
        assert_eq!(suggestions[0].count, 3);
        assert_eq!(suggestions[1].pattern, "AMAZON");
        // The lone pharmacy never reaches the two-member threshold.
        assert!(!suggestions.iter().any(|s| s.pattern.starts_with("FARMACIA")));
    }

    #[test]
    fn test_suggestions_prefix_fallback_and_cap() {
        let (_dir, conn) = test_db();
        seed_transactions(
            &conn,
            &["FARMACIA CENTRAL LX", "FARMACIA CENTRAL PT", "PINGO DOCE 12", "PINGO DOCE 99"],
        );
        let suggestions = suggest_patterns(&conn).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().any(|s| s.pattern == "FARMACIA C" && s.count == 2));
        assert!(suggestions.iter().any(|s| s.pattern == "PINGO DOCE" && s.count == 2));
        assert!(suggestions.len() <= 8);
    }

    #[test]
    fn test_suggestions_ignore_categorized() {
        let (_dir, conn) = test_db();
        let ids = seed_transactions(&conn, &["STARBUCKS AEROPORTO", "STARBUCKS CHIADO"]);
        find_or_create_category(&conn, "Coffee").unwrap();
        assign_category(&conn, &ids, "Coffee").unwrap();
        assert!(suggest_patterns(&conn).unwrap().is_empty());
    }
}
