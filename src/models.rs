use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Cash,
    Credit,
    Bank,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Credit => "credit",
            Self::Bank => "bank",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "credit" => Some(Self::Credit),
            "bank" => Some(Self::Bank),
            _ => None,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub created_at: String,
    pub description: String,
    pub amount_cents: i64,
    pub category_id: Option<i64>,
    pub account_id: i64,
    pub import_id: Option<i64>,
    pub recurring_rule_id: Option<i64>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Import {
    pub id: i64,
    pub file_name: String,
    pub sha256: String,
}

/// Intermediate representation from a statement parser before DB insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    /// Category name carried by the statement itself (CGD only).
    pub category: Option<String>,
}
