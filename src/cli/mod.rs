pub mod accounts;
pub mod add;
pub mod categories;
pub mod categorize;
pub mod import;
pub mod init;
pub mod report;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fin", about = "Personal finance CLI for importing and categorizing bank statements.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up fin: choose a data directory and initialize the database.
    Init {
        /// Path for fin data (default: ~/Documents/fin)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Import a bank statement export (CGD TSV or Moey PDF).
    Import {
        /// Path to the statement file
        file: String,
        /// Account name to import into (created if absent)
        #[arg(long)]
        account: String,
        /// Importer format key (cgd_tsv, moey_pdf); sniffed when omitted
        #[arg(long)]
        format: Option<String>,
    },
    /// Record a single transaction by hand.
    Add {
        /// Transaction description
        description: String,
        /// Amount in euros, e.g. -12,50 (negative = outflow)
        amount: String,
        /// Account name
        #[arg(long)]
        account: String,
        /// Transaction date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Category name
        #[arg(long)]
        category: Option<String>,
    },
    /// Categorize transactions in bulk.
    Categorize {
        #[command(subcommand)]
        command: CategorizeCommands,
    },
    /// List transactions by account, category, or import.
    Transactions {
        /// Account name
        #[arg(long)]
        account: Option<String>,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        /// Import id
        #[arg(long)]
        import: Option<i64>,
    },
    /// Reporting rollups.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show database location and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add an account (idempotent: returns the existing one by name).
    Add {
        /// Account name, e.g. 'CGD'
        name: String,
        /// Account kind: cash, credit, bank
        #[arg(long, default_value = "bank")]
        kind: String,
    },
    /// List all accounts.
    List,
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category (idempotent: returns the existing one by name).
    Add {
        /// Category name
        name: String,
    },
    /// List all categories.
    List,
    /// Rename a category.
    Rename {
        /// Current category name
        name: String,
        /// New category name
        new_name: String,
    },
}

#[derive(Subcommand)]
pub enum CategorizeCommands {
    /// Assign a category to explicit transaction ids.
    Assign {
        /// Category name
        #[arg(long)]
        category: String,
        /// Transaction ids
        ids: Vec<i64>,
    },
    /// List merchant groups (transactions sharing a description prefix).
    Merchants {
        /// Include already-categorized transactions
        #[arg(long)]
        all: bool,
    },
    /// Assign a category to every transaction starting with a merchant key.
    Merchant {
        /// Merchant key (description prefix)
        key: String,
        /// Category name
        #[arg(long)]
        category: String,
        /// Also recategorize transactions that already have a category
        #[arg(long)]
        all: bool,
    },
    /// Apply a substring pattern rule.
    Rule {
        /// Substring to match against descriptions (no wildcards)
        pattern: String,
        /// Category name (required unless --preview)
        #[arg(long)]
        category: Option<String>,
        /// Match case-sensitively
        #[arg(long = "case-sensitive")]
        case_sensitive: bool,
        /// Also recategorize transactions that already have a category
        #[arg(long)]
        all: bool,
        /// Only count matches, change nothing
        #[arg(long)]
        preview: bool,
    },
    /// Suggest recurring patterns among uncategorized transactions.
    Suggest,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Per-category income/expense totals within a date range.
    Categories {
        /// Start date: YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
    },
    /// Per-month, per-category outflow totals within a date range.
    Monthly {
        /// Start date: YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
    },
}
