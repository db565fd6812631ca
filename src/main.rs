mod categorizer;
mod cli;
mod db;
mod error;
mod importer;
mod models;
mod money;
mod reports;
mod settings;

use clap::Parser;

use cli::{AccountsCommands, CategoriesCommands, CategorizeCommands, Cli, Commands, ReportCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add { name, kind } => cli::accounts::add(&name, &kind),
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name } => cli::categories::add(&name),
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::Rename { name, new_name } => cli::categories::rename(&name, &new_name),
        },
        Commands::Import { file, account, format } => {
            cli::import::run(&file, &account, format.as_deref())
        }
        Commands::Add {
            description,
            amount,
            account,
            date,
            category,
        } => cli::add::run(&description, &amount, &account, date.as_deref(), category.as_deref()),
        Commands::Categorize { command } => match command {
            CategorizeCommands::Assign { category, ids } => cli::categorize::assign(&ids, &category),
            CategorizeCommands::Merchants { all } => cli::categorize::merchants(all),
            CategorizeCommands::Merchant { key, category, all } => {
                cli::categorize::merchant(&key, &category, all)
            }
            CategorizeCommands::Rule {
                pattern,
                category,
                case_sensitive,
                all,
                preview,
            } => cli::categorize::rule(&pattern, category.as_deref(), case_sensitive, all, preview),
            CategorizeCommands::Suggest => cli::categorize::suggest(),
        },
        Commands::Transactions {
            account,
            category,
            import,
        } => cli::transactions::list(account.as_deref(), category.as_deref(), import),
        Commands::Report { command } => match command {
            ReportCommands::Categories { from, to } => {
                cli::report::categories(from.as_deref(), to.as_deref())
            }
            ReportCommands::Monthly { from, to } => {
                cli::report::monthly(from.as_deref(), to.as_deref())
            }
        },
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
