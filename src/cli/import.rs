use std::path::PathBuf;

use crate::db::get_connection;
use crate::error::Result;
use crate::importer::import_file;
use crate::settings::db_path;

pub fn run(file: &str, account: &str, format: Option<&str>) -> Result<()> {
    let mut conn = get_connection(&db_path())?;
    let summary = import_file(&mut conn, &PathBuf::from(file), account, format)?;
    println!(
        "Imported {} transactions into '{}' (import #{})",
        summary.imported, summary.account, summary.import_id
    );
    Ok(())
}
