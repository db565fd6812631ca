use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{save_settings, Settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let settings = match data_dir {
        Some(dir) => Settings { data_dir: dir },
        None => Settings::default(),
    };
    std::fs::create_dir_all(&settings.data_dir)?;
    save_settings(&settings)?;

    let conn = get_connection(&std::path::Path::new(&settings.data_dir).join("fin.db"))?;
    init_db(&conn)?;

    println!("Initialized fin database in {}", settings.data_dir);
    Ok(())
}
