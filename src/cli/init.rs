use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};
use anyhow::{Result, anyhow};
use std::fs;

pub async fn run(db: bool, config: &AppConfig) -> Result<()> {
    if !db {
        return Err(anyhow!("Missing value for init \"--db\""));
    }

    println!("Initializing db...");
    fs::create_dir_all(&config.storage_path)?;

    let db = async_db(&config.db_path).await?;
    db.call(|conn| {
        initialize_db(conn)?;
        Ok(())
    })
    .await?;
    println!("Finished initializing db at {}", config.db_path);

    Ok(())
}
