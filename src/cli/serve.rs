use std::fs;

use anyhow::Result;

use crate::api;
use crate::core::AppConfig;

pub async fn run(host: String, port: String, config: AppConfig) -> Result<()> {
    fs::create_dir_all(&config.storage_path)?;
    api::serve(host, port, config).await
}
