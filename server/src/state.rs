//! Shared application state for request handlers.

use std::path::Path;
use std::sync::Arc;

use leadbook::{Config, Database, LeadbookError, UploadStaging};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub staging: Arc<UploadStaging>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Opens the database named in the config, running migrations.
    pub fn open(config: Config) -> Result<Self, LeadbookError> {
        let db = Database::open(Path::new(&config.database_path))?;
        Ok(Self::with_database(db, config))
    }

    pub fn with_database(db: Database, config: Config) -> Self {
        let staging = UploadStaging::new(&config.upload_directory, config.uploads.max_file_bytes);
        Self {
            db,
            staging: Arc::new(staging),
            config: Arc::new(config),
        }
    }
}
