use std::path::PathBuf;

/// Runtime settings the embedding application may override.
#[derive(Debug, Clone)]
pub struct BlogConfig {
    /// Location of the SQLite database file
    pub database_path: PathBuf,
    /// Directory uploaded attachments are stored under
    pub media_root: PathBuf,
    /// Articles shown per listing page
    pub page_size: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/inkpost.db"),
            media_root: PathBuf::from("data/media"),
            page_size: 3,
        }
    }
}
