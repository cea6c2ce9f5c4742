use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the home directory, its data directory and an initial `config.json` with default
/// settings.
///
/// # Arguments
/// - `home` - The directory that will be the root of data directory, e.g. `$HOME/minimarket`
///
/// # Errors
/// - Returns an error if any file operations fail or the directory is already initialized.
pub async fn init(home: &Path) -> Result<Out<()>> {
    let config = Config::create(home).await?;
    Ok(format!(
        "Created the minimarket directory at '{}'. Put collection snapshots in '{}'",
        config.root().display(),
        config.data_dir().display()
    )
    .into())
}
