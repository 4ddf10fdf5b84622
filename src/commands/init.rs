use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the data directory, its `.secrets` subdirectory and an initial `config.json` that
/// points at `base_url`.
///
/// # Arguments
/// - `tally_home` - The directory that will be the root of data directory, e.g. `$HOME/tally`
/// - `base_url` - The address of the tracker service, e.g. `http://127.0.0.1:5000`
///
/// # Errors
/// - Returns an error if `base_url` is not an http(s) URL or if any file operations fail.
pub async fn init(tally_home: &Path, base_url: &str) -> Result<Out<()>> {
    let config = Config::create(tally_home, base_url).await?;
    Ok(format!(
        "Successfully created the tally directory and config at {}. Next, sign in with \
        'tally auth --token <TOKEN>'",
        config.root().display()
    )
    .into())
}
