use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::api::ApiClient;
use crate::config::{config, AppConfig};
use crate::session::{FileStore, SessionContext};

/// Directory holding the CLI session file.
///
/// `APPROVEX_CONFIG_DIR` wins, then `$HOME/.config/approvex`.
pub fn get_config_dir(app: &AppConfig) -> anyhow::Result<PathBuf> {
    let config_dir = match &app.storage.config_dir {
        Some(dir) => dir.clone(),
        None => {
            let home = std::env::var("HOME")
                .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
            PathBuf::from(home).join(".config").join("approvex")
        }
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Session persisted in `<config dir>/session.json`
pub fn session_context(app: &AppConfig) -> anyhow::Result<SessionContext> {
    let dir = get_config_dir(app)?;
    Ok(SessionContext::new(FileStore::in_dir(&dir)))
}

/// Client for the configured backend, bound to the CLI's session file
pub fn client() -> anyhow::Result<ApiClient> {
    let app = config();
    let session = session_context(app)?;
    tracing::debug!("Using API base {}", app.api.base_url);
    Ok(ApiClient::from_config(app, session)?)
}

/// Use the given password or read one line from stdin
pub fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
