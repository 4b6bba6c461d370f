// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — opens the stores, builds the OCR client and wires
// them into the library.
//
// The host owns every collaborator: one SQLite store, one image directory and
// one HTTP client shared by image downloads and Vision requests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use leafcount_core::AppConfig;
use leafcount_core::error::{LeafcountError, Result};
use leafcount_pipeline::{
    EnvCredentials, Library, Orchestrator, VisionClient, build_http_client,
};
use leafcount_store::{FileImageStore, SqliteStore};
use tracing::info;

use super::data_dir;

const CONFIG_FILE: &str = "config.json";

/// Everything a command needs.
pub struct AppServices {
    pub library: Library,
    pub config: AppConfig,
    pub data_dir: PathBuf,
}

impl AppServices {
    /// Resolve the data directory, load the config and open the stores.
    pub fn init(explicit_dir: Option<PathBuf>) -> Result<Self> {
        let dir = data_dir::data_dir(explicit_dir)?;
        info!(path = %dir.display(), "initialising app services");

        let config = load_config(&dir)?;

        let documents = Arc::new(SqliteStore::open(config.database_path(&dir))?);
        let images = Arc::new(FileImageStore::new(config.image_path(&dir)));

        let http = build_http_client(&config)?;
        let provider = Arc::new(VisionClient::from_config(http.clone(), &config));

        let orchestrator = Orchestrator::new(
            documents.clone(),
            images.clone(),
            provider,
            Arc::new(EnvCredentials),
            config.credential_name.clone(),
        )
        .with_http_client(http);

        info!("app services initialised");
        Ok(Self {
            library: Library::new(documents, images, orchestrator),
            config,
            data_dir: dir,
        })
    }
}

/// Path of the config file inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load `config.json`, or the defaults if there is none.
///
/// A config file that exists but does not parse is an error.
pub fn load_config(data_dir: &Path) -> Result<AppConfig> {
    let path = config_path(data_dir);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&data)
        .map_err(|e| LeafcountError::Config(format!("{}: {e}", path.display())))
}

pub fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(config_path(data_dir), json)?;
    Ok(())
}
