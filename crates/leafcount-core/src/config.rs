// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// The OCR API key never lives here; only its name does. The key itself is
// looked up at call time through a credential source.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the environment variable holding the Cloud Vision API key.
pub const DEFAULT_CREDENTIAL_NAME: &str = "GCP_VISION_API_KEY";

/// Cloud Vision batch annotate endpoint.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file, relative to the data directory.
    pub database_file: PathBuf,
    /// Directory holding page images, relative to the data directory.
    pub image_dir: PathBuf,
    /// OCR provider endpoint.
    pub vision_endpoint: String,
    /// Name of the secret that holds the OCR provider API key.
    pub credential_name: String,
    /// Timeout for image downloads and OCR requests.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_file: PathBuf::from("leafcount.db"),
            image_dir: PathBuf::from("images"),
            vision_endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            credential_name: DEFAULT_CREDENTIAL_NAME.to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Absolute path of the database inside `data_dir`.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    /// Absolute path of the image directory inside `data_dir`.
    pub fn image_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.image_dir)
    }
}
