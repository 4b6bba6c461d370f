// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::PathBuf;

use leafcount_core::error::{LeafcountError, Result};

const APP_DIR: &str = "leafcount";

/// Return the application data directory, creating it if needed.
///
/// `explicit` comes from `--data-dir` / `LEAFCOUNT_DATA_DIR`. Without it the
/// XDG data dir is used, then `~/.local/share`.
pub fn data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let dir = resolve(
        explicit,
        std::env::var("XDG_DATA_HOME").ok(),
        std::env::var("HOME").ok(),
    )
    .ok_or_else(|| {
        LeafcountError::Config(
            "no data directory: set LEAFCOUNT_DATA_DIR, XDG_DATA_HOME or HOME".into(),
        )
    })?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn resolve(explicit: Option<PathBuf>, xdg: Option<String>, home: Option<String>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir);
    }
    if let Some(xdg) = xdg.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR));
    }
    home.filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".local").join("share").join(APP_DIR))
}
