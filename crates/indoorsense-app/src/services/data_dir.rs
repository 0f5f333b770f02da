// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

/// Return the application data directory, creating it if needed.
///
/// On mobile the host provides its own documents directory instead.
pub fn data_dir() -> PathBuf {
    let dir = base_dir().join("indoorsense");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Default location of the bridge config file.
pub fn config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}

fn base_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}
