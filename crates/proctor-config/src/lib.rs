// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Proctor interview engine.
//!
//! TOML files in the XDG hierarchy are layered under `PROCTOR_*` environment
//! overrides, strictly deserialized, validated, and reported as miette
//! diagnostics with typo suggestions.
//!
//! ```no_run
//! use proctor_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("oracle model: {}", config.gemini.model);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ProctorConfig;

/// Loads configuration from the standard hierarchy and validates it.
pub fn load_and_validate() -> Result<ProctorConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Loads configuration from an explicit file (plus env) and validates it.
pub fn load_and_validate_path(path: &Path) -> Result<ProctorConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Loads configuration from an inline TOML string and validates it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ProctorConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<ProctorConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ProctorConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

fn read_source(path: &Path) -> Option<(String, String)> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| (path.display().to_string(), content))
}

/// Reads every config file that exists so diagnostics can show source spans.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();
    if let Some(local) = std::env::current_dir()
        .ok()
        .map(|d| d.join(loader::LOCAL_CONFIG))
    {
        sources.extend(read_source(&local));
    }
    if let Some(user) = loader::user_config_path() {
        sources.extend(read_source(&user));
    }
    sources.extend(read_source(Path::new(loader::SYSTEM_CONFIG)));
    sources
}
