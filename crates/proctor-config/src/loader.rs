// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later wins: compiled defaults, `/etc/proctor/proctor.toml`,
//! `~/.config/proctor/proctor.toml`, `./proctor.toml`, then `PROCTOR_*`
//! environment variables.

// figment::Error is external and cannot be boxed without a wrapper.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ProctorConfig;

/// Sections that environment variables may address.
const ENV_SECTIONS: [&str; 6] = ["service", "gemini", "storage", "interview", "profile", "worker"];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/proctor/proctor.toml";
pub(crate) const LOCAL_CONFIG: &str = "proctor.toml";

/// Path of the per-user config file, if a config dir exists.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("proctor").join("proctor.toml"))
}

/// Builds the full layered Figment without extracting it.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(ProctorConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment.merge(Toml::file(LOCAL_CONFIG)).merge(env_provider())
}

/// Loads configuration from the standard file hierarchy plus environment.
pub fn load_config() -> Result<ProctorConfig, figment::Error> {
    build_figment().extract()
}

/// Loads configuration from an inline TOML document over the defaults.
pub fn load_config_from_str(toml_content: &str) -> Result<ProctorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ProctorConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads configuration from an explicit file plus environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<ProctorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ProctorConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Maps `PROCTOR_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `PROCTOR_INTERVIEW_MINUTES_PER_QUESTION` lands on
/// `interview.minutes_per_question`.
fn env_provider() -> Env {
    Env::prefixed("PROCTOR_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section) {
            if let Some(field) = rest.strip_prefix('_') {
                return format!("{section}.{field}");
            }
        }
    }
    key.to_string()
}
