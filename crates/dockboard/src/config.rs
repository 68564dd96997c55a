//! CLI-side configuration layering.
//!
//! Loads the TOML profiles from `dockboard-config` and applies the
//! `GlobalOpts` overrides to produce the core's `HostConfig`.

use std::path::PathBuf;

use secrecy::SecretString;

use dockboard_config::{self as config, Config, Profile};
use dockboard_core::HostConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config::config_path)
}

/// Load the config file, falling back to defaults when it is absent.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_file(global);
    if !path.exists() {
        return Ok(Config::default());
    }
    Ok(config::load_config_from(&path)?)
}

pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    cfg.active_profile_name(global.profile.as_deref()).to_owned()
}

/// Build a `HostConfig` from the config file, profile, and CLI overrides.
///
/// With no matching profile, `--url` alone is enough; the token then
/// comes from `--token`, the environment or the keyring.
pub fn build_host_config(global: &GlobalOpts, cfg: &Config) -> Result<HostConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut profile = match (cfg.profiles.get(&profile_name), &global.url) {
        (Some(profile), _) => profile.clone(),
        (None, Some(url)) => Profile {
            url: url.clone(),
            ..Profile::default()
        },
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_file(global).display().to_string(),
            });
        }
    };

    if let Some(url) = &global.url {
        profile.url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let url = config::parse_host_url(&profile.url)?;
    let token = match &global.token {
        Some(token) => SecretString::from(token.clone()),
        None => config::resolve_token(&profile, &profile_name)?,
    };

    let mut defaults = cfg.defaults.clone();
    defaults.strict_models |= global.strict;
    Ok(config::host_config(url, token, &profile, &defaults))
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}
