//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};
use serde::Serialize;

use dockboard_config::{self as config, Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{active_profile_name, config_file, load};
use crate::error::{CliError, prompt_err};
use crate::output;

use super::util;

// ── Show ────────────────────────────────────────────────────────────

/// Profile as displayed: the token itself is never printed.
#[derive(Serialize)]
struct ProfileSummary<'a> {
    name: &'a str,
    url: &'a str,
    token: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_env: Option<&'a str>,
    insecure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
}

#[derive(Serialize)]
struct ConfigSummary<'a> {
    path: String,
    active_profile: String,
    defaults: &'a config::Defaults,
    profiles: Vec<ProfileSummary<'a>>,
}

fn summarize<'a>(cfg: &'a Config, global: &GlobalOpts) -> ConfigSummary<'a> {
    let profiles = cfg
        .profiles
        .iter()
        .map(|(name, p)| ProfileSummary {
            name,
            url: &p.url,
            token: if p.token.is_some() { "(plaintext)" } else { "(env/keyring)" },
            token_env: p.token_env.as_deref(),
            insecure: p.insecure.unwrap_or(false),
            timeout: p.timeout,
        })
        .collect();
    ConfigSummary {
        path: config_file(global).display().to_string(),
        active_profile: active_profile_name(global, cfg),
        defaults: &cfg.defaults,
        profiles,
    }
}

fn detail(summary: &ConfigSummary<'_>) -> String {
    let mut lines = vec![
        format!("Config:   {}", summary.path),
        format!("Active:   {}", summary.active_profile),
        format!(
            "Defaults: output={} color={} timeout={}s strict_models={} show_inactive={}",
            summary.defaults.output,
            summary.defaults.color,
            summary.defaults.timeout,
            summary.defaults.strict_models,
            summary.defaults.show_inactive,
        ),
    ];
    if summary.profiles.is_empty() {
        lines.push("Profiles: (none)".into());
    }
    for p in &summary.profiles {
        let marker = if p.name == summary.active_profile { "*" } else { " " };
        lines.push(format!("{marker} {:<12} {}  token {}", p.name, p.url, p.token));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let path = config_file(global);
            eprintln!("dockboard configuration wizard");
            eprintln!("   Config path: {}\n", path.display());

            if path.exists() && !util::confirm("Config file exists. Add a profile to it?", global.yes)? {
                return Ok(());
            }
            let mut cfg = load(global)?;

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(global.profile.clone().unwrap_or_else(|| "default".into()))
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Home Assistant URL")
                .default(global.url.clone().unwrap_or_else(|| "http://homeassistant.local:8123".into()))
                .validate_with(|input: &String| config::parse_host_url(input).map(|_| ()).map_err(|e| e.to_string()))
                .interact_text()
                .map_err(prompt_err)?;

            let token = Password::new()
                .with_prompt("Long-lived access token")
                .interact()
                .map_err(prompt_err)?;
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "access token cannot be empty".into(),
                });
            }

            let store_choices = &["Store in system keyring (recommended)", "Save to config file (plaintext)"];
            let store_selection = Select::new()
                .with_prompt("Where to store the token?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let plaintext = if store_selection == 0 {
                config::store_token(&profile_name, &token)?;
                eprintln!("   ✓ Token stored in system keyring");
                None
            } else {
                Some(token)
            };

            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    url,
                    token: plaintext,
                    insecure: global.insecure.then_some(true),
                    ..Profile::default()
                },
            );
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }

            config::save_config_to(&cfg, &path)?;
            output::print_success(&format!("Configuration written to {}", path.display()), global.color(), false);
            eprintln!("  Active profile: {}", cfg.active_profile_name(None));
            eprintln!("\n  Try it: dockboard containers list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = load(global)?;
            let summary = summarize(&cfg, global);
            let out = output::render_single(global.output(), &summary, detail, |s| s.active_profile.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set token ───────────────────────────────────────────────
        ConfigCommand::SetToken => {
            let cfg = load(global)?;
            let profile_name = active_profile_name(global, &cfg);

            let token = match &global.token {
                Some(token) => token.clone(),
                None => Password::new()
                    .with_prompt(format!("Access token for '{profile_name}'"))
                    .interact()
                    .map_err(prompt_err)?,
            };
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "access token cannot be empty".into(),
                });
            }

            config::store_token(&profile_name, &token)?;
            output::print_success(
                &format!("Token stored in system keyring for profile '{profile_name}'"),
                global.color(),
                global.quiet,
            );
            Ok(())
        }
    }
}
