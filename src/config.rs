//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Key the services accept without registration, at a low rate limit.
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "SPACEFETCH_API_KEY";

const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=3600;

/// File configuration for spacefetch defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// API key sent with every request.
    pub api_key: Option<String>,
    /// Root folder for saved images.
    pub output_dir: Option<PathBuf>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/spacefetch/config.toml`
/// 2. `$HOME/.config/spacefetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("spacefetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("spacefetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path, or defaults when no file exists.
pub fn load_default_file_config() -> Result<FileConfig> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "api_key" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `api_key` value on line {line_number}"))?;
                if parsed.trim().is_empty() {
                    bail!("Invalid `api_key` value on line {line_number}: must not be empty");
                }
                cfg.api_key = Some(parsed);
            }
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `output_dir` value on line {line_number}")
                })?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_timeout(key, value, line_number)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_timeout(key, value, line_number)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    Ok(cfg)
}

fn parse_timeout(key: &str, value: &str, line_number: usize) -> Result<u64> {
    let parsed = parse_integer_u64(value)
        .with_context(|| format!("Invalid `{key}` value on line {line_number}"))?;
    if !TIMEOUT_RANGE.contains(&parsed) {
        bail!(
            "Invalid config value for `{key}` on line {line_number}: {parsed}. Expected range: 1..=3600"
        );
    }
    Ok(parsed)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

/// Picks the API key: CLI flag, then environment, then file, then [`DEMO_API_KEY`].
#[must_use]
pub fn resolve_api_key(cli: Option<&str>, file: &FileConfig) -> String {
    let from_env = env::var(API_KEY_ENV).ok();
    choose_api_key(cli, from_env.as_deref(), file.api_key.as_deref())
}

fn choose_api_key(cli: Option<&str>, env_value: Option<&str>, file_value: Option<&str>) -> String {
    [cli, env_value, file_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .unwrap_or(DEMO_API_KEY)
        .to_string()
}
