use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::transcript::{MarkerSet, MarkerSetError};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub user_marker: Option<String>,
    pub assistant_marker: Option<String>,
    pub legacy_markers: bool,
    pub rule_width: Option<usize>,
    pub debounce_ms: Option<u64>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            user_marker: other
                .user_marker
                .clone()
                .or_else(|| self.user_marker.clone()),
            assistant_marker: other
                .assistant_marker
                .clone()
                .or_else(|| self.assistant_marker.clone()),
            legacy_markers: self.legacy_markers || other.legacy_markers,
            rule_width: other.rule_width.or(self.rule_width),
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
        }
    }

    /// The marker vocabulary these flags select.
    ///
    /// `--legacy-markers` picks the base pair; explicit literals override
    /// either side of it.
    ///
    /// # Errors
    /// Returns an error if the resulting literals are not a valid pair.
    pub fn markers(&self) -> Result<MarkerSet, MarkerSetError> {
        let base = if self.legacy_markers {
            MarkerSet::legacy()
        } else {
            MarkerSet::default()
        };
        MarkerSet::new(
            self.user_marker.as_deref().unwrap_or(base.user()),
            self.assistant_marker.as_deref().unwrap_or(base.assistant()),
        )
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("turnscript").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("turnscript")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("turnscript").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("turnscript")
                .join("config");
        }
    }

    PathBuf::from(".turnscriptrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".turnscriptrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# turnscript defaults (saved with --save)".to_string());
    if flags.legacy_markers {
        lines.push("--legacy-markers".to_string());
    }
    if let Some(marker) = &flags.user_marker {
        lines.push(format!("--user-marker {marker}"));
    }
    if let Some(marker) = &flags.assistant_marker {
        lines.push(format!("--assistant-marker {marker}"));
    }
    if let Some(width) = flags.rule_width {
        lines.push(format!("--rule-width {width}"));
    }
    if let Some(ms) = flags.debounce_ms {
        lines.push(format!("--debounce-ms {ms}"));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the flags this module knows out of a token list.
///
/// Unknown tokens (the program name, subcommands, file paths) are skipped,
/// so raw `argv` can be passed straight in.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--legacy-markers" {
            flags.legacy_markers = true;
        } else if let Some((value, consumed)) = flag_value(tokens, i, "--user-marker") {
            flags.user_marker = Some(value.to_string());
            i += consumed;
        } else if let Some((value, consumed)) = flag_value(tokens, i, "--assistant-marker") {
            flags.assistant_marker = Some(value.to_string());
            i += consumed;
        } else if let Some((value, consumed)) = flag_value(tokens, i, "--rule-width") {
            flags.rule_width = value.parse().ok();
            i += consumed;
        } else if let Some((value, consumed)) = flag_value(tokens, i, "--debounce-ms") {
            flags.debounce_ms = value.parse().ok();
            i += consumed;
        }
        i += 1;
    }
    flags
}

/// Value of `name` at `tokens[i]`, given as `name value` or `name=value`,
/// with the number of extra tokens it used.
fn flag_value<'a>(tokens: &'a [String], i: usize, name: &str) -> Option<(&'a str, usize)> {
    let token = tokens.get(i)?;
    if token == name {
        return tokens.get(i + 1).map(|next| (next.as_str(), 1));
    }
    token
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('='))
        .map(|value| (value, 0))
}
