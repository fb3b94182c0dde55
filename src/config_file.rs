use crate::cli::{Anchor, Args};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// JSON configuration file. Every key is optional; command-line options win.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub input: Option<String>,
    pub output: Option<String>,
    #[serde(rename = "type")]
    pub output_type: Option<String>,
    pub filters: Option<Vec<String>>,
    pub all_filters: Option<bool>,
    pub params: Option<BTreeMap<String, String>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub water_mark: Option<String>,
    pub water_mark_text: Option<String>,
    pub water_mark_pos: Option<Anchor>,
    pub font: Option<String>,
    pub font_size: Option<u32>,
    pub font_color: Option<String>,
}

impl ConfigFile {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Invalid JSON configuration")
    }
}

impl Args {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config = ConfigFile::from_json(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            let args_from_cli = std::env::args().collect::<Vec<_>>();
            self.merge_from_config(config, &args_from_cli);

            if self.verbose && !self.json {
                println!("Loaded configuration from: {:?}", config_path);
            }
        }
        Ok(())
    }

    /// Fill in values from `config` for every option that `args_from_cli` does not set
    pub fn merge_from_config(&mut self, config: ConfigFile, args_from_cli: &[String]) {
        let given = |short: Option<&str>, long: &str| {
            args_from_cli.iter().any(|a| {
                Some(a.as_str()) == short || a == long || a.starts_with(&format!("{}=", long))
            })
        };

        if self.input.is_none() {
            self.input = config.input.map(PathBuf::from);
        }
        if self.output.is_none() {
            self.output = config.output.map(PathBuf::from);
        }
        if self.output_type.is_none() {
            self.output_type = config.output_type;
        }
        if self.filters.is_empty() {
            if let Some(filters) = config.filters {
                self.filters = filters;
            }
        }
        if !self.all_filters {
            self.all_filters = config.all_filters.unwrap_or(false);
        }

        // Config params first so that -a entries override the same keys
        if let Some(params) = config.params {
            let mut merged: Vec<String> = params
                .into_iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            merged.append(&mut self.params);
            self.params = merged;
        }

        if self.width.is_none() {
            self.width = config.width;
        }
        if self.height.is_none() {
            self.height = config.height;
        }
        if self.water_mark.is_none() {
            self.water_mark = config.water_mark.map(PathBuf::from);
        }
        if self.water_mark_text.is_none() {
            self.water_mark_text = config.water_mark_text;
        }

        if !given(Some("-p"), "--water-mark-pos") {
            if let Some(pos) = config.water_mark_pos {
                self.water_mark_pos = pos;
            }
        }
        if !given(None, "--font") {
            if let Some(font) = config.font {
                self.font = font;
            }
        }
        if !given(None, "--font-size") {
            if let Some(size) = config.font_size {
                self.font_size = size;
            }
        }
        if !given(None, "--font-color") {
            if let Some(color) = config.font_color {
                self.font_color = color;
            }
        }
    }
}
