//! Common types shared across CLI commands

use clap::ValueEnum;

/// Serialization format of the graph dump
#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq, Default)]
#[value(rename_all = "lower")]
pub enum OutputFormat {
    /// YAML document
    #[default]
    Yaml,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    /// File extension used when no output path is given.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }
}
