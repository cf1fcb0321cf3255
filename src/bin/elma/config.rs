//! Parse the tool's configuration file.
use super::{anchor_error, as_io_error, LocatedError};

use std::io;
use std::path::Path;

use toml::Value;

const DEFAULT_CONFIG: &str = "elma.toml";

/// Full configuration, every table optional.
#[derive(Default, Debug)]
pub struct Config {
    pub output: Output,
}

/// The `[output]` table.
#[derive(Default, Debug)]
pub struct Output {
    pub format: Format,
    /// A `tinytemplate` replacing the text summary of `info`.
    pub template: Option<String>,
}

/// How results are printed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Format {
    Text,
    Json,
}

impl Default for Format {
    fn default() -> Self {
        Format::Text
    }
}

impl Config {
    /// Read an explicitly named file, or `elma.toml` when it exists.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, LocatedError> {
        let data = match path {
            Some(path) => std::fs::read_to_string(path).map_err(anchor_error())?,
            None => match std::fs::read_to_string(DEFAULT_CONFIG) {
                Ok(data) => data,
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
                Err(err) => return Err(anchor_error()(err)),
            },
        };

        Config::from_str(&data)
    }

    pub(crate) fn from_str(data: &str) -> Result<Self, LocatedError> {
        let toml: Value = toml::from_str(data)
            .map_err(as_io_error)
            .map_err(anchor_error())?;

        let mut config = Config::default();
        if let Some(output) = toml.get("output") {
            config.output = Output::from_value(output)?;
        }

        tracing::debug!("configuration: {:?}", config);
        Ok(config)
    }
}

impl Output {
    pub(crate) fn from_value(val: &Value) -> Result<Self, LocatedError> {
        let mut table = val
            .as_table()
            .ok_or_else(|| {
                let err = io::Error::new(io::ErrorKind::Other, "Expected an [output] table");
                anchor_error()(err)
            })?
            .clone();

        let mut output = Output::default();

        if let Some(format) = table.remove("format") {
            match format.as_str() {
                Some("text") => output.format = Format::Text,
                Some("json") => output.format = Format::Json,
                _ => {
                    let err = io::Error::new(
                        io::ErrorKind::Other,
                        "Bad value for `format`, expected \"text\" or \"json\"",
                    );
                    return Err(anchor_error()(err));
                }
            }
        }

        if let Some(template) = table.remove("template") {
            if let Some(template) = template.as_str() {
                output.template = Some(template.to_string());
            } else {
                let err = io::Error::new(
                    io::ErrorKind::Other,
                    "Bad value for `template`, expected string",
                );
                return Err(anchor_error()(err));
            }
        }

        for key in table.keys() {
            tracing::warn!("ignoring unknown key `output.{}`", key);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.output.format, Format::Text);
        assert!(config.output.template.is_none());
    }

    #[test]
    fn output_table() {
        let config = Config::from_str(
            r#"
[output]
format = "json"
template = "{file}"
"#,
        )
        .unwrap();
        assert_eq!(config.output.format, Format::Json);
        assert_eq!(config.output.template.as_deref(), Some("{file}"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Config::from_str("[output]\nformat = \"xml\"").is_err());
        assert!(Config::from_str("output = 3").is_err());
    }
}
