// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use config::{Config, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub(crate) trait SettingsValidate {
    // returns error if settings are invalid
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Settings for configuring envelope analysis and the tools built on it.
///
/// Settings are plain values handed to [`Analyzer::new`](crate::Analyzer::new);
/// there is no process-wide copy. Any key left out of a configuration source
/// keeps its default.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Deepest envelope level that is analyzed. Content nested below it stops
    /// the analysis with [`Error::TooDeep`].
    pub max_nesting_depth: usize,

    /// `strftime` pattern used when timestamps are rendered for people.
    pub date_format: String,

    /// The `openssl` executable used to unwrap envelope levels.
    pub openssl_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_nesting_depth: 16,
            date_format: "%d/%m/%Y %H:%M:%S".to_string(),
            openssl_path: PathBuf::from("openssl"),
        }
    }
}

impl SettingsValidate for Settings {
    fn validate(&self) -> Result<()> {
        if self.max_nesting_depth == 0 {
            return Err(Error::BadParam(
                "max_nesting_depth must be at least 1".into(),
            ));
        }

        if self.date_format.trim().is_empty() {
            return Err(Error::BadParam("date_format must not be empty".into()));
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::BadParam(format!(
                "date_format \"{}\" is not a valid strftime pattern",
                self.date_format
            )));
        }

        Ok(())
    }
}

impl Settings {
    /// Load [Settings] from a file. The format (json or toml) is taken from
    /// the file extension.
    pub fn from_file<P: AsRef<Path>>(settings_path: P) -> Result<Self> {
        let ext = settings_path
            .as_ref()
            .extension()
            .ok_or(Error::UnsupportedType)?
            .to_string_lossy();

        let setting_buf = std::fs::read(&settings_path).map_err(Error::IoError)?;
        Settings::from_string(&String::from_utf8_lossy(&setting_buf), &ext)
    }

    /// Load [Settings] from a string representation of the configuration.
    /// Format of configuration must be supplied (json or toml).
    pub fn from_string(settings_str: &str, format: &str) -> Result<Self> {
        let f = match format.to_lowercase().as_str() {
            "json" => FileFormat::Json,
            "toml" => FileFormat::Toml,
            _ => return Err(Error::UnsupportedType),
        };

        let config = Config::builder()
            .add_source(config::File::from_str(settings_str, f))
            .build()
            .map_err(|e| Error::BadParam(format!("could not parse configuration: {e}")))?;

        let settings = config
            .try_deserialize::<Settings>()
            .map_err(|e| Error::BadParam(e.to_string()))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Load [Settings] from a TOML string.
    pub fn from_toml(toml: &str) -> Result<Self> {
        Settings::from_string(toml, "toml")
    }

    /// Load [Settings] from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Settings::from_string(json, "json")
    }

    /// Serializes the settings as pretty printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_nesting_depth, 16);
        assert_eq!(settings.date_format, "%d/%m/%Y %H:%M:%S");
        assert_eq!(settings.openssl_path, PathBuf::from("openssl"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml("max_nesting_depth = 3").unwrap();
        assert_eq!(settings.max_nesting_depth, 3);
        assert_eq!(settings.date_format, Settings::default().date_format);
    }

    #[test]
    fn test_json() {
        let settings = Settings::from_json(
            r#"{ "date_format": "%Y-%m-%d", "openssl_path": "/usr/local/bin/openssl" }"#,
        )
        .unwrap();
        assert_eq!(settings.date_format, "%Y-%m-%d");
        assert_eq!(
            settings.openssl_path,
            PathBuf::from("/usr/local/bin/openssl")
        );
        assert_eq!(settings.max_nesting_depth, 16);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            max_nesting_depth: 2,
            ..Default::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Settings::from_toml("max_nesting_depth = 0"),
            Err(Error::BadParam(_))
        ));
        assert!(matches!(
            Settings::from_toml("date_format = \"  \""),
            Err(Error::BadParam(_))
        ));
        assert!(matches!(
            Settings::from_toml("max_nesting_depth = \"deep\""),
            Err(Error::BadParam(_))
        ));
        assert!(matches!(
            Settings::from_toml("date_format = \"%d/%m/%Y %Q\""),
            Err(Error::BadParam(_))
        ));
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            Settings::from_string("max_nesting_depth: 2", "yaml"),
            Err(Error::UnsupportedType)
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_nesting_depth = 5").unwrap();
        writeln!(file, "date_format = \"%d.%m.%Y\"").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.max_nesting_depth, 5);
        assert_eq!(settings.date_format, "%d.%m.%Y");
    }

    #[test]
    fn test_from_file_without_extension() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            Settings::from_file(file.path()),
            Err(Error::UnsupportedType)
        ));
    }
}
