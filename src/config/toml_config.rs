use crate::adapters::{FileSource, MemoryStore, SpreadsheetSource, SqliteStore};
use crate::core::importer::ImportOptions;
use crate::domain::ports::{BankSource, DocumentStore};
use crate::utils::error::{BankError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const BACKENDS: [&str; 2] = ["sqlite", "memory"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-request deadline handed to every repository call.
    pub request_timeout_secs: u64,
    pub cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite` or `memory`.
    pub backend: String,
    pub path: String,
}

/// Where the bank spreadsheet comes from. The first of `csv_path`, `source_url`
/// and `spreadsheet_id` that is set wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub enabled: bool,
    pub spreadsheet_id: Option<String>,
    pub source_url: Option<String>,
    pub csv_path: Option<String>,
    /// HTTP timeout for the download.
    pub timeout_secs: u64,
    /// Deadline for the drop-and-reinsert.
    pub deadline_secs: u64,
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 5,
            cors: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: "swift_codes.db".to_string(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spreadsheet_id: None,
            source_url: None,
            csv_path: None,
            timeout_secs: 10,
            deadline_secs: 300,
            strict: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BankError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BankError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            deadline: Duration::from_secs(self.import.deadline_secs),
            strict: self.import.strict,
        }
    }

    pub fn build_store(&self) -> Result<Arc<dyn DocumentStore>> {
        match self.database.backend.as_str() {
            "memory" => {
                tracing::warn!("⚠️ Using in-memory store, data is lost on shutdown");
                Ok(Arc::new(MemoryStore::new()))
            }
            "sqlite" => {
                tracing::info!("🗄️ Opening SQLite store at {}", self.database.path);
                let store = SqliteStore::open(&self.database.path)
                    .map_err(|e| BankError::database("open", e))?;
                Ok(Arc::new(store))
            }
            other => Err(BankError::InvalidConfigValueError {
                field: "database.backend".to_string(),
                value: other.to_string(),
                reason: format!("Expected one of: {}", BACKENDS.join(", ")),
            }),
        }
    }

    /// `None` when no source is configured.
    pub fn build_source(&self) -> Result<Option<Box<dyn BankSource>>> {
        let timeout = Duration::from_secs(self.import.timeout_secs);

        if let Some(path) = &self.import.csv_path {
            return Ok(Some(Box::new(FileSource::new(path))));
        }
        if let Some(url) = &self.import.source_url {
            return Ok(Some(Box::new(SpreadsheetSource::new(url.clone(), timeout)?)));
        }
        if let Some(id) = &self.import.spreadsheet_id {
            return Ok(Some(Box::new(SpreadsheetSource::google_sheet(id, timeout)?)));
        }
        Ok(None)
    }
}

/// 替換環境變數 (例如 ${SPREADSHEET_ID})；未設定的變數保持原樣
fn substitute_env_vars(content: &str) -> String {
    static ENV_VAR: OnceLock<regex::Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| {
        regex::Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
    });

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_resolved("server.host", &self.server.host)?;
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_range("server.port", self.server.port, 1, u16::MAX)?;
        validation::validate_positive_number(
            "server.request_timeout_secs",
            self.server.request_timeout_secs,
            1,
        )?;

        validation::validate_one_of("database.backend", &self.database.backend, &BACKENDS)?;
        if self.database.backend == "sqlite" {
            validation::validate_resolved("database.path", &self.database.path)?;
            validation::validate_path("database.path", &self.database.path)?;
        }

        validation::validate_positive_number("import.timeout_secs", self.import.timeout_secs, 1)?;
        validation::validate_positive_number("import.deadline_secs", self.import.deadline_secs, 1)?;
        if let Some(url) = &self.import.source_url {
            validation::validate_resolved("import.source_url", url)?;
            validation::validate_url("import.source_url", url)?;
        }
        if let Some(id) = &self.import.spreadsheet_id {
            validation::validate_resolved("import.spreadsheet_id", id)?;
            validation::validate_non_empty_string("import.spreadsheet_id", id)?;
        }
        if let Some(path) = &self.import.csv_path {
            validation::validate_resolved("import.csv_path", path)?;
            validation::validate_path("import.csv_path", path)?;
        }

        validation::validate_one_of("logging.level", &self.logging.level, &LOG_LEVELS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 9090
request_timeout_secs = 3
cors = true

[database]
backend = "memory"

[import]
spreadsheet_id = "1iFFqsu_xruvVKzXAadAAlDBpIuU51v-pfIEU5HeGa8w"
strict = true

[logging]
level = "debug"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert!(config.server.cors);
        assert_eq!(config.database.backend, "memory");
        assert_eq!(config.database.path, "swift_codes.db");
        assert!(config.import.enabled);
        assert_eq!(config.import.deadline_secs, 300);
        assert!(config.import_options().strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SWIFT_TEST_SHEET_ID", "sheet-from-env");

        let toml_content = r#"
[import]
spreadsheet_id = "${SWIFT_TEST_SHEET_ID}"
source_url = "${SWIFT_TEST_UNSET_VAR}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.import.spreadsheet_id.as_deref(), Some("sheet-from-env"));
        assert_eq!(config.import.source_url.as_deref(), Some("${SWIFT_TEST_UNSET_VAR}"));

        std::env::remove_var("SWIFT_TEST_SHEET_ID");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        std::env::remove_var("SWIFT_TEST_MISSING_SHEET_ID");
        let config = AppConfig::from_toml_str(
            "[import]\nspreadsheet_id = \"${SWIFT_TEST_MISSING_SHEET_ID}\"\n",
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, BankError::ConfigError { .. }));
        assert!(err.to_string().contains("SWIFT_TEST_MISSING_SHEET_ID"));
    }

    #[test]
    fn test_config_validation() {
        let bad_backend = AppConfig::from_toml_str("[database]\nbackend = \"mongo\"\n").unwrap();
        assert!(matches!(
            bad_backend.validate(),
            Err(BankError::InvalidConfigValueError { .. })
        ));

        let bad_url = AppConfig::from_toml_str("[import]\nsource_url = \"not a url\"\n").unwrap();
        assert!(bad_url.validate().is_err());

        let zero_timeout =
            AppConfig::from_toml_str("[server]\nrequest_timeout_secs = 0\n").unwrap();
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, BankError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 3000\n[database]\nbackend = \"memory\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_source_selection() {
        let mut config = AppConfig::default();
        assert!(config.build_source().unwrap().is_none());

        config.import.spreadsheet_id = Some("abc".to_string());
        let source = config.build_source().unwrap().unwrap();
        assert!(source.describe().contains("/abc/export?format=csv"));

        config.import.csv_path = Some("banks.csv".to_string());
        let source = config.build_source().unwrap().unwrap();
        assert_eq!(source.describe(), "file banks.csv");
    }

    #[tokio::test]
    async fn test_build_memory_store() {
        let mut config = AppConfig::default();
        config.database.backend = "memory".to_string();
        let store = config.build_store().unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
