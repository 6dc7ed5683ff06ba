use std::path::{Path, PathBuf};

use serde::Deserialize;
use services::{SurveyConfig, WriteMode};
use storage::sheets::{ServiceAccountKey, SheetsConfig};
use survey_core::model::ImageOrder;
use thiserror::Error;

pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";
pub const DEFAULT_COOKIE_PATH: &str = "survey-cookies.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{flag} requires a value")]
    MissingValue { flag: &'static str },
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    #[error("cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("invalid secrets file {path}: {message}")]
    Secrets { path: PathBuf, message: String },
    #[error("invalid {name} value: {raw}")]
    Invalid { name: &'static str, raw: String },
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// `secrets.toml` contents. Every key is optional here; requirements are
/// checked after all sources are merged.
#[derive(Debug, Default, Deserialize)]
pub struct SecretsFile {
    pub spreadsheet_id: Option<String>,
    pub worksheet: Option<String>,
    pub cookie_password: Option<String>,
    pub gsheets: Option<ServiceAccountKey>,
}

impl SecretsFile {
    /// Read a secrets file. A missing file at the default location is not an
    /// error; an explicitly requested one is.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` or `ConfigError::Secrets`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        };
        toml::from_str(&raw).map_err(|e| ConfigError::Secrets {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Settings supplied by the environment or the command line. Later sources
/// win field by field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub secrets: Option<PathBuf>,
    pub spreadsheet_id: Option<String>,
    pub worksheet: Option<String>,
    pub credentials: Option<PathBuf>,
    pub cookie_password: Option<String>,
    pub cookie_path: Option<PathBuf>,
    pub ledger: Option<String>,
    pub images: Option<PathBuf>,
    pub set_count: Option<String>,
    pub order: Option<String>,
    pub write_mode: Option<String>,
}

impl Overrides {
    /// Collect `SURVEY_*` variables through `lookup`.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            secrets: get("SURVEY_SECRETS").map(PathBuf::from),
            spreadsheet_id: get("SURVEY_SPREADSHEET_ID"),
            worksheet: get("SURVEY_WORKSHEET"),
            credentials: get("SURVEY_CREDENTIALS").map(PathBuf::from),
            cookie_password: get("SURVEY_COOKIE_PASSWORD"),
            cookie_path: get("SURVEY_COOKIE_PATH").map(PathBuf::from),
            ledger: get("SURVEY_LEDGER"),
            images: get("SURVEY_IMAGES").map(PathBuf::from),
            set_count: get("SURVEY_SET_COUNT"),
            order: get("SURVEY_ORDER"),
            write_mode: get("SURVEY_WRITE_MODE"),
        }
    }

    /// Parse command-line flags.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingValue` or `ConfigError::UnknownArg`.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self, ConfigError> {
        let mut args = args.into_iter();
        let mut out = Self::default();
        while let Some(arg) = args.next() {
            let mut value = |flag: &'static str| {
                args.next().ok_or(ConfigError::MissingValue { flag })
            };
            match arg.as_str() {
                "--secrets" => out.secrets = Some(value("--secrets")?.into()),
                "--spreadsheet-id" => out.spreadsheet_id = Some(value("--spreadsheet-id")?),
                "--worksheet" => out.worksheet = Some(value("--worksheet")?),
                "--credentials" => out.credentials = Some(value("--credentials")?.into()),
                "--cookie-password" => out.cookie_password = Some(value("--cookie-password")?),
                "--cookie-path" => out.cookie_path = Some(value("--cookie-path")?.into()),
                "--ledger" => out.ledger = Some(value("--ledger")?),
                "--images" => out.images = Some(value("--images")?.into()),
                "--set-count" => out.set_count = Some(value("--set-count")?),
                "--order" => out.order = Some(value("--order")?),
                "--write-mode" => out.write_mode = Some(value("--write-mode")?),
                _ => return Err(ConfigError::UnknownArg(arg)),
            }
        }
        Ok(out)
    }

    #[must_use]
    pub fn merge(self, higher: Self) -> Self {
        Self {
            secrets: higher.secrets.or(self.secrets),
            spreadsheet_id: higher.spreadsheet_id.or(self.spreadsheet_id),
            worksheet: higher.worksheet.or(self.worksheet),
            credentials: higher.credentials.or(self.credentials),
            cookie_password: higher.cookie_password.or(self.cookie_password),
            cookie_path: higher.cookie_path.or(self.cookie_path),
            ledger: higher.ledger.or(self.ledger),
            images: higher.images.or(self.images),
            set_count: higher.set_count.or(self.set_count),
            order: higher.order.or(self.order),
            write_mode: higher.write_mode.or(self.write_mode),
        }
    }
}

/// Where ratings are written.
#[derive(Debug, Clone)]
pub enum LedgerBackend {
    Sheets {
        config: SheetsConfig,
        key: ServiceAccountKey,
    },
    Sqlite {
        url: String,
    },
}

/// Fully resolved startup configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ledger: LedgerBackend,
    pub cookie_password: String,
    pub cookie_path: PathBuf,
    pub survey: SurveyConfig,
}

impl AppConfig {
    /// Merge the secrets file with overrides and check required settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing cookie password, a Sheets ledger
    /// without a spreadsheet id or credentials, or unparseable values.
    pub fn resolve(secrets: SecretsFile, overrides: Overrides) -> Result<Self, ConfigError> {
        let cookie_password = overrides
            .cookie_password
            .or(secrets.cookie_password)
            .filter(|pw| !pw.trim().is_empty())
            .ok_or(ConfigError::Missing("cookie password"))?;

        let ledger = match overrides.ledger.as_deref().map(str::trim) {
            None | Some("sheets") => {
                let spreadsheet_id = overrides
                    .spreadsheet_id
                    .or(secrets.spreadsheet_id)
                    .filter(|id| !id.trim().is_empty())
                    .ok_or(ConfigError::Missing("spreadsheet id"))?;
                let key = match overrides.credentials {
                    Some(path) => read_credentials(&path)?,
                    None => secrets
                        .gsheets
                        .ok_or(ConfigError::Missing("service-account credentials"))?,
                };
                let mut config = SheetsConfig::new(spreadsheet_id);
                if let Some(worksheet) = overrides.worksheet.or(secrets.worksheet) {
                    config = config.with_worksheet(worksheet);
                }
                LedgerBackend::Sheets { config, key }
            }
            Some(raw) if raw.starts_with("sqlite:") => LedgerBackend::Sqlite {
                url: normalize_sqlite_url(raw),
            },
            Some(raw) => {
                return Err(ConfigError::Invalid {
                    name: "ledger",
                    raw: raw.to_string(),
                });
            }
        };

        let mut survey = SurveyConfig::default();
        if let Some(images) = overrides.images {
            survey.images_root = images;
        }
        if let Some(raw) = overrides.set_count {
            survey.set_count = raw
                .trim()
                .parse()
                .ok()
                .filter(|n: &u32| *n >= 1)
                .ok_or(ConfigError::Invalid {
                    name: "set count",
                    raw,
                })?;
        }
        if let Some(raw) = overrides.order {
            survey.order =
                ImageOrder::parse(&raw).ok_or(ConfigError::Invalid { name: "order", raw })?;
        }
        if let Some(raw) = overrides.write_mode {
            survey.write_mode = WriteMode::parse(&raw).ok_or(ConfigError::Invalid {
                name: "write mode",
                raw,
            })?;
        }

        Ok(Self {
            ledger,
            cookie_password,
            cookie_path: overrides
                .cookie_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIE_PATH)),
            survey,
        })
    }
}

fn read_credentials(path: &Path) -> Result<ServiceAccountKey, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    ServiceAccountKey::from_json(&raw).map_err(|e| ConfigError::Secrets {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Turn `sqlite:relative/path` into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw.to_string();
    }

    let path_str = raw.strip_prefix("sqlite:").unwrap_or(raw);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its directory) so `SQLite` can open it.
///
/// # Errors
///
/// Returns `ConfigError` if the URL has no path or the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || ConfigError::Invalid {
        name: "ledger",
        raw: db_url.to_string(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    let io_err = |e: std::io::Error| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;
    }
    Ok(())
}
