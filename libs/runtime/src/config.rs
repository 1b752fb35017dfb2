use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::paths::resolve_home_dir;

/// Fallback home directory under the user's home when `server.home_dir` is empty.
const HOME_SUBDIR: &str = ".users-service";
/// Logging section that applies to targets without a section of their own.
const DEFAULT_SECTION: &str = "default";
/// Env overrides look like `APP__SERVER__PORT=9000`.
const ENV_PREFIX: &str = "APP__";

/// Top-level config file: typed `server` and `logging` sections plus one
/// free-form section per module under `modules`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// `None` means the file had no `logging` section.
    pub logging: Option<LoggingConfig>,
    /// Keyed by module name; each module parses its own section.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Absolute after loading; empty selects `~/.users-service`.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Per-request handler timeout; 0 means the ingress default.
    #[serde(default)]
    pub timeout_sec: u64,
    #[serde(default)]
    pub cors_enabled: bool,
}

/// Subsystem (tracing target prefix) to sink settings. `default` covers every
/// target without a section of its own.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    /// trace | debug | info | warn | error | off
    pub console_level: String,
    /// Relative to `home_dir`; empty means no file sink.
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    /// Rotated files kept on disk
    #[serde(default)]
    pub max_backups: Option<usize>,
    /// Size threshold in MB that triggers rotation
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".into(),
            port: 8087,
            timeout_sec: 0,
            cors_enabled: false,
        }
    }
}

/// Console at info, debug-level JSON file under `logs/`.
pub fn default_logging_config() -> LoggingConfig {
    let section = Section {
        console_level: "info".into(),
        file: "logs/users-service.log".into(),
        file_level: "debug".into(),
        max_backups: Some(3),
        max_size_mb: Some(100),
    };
    LoggingConfig::from([(DEFAULT_SECTION.to_string(), section)])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: Some(default_logging_config()),
            ..Self::bare()
        }
    }
}

impl AppConfig {
    /// Server defaults only; optional sections stay empty so a file without
    /// them extracts as `None`.
    fn bare() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: None,
            modules: HashMap::new(),
        }
    }

    /// Built-in defaults, overlaid by the YAML file, overlaid by `APP__*` env vars.
    /// The file must exist. `server.home_dir` comes back absolute and created.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        if !path.is_file() {
            anyhow::bail!("config file not found: {}", path.display());
        }

        let mut config: AppConfig = Figment::from(Serialized::defaults(Self::bare()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to parse yaml config {}", path.display()))?;

        config.resolve_home_dir()?;
        Ok(config)
    }

    /// `load_layered` when a path is given, built-in defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_layered(path);
        }
        let mut config = Self::default();
        config.resolve_home_dir()?;
        Ok(config)
    }

    /// Make `server.home_dir` absolute and create it.
    fn resolve_home_dir(&mut self) -> Result<()> {
        let configured = Some(self.server.home_dir.trim())
            .filter(|dir| !dir.is_empty())
            .map(str::to_owned);
        let dir = resolve_home_dir(configured, HOME_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        self.server.home_dir = dir.to_string_lossy().into_owned();
        Ok(())
    }

    /// Render for `--print-config` and `check`.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Config section of a module, if present.
    pub fn module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.modules.get(module_name)
    }

    /// `host:port` the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// `--port` replaces `server.port`; `-v`/`-vv` raise the default console level.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let sections = self.logging.get_or_insert_with(default_logging_config);
        let level = match args.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        if let Some(section) = sections.get_mut(DEFAULT_SECTION) {
            section.console_level = level.into();
        }
    }
}

/// Flags the binary hands down to the config layer.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Write `body` to `<tmp>/app.yaml`, with `{home}` replaced by a dir inside `tmp`.
    fn write_yaml(tmp: &TempDir, body: &str) -> PathBuf {
        let home = tmp.path().join("home").to_string_lossy().replace('\\', "/");
        let path = tmp.path().join("app.yaml");
        std::fs::write(&path, body.replace("{home}", &home)).unwrap();
        path
    }

    fn console_level(config: &AppConfig) -> &str {
        &config.logging.as_ref().unwrap()[DEFAULT_SECTION].console_level
    }

    #[test]
    fn defaults_bind_loopback_8087() {
        let config = AppConfig::default();

        assert_eq!(config.bind_addr(), "127.0.0.1:8087");
        assert!(config.server.home_dir.is_empty());
        assert_eq!(config.server.timeout_sec, 0);
        assert!(!config.server.cors_enabled);
        assert_eq!(console_level(&config), "info");
        assert!(config.module_config("users_info").is_none());
    }

    #[test]
    fn layered_load_reads_every_section() {
        let tmp = TempDir::new().unwrap();
        let path = write_yaml(
            &tmp,
            r#"
server:
  home_dir: "{home}"
  host: "0.0.0.0"
  port: 9090
  timeout_sec: 15
  cors_enabled: true
logging:
  default:
    console_level: warn
    file: "logs/all.log"
  users_info:
    console_level: trace
modules:
  users_info:
    max_name_length: 80
"#,
        );

        let config = AppConfig::load_layered(&path).unwrap();

        let home = tmp.path().join("home");
        assert_eq!(PathBuf::from(&config.server.home_dir), home);
        assert!(home.is_dir());
        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
        assert_eq!(config.server.timeout_sec, 15);
        assert!(config.server.cors_enabled);
        assert_eq!(console_level(&config), "warn");
        assert_eq!(
            config.logging.as_ref().unwrap()["users_info"].console_level,
            "trace"
        );
        assert_eq!(config.module_config("users_info").unwrap()["max_name_length"], 80);
    }

    #[test]
    fn server_only_file_leaves_optional_sections_empty() {
        let tmp = TempDir::new().unwrap();
        let path = write_yaml(
            &tmp,
            "server:\n  home_dir: \"{home}\"\n  host: \"localhost\"\n  port: 8080\n",
        );

        let config = AppConfig::load_layered(&path).unwrap();

        assert!(PathBuf::from(&config.server.home_dir).is_absolute());
        assert_eq!(config.bind_addr(), "localhost:8080");
        assert_eq!(config.server.timeout_sec, 0);
        assert!(config.logging.is_none());
        assert!(config.modules.is_empty());
    }

    #[test]
    fn missing_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let err = AppConfig::load_layered(tmp.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn unknown_server_key_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_yaml(
            &tmp,
            "server:\n  home_dir: \"{home}\"\n  host: \"localhost\"\n  port: 8080\n  database_url: \"x\"\n",
        );
        assert!(AppConfig::load_layered(&path).is_err());
    }

    #[test]
    fn port_and_verbosity_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(&CliArgs {
            port: Some(3000),
            verbose: 2,
            ..Default::default()
        });

        assert_eq!(config.server.port, 3000);
        assert_eq!(console_level(&config), "trace");
    }

    #[test]
    fn verbosity_count_maps_to_console_level() {
        for (verbose, expected) in [(0, "info"), (1, "debug"), (2, "trace"), (5, "trace")] {
            let mut config = AppConfig::default();
            config.apply_cli_overrides(&CliArgs {
                verbose,
                ..Default::default()
            });
            assert_eq!(console_level(&config), expected, "verbose = {verbose}");
        }
    }

    #[test]
    fn verbosity_creates_logging_section_when_absent() {
        let mut config = AppConfig::bare();
        config.apply_cli_overrides(&CliArgs {
            verbose: 1,
            ..Default::default()
        });
        assert_eq!(console_level(&config), "debug");
    }

    #[test]
    fn yaml_dump_parses_back() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("server:"));

        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.bind_addr(), config.bind_addr());
        assert_eq!(console_level(&parsed), "info");
    }

    #[test]
    fn server_section_requires_host() {
        let parsed: Result<AppConfig, _> =
            serde_yaml::from_str("server:\n  home_dir: \"/tmp/x\"\n  port: 8087\n");
        assert!(parsed.is_err());
    }
}
