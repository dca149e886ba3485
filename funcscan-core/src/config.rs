//! Configuration file support for funcscan
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.funcscanrc.json` in the scan root
//! 3. `funcscan.config.json` in the scan root
//! 4. `"funcscan"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::extract::FunctionOrder;
use anyhow::{Context, Result};
use globset::GlobBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inference service used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

/// Report destination used when nothing else is configured
pub const DEFAULT_OUTPUT: &str = "result.json";

const RC_FILE: &str = ".funcscanrc.json";
const CONFIG_FILE: &str = "funcscan.config.json";
const PACKAGE_JSON: &str = "package.json";
const PACKAGE_KEY: &str = "funcscan";

/// funcscan configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FuncscanConfig {
    /// Extra glob patterns for files to exclude, on top of the built-ins
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Report destination (default: result.json)
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Inference service URL (default: http://localhost:5000)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Local inference program and its arguments, used instead of the service
    #[serde(default)]
    pub command: Option<Vec<String>>,

    /// Dispatch timeout in seconds (default: none)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Sort each file's functions by start line (default: true)
    #[serde(default)]
    pub sort_by_line: Option<bool>,
}

/// Where the persisted report is handed off
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceTarget {
    Http { endpoint: String },
    Command { program: String, args: Vec<String> },
}

impl Default for InferenceTarget {
    fn default() -> Self {
        InferenceTarget::Http {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Resolved configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Extra exclude globs
    pub exclude: Vec<String>,
    pub output: PathBuf,
    pub inference: InferenceTarget,
    pub timeout: Option<Duration>,
    pub order: FunctionOrder,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl FuncscanConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.exclude {
            GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        if let Some(ref endpoint) = self.endpoint {
            validate_endpoint(endpoint)?;
        }

        if let Some(ref command) = self.command {
            match command.first() {
                None => anyhow::bail!("command must name a program"),
                Some(program) if program.trim().is_empty() => {
                    anyhow::bail!("command program must not be blank")
                }
                Some(_) => {}
            }
        }

        if self.endpoint.is_some() && self.command.is_some() {
            anyhow::bail!("endpoint and command are mutually exclusive");
        }

        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout_secs must be positive (got 0)");
        }

        if let Some(ref output) = self.output {
            if output.as_os_str().is_empty() {
                anyhow::bail!("output must not be empty");
            }
        }

        Ok(())
    }

    /// Resolve config into the form used by a scan
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let inference = match (&self.endpoint, &self.command) {
            (_, Some(command)) => match command.split_first() {
                Some((program, args)) => InferenceTarget::Command {
                    program: program.clone(),
                    args: args.to_vec(),
                },
                None => anyhow::bail!("command must name a program"),
            },
            (Some(endpoint), None) => InferenceTarget::Http {
                endpoint: endpoint.clone(),
            },
            (None, None) => InferenceTarget::default(),
        };

        let order = if self.sort_by_line.unwrap_or(true) {
            FunctionOrder::SourceLine
        } else {
            FunctionOrder::Traversal
        };

        Ok(ResolvedConfig {
            exclude: self.exclude.clone(),
            output: self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            inference,
            timeout: self.timeout_secs.map(Duration::from_secs),
            order,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        FuncscanConfig::default().resolve()
    }
}

/// Check that an endpoint is an http(s) URL
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = reqwest::Url::parse(endpoint).with_context(|| format!("invalid endpoint: {}", endpoint))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => anyhow::bail!("endpoint must use http or https (got {})", scheme),
    }
}

/// Discover and load a config file from the scan root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(FuncscanConfig, PathBuf)>> {
    for name in [RC_FILE, CONFIG_FILE] {
        let path = project_root.join(name);
        if path.is_file() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    let pkg_path = project_root.join(PACKAGE_JSON);
    if pkg_path.is_file() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<FuncscanConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: FuncscanConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load funcscan config from the "funcscan" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<FuncscanConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get(PACKAGE_KEY) {
        Some(value) => {
            let config: FuncscanConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid funcscan config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid funcscan config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config for a scan
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the scan root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (FuncscanConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    if let Some(ref path) = resolved.config_path {
        tracing::debug!(config = %path.display(), "loaded configuration");
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let resolved = ResolvedConfig::defaults().expect("default config should resolve");
        assert!(resolved.exclude.is_empty());
        assert_eq!(resolved.output, PathBuf::from("result.json"));
        assert_eq!(resolved.inference, InferenceTarget::default());
        assert_eq!(resolved.timeout, None);
        assert_eq!(resolved.order, FunctionOrder::SourceLine);
        assert!(resolved.config_path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "exclude": ["**/generated/**"],
            "output": "reports/functions.json",
            "endpoint": "http://scoring.internal:8080/score",
            "timeout_secs": 30,
            "sort_by_line": false
        }"#;
        let config: FuncscanConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.exclude, vec!["**/generated/**"]);
        assert_eq!(resolved.output, PathBuf::from("reports/functions.json"));
        assert_eq!(
            resolved.inference,
            InferenceTarget::Http {
                endpoint: "http://scoring.internal:8080/score".to_string()
            }
        );
        assert_eq!(resolved.timeout, Some(Duration::from_secs(30)));
        assert_eq!(resolved.order, FunctionOrder::Traversal);
    }

    #[test]
    fn test_command_target() {
        let json = r#"{"command": ["python", "inference.py", "-i", "{input}"]}"#;
        let config: FuncscanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.resolve().unwrap().inference,
            InferenceTarget::Command {
                program: "python".to_string(),
                args: vec!["inference.py".to_string(), "-i".to_string(), "{input}".to_string()],
            }
        );
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<FuncscanConfig, _> = serde_json::from_str(r#"{"unknown_field": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_reject_invalid_values() {
        let cases = [
            r#"{"exclude": ["src/[bad"]}"#,
            r#"{"endpoint": "not a url"}"#,
            r#"{"endpoint": "ftp://host/score"}"#,
            r#"{"command": []}"#,
            r#"{"command": ["  "]}"#,
            r#"{"endpoint": "http://localhost:5000", "command": ["score"]}"#,
            r#"{"timeout_secs": 0}"#,
            r#"{"output": ""}"#,
        ];
        for json in cases {
            let config: FuncscanConfig = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "expected {} to be rejected", json);
        }
    }

    #[test]
    fn test_discover_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "app", "funcscan": {"output": "from-package.json"}}"#,
        )
        .unwrap();
        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.output, Some(PathBuf::from("from-package.json")));
        assert_eq!(path, dir.path().join("package.json"));

        fs::write(dir.path().join("funcscan.config.json"), r#"{"output": "from-config.json"}"#).unwrap();
        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.output, Some(PathBuf::from("from-config.json")));

        fs::write(dir.path().join(".funcscanrc.json"), r#"{"output": "from-rc.json"}"#).unwrap();
        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.output, Some(PathBuf::from("from-rc.json")));
        assert_eq!(path, dir.path().join(".funcscanrc.json"));
    }

    #[test]
    fn test_package_json_without_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "app"}"#).unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_config_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".funcscanrc.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_and_resolve(dir.path(), None).unwrap_err();
        assert!(format!("{:#}", err).contains(".funcscanrc.json"));
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{"sort_by_line": false}"#).unwrap();

        let resolved = load_and_resolve(Path::new("/nonexistent"), Some(&path)).unwrap();
        assert_eq!(resolved.order, FunctionOrder::Traversal);
        assert_eq!(resolved.config_path, Some(path));
    }

    #[test]
    fn test_load_and_resolve_defaults_when_absent() {
        let dir = TempDir::new().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert_eq!(resolved, ResolvedConfig::defaults().unwrap());
    }
}
