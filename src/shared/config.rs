//! Application configuration. Model artifact, dataset override, output paths.

use serde::Deserialize;

/// Default location of the frozen ONNX model.
pub const DEFAULT_MODEL_PATH: &str = "./models/house_price_model.onnx";

/// Default number of timed predictions for the diagnostics action.
pub const DEFAULT_DIAGNOSTICS_RUNS: usize = 10;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Path to the ONNX artifact. Read from PROPVAL_MODEL_PATH.
    #[serde(default)]
    pub model_path: Option<String>,

    /// Location dataset (JSON) replacing the embedded one. Read from PROPVAL_CATALOG_PATH.
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Start loading the model in the background at startup (default true).
    /// Read from PROPVAL_PRELOAD_MODEL.
    #[serde(default)]
    pub preload_model: Option<bool>,

    /// Display currency code (default "TND"). Read from PROPVAL_CURRENCY.
    #[serde(default)]
    pub currency: Option<String>,

    /// Directory for batch valuation results (default "./reports"). Read from PROPVAL_REPORTS_DIR.
    #[serde(default)]
    pub reports_dir: Option<String>,

    /// Predictions timed by the diagnostics action. Read from PROPVAL_DIAGNOSTICS_RUNS.
    #[serde(default)]
    pub diagnostics_runs: Option<usize>,
}

impl AppConfig {
    /// Reads `PROPVAL_*` variables and the file named by `PROPVAL_CONFIG`.
    /// Expects `.env` to be loaded already (main does it before tracing init).
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(std::env::var("PROPVAL_CONFIG").ok().as_deref())
    }

    /// Environment variables win over the file.
    pub fn load_with(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        if let Some(path) = file {
            c = c.add_source(config::File::with_name(path));
        }
        c = c.add_source(config::Environment::with_prefix("PROPVAL").try_parsing(true));
        c.build()?.try_deserialize()
    }

    pub fn model_path_or_default(&self) -> String {
        self.model_path
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
    }

    pub fn preload_model_or_default(&self) -> bool {
        self.preload_model.unwrap_or(true)
    }

    pub fn currency_or_default(&self) -> String {
        self.currency.clone().unwrap_or_else(|| "TND".to_string())
    }

    pub fn reports_dir_or_default(&self) -> String {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| "./reports".to_string())
    }

    /// Returns diagnostics run count. Zero is treated as unset.
    pub fn diagnostics_runs_or_default(&self) -> usize {
        match self.diagnostics_runs {
            Some(0) | None => DEFAULT_DIAGNOSTICS_RUNS,
            Some(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.model_path_or_default(), DEFAULT_MODEL_PATH);
        assert!(cfg.preload_model_or_default());
        assert_eq!(cfg.currency_or_default(), "TND");
        assert_eq!(cfg.reports_dir_or_default(), "./reports");
        assert_eq!(cfg.diagnostics_runs_or_default(), 10);
        assert!(cfg.catalog_path.is_none());
    }

    #[test]
    fn explicit_values_win() {
        let cfg = AppConfig {
            model_path: Some("/opt/model.onnx".into()),
            preload_model: Some(false),
            currency: Some("EUR".into()),
            diagnostics_runs: Some(0),
            ..AppConfig::default()
        };
        assert_eq!(cfg.model_path_or_default(), "/opt/model.onnx");
        assert!(!cfg.preload_model_or_default());
        assert_eq!(cfg.currency_or_default(), "EUR");
        assert_eq!(cfg.diagnostics_runs_or_default(), 10);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(AppConfig::load_with(Some("/does/not/exist/propval")).is_err());
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("propval.toml");
        std::fs::write(&path, "model_path = \"m.onnx\"\ndiagnostics_runs = 3\n").unwrap();

        let cfg = AppConfig::load_with(path.to_str()).unwrap();
        assert_eq!(cfg.model_path_or_default(), "m.onnx");
        assert_eq!(cfg.diagnostics_runs_or_default(), 3);
    }
}
