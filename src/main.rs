//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; valuation is delegated to ValuationEngine.

use dotenv::dotenv;
use prop_valuator::adapters::catalog::{load_embedded, load_from_path};
use prop_valuator::adapters::model::OnnxModelLoader;
use prop_valuator::adapters::ui::tui::TuiInputPort;
use prop_valuator::ports::{InputPort, ModelLoader};
use prop_valuator::shared::config::AppConfig;
use prop_valuator::usecases::{BatchService, ValuationEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    // Logs go to stderr so they do not tear the prompts on stdout.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "invalid configuration, using defaults");
        AppConfig::default()
    });

    // --- Location catalog (embedded unless overridden) ---
    let catalog = match cfg.catalog_path.as_deref() {
        Some(path) => load_from_path(path).await,
        None => load_embedded(),
    }
    .map_err(|e| anyhow::anyhow!("{}", e))?;
    if catalog.has_placeholder_region_codes() {
        warn!(
            version = catalog.version(),
            "location dataset uses placeholder region codes; estimates will be unreliable. \
             Set PROPVAL_CATALOG_PATH to the dataset the model was trained with"
        );
    }
    let currency = cfg.currency_or_default();
    prop_valuator::adapters::ui::init_ui(&currency, &catalog);
    let catalog = Arc::new(catalog);

    // --- Valuation engine (model loads once, lazily or in the background) ---
    let model_path = cfg.model_path_or_default();
    let loader: Arc<dyn ModelLoader> = Arc::new(OnnxModelLoader::new(&model_path));
    let engine = Arc::new(ValuationEngine::new(loader));

    if cfg.preload_model_or_default() {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if let Err(e) = engine.initialize().await {
                warn!(error = %e, "background model load failed; will retry on first valuation");
            }
        });
    } else {
        info!(path = %model_path, "model preload disabled; loading on first valuation");
    }

    // --- Services ---
    let reports_dir = PathBuf::from(cfg.reports_dir_or_default());
    let batch_service = Arc::new(BatchService::new(
        Arc::clone(&engine),
        Arc::clone(&catalog),
        reports_dir,
    ));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        Arc::clone(&catalog),
        Arc::clone(&engine),
        batch_service,
        currency,
        cfg.diagnostics_runs_or_default(),
    ));

    // --- Run (main menu -> Estimate / Batch / Diagnostics) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
