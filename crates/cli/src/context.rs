//! Application context - wires the engine together from CLI options

use std::path::PathBuf;
use std::sync::Arc;

use guardscreen_engine::{
    EngineConfig, JsonlAuditLog, ScreeningEngine, ScreeningMode, Settings,
};
use guardscreen_probes::{MockSourceProbe, ProbeSet, RandomizedProbe};

/// Options gathered from global CLI flags
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub config: Option<PathBuf>,
    pub credits: Option<i64>,
    pub mode: Option<ScreeningMode>,
    pub audit_log: Option<PathBuf>,
    pub secret: Option<String>,
    pub seed: Option<u64>,
}

/// Application context
pub struct AppContext {
    pub engine: ScreeningEngine,
    pub config: EngineConfig,
}

impl AppContext {
    pub async fn new(options: ContextOptions) -> Result<Self, anyhow::Error> {
        let config = match &options.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };

        let defaults = Settings::default();
        let settings = Settings {
            api_key_secret: options.secret.clone().unwrap_or_default(),
            credit_balance: options.credits.unwrap_or(defaults.credit_balance),
            mode: options.mode.unwrap_or(defaults.mode),
            ..defaults
        };

        let mut builder = ScreeningEngine::builder()
            .with_config(config.clone())
            .with_settings(settings);

        if let Some(seed) = options.seed {
            let multi = MockSourceProbe::default_sources(seed)
                .into_iter()
                .fold(ProbeSet::new(), |set, probe| set.with_probe(Arc::new(probe)));
            builder = builder
                .with_multi_source(multi)
                .with_single_source(Arc::new(RandomizedProbe::new().with_seed(seed)));
        }

        if let Some(path) = &options.audit_log {
            builder = builder.with_audit(Arc::new(JsonlAuditLog::new(path)?));
            tracing::debug!(path = %path.display(), "Audit log opened");
        }

        Ok(Self {
            engine: builder.build().await?,
            config,
        })
    }
}
