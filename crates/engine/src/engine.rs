//! Screening Engine - main orchestrator
//!
//! Admission is synchronous with the caller; everything after the
//! Pending record is created runs on a detached tokio task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use guardscreen_cache::{InMemoryCache, ResultCache};
use guardscreen_core::{
    AggregateResult, Check, CheckStatus, Clock, Fingerprint, Identity, SystemClock,
};
use guardscreen_ledger::CreditLedger;
use guardscreen_probes::{MockSourceProbe, ProbeSet, RandomizedProbe, SourceProbe};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::aggregate::{aggregate, Aggregation};
use crate::audit::{AuditSink, InMemoryAuditLog};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::event::AuditEvent;
use crate::settings::{InMemorySettings, ScreeningMode, Settings, SettingsProvider};
use crate::store::{CheckStore, InMemoryCheckStore, ListRequest, Page};

/// Reason recorded on a check whose sources all failed
pub const ALL_SOURCES_FAILED: &str = "All data sources unreachable";

/// Handle on a check's background pipeline.
///
/// Dropping it detaches the task; the pipeline still runs to completion.
pub struct PipelineHandle {
    check_id: String,
    handle: JoinHandle<EngineResult<CheckStatus>>,
}

impl PipelineHandle {
    pub fn check_id(&self) -> &str {
        &self.check_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the terminal status
    pub async fn wait(self) -> EngineResult<CheckStatus> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(EngineError::Pipeline(e.to_string())),
        }
    }
}

struct EngineInner {
    config: EngineConfig,
    settings: Arc<dyn SettingsProvider>,
    ledger: Arc<CreditLedger>,
    cache: Arc<dyn ResultCache>,
    store: Arc<dyn CheckStore>,
    audit: Arc<dyn AuditSink>,
    multi_source: ProbeSet,
    single_source: ProbeSet,
    clock: Arc<dyn Clock>,
    /// Serializes settings writes made by this engine
    settings_write: Mutex<()>,
}

/// Main screening engine
///
/// Orchestrates:
/// - Credit and breaker admission
/// - Cache lookup and probe fan-out
/// - Aggregation and check completion
/// - Audit events
#[derive(Clone)]
pub struct ScreeningEngine {
    inner: Arc<EngineInner>,
}

impl ScreeningEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn ledger(&self) -> &Arc<CreditLedger> {
        &self.inner.ledger
    }

    /// Current settings, generating the fingerprint secret on first use
    pub async fn current_settings(&self) -> EngineResult<Settings> {
        let settings = self.inner.settings.load().await?;
        if !settings.api_key_secret.is_empty() {
            return Ok(settings);
        }

        // The secret is only filled in if still empty when the write lands
        let _guard = self.inner.settings_write.lock().await;
        let generated = AtomicBool::new(false);
        let settings = self
            .inner
            .settings
            .update(&|s: &mut Settings| {
                if s.ensure_api_key() {
                    generated.store(true, Ordering::Relaxed);
                }
            })
            .await?;

        if generated.load(Ordering::Relaxed) {
            tracing::info!("Generated new fingerprint secret");
        }
        Ok(settings)
    }

    /// Replace the operator settings and record a `config.updated` event.
    ///
    /// The credit balance belongs to the ledger and is never taken from
    /// `incoming`; use [`ScreeningEngine::top_up`]. An empty secret keeps
    /// the stored one.
    pub async fn update_settings(&self, incoming: Settings) -> EngineResult<Settings> {
        let inner = &self.inner;
        let _guard = inner.settings_write.lock().await;

        let current = inner.settings.load().await?;
        let mut next = incoming;
        next.credit_balance = inner.ledger.balance();
        if next.api_key_secret.is_empty() {
            next.api_key_secret = current.api_key_secret.clone();
        }
        next.ensure_api_key();

        let changed = current.changed_fields(&next);
        if changed.is_empty() {
            return Ok(current);
        }

        inner.settings.save(&next).await?;
        tracing::info!(changed = ?changed, mode = %next.mode, "Settings updated");
        self.emit(AuditEvent::config_updated(changed, inner.clock.now()))
            .await;

        Ok(next)
    }

    /// Add credits to the ledger. Returns the new balance.
    pub async fn top_up(&self, credits: u32) -> EngineResult<i64> {
        let balance = self.inner.ledger.top_up(credits);
        self.sync_balance().await;
        tracing::info!(credits, balance, "Credits topped up");
        Ok(balance)
    }

    /// Fingerprint `identity` with the configured secret and admit it
    pub async fn submit(&self, identity: Identity) -> EngineResult<(Check, PipelineHandle)> {
        let settings = self.current_settings().await?;
        let fingerprint = Fingerprint::compute(&settings.api_key_secret, &identity)?;
        self.admit_with(&settings, identity, fingerprint).await
    }

    /// Reserve a credit, create the Pending record and schedule the pipeline.
    ///
    /// Returns as soon as the record exists. Refusals consume no credit.
    pub async fn admit_check(
        &self,
        identity: Identity,
        fingerprint: Fingerprint,
    ) -> EngineResult<(Check, PipelineHandle)> {
        let settings = self.current_settings().await?;
        self.admit_with(&settings, identity, fingerprint).await
    }

    async fn admit_with(
        &self,
        settings: &Settings,
        identity: Identity,
        fingerprint: Fingerprint,
    ) -> EngineResult<(Check, PipelineHandle)> {
        let inner = &self.inner;

        let reservation = inner.ledger.try_reserve()?;
        self.sync_balance().await;
        if reservation.remaining <= settings.alert_threshold {
            tracing::warn!(
                remaining = reservation.remaining,
                threshold = settings.alert_threshold,
                "Credit balance low"
            );
        }

        let mut check = Check::new(identity.clone(), fingerprint, inner.clock.now());
        check.take_identity();

        if let Err(e) = inner.store.insert(check.clone()).await {
            tracing::error!(check_id = %check.id, error = %e, "Failed to create check, refunding credit");
            inner.ledger.top_up(1);
            self.sync_balance().await;
            return Err(e);
        }

        self.emit(AuditEvent::check_initiated(
            &check.id,
            check.fingerprint.clone(),
            check.created_at,
        ))
        .await;

        tracing::info!(
            check_id = %check.id,
            fingerprint = %check.fingerprint,
            mode = %settings.mode,
            remaining = reservation.remaining,
            "Check admitted"
        );

        let engine = self.clone();
        let check_id = check.id.clone();
        let fp = check.fingerprint.clone();
        let mode = settings.mode;
        let handle =
            tokio::spawn(async move { engine.run_pipeline(check_id, fp, identity, mode).await });

        let handle = PipelineHandle {
            check_id: check.id.clone(),
            handle,
        };
        Ok((check, handle))
    }

    pub async fn get_check(&self, id: &str) -> EngineResult<Check> {
        self.inner
            .store
            .get(id)
            .await?
            .ok_or_else(|| EngineError::CheckNotFound(id.to_string()))
    }

    /// Newest-first page of checks
    pub async fn list_checks(&self, request: &ListRequest) -> EngineResult<Page<Check>> {
        let limit = request.effective_limit(&self.inner.config);
        self.inner
            .store
            .list(request.cursor.as_deref(), limit)
            .await
    }

    /// Newest-first page of audit events
    pub async fn list_audits(&self, request: &ListRequest) -> EngineResult<Page<AuditEvent>> {
        let limit = request.effective_limit(&self.inner.config);
        self.inner
            .audit
            .list(request.cursor.as_deref(), limit)
            .await
    }

    /// Remove completed checks older than the retention window
    pub async fn purge_expired(&self) -> EngineResult<usize> {
        let settings = self.inner.settings.load().await?;
        let cutoff = self.inner.clock.now() - settings.retention();
        let removed = self.inner.store.purge_older_than(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, retention_days = settings.retention_days, "Purged expired checks");
        }
        Ok(removed)
    }

    async fn run_pipeline(
        self,
        check_id: String,
        fingerprint: Fingerprint,
        identity: Identity,
        mode: ScreeningMode,
    ) -> EngineResult<CheckStatus> {
        let aggregation = self.resolve(&check_id, &fingerprint, &identity, mode).await;
        drop(identity);

        let status = aggregation.status;
        if let Err(e) = self.finish(&check_id, aggregation).await {
            tracing::error!(check_id = %check_id, error = %e, "Failed to record check completion");
            return Err(e);
        }
        Ok(status)
    }

    /// Cache hit or fresh fan-out. Total failure is folded into an Error aggregation.
    async fn resolve(
        &self,
        check_id: &str,
        fingerprint: &Fingerprint,
        identity: &Identity,
        mode: ScreeningMode,
    ) -> Aggregation {
        let inner = &self.inner;

        if let Some(entry) = inner.cache.get(fingerprint).await {
            if entry.is_valid(inner.config.cache_ttl(), inner.clock.now()) {
                tracing::info!(check_id, fingerprint = %fingerprint, "Cache hit");
                let status = CheckStatus::from_result(&entry.result);
                return Aggregation {
                    result: entry.result,
                    status,
                };
            }
            tracing::debug!(check_id, fingerprint = %fingerprint, "Cached result expired");
        }

        let probes = match mode {
            ScreeningMode::SingleSource => &inner.single_source,
            ScreeningMode::MultiSource => &inner.multi_source,
        };
        let outcomes = probes.fan_out(identity).await;

        match aggregate(&outcomes, inner.config.identity_confidence) {
            Ok(aggregation) => {
                inner
                    .cache
                    .put(fingerprint, aggregation.result.clone())
                    .await;
                tracing::debug!(
                    check_id,
                    risk_score = aggregation.result.risk_score,
                    offenses = aggregation.result.offenses.len(),
                    "Aggregated findings"
                );
                aggregation
            }
            Err(e) => {
                let tripped = inner.ledger.record_failure();
                tracing::error!(check_id, error = %e, breaker_tripped = tripped, "Check failed");
                Aggregation {
                    result: AggregateResult::failed(ALL_SOURCES_FAILED),
                    status: CheckStatus::Error,
                }
            }
        }
    }

    async fn finish(&self, check_id: &str, aggregation: Aggregation) -> EngineResult<()> {
        let inner = &self.inner;
        let mut check = self.get_check(check_id).await?;
        let completed_at = inner.clock.now();

        check.complete(aggregation.status, aggregation.result, completed_at)?;
        inner.store.update(check).await?;

        self.emit(AuditEvent::check_completed(
            check_id,
            aggregation.status,
            completed_at,
        ))
        .await;

        tracing::info!(check_id, status = %aggregation.status, "Check completed");
        Ok(())
    }

    /// Mirror the ledger balance into the settings store.
    ///
    /// The ledger stays authoritative; a failed write is only logged.
    async fn sync_balance(&self) {
        let inner = &self.inner;
        let _guard = inner.settings_write.lock().await;
        let ledger = &inner.ledger;

        if let Err(e) = inner
            .settings
            .update(&|s: &mut Settings| s.credit_balance = ledger.balance())
            .await
        {
            tracing::warn!(error = %e, balance = ledger.balance(), "Failed to store credit balance");
        }
    }

    /// Audit failures are logged and never fail the check
    async fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.inner.audit.record(&event).await {
            tracing::error!(
                check_id = event.check_id(),
                event = event.name(),
                error = %e,
                "Failed to write audit event"
            );
        }
    }
}

/// Builder for ScreeningEngine
///
/// Anything not supplied falls back to an in-memory collaborator. Probe
/// sets default to the simulated demo sources.
pub struct EngineBuilder {
    config: EngineConfig,
    settings: Option<Arc<dyn SettingsProvider>>,
    ledger: Option<Arc<CreditLedger>>,
    cache: Option<Arc<dyn ResultCache>>,
    store: Option<Arc<dyn CheckStore>>,
    audit: Option<Arc<dyn AuditSink>>,
    multi_source: Option<ProbeSet>,
    single_source: Option<ProbeSet>,
    clock: Arc<dyn Clock>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            settings: None,
            ledger: None,
            cache: None,
            store: None,
            audit: None,
            multi_source: None,
            single_source: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// In-memory settings
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(Arc::new(InMemorySettings::new(settings)));
        self
    }

    /// Without an injected ledger, the provider's credit balance seeds
    /// a new one. With one, the provider is brought in line with it.
    pub fn with_settings_provider(mut self, provider: Arc<dyn SettingsProvider>) -> Self {
        self.settings = Some(provider);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<CreditLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CheckStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_multi_source(mut self, probes: ProbeSet) -> Self {
        self.multi_source = Some(probes);
        self
    }

    /// Single-source mode consults one probe
    pub fn with_single_source(mut self, probe: Arc<dyn SourceProbe>) -> Self {
        self.single_source = Some(ProbeSet::new().with_probe(probe));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn build(self) -> EngineResult<ScreeningEngine> {
        let timeout = self.config.probe_timeout();

        let settings = self
            .settings
            .unwrap_or_else(|| Arc::new(InMemorySettings::default()));
        let stored = settings.load().await?;

        let ledger = match self.ledger {
            Some(ledger) => {
                if stored.credit_balance != ledger.balance() {
                    let balance = ledger.balance();
                    settings
                        .update(&|s: &mut Settings| s.credit_balance = balance)
                        .await?;
                }
                ledger
            }
            None => Arc::new(CreditLedger::with_clock(
                stored.credit_balance,
                self.config.breaker.clone(),
                Arc::clone(&self.clock),
            )),
        };

        let multi_source = self.multi_source.unwrap_or_else(|| {
            let seed = rand::random::<u64>();
            MockSourceProbe::default_sources(seed)
                .into_iter()
                .fold(ProbeSet::new(), |set, probe| set.with_probe(Arc::new(probe)))
        });
        let single_source = self
            .single_source
            .unwrap_or_else(|| ProbeSet::new().with_probe(Arc::new(RandomizedProbe::new())));

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryCache::with_clock(Arc::clone(&self.clock))));

        tracing::debug!(
            multi_source = ?multi_source.names(),
            single_source = ?single_source.names(),
            timeout_ms = self.config.probe_timeout_ms,
            balance = ledger.balance(),
            "Screening engine built"
        );

        Ok(ScreeningEngine {
            inner: Arc::new(EngineInner {
                settings,
                ledger,
                cache,
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(InMemoryCheckStore::new())),
                audit: self
                    .audit
                    .unwrap_or_else(|| Arc::new(InMemoryAuditLog::new())),
                multi_source: multi_source.with_timeout(timeout),
                single_source: single_source.with_timeout(timeout),
                clock: self.clock,
                config: self.config,
                settings_write: Mutex::new(()),
            }),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
