//! End-to-end tests for the screening pipeline

use std::sync::Arc;

use chrono::Duration;
use guardscreen_cache::{InMemoryCache, ResultCache};
use guardscreen_core::{
    CheckStatus, Clock, Fingerprint, Identity, ManualClock, Offense, Pillar,
};
use guardscreen_engine::{
    AuditEvent, EngineConfig, EngineError, InMemoryAuditLog, InMemorySettings, ListRequest,
    ScreeningEngine, ScreeningMode, Settings, SettingsProvider,
};
use guardscreen_ledger::{BreakerConfig, CreditLedger};
use guardscreen_probes::{ProbeSet, StaticProbe};

const SECRET: &str = "gs_live_0123456789abcdef0123456789abcdef";

fn identity() -> Identity {
    Identity::new("Jane Public", "1990-04-01", "1234")
}

fn other_identity() -> Identity {
    Identity::new("John Doe", "1985-12-24", "9876")
}

fn fingerprint(identity: &Identity) -> Fingerprint {
    Fingerprint::compute(SECRET, identity).unwrap()
}

fn settings(credits: i64) -> Settings {
    Settings {
        api_key_secret: SECRET.to_string(),
        credit_balance: credits,
        ..Settings::default()
    }
}

fn offense(date: &str, location: &str, source: &str, pillar: Pillar) -> Offense {
    Offense::new("Felony", date, location, "", source, pillar)
}

fn probes(list: Vec<Arc<StaticProbe>>) -> ProbeSet {
    list.into_iter()
        .fold(ProbeSet::new(), |set, probe| set.with_probe(probe))
}

#[tokio::test]
async fn test_duplicate_offenses_collapse_to_first_seen() {
    let a = StaticProbe::hit(
        "A",
        Pillar::Criminal,
        vec![
            offense("2021-08-15", "Springfield", "A", Pillar::Criminal),
            offense("2020-01-01", "Reno", "A", Pillar::Criminal),
        ],
    );
    let b = StaticProbe::hit(
        "B",
        Pillar::Criminal,
        vec![offense("2021-08-15", "Springfield", "B", Pillar::Criminal)],
    );
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_multi_source(probes(vec![Arc::new(a), Arc::new(b)]))
        .build()
        .await
        .unwrap();

    let (check, handle) = engine.submit(identity()).await.unwrap();
    assert_eq!(handle.wait().await.unwrap(), CheckStatus::Hit);

    let result = engine.get_check(&check.id).await.unwrap().result.unwrap();
    assert_eq!(result.offenses.len(), 2);
    assert_eq!(result.offenses[0].location, "Springfield");
    assert_eq!(result.offenses[0].source, "A");
    assert_eq!(result.sources, vec!["A".to_string(), "B".to_string()]);
}

#[tokio::test]
async fn test_two_offenses_across_two_pillars_score_69() {
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_multi_source(probes(vec![
            Arc::new(StaticProbe::hit(
                "County Criminal",
                Pillar::Criminal,
                vec![offense("2021-08-15", "Springfield", "County Criminal", Pillar::Criminal)],
            )),
            Arc::new(StaticProbe::hit(
                "Global Sanctions",
                Pillar::Sanctions,
                vec![offense("2019-03-02", "OFAC SDN List", "Global Sanctions", Pillar::Sanctions)],
            )),
            Arc::new(StaticProbe::clear("Identity Verification", Pillar::Identity)),
        ]))
        .build()
        .await
        .unwrap();

    let (check, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    let stored = engine.get_check(&check.id).await.unwrap();
    assert_eq!(stored.status, CheckStatus::Hit);
    assert_eq!(stored.result.unwrap().risk_score, 69);
}

#[tokio::test]
async fn test_score_clamps_at_100() {
    let sources: Vec<Arc<StaticProbe>> = Pillar::ALL
        .iter()
        .enumerate()
        .map(|(i, pillar)| {
            let name = format!("S{}", i);
            let date = format!("2020-0{}-01", i + 1);
            Arc::new(StaticProbe::hit(
                name.as_str(),
                *pillar,
                vec![offense(&date, "Somewhere", &name, *pillar)],
            ))
        })
        .collect();

    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_multi_source(probes(sources))
        .build()
        .await
        .unwrap();

    let (check, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    let result = engine.get_check(&check.id).await.unwrap().result.unwrap();
    assert_eq!(result.offenses.len(), 4);
    assert_eq!(result.risk_score, 100);
}

#[tokio::test]
async fn test_status_follows_offense_list() {
    let clear = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_multi_source(probes(vec![
            Arc::new(StaticProbe::clear("A", Pillar::Criminal)),
            Arc::new(StaticProbe::clear("B", Pillar::Sanctions)),
        ]))
        .build()
        .await
        .unwrap();
    let (_, handle) = clear.submit(identity()).await.unwrap();
    assert_eq!(handle.wait().await.unwrap(), CheckStatus::Clear);

    let hit = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_multi_source(probes(vec![
            Arc::new(StaticProbe::clear("A", Pillar::Criminal)),
            Arc::new(StaticProbe::hit(
                "B",
                Pillar::Sanctions,
                vec![offense("2019-03-02", "OFAC SDN List", "B", Pillar::Sanctions)],
            )),
        ]))
        .build()
        .await
        .unwrap();
    let (_, handle) = hit.submit(identity()).await.unwrap();
    assert_eq!(handle.wait().await.unwrap(), CheckStatus::Hit);
}

#[tokio::test]
async fn test_partial_failure_is_recovered_locally() {
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_multi_source(probes(vec![
            Arc::new(StaticProbe::failing("Down", Pillar::Criminal)),
            Arc::new(StaticProbe::clear("Up", Pillar::Sanctions)),
        ]))
        .build()
        .await
        .unwrap();

    let (check, handle) = engine.submit(identity()).await.unwrap();
    assert_eq!(handle.wait().await.unwrap(), CheckStatus::Clear);

    let result = engine.get_check(&check.id).await.unwrap().result.unwrap();
    assert_eq!(result.sources, vec!["Up".to_string()]);
    assert!(result.error.is_none());
    assert_eq!(engine.ledger().snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn test_total_failure_path() {
    let cache = Arc::new(InMemoryCache::new());
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_cache(cache.clone())
        .with_multi_source(probes(vec![
            Arc::new(StaticProbe::failing("A", Pillar::Criminal)),
            Arc::new(StaticProbe::failing("B", Pillar::Sanctions)),
        ]))
        .build()
        .await
        .unwrap();

    let (check, handle) = engine.submit(identity()).await.unwrap();
    assert_eq!(handle.wait().await.unwrap(), CheckStatus::Error);

    let stored = engine.get_check(&check.id).await.unwrap();
    assert_eq!(stored.status, CheckStatus::Error);
    assert!(stored.result.unwrap().error.is_some());

    assert!(!cache.contains(&fingerprint(&identity())));
    assert_eq!(engine.ledger().snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn test_breaker_trips_after_five_total_failures() {
    let clock = ManualClock::default();
    let engine = ScreeningEngine::builder()
        .with_settings(settings(100))
        .with_clock(Arc::new(clock.clone()))
        .with_multi_source(probes(vec![Arc::new(StaticProbe::failing(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    for _ in 0..5 {
        let (_, handle) = engine.submit(identity()).await.unwrap();
        assert_eq!(handle.wait().await.unwrap(), CheckStatus::Error);
        clock.advance(Duration::seconds(10));
    }
    let fifth_failure_at = clock.now() - Duration::seconds(10);
    let balance = engine.ledger().balance();

    match engine.submit(identity()).await {
        Err(EngineError::BreakerOpen { until }) => {
            assert_eq!(until, fifth_failure_at + Duration::seconds(60));
        }
        other => panic!("expected BreakerOpen, got {:?}", other.map(|(c, _)| c.id)),
    }
    assert_eq!(engine.ledger().balance(), balance);

    clock.set(fifth_failure_at + Duration::seconds(60));
    assert!(engine.submit(identity()).await.is_ok());
}

#[tokio::test]
async fn test_failures_outside_window_do_not_trip() {
    let clock = ManualClock::default();
    let engine = ScreeningEngine::builder()
        .with_settings(settings(100))
        .with_clock(Arc::new(clock.clone()))
        .with_multi_source(probes(vec![Arc::new(StaticProbe::failing(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    for _ in 0..6 {
        let (_, handle) = engine.submit(identity()).await.unwrap();
        handle.wait().await.unwrap();
        clock.advance(Duration::seconds(61));
    }

    assert!(!engine.ledger().is_open());
    assert_eq!(engine.ledger().snapshot().consecutive_failures, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admission_of_last_credit() {
    let engine = ScreeningEngine::builder()
        .with_settings(settings(1))
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    let a = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.submit(identity()).await.map(|(c, _)| c) })
    };
    let b = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.submit(other_identity()).await.map(|(c, _)| c) })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let granted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::InsufficientCredit { .. })))
        .count();

    assert_eq!(granted, 1);
    assert_eq!(refused, 1);
    assert_eq!(engine.ledger().balance(), 0);
}

#[tokio::test]
async fn test_cache_hit_skips_fan_out() {
    let probe = Arc::new(StaticProbe::hit(
        "A",
        Pillar::Criminal,
        vec![offense("2021-08-15", "Springfield", "A", Pillar::Criminal)],
    ));
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_multi_source(probes(vec![probe.clone()]))
        .build()
        .await
        .unwrap();

    let (first, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();
    assert_eq!(probe.calls(), 1);

    let (second, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();
    assert_eq!(probe.calls(), 1);

    let first = engine.get_check(&first.id).await.unwrap();
    let second = engine.get_check(&second.id).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.result, second.result);
    assert_eq!(second.status, CheckStatus::Hit);
}

#[tokio::test]
async fn test_prepopulated_cache_means_no_probe_runs() {
    let cache = Arc::new(InMemoryCache::new());
    let fp = fingerprint(&identity());

    let warm = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_cache(cache.clone())
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();
    let (_, handle) = warm.admit_check(identity(), fp.clone()).await.unwrap();
    handle.wait().await.unwrap();
    let cached = cache.get(&fp).await.unwrap().result;

    let probe = Arc::new(StaticProbe::clear("B", Pillar::Sanctions));
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_cache(cache.clone())
        .with_multi_source(probes(vec![probe.clone()]))
        .build()
        .await
        .unwrap();

    let (check, handle) = engine.admit_check(identity(), fp).await.unwrap();
    handle.wait().await.unwrap();

    assert_eq!(probe.calls(), 0);
    assert_eq!(engine.get_check(&check.id).await.unwrap().result, Some(cached));
}

#[tokio::test]
async fn test_expired_cache_entry_is_recomputed() {
    let clock = ManualClock::default();
    let probe = Arc::new(StaticProbe::clear("A", Pillar::Criminal));
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_clock(Arc::new(clock.clone()))
        .with_multi_source(probes(vec![probe.clone()]))
        .build()
        .await
        .unwrap();

    let (_, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    clock.advance(Duration::hours(24));
    let (_, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn test_mode_is_read_per_check() {
    let provider = Arc::new(InMemorySettings::new(settings(10)));
    let multi = Arc::new(StaticProbe::clear("Multi", Pillar::Criminal));
    let single = Arc::new(StaticProbe::clear("Single", Pillar::Criminal));

    let engine = ScreeningEngine::builder()
        .with_settings_provider(provider.clone())
        .with_multi_source(probes(vec![multi.clone()]))
        .with_single_source(single.clone())
        .build()
        .await
        .unwrap();

    let (_, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    provider.set_mode(ScreeningMode::SingleSource);
    let (check, handle) = engine.submit(other_identity()).await.unwrap();
    handle.wait().await.unwrap();

    assert_eq!(multi.calls(), 1);
    assert_eq!(single.calls(), 1);
    let result = engine.get_check(&check.id).await.unwrap().result.unwrap();
    assert_eq!(result.sources, vec!["Single".to_string()]);
}

#[tokio::test]
async fn test_insufficient_credit_creates_no_record() {
    let audit = Arc::new(InMemoryAuditLog::new());
    let engine = ScreeningEngine::builder()
        .with_settings(settings(0))
        .with_audit(audit.clone())
        .build()
        .await
        .unwrap();

    assert!(matches!(
        engine.submit(identity()).await,
        Err(EngineError::InsufficientCredit { balance: 0 })
    ));
    assert!(engine.list_checks(&ListRequest::default()).await.unwrap().items.is_empty());
    assert!(audit.events().is_empty());
}

#[tokio::test]
async fn test_audit_events_carry_no_identity() {
    let audit = Arc::new(InMemoryAuditLog::new());
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_audit(audit.clone())
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    let (check, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    let events = audit.events_for(&check.id);
    assert_eq!(events.len(), 2);
    match &events[0] {
        AuditEvent::CheckInitiated { fingerprint, .. } => {
            assert_eq!(fingerprint, &check.fingerprint)
        }
        other => panic!("unexpected event {:?}", other),
    }
    match &events[1] {
        AuditEvent::CheckCompleted { status, .. } => assert_eq!(*status, CheckStatus::Clear),
        other => panic!("unexpected event {:?}", other),
    }

    let json = serde_json::to_string(&events).unwrap();
    assert!(!json.contains("Jane"));
    assert!(!json.contains("1990-04-01"));
}

#[tokio::test]
async fn test_list_checks_newest_first() {
    let clock = ManualClock::default();
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_clock(Arc::new(clock.clone()))
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (check, handle) = engine.submit(identity()).await.unwrap();
        handle.wait().await.unwrap();
        ids.push(check.id);
        clock.advance(Duration::seconds(1));
    }
    ids.reverse();

    let page = engine.list_checks(&ListRequest::new(2)).await.unwrap();
    let got: Vec<String> = page.items.iter().map(|c| c.id.clone()).collect();
    assert_eq!(got, ids[..2].to_vec());

    let cursor = page.next_cursor.unwrap();
    let rest = engine
        .list_checks(&ListRequest::new(2).after(cursor))
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].id, ids[2]);
    assert!(rest.next_cursor.is_none());
}

#[tokio::test]
async fn test_purge_expired_uses_retention() {
    let clock = ManualClock::default();
    let engine = ScreeningEngine::builder()
        .with_settings(Settings {
            retention_days: 30,
            ..settings(10)
        })
        .with_clock(Arc::new(clock.clone()))
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    let (old, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    clock.advance(Duration::days(31));
    assert_eq!(engine.purge_expired().await.unwrap(), 1);
    assert!(matches!(
        engine.get_check(&old.id).await,
        Err(EngineError::CheckNotFound(_))
    ));
}

#[tokio::test]
async fn test_injected_ledger_is_shared() {
    let ledger = Arc::new(CreditLedger::new(2, BreakerConfig::default()));
    let engine = ScreeningEngine::builder()
        .with_config(EngineConfig::default())
        .with_settings(settings(10))
        .with_ledger(ledger.clone())
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    let (_, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    assert_eq!(ledger.balance(), 1);
}

#[tokio::test]
async fn test_settings_provider_seeds_ledger() {
    let provider = Arc::new(InMemorySettings::new(settings(1)));
    let engine = ScreeningEngine::builder()
        .with_settings_provider(provider.clone())
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    assert_eq!(engine.ledger().balance(), 1);

    let (_, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    assert!(matches!(
        engine.submit(other_identity()).await,
        Err(EngineError::InsufficientCredit { balance: 0 })
    ));
    assert_eq!(provider.load().await.unwrap().credit_balance, 0);
}

#[tokio::test]
async fn test_settings_balance_tracks_ledger() {
    let provider = Arc::new(InMemorySettings::new(settings(3)));
    let engine = ScreeningEngine::builder()
        .with_settings_provider(provider.clone())
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    let (_, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();
    assert_eq!(engine.ledger().balance(), 2);
    assert_eq!(engine.current_settings().await.unwrap().credit_balance, 2);

    assert_eq!(engine.top_up(5).await.unwrap(), 7);
    assert_eq!(engine.ledger().balance(), 7);
    assert_eq!(provider.load().await.unwrap().credit_balance, 7);
}

#[tokio::test]
async fn test_injected_ledger_overrides_stored_balance() {
    let provider = Arc::new(InMemorySettings::new(settings(10)));
    let ledger = Arc::new(CreditLedger::new(2, BreakerConfig::default()));
    let engine = ScreeningEngine::builder()
        .with_settings_provider(provider.clone())
        .with_ledger(ledger.clone())
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    assert_eq!(provider.load().await.unwrap().credit_balance, 2);

    let (_, handle) = engine.submit(identity()).await.unwrap();
    handle.wait().await.unwrap();

    assert_eq!(ledger.balance(), 1);
    assert_eq!(provider.load().await.unwrap().credit_balance, 1);
}

#[tokio::test]
async fn test_settings_update_is_audited() {
    let audit = Arc::new(InMemoryAuditLog::new());
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_audit(audit.clone())
        .build()
        .await
        .unwrap();

    let saved = engine
        .update_settings(Settings {
            mode: ScreeningMode::SingleSource,
            ..settings(10)
        })
        .await
        .unwrap();
    assert_eq!(saved.mode, ScreeningMode::SingleSource);

    // Saving the same values again records nothing
    engine.update_settings(saved.clone()).await.unwrap();

    let events = audit.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        AuditEvent::ConfigUpdated { changed, .. } => assert_eq!(changed, &vec!["mode".to_string()]),
        other => panic!("unexpected event {:?}", other),
    }

    let json = serde_json::to_string(&events).unwrap();
    assert!(!json.contains(SECRET));
}

#[tokio::test]
async fn test_list_audits_newest_first() {
    let clock = ManualClock::default();
    let engine = ScreeningEngine::builder()
        .with_settings(settings(10))
        .with_clock(Arc::new(clock.clone()))
        .with_multi_source(probes(vec![Arc::new(StaticProbe::clear(
            "A",
            Pillar::Criminal,
        ))]))
        .build()
        .await
        .unwrap();

    let (check, handle) = engine.submit(identity()).await.unwrap();
    clock.advance(Duration::seconds(1));
    handle.wait().await.unwrap();
    clock.advance(Duration::seconds(1));
    engine
        .update_settings(Settings {
            alert_threshold: 1,
            ..settings(10)
        })
        .await
        .unwrap();

    let page = engine.list_audits(&ListRequest::new(2)).await.unwrap();
    let names: Vec<&str> = page.items.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["config.updated", "check.completed"]);

    let cursor = page.next_cursor.unwrap();
    let rest = engine
        .list_audits(&ListRequest::new(2).after(cursor))
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].name(), "check.initiated");
    assert_eq!(rest.items[0].check_id(), Some(check.id.as_str()));
    assert!(rest.next_cursor.is_none());

    assert!(matches!(
        engine.list_audits(&ListRequest::new(2).after("missing")).await,
        Err(EngineError::InvalidCursor(_))
    ));
}
