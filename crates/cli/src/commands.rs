//! CLI commands

use guardscreen_core::{Fingerprint, Identity};
use guardscreen_engine::ListRequest;
use serde_json::json;

use crate::context::AppContext;

/// Submit a screening and print the completed check
pub async fn screen(
    ctx: &AppContext,
    name: &str,
    dob: &str,
    ssn_last4: &str,
) -> Result<(), anyhow::Error> {
    let identity = Identity::new(name, dob, ssn_last4);
    let (check, handle) = ctx.engine.submit(identity).await?;
    tracing::info!(check_id = %check.id, "Waiting for check to complete");

    let status = handle.wait().await?;
    let check = ctx.engine.get_check(&check.id).await?;

    println!("{}", serde_json::to_string_pretty(&check)?);
    eprintln!(
        "{} {} (credits left: {})",
        status,
        check.id,
        ctx.engine.ledger().balance()
    );
    Ok(())
}

/// Print the fingerprint of an identity under `secret`
pub fn fingerprint(
    name: &str,
    dob: &str,
    ssn_last4: &str,
    secret: &str,
) -> Result<(), anyhow::Error> {
    let fp = Fingerprint::compute(secret, &Identity::new(name, dob, ssn_last4))?;
    println!("{}", fp);
    Ok(())
}

/// Print the effective configuration and settings
pub async fn config(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let settings = ctx.engine.current_settings().await?;
    let snapshot = ctx.engine.ledger().snapshot();

    let output = json!({
        "engine": ctx.config,
        "settings": {
            "credit_balance": settings.credit_balance,
            "alert_threshold": settings.alert_threshold,
            "retention_days": settings.retention_days,
            "mode": settings.mode,
        },
        "breaker": snapshot,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print one page of audit events, newest first
pub async fn audits(
    ctx: &AppContext,
    limit: usize,
    cursor: Option<String>,
) -> Result<(), anyhow::Error> {
    let request = ListRequest { cursor, limit };
    let page = ctx.engine.list_audits(&request).await?;

    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
