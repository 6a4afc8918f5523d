use std::fmt::Display;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, TimeZone};
use pharmachain_api::{ApiClient, VerificationClient};
use pharmachain_core::config::PharmaConfig;
use pharmachain_core::reminder::{parse_times, preset_times};
use pharmachain_core::{
    resolve as resolve_id, share_url, CanonicalId, IdKind, ReminderSpec, TimeOfDay,
};
use pharmachain_notify::{ConsolePlatform, PlatformNotifier};
use pharmachain_scheduler::{next_fire_after, ReminderScheduler};
use tracing::info;

fn resolve_required(input: &str, kind: IdKind) -> Result<CanonicalId> {
    let id = resolve_id(input, kind);
    if id.is_empty() {
        bail!("no {kind} id in {input:?}");
    }
    Ok(id)
}

pub async fn resolve(config: &PharmaConfig, input: &str, kind: IdKind, check: bool) -> Result<()> {
    let id = resolve_required(input, kind)?;
    if check {
        let api = ApiClient::new(&config.api)?;
        if !api.exists(kind, &id).await {
            bail!("{kind} {id} not found");
        }
    }
    println!("{id}");
    Ok(())
}

pub fn link(config: &PharmaConfig, input: &str, kind: IdKind) -> Result<()> {
    let id = resolve_required(input, kind)?;
    println!("{}", share_url(&config.app.origin, kind, &id));
    Ok(())
}

pub fn next(times: Option<&str>, frequency: Option<u32>) -> Result<()> {
    let list = match (times, frequency) {
        (Some(times), _) => times,
        (None, Some(f)) => match preset_times(f) {
            "" => bail!("no preset for {f} doses per day (expected 1-4)"),
            preset => preset,
        },
        (None, None) => bail!("pass --times or --frequency"),
    };

    let lines = next_lines(&parse_times(list), &Local::now());
    if lines.is_empty() {
        bail!("no valid HH:MM entry in {list:?}");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

pub async fn show(config: &PharmaConfig, input: &str, kind: IdKind) -> Result<()> {
    let id = resolve_required(input, kind)?;
    let api = ApiClient::new(&config.api)?;
    let json = match kind {
        IdKind::Prescription => serde_json::to_string_pretty(&api.prescription(&id).await?)?,
        IdKind::Patient => serde_json::to_string_pretty(&api.patient(&id).await?)?,
    };
    println!("{json}");
    Ok(())
}

pub async fn verify(config: &PharmaConfig, input: &str) -> Result<()> {
    let id = resolve_required(input, IdKind::Prescription)?;
    let client = VerificationClient::new(ApiClient::new(&config.api)?);

    let outcome = client.verify(&id).await;
    if outcome.verified {
        println!("{id}: verified on ledger");
        if let Some(url) = outcome.explorer_url {
            println!("explorer: {url}");
        }
    } else {
        println!("{id}: NOT verified");
    }
    Ok(())
}

pub async fn remind(
    config: &PharmaConfig,
    input: Option<&str>,
    name: Option<String>,
    times: Option<String>,
    dosage: &str,
) -> Result<()> {
    let spec = match (name, times, input) {
        (Some(name), Some(times), None) => ReminderSpec::parse(name, dosage, &times),
        (None, None, Some(input)) => {
            let id = resolve_required(input, IdKind::Prescription)?;
            let api = ApiClient::new(&config.api)?;
            api.prescription(&id)
                .await
                .with_context(|| format!("cannot load prescription {id}"))?
                .reminder_spec()
        }
        _ => bail!("pass either a prescription id or both --name and --times"),
    };
    if !spec.is_schedulable() {
        bail!("nothing to schedule: medicine name or valid times missing");
    }

    for line in next_lines(&spec.times, &Local::now()) {
        println!("next  {line}");
    }
    let medicine = spec.medicine_name.clone();

    let notifier = Arc::new(PlatformNotifier::new(ConsolePlatform::new(
        config.notify.permission,
    )));
    let scheduler = ReminderScheduler::new(notifier);
    let guard = scheduler.start_scoped(spec);
    info!(%medicine, "reminders running; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("cannot listen for Ctrl-C")?;
    drop(guard);
    info!(%medicine, "reminders stopped");
    Ok(())
}

/// `HH:MM  <next local fire instant>` per time, in list order.
fn next_lines<Tz>(times: &[TimeOfDay], now: &DateTime<Tz>) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    times
        .iter()
        .filter_map(|t| {
            next_fire_after(*t, now).map(|at| format!("{t}  {}", at.format("%Y-%m-%d %H:%M %:z")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn next_lines_keep_list_order() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let lines = next_lines(&parse_times("20:00, 08:00, bogus"), &now);
        assert_eq!(
            lines,
            vec![
                "20:00  2024-01-01 20:00 +00:00".to_string(),
                "08:00  2024-01-02 08:00 +00:00".to_string(),
            ]
        );
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(resolve_required("   ", IdKind::Patient).is_err());
        assert!(resolve_required("https://x/prescription/", IdKind::Prescription).is_err());
        assert_eq!(
            resolve_required("https://x/patient/42", IdKind::Patient)
                .unwrap()
                .as_str(),
            "42"
        );
    }

    #[test]
    fn next_without_source_fails() {
        assert!(next(None, None).is_err());
        assert!(next(None, Some(7)).is_err());
        assert!(next(Some("nope"), None).is_err());
    }
}
