//! CLI command implementations

use crate::output::{self, OutputFormat};
use crate::script::{Script, Step};
use anyhow::Context;
use chrono::{DateTime, Utc};
use screenplay_core::{
    BackendCall, Error, MediaEvent, PlaybackSession, PlaybackState, PlaybackStrategy, PlayerConfig,
    SeekPolicy, SeekableRange, SimulatedBackend, WindowType,
};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tabled::Tabled;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct StepRecord {
    index: usize,
    step: String,
    state: PlaybackState,
    current_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct EventRecord {
    step: usize,
    received_at: DateTime<Utc>,
    #[serde(flatten)]
    event: MediaEvent,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    session_id: String,
    tier: String,
    window: WindowType,
    steps: Vec<StepRecord>,
    events: Vec<EventRecord>,
    backend_calls: Vec<BackendCall>,
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Error")]
    error: String,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Load a player configuration, or the defaults without a path
fn load_config(path: Option<&Path>) -> anyhow::Result<PlayerConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            PlayerConfig::from_json(&json)
                .with_context(|| format!("Invalid config {}", path.display()))
        }
        None => Ok(PlayerConfig::default()),
    }
}

fn drain_events(
    events: &mut broadcast::Receiver<MediaEvent>,
    step: usize,
    log: &mut Vec<EventRecord>,
) {
    loop {
        match events.try_recv() {
            Ok(event) => log.push(EventRecord {
                step,
                received_at: Utc::now(),
                event,
            }),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Event log fell behind, events dropped");
            }
            Err(_) => break,
        }
    }
}

/// Run a scripted session against the simulated backend
pub async fn simulate(
    script_path: &Path,
    config_path: Option<&Path>,
    format: &str,
) -> anyhow::Result<()> {
    let script = Script::load(script_path)?;
    let config = load_config(config_path)?;

    let backend = SimulatedBackend::new("simulated-player");
    let strategy = PlaybackStrategy::new(
        script.window,
        &config,
        script.time_window,
        Box::new(backend.clone()),
    )?;
    let tier = strategy.name().to_string();

    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let session = PlaybackSession::spawn(strategy, backend_rx);
    let mut events = session.subscribe();
    info!(session_id = %session.id(), steps = script.steps.len(), "Running script");

    let mut steps = Vec::with_capacity(script.steps.len());
    let mut event_log = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        let outcome = match step {
            Step::Operation(operation) => session.execute(operation.clone()).await,
            Step::Backend(event) => {
                backend_tx
                    .send(event.clone())
                    .map_err(|_| Error::SessionClosed)?;
                session.snapshot().await
            }
            Step::Wait { wait_ms } => {
                tokio::time::sleep(Duration::from_millis(*wait_ms)).await;
                session.snapshot().await
            }
            Step::Reject { reject, enabled } => {
                reject.apply(&backend, *enabled);
                session.snapshot().await
            }
        };

        let record = match outcome {
            Ok(snapshot) => StepRecord {
                index,
                step: step.describe(),
                state: snapshot.state,
                current_time: snapshot.current_time,
                error: None,
            },
            Err(Error::SessionClosed) => return Err(Error::SessionClosed.into()),
            Err(e) => {
                warn!(index, error = %e, "Step failed");
                let snapshot = session.snapshot().await?;
                StepRecord {
                    index,
                    step: step.describe(),
                    state: snapshot.state,
                    current_time: snapshot.current_time,
                    error: Some(e.to_string()),
                }
            }
        };

        drain_events(&mut events, index, &mut event_log);
        steps.push(record);
    }

    session.shutdown().await?;

    let report = SimulationReport {
        session_id: session.id().to_string(),
        tier,
        window: script.window,
        steps,
        events: event_log,
        backend_calls: backend.calls(),
    };
    print_report(&report, OutputFormat::from(format))
}

fn print_report(report: &SimulationReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", output::to_json(report)?),
        OutputFormat::Table => {
            let step_rows: Vec<StepRow> = report
                .steps
                .iter()
                .map(|s| StepRow {
                    index: s.index,
                    step: s.step.clone(),
                    state: s.state.to_string(),
                    time: output::seconds(s.current_time),
                    error: s.error.clone().unwrap_or_default(),
                })
                .collect();
            let event_rows: Vec<EventRow> = report
                .events
                .iter()
                .map(|e| EventRow {
                    step: e.step,
                    event: e.event.event_type.to_string(),
                    state: e.event.state.to_string(),
                    time: output::seconds(e.event.current_time),
                    duration: output::seconds(e.event.duration),
                    message: e.event.error_message.clone().unwrap_or_default(),
                })
                .collect();

            println!("Session {} ({} tier, {} window)", report.session_id, report.tier, report.window);
            println!("\nSteps:\n{}", output::to_table(&step_rows));
            println!("\nEvents:\n{}", output::to_table(&event_rows));
            println!("\nBackend calls: {}", report.backend_calls.len());
        }
        OutputFormat::Text => {
            println!("Session {} ({} tier, {} window)", report.session_id, report.tier, report.window);
            println!();
            for step in &report.steps {
                println!(
                    "[{:>3}] {} -> {} (time {})",
                    step.index,
                    step.step,
                    step.state,
                    output::seconds(step.current_time)
                );
                if let Some(error) = &step.error {
                    println!("      rejected: {}", error);
                }
                for record in report.events.iter().filter(|e| e.step == step.index) {
                    let event = &record.event;
                    print!("      event {} time {}", event.event_type, output::seconds(event.current_time));
                    if let Some(message) = &event.error_message {
                        print!(" \"{}\"", message);
                    }
                    println!();
                }
            }

            println!("\nBackend calls:");
            for (i, call) in report.backend_calls.iter().enumerate() {
                println!("  {}. {:?}", i + 1, call);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
struct ClampReport {
    #[tabled(rename = "Target")]
    target: f64,
    #[tabled(rename = "Start")]
    start: f64,
    #[tabled(rename = "End")]
    end: f64,
    #[tabled(rename = "Clamped")]
    clamped: f64,
    #[tabled(display_with = "display_near", rename = "Near")]
    near: Option<bool>,
}

fn display_near(near: &Option<bool>) -> String {
    match near {
        Some(near) => near.to_string(),
        None => "-".to_string(),
    }
}

/// Show where a seek target lands and whether it would be skipped
pub fn clamp(
    seconds: f64,
    start: f64,
    end: f64,
    current: Option<f64>,
    config_path: Option<&Path>,
    format: &str,
) -> anyhow::Result<()> {
    if start.is_nan() || end.is_nan() || start > end {
        anyhow::bail!("Range start {} is after its end {}", start, end);
    }

    let config = load_config(config_path)?;
    let policy = SeekPolicy::from_config(&config);
    let range = SeekableRange::new(start, end);

    let report = ClampReport {
        target: seconds,
        start,
        end,
        clamped: policy.clamp(seconds, Some(&range)),
        near: current.map(|c| policy.is_near(Some(c), seconds, Some(&range))),
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::to_json(&report)?),
        OutputFormat::Table => println!("{}", output::to_table(&[report])),
        OutputFormat::Text => {
            println!("Target:  {}", report.target);
            println!("Range:   {} - {}", report.start, report.end);
            println!(
                "Clamped: {} (offset from end {})",
                report.clamped, policy.clamp_offset_from_end
            );
            if let (Some(current), Some(near)) = (current, report.near) {
                println!(
                    "Near {}: {} (tolerance {})",
                    current, near, policy.tolerance
                );
            }
        }
    }
    Ok(())
}

/// Print the effective player configuration
pub fn show_config(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    println!("{}", output::to_json(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = load_config(None).unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_clamp_rejects_inverted_range() {
        assert!(clamp(10.0, 50.0, 20.0, None, None, "text").is_err());
    }

    #[tokio::test]
    async fn test_simulate_demo_script() {
        let script = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/static_seek.json"));
        simulate(script, None, "json").await.unwrap();
    }
}
