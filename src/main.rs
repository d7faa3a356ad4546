/*!
 * Scheduler Replay - Main Entry Point
 *
 * Runs a JSON replay script against a fresh scheduler and prints one JSON
 * record per update to stdout.
 */

use anyhow::{bail, Context, Result};
use tracing::info;

use cpu_share_sched::{init_tracing, span_replay, ReplayScript, Replayer};

fn main() -> Result<()> {
    // Initialize structured tracing
    init_tracing();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: sched-replay <script.json>");
    };

    let script = ReplayScript::load(&path)
        .with_context(|| format!("loading replay script {path}"))?;
    let name = script.name.clone().unwrap_or_else(|| path.clone());

    let span = span_replay(&name, script.steps.len());
    let _guard = span.enter();

    info!(
        priority_levels = script.config.priority_levels,
        super_period = script.config.super_period,
        fill_quantum = script.config.fill_quantum,
        "replaying"
    );

    let records = Replayer::run(&script).with_context(|| format!("replaying {name}"))?;
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }

    info!(updates = records.len(), "replay complete");
    Ok(())
}
