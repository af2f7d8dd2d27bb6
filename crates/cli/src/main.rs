//! `flowsim` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate` — audit a workflow JSON file and replay its edges through
//!   the connection validator.
//! - `run`      — simulate a workflow run, printing status transitions and
//!   the final report.
//! - `sample`   — emit the starter workflow as JSON.
//! - `kinds`    — list the registered node-kind palette.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use engine::{
    audit_snapshot, check_connection, event_channel, ConnectionCandidate, WorkflowEngine,
    WorkflowEvent,
};
use graph::{Workflow, WorkflowSnapshot};
use nodes::sample::{register_demo_kinds, sample_workflow};
use nodes::KindRegistry;

#[derive(Parser)]
#[command(
    name = "flowsim",
    about = "Dependency-driven pipeline simulation engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Audit a workflow JSON file and replay its edges through the
    /// connection validator.
    Validate {
        /// Path to the workflow JSON file.
        path: PathBuf,
    },
    /// Simulate a run of a workflow JSON file.
    Run {
        /// Path to the workflow JSON file.
        path: PathBuf,
    },
    /// Print the starter workflow as JSON.
    Sample,
    /// List the registered node kinds (demo extras included).
    Kinds,
}

fn load_snapshot(path: &PathBuf) -> anyhow::Result<WorkflowSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid workflow JSON in {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { path } => {
            let snapshot = load_snapshot(&path)?;
            let workflow = Workflow::from_snapshot(snapshot.clone());

            let mut findings = 0usize;
            for issue in audit_snapshot(&snapshot) {
                findings += 1;
                println!("❌ {issue}");
            }
            for edge in &snapshot.edges {
                let candidate = ConnectionCandidate::from(edge);
                if !check_connection(&candidate, &workflow).is_accepted() {
                    findings += 1;
                    println!("❌ edge '{}' would not pass connection validation", edge.id);
                }
            }

            if findings == 0 {
                println!("✅ Workflow is valid: {} nodes, {} edges", snapshot.nodes.len(), snapshot.edges.len());
            } else {
                eprintln!("❌ Validation finished with {findings} finding(s)");
                std::process::exit(1);
            }
        }

        Command::Run { path } => {
            let snapshot = load_snapshot(&path)?;
            let (events, mut receiver) = event_channel();
            let engine = WorkflowEngine::new(Workflow::from_snapshot(snapshot), events);

            let printer = tokio::spawn(async move {
                while let Some(event) = receiver.recv().await {
                    match event {
                        WorkflowEvent::StatusChanged {
                            node_id, status, ..
                        } => {
                            println!("{node_id}: {status:?}");
                        }
                        WorkflowEvent::RunFinished { report, .. } => {
                            println!(
                                "run finished: {} completed, {} never completed",
                                report.completed.len(),
                                report.never_completed.len()
                            );
                        }
                    }
                }
            });

            let report = engine
                .run_workflow()
                .await
                .expect("no other run can be in flight");
            drop(engine);
            printer.await.ok();

            if !report.never_completed.is_empty() {
                println!("⚠ nodes left idle: {}", report.never_completed.join(", "));
            }
            info!("simulation complete");
        }

        Command::Sample => {
            let snapshot = sample_workflow();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Command::Kinds => {
            let mut registry = KindRegistry::with_builtins();
            register_demo_kinds(&mut registry);
            for (key, descriptor) in registry.palette() {
                println!(
                    "{key:<12} {:<16} in:{} out:{}{}",
                    descriptor.display_name,
                    descriptor.default_inputs,
                    descriptor.default_outputs,
                    if descriptor.typed_ports { " (typed ports)" } else { "" }
                );
            }
        }
    }

    Ok(())
}
