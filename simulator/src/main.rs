use anyhow::Context;
use bridge::server::{bind_address, ResultBridge};
use clap::Parser;
use doacore::interface::SampleCube;
use generator::profile::build_cube;
use ingest::csv::load_frames;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::{BatchSummary, Runner};

mod bridge;
mod generator;
mod ingest;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline driver for the radar direction-finding core")]
struct Args {
    /// Process a batch of frames and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Read frames from an indexed CSV dump instead of generating them
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    frames: Option<usize>,
    #[arg(long)]
    receivers: Option<usize>,
    #[arg(long)]
    chirps: Option<usize>,
    #[arg(long)]
    samples: Option<usize>,
    /// Write the frame reports as JSON
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the result bridge alive for posted frames
    #[arg(long, default_value_t = false)]
    serve: bool,
}

impl Args {
    fn workflow_config(&self) -> anyhow::Result<WorkflowConfig> {
        let mut config = match &self.workflow {
            Some(path) => WorkflowConfig::load(path)?,
            None => WorkflowConfig::default(),
        };
        if let Some(receivers) = self.receivers {
            config.radar.num_receivers = receivers;
        }
        if let Some(chirps) = self.chirps {
            config.radar.num_chirps = chirps;
        }
        if let Some(samples) = self.samples {
            config.radar.num_samples = samples;
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if self.input.is_some() {
            config.input = self.input.clone();
        }
        if self.report.is_some() {
            config.report = self.report.clone();
        }
        Ok(config)
    }
}

fn gather_frames(config: &WorkflowConfig) -> anyhow::Result<Vec<(usize, SampleCube)>> {
    match &config.input {
        Some(path) => load_frames(path, config.shape()),
        None => (0..config.frames)
            .map(|index| Ok((index, build_cube(&config.generator, &config.radar, index)?)))
            .collect(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let workflow_config = args.workflow_config()?;

    let runner = Arc::new(Runner::new(workflow_config.clone()));
    let bridge = ResultBridge::new(runner.clone());
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime")?;

    if args.offline {
        let frames = gather_frames(&workflow_config)?;
        let reports = runtime.block_on(runner.execute_batch(frames))?;
        let summary = BatchSummary::from_reports(&reports);

        for report in &reports {
            println!(
                "frame {} -> peaks {}, estimates {}, targets {}, ego {:.2} m/s",
                report.frame_index,
                report.peaks.len(),
                report.estimates.len(),
                report.targets.len(),
                report.ego_speed_mps
            );
        }
        println!(
            "Offline run -> frames {}, peaks {}, estimates {}, conditions {}",
            summary.frames, summary.peaks, summary.estimates, summary.conditions
        );

        bridge.publish(&reports);
        bridge.publish_status("Offline workflow results ready.");

        if let Some(path) = &workflow_config.report {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let json = serde_json::to_string_pretty(&reports).context("serializing reports")?;
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        }
    }
    if args.serve {
        let _server = bridge.spawn_server(bind_address());
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
