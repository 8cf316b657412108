use crate::bridge::model::ReportModel;
use crate::generator::profile::{build_payload, GeneratorConfig};
use crate::workflow::runner::Runner;
use doacore::{FramePayload, FrameReport};
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter, Rejection, Reply};

pub fn bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct IngestError;

impl warp::reject::Reject for IngestError {}

type SharedModel = Arc<RwLock<ReportModel>>;

/// Serves the latest report over HTTP and runs frames posted to it.
pub struct ResultBridge {
    state: SharedModel,
    runner: Arc<Runner>,
}

impl ResultBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(ReportModel::default())),
            runner,
        }
    }

    /// Starts the HTTP endpoint on its own thread and runtime.
    pub fn spawn_server(&self, address: SocketAddr) -> thread::JoinHandle<()> {
        let routes = routes(self.state.clone(), self.runner.clone());
        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            info!("result bridge listening on {}", address);
            runtime.block_on(warp::serve(routes).run(address));
        })
    }

    pub fn publish(&self, reports: &[FrameReport]) {
        let model = ReportModel::from_reports(reports, self.runner.metrics());
        println!(
            "[bridge] frames: {}, peaks: {}, estimates: {}, targets: {}",
            model.summary.frames, model.summary.peaks, model.summary.estimates, model.summary.targets
        );
        store(&self.state, model);
    }

    pub fn publish_status(&self, message: &str) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status = message.to_string();
        println!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ReportModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn store(state: &SharedModel, model: ReportModel) {
    *state.write().unwrap_or_else(PoisonError::into_inner) = model;
}

fn with_state(state: SharedModel) -> impl Filter<Extract = (SharedModel,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_runner(runner: Arc<Runner>) -> impl Filter<Extract = (Arc<Runner>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || runner.clone())
}

pub fn routes(
    state: SharedModel,
    runner: Arc<Runner>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let report_route = warp::path("report")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: SharedModel| {
            warp::reply::json(&*state.read().unwrap_or_else(PoisonError::into_inner))
        });

    let ingest_route = warp::path("ingest")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and(with_runner(runner.clone()))
        .and_then(
            |payload: FramePayload, state: SharedModel, runner: Arc<Runner>| async move {
                let job = runner.clone();
                let outcome = tokio::task::spawn_blocking(move || job.execute_payload(&payload))
                    .await
                    .map_err(anyhow::Error::from)
                    .and_then(|result| result);
                respond(outcome, &state, &runner, None)
            },
        );

    let generator_route = warp::path("ingest-config")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and(with_runner(runner))
        .and_then(
            |config: GeneratorConfig, state: SharedModel, runner: Arc<Runner>| async move {
                let job = runner.clone();
                let generator = config.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    build_payload(&generator, &job.config().radar, 0)
                        .and_then(|payload| job.execute_payload(&payload))
                })
                .await
                .map_err(anyhow::Error::from)
                .and_then(|result| result);
                if let (Ok(report), Some(name)) = (&outcome, config.scenario.as_ref()) {
                    info!("scenario {} -> {} peaks", name, report.peaks.len());
                }
                respond(outcome, &state, &runner, config.description)
            },
        );

    report_route.or(ingest_route).or(generator_route)
}

fn respond(
    outcome: anyhow::Result<FrameReport>,
    state: &SharedModel,
    runner: &Runner,
    description: Option<String>,
) -> Result<impl Reply, Rejection> {
    match outcome {
        Ok(report) => {
            let body = json!({
                "status": "ok",
                "frame_index": report.frame_index,
                "peaks": report.peaks.len(),
                "estimates": report.estimates.len(),
                "description": description.unwrap_or_default(),
            });
            store(
                state,
                ReportModel::from_reports(std::slice::from_ref(&report), runner.metrics()),
            );
            Ok(warp::reply::with_status(warp::reply::json(&body), StatusCode::OK))
        }
        Err(err) => {
            error!("ingest error: {:#}", err);
            Err(warp::reject::custom(IngestError))
        }
    }
}
