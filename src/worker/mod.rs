//! Background planning worker
//!
//! The worker owns nothing shared with the live session. It receives a
//! serialized snapshot, plans on its own copies inside a blocking task and
//! answers with a [`WirePlan`] description.

pub mod protocol;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::ai::orchestrator::plan_turn;
use crate::ai::PlanningContext;
use crate::game::{SessionSnapshot, TrajectoryPredictor};

pub use protocol::{PlanRequest, PlanResponse, WirePlan};

/// Pending requests the channel will buffer
const REQUEST_BUFFER: usize = 16;

/// Worker-channel errors
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("Planning worker is not running")]
    Unavailable,

    #[error("Planning worker dropped the reply")]
    DroppedReply,

    #[error("Session has no active team to snapshot")]
    NoActiveTeam,

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Response for request {got} while waiting for {expected}")]
    RequestMismatch { expected: u64, got: u64 },

    #[error("Planning failed in worker: {0}")]
    Computation(String),
}

struct WorkerMessage {
    request: PlanRequest,
    reply: oneshot::Sender<PlanResponse>,
}

/// Handle to a running planning worker
#[derive(Clone)]
pub struct PlanningWorkerHandle {
    request_tx: mpsc::Sender<WorkerMessage>,
}

impl PlanningWorkerHandle {
    /// Send one request and wait for its answer
    pub async fn plan(&self, request: PlanRequest) -> Result<Option<WirePlan>, PlanningError> {
        let expected = request.request_id;
        let (reply, reply_rx) = oneshot::channel();
        self.request_tx
            .send(WorkerMessage { request, reply })
            .await
            .map_err(|_| PlanningError::Unavailable)?;

        let response = reply_rx.await.map_err(|_| PlanningError::DroppedReply)?;
        if response.request_id() != expected {
            return Err(PlanningError::RequestMismatch {
                expected,
                got: response.request_id(),
            });
        }
        match response {
            PlanResponse::Plan { plan, .. } => Ok(plan),
            PlanResponse::Error { message, .. } => Err(PlanningError::Computation(message)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.request_tx.is_closed()
    }
}

/// The planning worker actor
pub struct PlanningWorker {
    predictor: Arc<dyn TrajectoryPredictor>,
    request_rx: mpsc::Receiver<WorkerMessage>,
}

impl PlanningWorker {
    pub fn new(predictor: Arc<dyn TrajectoryPredictor>) -> (Self, PlanningWorkerHandle) {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let worker = Self {
            predictor,
            request_rx,
        };
        (worker, PlanningWorkerHandle { request_tx })
    }

    /// Start the worker on the current runtime
    pub fn spawn(predictor: Arc<dyn TrajectoryPredictor>) -> PlanningWorkerHandle {
        let (worker, handle) = Self::new(predictor);
        tokio::spawn(worker.run());
        handle
    }

    /// Serve requests until every handle is dropped
    pub async fn run(mut self) {
        info!("Planning worker started");

        while let Some(WorkerMessage { request, reply }) = self.request_rx.recv().await {
            let request_id = request.request_id;
            let predictor = self.predictor.clone();

            let task =
                tokio::task::spawn_blocking(move || compute_plan(predictor.as_ref(), &request));
            let response = match task.await {
                Ok(response) => response,
                Err(e) => {
                    error!(request_id, error = %e, "Planning task failed");
                    PlanResponse::Error {
                        request_id,
                        message: e.to_string(),
                    }
                }
            };

            if reply.send(response).is_err() {
                warn!(request_id, "Requester went away before the plan was ready");
            }
        }

        info!("Planning worker stopped");
    }
}

/// Plan from a serialized snapshot, touching only owned copies
pub fn compute_plan(predictor: &dyn TrajectoryPredictor, request: &PlanRequest) -> PlanResponse {
    let request_id = request.request_id;
    let snapshot = match SessionSnapshot::from_bytes(&request.snapshot) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            return PlanResponse::Error {
                request_id,
                message: format!("invalid snapshot: {}", e),
            }
        }
    };

    let (teams, personalities) = snapshot.restore_teams();
    let Some(shooter_team) = teams.iter().position(|t| t.id == snapshot.active_team_id) else {
        return PlanResponse::Error {
            request_id,
            message: format!("active team {} missing from snapshot", snapshot.active_team_id),
        };
    };

    let ctx = PlanningContext::new(
        &teams,
        &snapshot.terrain,
        predictor,
        snapshot.wind,
        snapshot.water_y,
        request.settings.scoring,
    );
    let mut rng = ChaCha8Rng::seed_from_u64(request.seed);
    let plan = plan_turn(
        &ctx,
        shooter_team,
        snapshot.active_index,
        snapshot.time_left_ms,
        &request.settings,
        &personalities,
        &mut rng,
    );

    debug!(request_id, planned = plan.is_some(), "Worker request served");
    PlanResponse::Plan {
        request_id,
        plan: plan.map(WirePlan::from),
    }
}
