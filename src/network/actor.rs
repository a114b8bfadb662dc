//! Network actor - runs requests for a host UI over channels
//!
//! Each request runs on its own task. Cancelling one id never touches the
//! others; exactly one `NetworkResponse` is sent per request id.

use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{ExtractRule, RequestSpec};
use crate::network::executor::Executor;
use crate::postprocess;

/// Tracks an active request for cancellation
struct ActiveRequest {
    cancel_tx: oneshot::Sender<()>,
}

/// Network actor that processes request commands
pub struct NetworkActor {
    executor: Executor,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<u64>,
    cancel_handles: HashMap<u64, ActiveRequest>,
}

impl NetworkActor {
    pub fn new(executor: Executor, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            executor,
            response_tx,
            active_requests: JoinSet::new(),
            cancel_handles: HashMap::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::ExecuteRequest { id, request }) => {
                            let spec = request.to_spec();
                            self.spawn_request(id, spec, request.extract_rules);
                        }

                        Some(NetworkCommand::ExecuteSpec { id, spec }) => {
                            self.spawn_request(id, spec, Vec::new());
                        }

                        Some(NetworkCommand::CancelRequest(id)) => {
                            if let Some(active) = self.cancel_handles.remove(&id) {
                                tracing::info!(id, "Cancelling request");
                                let _ = active.cancel_tx.send(());
                            }
                        }

                        Some(NetworkCommand::ClearCookies) => {
                            tracing::info!("Clearing cookies");
                            self.executor.transport().clear_cookies();
                        }

                        Some(NetworkCommand::Shutdown) => {
                            for (_, active) in self.cancel_handles.drain() {
                                let _ = active.cancel_tx.send(());
                            }
                            break;
                        }

                        None => break,
                    }
                }

                Some(joined) = self.active_requests.join_next() => {
                    if let Ok(id) = joined {
                        self.cancel_handles.remove(&id);
                    }
                }
            }
        }

        // let cancelled tasks report before the actor goes away
        while self.active_requests.join_next().await.is_some() {}
    }

    fn spawn_request(&mut self, id: u64, spec: RequestSpec, rules: Vec<ExtractRule>) {
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        self.cancel_handles.insert(id, ActiveRequest { cancel_tx });

        let executor = self.executor.clone();
        let response_tx = self.response_tx.clone();

        self.active_requests.spawn(async move {
            tracing::info!(id, url = %spec.url, method = spec.method.as_str(), "Executing request");
            tokio::select! {
                biased;

                _ = &mut cancel_rx => {
                    let _ = response_tx.send(NetworkResponse::Cancelled { id });
                }
                response = executor.run(&spec) => {
                    let (response, extracted) = postprocess::finish(response, &rules);
                    tracing::info!(id, status = response.status_code, "Request completed");
                    let _ = response_tx.send(NetworkResponse::Completed { id, response, extracted });
                }
            }
            id
        });
    }
}
