//! In-memory transport used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::dav::transport::{DavMethod, DavRequest, DavResponse, DavTransport};
use crate::error::AppError;

enum Outcome {
    Response(DavResponse),
    Network(String),
}

struct Canned {
    outcome: Outcome,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(DavMethod, String), VecDeque<Canned>>>,
    requests: Mutex<Vec<DavRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: DavMethod, path: &str, canned: Canned) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(canned);
    }

    pub fn respond(&self, method: DavMethod, path: &str, status: u16, body: &str) {
        self.respond_with_headers(method, path, status, body, &[]);
    }

    pub fn respond_with_headers(
        &self,
        method: DavMethod,
        path: &str,
        status: u16,
        body: &str,
        headers: &[(&str, &str)],
    ) {
        let response = DavResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            body: body.to_string(),
        };
        self.push(
            method,
            path,
            Canned {
                outcome: Outcome::Response(response),
                gate: None,
            },
        );
    }

    /// The response is held back until the returned sender fires (or is dropped).
    pub fn respond_gated(
        &self,
        method: DavMethod,
        path: &str,
        status: u16,
        body: &str,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            method,
            path,
            Canned {
                outcome: Outcome::Response(DavResponse {
                    status,
                    body: body.to_string(),
                    ..Default::default()
                }),
                gate: Some(rx),
            },
        );
        tx
    }

    pub fn fail_network(&self, method: DavMethod, path: &str) {
        self.push(
            method,
            path,
            Canned {
                outcome: Outcome::Network("connection refused".to_string()),
                gate: None,
            },
        );
    }

    pub fn requests(&self) -> Vec<DavRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DavTransport for FakeTransport {
    async fn send(&self, request: DavRequest) -> Result<DavResponse, AppError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);

        let canned = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() == 1 && queue[0].gate.is_none() => {
                    let only = &queue[0];
                    Some(Canned {
                        outcome: match &only.outcome {
                            Outcome::Response(r) => Outcome::Response(r.clone()),
                            Outcome::Network(m) => Outcome::Network(m.clone()),
                        },
                        gate: None,
                    })
                }
                Some(queue) => queue.pop_front(),
                None => None,
            }
        };

        let Some(canned) = canned else {
            return Ok(DavResponse {
                status: 404,
                ..Default::default()
            });
        };

        if let Some(gate) = canned.gate {
            let _ = gate.await;
        }

        match canned.outcome {
            Outcome::Response(response) => Ok(response),
            Outcome::Network(message) => Err(AppError::transport(None, message)),
        }
    }
}
