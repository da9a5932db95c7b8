//! Blocking harness around a wiremock server.
//!
//! wiremock is async; the server runs on its own thread and is only driven
//! from `block_on` here, so the blocking reqwest client under test never runs
//! inside a tokio context.

#![allow(dead_code)]

use argilla_client::{Client, ClientConfig};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

pub const API_KEY: &str = "argilla.apikey";
pub const DATASET_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
pub const WORKSPACE_ID: &str = "6d1e0bfa-7c4f-4d5a-9d0e-2b1c4a3e5f70";

// `server` is declared first so it drops (and verifies) before the runtime.
pub struct Server {
    server: MockServer,
    rt: Runtime,
}

impl Server {
    pub fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn client(&self) -> Client {
        Client::from_config(ClientConfig::new(self.uri(), API_KEY)).unwrap()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    pub fn verify(&self) {
        self.rt.block_on(self.server.verify());
    }
}

pub fn dataset_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": "product-reviews",
        "guidelines": "Label the sentiment of each review.",
        "status": status,
        "workspace_id": WORKSPACE_ID,
        "inserted_at": "2023-05-10T09:00:00",
        "updated_at": "2023-05-10T09:00:00"
    })
}
