//! In-memory `Sender` used by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Method, Request, Response};
use url::Url;

use crate::client::Sender;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

#[derive(Debug)]
enum Canned {
    Respond { status: u16, body: String },
    Fail(String),
}

/// Returns queued responses in order and remembers every request it was given.
#[derive(Debug, Default)]
pub(crate) struct RecordingSender {
    canned: Mutex<VecDeque<Canned>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.canned.lock().unwrap().push_back(Canned::Respond {
            status,
            body: body.into(),
        });
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.canned
            .lock()
            .unwrap()
            .push_back(Canned::Fail(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sender for RecordingSender {
    async fn send(&self, request: Request) -> Result<Response> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            authorization: request
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });

        let canned = self.canned.lock().unwrap().pop_front();
        match canned {
            Some(Canned::Respond { status, body }) => Ok(json_response(status, body)),
            Some(Canned::Fail(message)) => Err(Error::Unexpected(message)),
            None => Err(Error::Unexpected("no canned response left".to_string())),
        }
    }
}

pub(crate) fn json_response(status: u16, body: impl Into<String>) -> Response {
    let body: String = body.into();
    let response = http::Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("x-request-id", "test-request")
        .body(body)
        .unwrap();
    Response::from(response)
}
