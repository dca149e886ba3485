//! Hand-off of a persisted report to the inference collaborator
//!
//! Two dispatchers are provided:
//! - [`HttpDispatcher`] POSTs `{"input_file": "<report path>"}` to a service
//! - [`CommandDispatcher`] runs a local program with the report path
//!
//! Both treat an in-band `FAILURE` payload as an error. Nothing is retried.

use crate::config::InferenceTarget;
use reqwest::Client;
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

/// Argument replaced by the report path in command dispatch
pub const INPUT_PLACEHOLDER: &str = "{input}";

const FAILURE_MARKER: &str = "FAILURE";

/// Errors that can occur while handing off a report
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("inference service answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("inference reported failure: {0}")]
    Rejected(String),
    #[error("could not run {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Payload returned by the inference collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResult {
    Json(Value),
    Text(String),
}

impl fmt::Display for InferenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceResult::Json(Value::String(text)) | InferenceResult::Text(text) => {
                f.write_str(text)
            }
            InferenceResult::Json(value) => write!(f, "{}", value),
        }
    }
}

/// Parse a response body, keeping it as text when it is not JSON
pub fn parse_payload(body: &str) -> InferenceResult {
    let body = body.trim();
    match serde_json::from_str(body) {
        Ok(value) => InferenceResult::Json(value),
        Err(_) => InferenceResult::Text(body.to_string()),
    }
}

/// Detect the collaborator's in-band failure signal
///
/// Recognized shapes are a string starting with `FAILURE` and an array whose
/// first element is such a string.
pub fn failure_message(result: &InferenceResult) -> Option<String> {
    match result {
        InferenceResult::Text(text) | InferenceResult::Json(Value::String(text))
            if is_failure(text) =>
        {
            Some(text.trim().to_string())
        }
        InferenceResult::Json(Value::Array(items))
            if items.first().and_then(Value::as_str).is_some_and(is_failure) =>
        {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect();
            Some(parts.concat().trim().to_string())
        }
        _ => None,
    }
}

fn is_failure(text: &str) -> bool {
    text.trim_start().starts_with(FAILURE_MARKER)
}

fn check_payload(result: InferenceResult) -> Result<InferenceResult, DispatchError> {
    match failure_message(&result) {
        Some(message) => Err(DispatchError::Rejected(message)),
        None => Ok(result),
    }
}

/// Consumer of a persisted report
#[allow(async_fn_in_trait)]
pub trait InferenceDispatcher {
    /// Hand the report at `report` to the collaborator
    async fn dispatch(&self, report: &Path) -> Result<InferenceResult, DispatchError>;
}

/// Dispatch over HTTP
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl HttpDispatcher {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, DispatchError> {
        let client = Client::builder().build().map_err(DispatchError::Client)?;
        Ok(Self::with_client(client, endpoint, timeout))
    }

    /// Use a preconfigured client
    pub fn with_client(client: Client, endpoint: impl Into<String>, timeout: Option<Duration>) -> Self {
        HttpDispatcher {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, error: reqwest::Error) -> DispatchError {
        match self.timeout {
            Some(timeout) if error.is_timeout() => DispatchError::Timeout(timeout),
            _ => DispatchError::Network(error),
        }
    }
}

impl InferenceDispatcher for HttpDispatcher {
    async fn dispatch(&self, report: &Path) -> Result<InferenceResult, DispatchError> {
        let body = json!({ "input_file": report.display().to_string() });
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(endpoint = %self.endpoint, report = %report.display(), "posting report");
        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body: text.trim().to_string(),
            });
        }
        check_payload(parse_payload(&text))
    }
}

/// Dispatch by running a local program
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandDispatcher {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Option<Duration>) -> Self {
        CommandDispatcher {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with `{input}` replaced by the report path
    ///
    /// The path is appended when no argument mentions the placeholder.
    pub fn arguments_for(&self, report: &Path) -> Vec<String> {
        let path = report.display().to_string();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(INPUT_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(INPUT_PLACEHOLDER, &path)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(path);
        }
        args
    }

    fn launch_error(&self, source: std::io::Error) -> DispatchError {
        DispatchError::Launch {
            program: self.program.clone(),
            source,
        }
    }
}

impl InferenceDispatcher for CommandDispatcher {
    async fn dispatch(&self, report: &Path) -> Result<InferenceResult, DispatchError> {
        let args = self.arguments_for(report);
        tracing::debug!(program = %self.program, ?args, "running inference command");

        let child = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.launch_error(e))?;

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| DispatchError::Timeout(timeout))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| self.launch_error(e))?;

        if !output.status.success() {
            return Err(DispatchError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        check_payload(parse_payload(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Dispatcher selected from configuration
#[derive(Debug, Clone)]
pub enum Dispatcher {
    Http(HttpDispatcher),
    Command(CommandDispatcher),
}

impl Dispatcher {
    pub fn from_target(target: &InferenceTarget, timeout: Option<Duration>) -> Result<Self, DispatchError> {
        Ok(match target {
            InferenceTarget::Http { endpoint } => {
                Dispatcher::Http(HttpDispatcher::new(endpoint.as_str(), timeout)?)
            }
            InferenceTarget::Command { program, args } => {
                Dispatcher::Command(CommandDispatcher::new(program.as_str(), args.clone(), timeout))
            }
        })
    }
}

impl InferenceDispatcher for Dispatcher {
    async fn dispatch(&self, report: &Path) -> Result<InferenceResult, DispatchError> {
        match self {
            Dispatcher::Http(http) => http.dispatch(report).await,
            Dispatcher::Command(command) => command.dispatch(report).await,
        }
    }
}
