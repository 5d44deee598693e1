//! Remote project hosting.
//!
//! Publishing a schedule remotely is best effort. Every call here may fail and
//! the assembler treats any [`RemoteError`] as a signal to write the local
//! document instead.

use crate::config::RemoteSettings;
use crate::ids::RemoteProjectId;
use crate::resource::Resource;
use crate::task::Task;
use chrono::Local;
use parking_lot::Mutex;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Refresh the token this long before the provider says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(300);
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote service rejected {operation} with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("remote response for {0} carries no id")]
    MissingId(&'static str),
    #[error("remote service unavailable: {0}")]
    Unavailable(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Operations the assembler needs from a project hosting service.
///
/// Element references returned by `add_resource` and `add_task` are the
/// service's own ids and are only meaningful to the same host.
pub trait RemoteHost: Send + Sync {
    fn create_project(&self, project_name: &str) -> RemoteResult<RemoteProjectId>;
    fn add_resource(&self, project: &RemoteProjectId, resource: &Resource) -> RemoteResult<String>;
    fn add_task(&self, project: &RemoteProjectId, task: &Task) -> RemoteResult<String>;
    fn assign_resource(
        &self,
        project: &RemoteProjectId,
        task_ref: &str,
        resource_ref: &str,
    ) -> RemoteResult<()>;
    /// Removes a partially published project.
    fn discard_project(&self, project: &RemoteProjectId) -> RemoteResult<()>;
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_after: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Microsoft Graph style client using the OAuth client-credentials flow.
pub struct GraphProjectClient {
    settings: RemoteSettings,
    token: Mutex<Option<CachedToken>>,
}

impl GraphProjectClient {
    pub fn new(settings: RemoteSettings) -> Self {
        Self {
            settings,
            token: Mutex::new(None),
        }
    }

    // Built per call: a blocking client must not be dropped on an async
    // executor thread, and callers reach this through `spawn_blocking`.
    fn client(&self) -> RemoteResult<Client> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .build()?)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn access_token(&self, client: &Client) -> RemoteResult<String> {
        let mut cached = self.token.lock();
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_after {
                return Ok(token.access_token.clone());
            }
        }

        let response = client
            .post(&self.settings.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("scope", self.settings.scope.as_str()),
            ])
            .send()?;
        let response = check_status(response, "token request")?;
        let token: TokenResponse = response.json()?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS));
        let refresh_after = Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN);
        tracing::debug!(lifetime_secs = lifetime.as_secs(), "acquired remote access token");
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_after,
        });
        Ok(token.access_token)
    }

    fn post(&self, operation: &'static str, path: &str, body: Value) -> RemoteResult<Value> {
        let client = self.client()?;
        let token = self.access_token(&client)?;
        let response = client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()?;
        Ok(check_status(response, operation)?.json()?)
    }
}

fn check_status(
    response: reqwest::blocking::Response,
    operation: &'static str,
) -> RemoteResult<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(RemoteError::Rejected {
        operation,
        status: status.as_u16(),
        body,
    })
}

fn response_id(value: &Value, operation: &'static str) -> RemoteResult<String> {
    match value.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(RemoteError::MissingId(operation)),
    }
}

impl RemoteHost for GraphProjectClient {
    fn create_project(&self, project_name: &str) -> RemoteResult<RemoteProjectId> {
        let body = json!({
            "name": format!("{project_name}.mpp"),
            "description": format!("Project created by the planner on {}", Local::now().naive_local()),
        });
        let created = self.post("create project", "me/drive/root:/Projects", body)?;
        response_id(&created, "create project").map(RemoteProjectId::new)
    }

    fn add_resource(&self, project: &RemoteProjectId, resource: &Resource) -> RemoteResult<String> {
        let body = json!({
            "name": resource.name,
            "capacity": resource.capacity_percent as f64 / 100.0,
        });
        let path = format!("me/drive/items/{project}/resources");
        let created = self.post("add resource", &path, body)?;
        response_id(&created, "add resource")
    }

    fn add_task(&self, project: &RemoteProjectId, task: &Task) -> RemoteResult<String> {
        let mut body = json!({
            "name": task.name,
            "description": task.description.clone().unwrap_or_default(),
            "duration": format!("P{}D", task.duration_days),
        });
        if !task.predecessors.is_empty() {
            body["predecessors"] = task
                .predecessors
                .iter()
                .map(|id| json!({ "id": id }))
                .collect();
        }
        let path = format!("me/drive/items/{project}/tasks");
        let created = self.post("add task", &path, body)?;
        response_id(&created, "add task")
    }

    fn assign_resource(
        &self,
        project: &RemoteProjectId,
        task_ref: &str,
        resource_ref: &str,
    ) -> RemoteResult<()> {
        let body = json!({
            "taskId": task_ref,
            "resourceId": resource_ref,
            "percentWorkComplete": 0,
            "units": 1.0,
        });
        let path = format!("me/drive/items/{project}/assignments");
        self.post("assign resource", &path, body)?;
        Ok(())
    }

    fn discard_project(&self, project: &RemoteProjectId) -> RemoteResult<()> {
        let client = self.client()?;
        let token = self.access_token(&client)?;
        let response = client
            .delete(self.url(&format!("me/drive/items/{project}")))
            .bearer_auth(token)
            .send()?;
        check_status(response, "discard project")?;
        Ok(())
    }
}
