//! REST implementation of [`ProcessBackend`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::{NewProcess, Page, ProcessId, ProcessNode};
use crate::infrastructure::traits::ProcessBackend;
use crate::infrastructure::{InfraError, InfraResult};

/// Body of `PATCH /processes/{id}/children/reorder`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBody<'a> {
    pub process_ids: &'a [ProcessId],
}

pub struct HttpProcessBackend {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpProcessBackend {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> InfraResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| InfraError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(InfraError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_settings(settings: &Settings) -> InfraResult<Self> {
        Self::new(
            &settings.api_url,
            settings.api_token.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Base url joined with percent-encoded path segments.
    pub fn endpoint(&self, segments: &[&str]) -> InfraResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| InfraError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> InfraResult<T> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| InfraError::decode(what, e))
    }
}

async fn check_status(response: Response) -> InfraResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    Err(InfraError::Http {
        status: status.as_u16(),
        message,
    })
}

/// `message` field of an error body; validation errors carry a list.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

#[async_trait]
impl ProcessBackend for HttpProcessBackend {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_children(&self, parent: &ProcessId) -> InfraResult<Vec<ProcessNode>> {
        let url = self.endpoint(&["processes", parent.as_str(), "children"])?;
        self.send(self.request(Method::GET, url), "children list").await
    }

    #[instrument(level = "debug", skip(self))]
    async fn commit_reorder(
        &self,
        parent: &ProcessId,
        ordered_ids: &[ProcessId],
    ) -> InfraResult<Vec<ProcessNode>> {
        let url = self.endpoint(&["processes", parent.as_str(), "children", "reorder"])?;
        let body = ReorderBody {
            process_ids: ordered_ids,
        };
        self.send(self.request(Method::PATCH, url).json(&body), "reorder result")
            .await
    }

    async fn list_processes(&self) -> InfraResult<Vec<ProcessNode>> {
        let url = self.endpoint(&["processes"])?;
        self.send(self.request(Method::GET, url), "process list").await
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_department_processes(
        &self,
        department: &str,
        page: u32,
        limit: u32,
    ) -> InfraResult<Page<ProcessNode>> {
        let mut url = self.endpoint(&["processes", "department", department])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        debug!("GET {}", url);
        self.send(self.request(Method::GET, url), "department processes")
            .await
    }

    async fn get_process(&self, id: &ProcessId) -> InfraResult<ProcessNode> {
        let url = self.endpoint(&["processes", id.as_str()])?;
        self.send(self.request(Method::GET, url), "process").await
    }

    #[instrument(level = "debug", skip(self, draft), fields(name = %draft.name))]
    async fn create_process(&self, draft: &NewProcess) -> InfraResult<ProcessNode> {
        let url = self.endpoint(&["processes"])?;
        self.send(self.request(Method::POST, url).json(draft), "created process")
            .await
    }
}
