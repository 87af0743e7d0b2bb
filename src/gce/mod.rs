//! Compute Engine v1 REST client.
//!
//! Requests carry a bearer token resolved once at construction. Responses
//! with a non-success status are surfaced as [`ComputeError::Api`] with the
//! provider's body untouched; nothing is retried.

mod error;
mod models;

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::compute::{ComputeApi, ComputeFuture, InstanceAction, InstanceSummary, MachineConfig};
use crate::config::GcpConfig;
use crate::credentials::{AccessToken, Credentials};
use models::{GceImage, GceInstance, GceOperation, InstanceList};

pub use error::ComputeError;

/// Base URL of the Compute Engine v1 API.
pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com/compute/v1";

/// Timeout applied to each request when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`ComputeApi`] implementation backed by the Compute Engine REST API.
#[derive(Clone, Debug)]
pub struct GceClient {
    http: Client,
    endpoint: String,
    token: AccessToken,
}

impl GceClient {
    /// Creates a client for `endpoint` that authenticates with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(
        endpoint: impl Into<String>,
        token: AccessToken,
        timeout: Duration,
    ) -> Result<Self, ComputeError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            token,
        })
    }

    /// Creates a client after resolving `credentials` to a token.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Credentials`] when no token can be obtained.
    pub async fn connect(
        endpoint: impl Into<String>,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Self, ComputeError> {
        let http = Client::builder().timeout(timeout).build()?;
        let token = credentials.resolve(&http).await?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            token,
        })
    }

    /// Creates a client from layered configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Credentials`] when no token can be obtained.
    pub async fn from_config(config: &GcpConfig) -> Result<Self, ComputeError> {
        Self::connect(
            config.compute_endpoint.as_str(),
            &config.credentials(),
            config.request_timeout(),
        )
        .await
    }

    fn instances_url(&self, project: &str, zone: &str) -> String {
        format!(
            "{}/projects/{project}/zones/{zone}/instances",
            self.endpoint
        )
    }

    fn instance_url(&self, project: &str, zone: &str, name: &str) -> String {
        format!("{}/{name}", self.instances_url(project, zone))
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", self.token.bearer())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ComputeError> {
        debug!(url = %url, "GET request");
        let response = self
            .authorised(self.http.get(url))
            .query(query)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn send_operation(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<GceOperation, ComputeError> {
        debug!(url = %url, "operation request");
        let response = self.authorised(request).send().await?;
        let operation: GceOperation = Self::handle_response(response).await?;
        debug!(operation = ?operation.name, "operation accepted");
        Ok(operation)
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComputeError> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ComputeError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|err| ComputeError::Decode {
            message: err.to_string(),
        })
    }
}

impl ComputeApi for GceClient {
    type Error = ComputeError;

    fn list_instances<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
    ) -> ComputeFuture<'a, Vec<InstanceSummary>, Self::Error> {
        Box::pin(async move {
            let url = self.instances_url(project, zone);
            let mut instances = Vec::new();
            let mut page_token: Option<String> = None;
            loop {
                let query: Vec<(&str, &str)> = page_token
                    .as_deref()
                    .map(|token| vec![("pageToken", token)])
                    .unwrap_or_default();
                let page: InstanceList = self.get_json(&url, &query).await?;
                instances.extend(page.items.into_iter().map(InstanceSummary::from));
                match page.next_page_token.filter(|token| !token.is_empty()) {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }
            Ok(instances)
        })
    }

    fn get_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, InstanceSummary, Self::Error> {
        Box::pin(async move {
            let url = self.instance_url(project, zone, name);
            let instance: GceInstance = self.get_json(&url, &[]).await?;
            Ok(instance.into())
        })
    }

    fn latest_image<'a>(
        &'a self,
        image_project: &'a str,
        image_family: &'a str,
    ) -> ComputeFuture<'a, String, Self::Error> {
        Box::pin(async move {
            let url = format!(
                "{}/projects/{image_project}/global/images/family/{image_family}",
                self.endpoint
            );
            let image: GceImage = self.get_json(&url, &[]).await?;
            Ok(image.self_link)
        })
    }

    fn insert_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        config: &'a MachineConfig,
    ) -> ComputeFuture<'a, String, Self::Error> {
        Box::pin(async move {
            let url = self.instances_url(project, zone);
            let operation = self
                .send_operation(&url, self.http.post(&url).json(config))
                .await?;
            operation.target_id.ok_or_else(|| ComputeError::Decode {
                message: String::from("insert operation is missing targetId"),
            })
        })
    }

    fn perform_action<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
        action: InstanceAction,
    ) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let url = format!("{}/{}", self.instance_url(project, zone, name), action.verb());
            self.send_operation(&url, self.http.post(&url)).await?;
            Ok(())
        })
    }

    fn delete_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let url = self.instance_url(project, zone, name);
            self.send_operation(&url, self.http.delete(&url)).await?;
            Ok(())
        })
    }
}
