//! Cloud Storage JSON API client.
//!
//! Listing follows page tokens; downloads stream the response body to disk
//! and remove the partial file when the stream fails;
//! uploads pick a single request or a resumable session depending on the
//! [`TransferConfig`] passed by the facade.

mod models;
mod upload;

use std::time::Duration;

use camino::Utf8Path;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url, redirect};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::GcpConfig;
use crate::credentials::{AccessToken, Credentials};
use crate::storage::{ObjectMetadata, StorageApi, StorageError, StorageFuture, TransferConfig};
use models::ObjectList;

/// Base URL of the Cloud Storage JSON API.
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

/// [`StorageApi`] implementation backed by the Cloud Storage JSON API.
#[derive(Clone, Debug)]
pub struct GcsClient {
    http: Client,
    endpoint: String,
    token: AccessToken,
}

fn http_client(timeout: Duration) -> Result<Client, StorageError> {
    // Resumable sessions answer 308 without a Location header; never follow.
    Ok(Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::none())
        .build()?)
}

impl GcsClient {
    /// Creates a client for `endpoint` that authenticates with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        token: AccessToken,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            http: http_client(timeout)?,
            endpoint: endpoint.into(),
            token,
        })
    }

    /// Creates a client after resolving `credentials` to a token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Credentials`] when no token can be obtained.
    pub async fn connect(
        endpoint: impl Into<String>,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let http = http_client(timeout)?;
        let token = credentials.resolve(&http).await?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token,
        })
    }

    /// Creates a client from layered configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Credentials`] when no token can be obtained.
    pub async fn from_config(config: &GcpConfig) -> Result<Self, StorageError> {
        Self::connect(
            config.storage_endpoint.as_str(),
            &config.credentials(),
            config.request_timeout(),
        )
        .await
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = Url::parse(&self.endpoint).map_err(|err| StorageError::InvalidRequest {
            message: format!("invalid storage endpoint {}: {err}", self.endpoint),
        })?;
        url.path_segments_mut()
            .map_err(|()| StorageError::InvalidRequest {
                message: format!("storage endpoint {} cannot be a base URL", self.endpoint),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", self.token.bearer())
    }

    async fn fetch_page(
        &self,
        bucket: &str,
        url: &Url,
        page_token: Option<&str>,
    ) -> Result<ObjectList, StorageError> {
        debug!(url = %url, "GET request");
        let mut request = self.authorised(self.http.get(url.clone()));
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::BucketNotFound {
                bucket: bucket.to_owned(),
            });
        }
        let body = ensure_success(response).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| StorageError::Decode {
            message: err.to_string(),
        })
    }
}

/// Passes success responses through and turns the rest into
/// [`StorageError::Api`] carrying the provider body.
async fn ensure_success(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StorageError::Api {
        status: status.as_u16(),
        message,
    })
}

impl StorageApi for GcsClient {
    fn list_objects<'a>(&'a self, bucket: &'a str) -> StorageFuture<'a, Vec<ObjectMetadata>> {
        Box::pin(async move {
            let url = self.api_url(&["storage", "v1", "b", bucket, "o"])?;
            let mut objects = Vec::new();
            let mut page_token: Option<String> = None;
            loop {
                let page = self.fetch_page(bucket, &url, page_token.as_deref()).await?;
                for item in page.items {
                    objects.push(ObjectMetadata::try_from(item)?);
                }
                match page.next_page_token.filter(|token| !token.is_empty()) {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }
            Ok(objects)
        })
    }

    fn upload_file<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
        source: &'a Utf8Path,
        transfer: TransferConfig,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move { self.upload(bucket, name, source, transfer).await })
    }

    fn download_file<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
        destination: &'a Utf8Path,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let mut url = self.api_url(&["storage", "v1", "b", bucket, "o", name])?;
            url.query_pairs_mut().append_pair("alt", "media");
            debug!(url = %url, "GET request");

            let sent = self.authorised(self.http.get(url)).send().await?;
            let mut response = ensure_success(sent).await?;

            let file = tokio::fs::File::create(destination)
                .await
                .map_err(|err| StorageError::io(destination, &err))?;
            let streamed = stream_to_file(&mut response, file, destination).await;
            if streamed.is_err() {
                discard_partial(destination).await;
            }
            streamed
        })
    }
}

async fn stream_to_file(
    response: &mut Response,
    mut file: tokio::fs::File,
    destination: &Utf8Path,
) -> Result<(), StorageError> {
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|err| StorageError::io(destination, &err))?;
    }
    file.flush()
        .await
        .map_err(|err| StorageError::io(destination, &err))
}

/// Removes a partially written download; the transfer error is what the
/// caller sees, so a failed removal is only logged.
async fn discard_partial(destination: &Utf8Path) {
    if let Err(err) = tokio::fs::remove_file(destination).await {
        warn!(destination = %destination, error = %err, "failed to remove partial download");
    }
}
