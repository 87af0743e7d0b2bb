//! Single-request and resumable uploads.
//!
//! Files up to `max_multipart_size` go out in one `uploadType=media`
//! request. Larger files open a resumable session and send `chunk_size`
//! slices with `Content-Range`; the service answers 308 with the persisted
//! `Range` until the last slice, then 200 or 201.

use std::io::SeekFrom;

use camino::Utf8Path;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE, HeaderMap, LOCATION, RANGE};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use super::{GcsClient, ensure_success};
use crate::storage::{StorageError, TransferConfig};

const OCTET_STREAM: &str = "application/octet-stream";

impl GcsClient {
    pub(super) async fn upload(
        &self,
        bucket: &str,
        name: &str,
        source: &Utf8Path,
        transfer: TransferConfig,
    ) -> Result<(), StorageError> {
        let size = tokio::fs::metadata(source)
            .await
            .map_err(|err| StorageError::io(source, &err))?
            .len();

        if size <= transfer.max_multipart_size {
            self.upload_single(bucket, name, source).await
        } else {
            self.upload_resumable(bucket, name, source, size, transfer.chunk_size)
                .await
        }
    }

    async fn upload_single(
        &self,
        bucket: &str,
        name: &str,
        source: &Utf8Path,
    ) -> Result<(), StorageError> {
        let body = tokio::fs::read(source)
            .await
            .map_err(|err| StorageError::io(source, &err))?;
        let mut url = self.api_url(&["upload", "storage", "v1", "b", bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);
        debug!(url = %url, bytes = body.len(), "single-request upload");

        let response = self
            .authorised(self.http.post(url))
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(body)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn start_session(
        &self,
        bucket: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError> {
        let mut url = self.api_url(&["upload", "storage", "v1", "b", bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("name", name);
        debug!(url = %url, size, "opening resumable session");

        let opened = self
            .authorised(self.http.post(url))
            .header("X-Upload-Content-Type", OCTET_STREAM)
            .header("X-Upload-Content-Length", size)
            .body(Vec::new())
            .send()
            .await?;
        ensure_success(opened)
            .await?
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| StorageError::Decode {
                message: String::from("resumable session response is missing Location"),
            })
    }

    async fn upload_resumable(
        &self,
        bucket: &str,
        name: &str,
        source: &Utf8Path,
        size: u64,
        chunk_size: u64,
    ) -> Result<(), StorageError> {
        let session = self.start_session(bucket, name, size).await?;
        let mut file = File::open(source)
            .await
            .map_err(|err| StorageError::io(source, &err))?;

        let mut offset = 0;
        while offset < size {
            let len = chunk_size.min(size - offset);
            let end = offset + len - 1;
            let chunk = read_chunk(&mut file, source, offset, len).await?;
            debug!(offset, end, size, "sending chunk");

            let response = self
                .authorised(self.http.put(session.as_str()))
                .header(CONTENT_RANGE, format!("bytes {offset}-{end}/{size}"))
                .body(chunk)
                .send()
                .await?;

            if response.status() == StatusCode::PERMANENT_REDIRECT {
                let next = persisted_through(response.headers()).map_or(0, |last| last + 1);
                if next <= offset {
                    return Err(StorageError::Api {
                        status: StatusCode::PERMANENT_REDIRECT.as_u16(),
                        message: format!("resumable session made no progress at byte {offset}"),
                    });
                }
                offset = next;
                continue;
            }

            ensure_success(response).await?;
            return Ok(());
        }

        Err(StorageError::Api {
            status: StatusCode::PERMANENT_REDIRECT.as_u16(),
            message: String::from("resumable session did not finalise after the last chunk"),
        })
    }
}

async fn read_chunk(
    file: &mut File,
    source: &Utf8Path,
    offset: u64,
    len: u64,
) -> Result<Vec<u8>, StorageError> {
    let capacity = usize::try_from(len).map_err(|_| StorageError::InvalidRequest {
        message: format!("chunk of {len} bytes exceeds addressable memory"),
    })?;
    file.seek(SeekFrom::Start(offset))
        .await
        .map_err(|err| StorageError::io(source, &err))?;

    let mut buffer = Vec::with_capacity(capacity);
    (&mut *file)
        .take(len)
        .read_to_end(&mut buffer)
        .await
        .map_err(|err| StorageError::io(source, &err))?;

    if buffer.len() != capacity {
        return Err(StorageError::Io {
            path: source.to_owned(),
            message: format!("file shrank while uploading at byte {offset}"),
        });
    }
    Ok(buffer)
}

/// Parses the last persisted byte from a `Range: bytes=0-N` header.
fn persisted_through(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RANGE)?
        .to_str()
        .ok()?
        .strip_prefix("bytes=")?
        .split_once('-')?
        .1
        .parse()
        .ok()
}
