use anyhow::Context;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use std::time::Duration;
use url::Url;

use crate::error::{SearchError, TransportError};
use crate::search::model::{decode_search_body, error_detail_from_body, QueryFile, ResultSet};
use crate::settings::Settings;

/// The remote matcher, seen from the client.
pub trait SearchBackend: Send + Sync {
    /// Submit `query` and wait for the ranked results.
    fn search(&self, query: &QueryFile) -> Result<ResultSet, SearchError>;

    /// Where the matched video can be streamed from, seeked to `timestamp_seconds`.
    fn video_url(&self, video_id: &str, timestamp_seconds: f64) -> Option<Url>;
}

pub struct HttpSearchClient {
    client: Client,
    base: Url,
}

impl HttpSearchClient {
    pub fn new(base: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scene-search-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self { client, base })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(settings.base_url()?, settings.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /` on the backend; returns its banner message.
    pub fn ping(&self) -> Result<String, TransportError> {
        let resp = self
            .client
            .get(self.base.clone())
            .send()
            .map_err(transport_error)?;
        let status = resp.status();
        let body = resp.bytes().map_err(transport_error)?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: error_detail_from_body(&body),
            });
        }
        Ok(error_detail_from_body(&body)
            .unwrap_or_else(|| String::from_utf8_lossy(&body).trim().to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|e| TransportError::Unreachable(format!("invalid endpoint '{path}': {e}")))
    }
}

impl SearchBackend for HttpSearchClient {
    fn search(&self, query: &QueryFile) -> Result<ResultSet, SearchError> {
        let url = self.endpoint("search")?;
        let part = Part::bytes(query.bytes().to_vec())
            .file_name(query.name().to_string())
            .mime_str(query.mime_type())
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;
        let form = Form::new().part("file", part);

        tracing::debug!(%url, file = query.name(), "submitting search");
        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .map_err(transport_error)?;
        let status = resp.status();
        let body = resp.bytes().map_err(transport_error)?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: error_detail_from_body(&body),
            }
            .into());
        }
        decode_search_body(&body)
    }

    fn video_url(&self, video_id: &str, timestamp_seconds: f64) -> Option<Url> {
        video_url(&self.base, video_id, timestamp_seconds)
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Unreachable(err.to_string())
    }
}

/// Parse a backend base URL so that relative endpoints join below it.
pub fn normalize_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `{base}/videos/{id}#t={seconds}`; the media fragment lets the player seek
/// with range requests instead of downloading the whole file.
pub fn video_url(base: &Url, video_id: &str, timestamp_seconds: f64) -> Option<Url> {
    let mut url = base
        .join(&format!("videos/{}", urlencoding::encode(video_id)))
        .ok()?;
    url.set_fragment(Some(&format!("t={:.3}", timestamp_seconds.max(0.0))));
    Some(url)
}
