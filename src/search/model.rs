use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ContractError, InputError, SearchError};
use crate::overlay::model::Point;

pub type Keypoint = Point;

/// One candidate scene returned by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub video_id: String,
    pub timestamp_seconds: f64,
    pub score: f64,
    /// Positions in the unscaled query image.
    pub query_keypoints: Vec<Keypoint>,
    /// Positions in the unscaled matched video frame; index `i` pairs with
    /// `query_keypoints[i]`.
    pub matched_keypoints: Vec<Keypoint>,
    /// `data:image/...;base64,` still of the matched frame, when the backend
    /// sends one.
    pub matched_frame: Option<String>,
}

impl SearchResult {
    pub fn timestamp_label(&self) -> String {
        format!("{:.2}s", self.timestamp_seconds)
    }

    pub fn score_label(&self) -> String {
        format!("{:.2}", self.score)
    }

    pub fn info_line(&self) -> String {
        format!(
            "{} | Time: {} | Score: {}",
            self.video_id,
            self.timestamp_label(),
            self.score_label()
        )
    }

    pub fn matched_frame_bytes(&self) -> Option<Vec<u8>> {
        self.matched_frame.as_deref().and_then(decode_data_url)
    }
}

/// Ranked results of one search, best first. Never mutated after it is built;
/// a new search produces a new set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    results: Arc<[SearchResult]>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ResultSet {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results: results.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SearchResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[SearchResult] {
        &self.results
    }
}

/// The image chosen by the user for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl QueryFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let unreadable = |message: String| InputError::Unreadable {
            path: path.display().to_string(),
            message,
        };
        if path.as_os_str().is_empty() {
            return Err(InputError::NoFileSelected);
        }
        let bytes = std::fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        if bytes.is_empty() {
            return Err(unreadable("the file is empty".into()));
        }
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("query")
            .to_string();
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn mime_type(&self) -> &'static str {
        let ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("bmp") => "image/bmp",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    video_file: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    query_keypoints: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    frame_keypoints: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    matched_frame: Option<String>,
}

/// Decode the body of a successful `/search` response.
///
/// An empty `result` list is a valid, empty [`ResultSet`]; the caller decides
/// how to present it.
pub fn decode_search_body(body: &[u8]) -> Result<ResultSet, SearchError> {
    let response: WireResponse = serde_json::from_slice(body)
        .map_err(|e| ContractError::MalformedPayload(e.to_string()))?;

    // The backend answers a search with no candidates as `success: false`
    // plus a plain `message`; only a `detail` or a `result` marks a failure.
    if response.success != Some(true)
        && response.detail.is_none()
        && response.result.is_none()
    {
        tracing::debug!(message = ?response.message, "backend found no candidates");
        return Ok(ResultSet::default());
    }
    if response.success != Some(true) {
        let message = error_detail(response.detail.as_ref(), response.message.as_deref())
            .unwrap_or_else(|| "The search failed for an unknown reason.".to_string());
        return Err(SearchError::Rejected(message));
    }

    let raw = match response.result {
        None => {
            return Err(
                ContractError::MalformedPayload("missing 'result' list".into()).into(),
            )
        }
        Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value::<Vec<WireResult>>(value)
            .map_err(|e| ContractError::MalformedPayload(e.to_string()))?,
    };

    let results = raw
        .into_iter()
        .enumerate()
        .map(|(index, wire)| into_result(index, wire))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ResultSet::new(results))
}

fn into_result(index: usize, wire: WireResult) -> Result<SearchResult, ContractError> {
    let video_id = wire
        .video_id
        .or(wire.video_file)
        .filter(|id| !id.trim().is_empty())
        .ok_or(ContractError::MissingField {
            index,
            field: "video_id",
        })?;

    let timestamp_seconds = required_number(index, "timestamp", wire.timestamp.as_ref())?;
    if timestamp_seconds < 0.0 {
        return Err(ContractError::NegativeTimestamp {
            index,
            value: timestamp_seconds,
        });
    }
    let score = required_number(index, "score", wire.score.as_ref())?;

    let (query_keypoints, matched_keypoints) = match (wire.query_keypoints, wire.frame_keypoints) {
        (None, None) => (Vec::new(), Vec::new()),
        (query, matched) => (
            to_points(query.unwrap_or_default()),
            to_points(matched.unwrap_or_default()),
        ),
    };
    if query_keypoints.len() != matched_keypoints.len() {
        return Err(ContractError::KeypointCountMismatch {
            index,
            query: query_keypoints.len(),
            matched: matched_keypoints.len(),
        });
    }
    if query_keypoints
        .iter()
        .chain(matched_keypoints.iter())
        .any(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return Err(ContractError::InvalidField {
            index,
            field: "keypoints",
        });
    }

    if let Some(frame) = wire.matched_frame.as_deref() {
        if !is_base64_data_url(frame) {
            return Err(ContractError::InvalidFrameData { index });
        }
    }

    Ok(SearchResult {
        video_id,
        timestamp_seconds,
        score,
        query_keypoints,
        matched_keypoints,
        matched_frame: wire.matched_frame,
    })
}

fn required_number(
    index: usize,
    field: &'static str,
    value: Option<&Value>,
) -> Result<f64, ContractError> {
    let value = value
        .filter(|v| !v.is_null())
        .ok_or(ContractError::MissingField { index, field })?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or(ContractError::InvalidField { index, field })
}

fn to_points(raw: Vec<[f64; 2]>) -> Vec<Keypoint> {
    raw.into_iter().map(|[x, y]| Point::new(x, y)).collect()
}

/// Human readable failure text from a FastAPI style error body.
pub fn error_detail(detail: Option<&Value>, message: Option<&str>) -> Option<String> {
    let from_detail = detail.and_then(|detail| match detail {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(obj) => obj.get("msg").and_then(Value::as_str).map(str::to_string),
                    _ => None,
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    });
    from_detail
        .or_else(|| message.map(str::to_string))
        .filter(|s| !s.trim().is_empty())
}

/// Pull `detail`/`message` out of an error response body, if it is JSON.
pub fn error_detail_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    error_detail(value.get("detail"), value.get("message").and_then(Value::as_str))
}

fn is_base64_data_url(url: &str) -> bool {
    url.split_once(',')
        .map(|(header, _)| header.starts_with("data:") && header.ends_with(";base64"))
        .unwrap_or(false)
}

pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    if !is_base64_data_url(url) {
        return None;
    }
    let (_, payload) = url.split_once(',')?;
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()
}
