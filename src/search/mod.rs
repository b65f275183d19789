pub mod client;
pub mod model;

pub use client::{normalize_base_url, video_url, HttpSearchClient, SearchBackend};
pub use model::{decode_search_body, Keypoint, QueryFile, ResultSet, SearchResult};
