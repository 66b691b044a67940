//! Qdrant REST client for the vector index.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::VectorIndex;
use crate::config::VectorIndexConfig;
use crate::memory::types::SearchResult;

pub struct QdrantIndex {
    client: Client,
    base_url: String,
    collection: String,
}

#[derive(Debug, Serialize)]
struct PointStruct<'a> {
    id: &'a str,
    vector: Vec<f32>,
    payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: Vec<PointStruct<'a>>,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

impl QdrantIndex {
    pub fn new(config: &VectorIndexConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).context("QDRANT_API_KEY is not a valid header value")?;
            headers.insert("api-key", value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        Ok(Self {
            client: builder.build().context("failed to build Qdrant HTTP client")?,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }
}

/// Turn a non-2xx reply into an error carrying Qdrant's message body.
async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("Qdrant {action} failed with HTTP {status}: {body}")
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn backend_name(&self) -> &'static str {
        "qdrant"
    }

    async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        let url = self.collection_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {url}"))?;

        if response.status() != StatusCode::NOT_FOUND {
            ensure_success(response, "collection lookup").await?;
            tracing::debug!(collection = %self.collection, "Qdrant collection exists");
            return Ok(());
        }

        let response = self
            .client
            .put(&url)
            .json(&json!({"vectors": {"size": dimensions, "distance": "Cosine"}}))
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {url}"))?;
        ensure_success(response, "collection create").await?;

        tracing::info!(collection = %self.collection, dimensions, "Qdrant collection created");
        Ok(())
    }

    async fn upsert(&self, id: &str, vector: Vec<f32>, payload: serde_json::Value) -> Result<()> {
        let url = format!("{}/points?wait=true", self.collection_url());
        let request = UpsertRequest {
            points: vec![PointStruct { id, vector, payload }],
        };

        let response = self
            .client
            .put(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {url}"))?;
        ensure_success(response, "upsert").await?;
        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = format!("{}/points/search", self.collection_url());
        let request = SearchRequest {
            vector,
            limit,
            with_payload: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {url}"))?;
        let body: QdrantResponse<Vec<ScoredPoint>> = ensure_success(response, "search")
            .await?
            .json()
            .await
            .context("invalid Qdrant search response")?;

        Ok(body
            .result
            .into_iter()
            .map(|point| SearchResult {
                score: point.score,
                payload: point.payload.unwrap_or_else(|| json!({})),
            })
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        let url = format!("{}/points/count", self.collection_url());
        let response = self
            .client
            .post(&url)
            .json(&json!({"exact": true}))
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {url}"))?;
        let body: QdrantResponse<CountResult> = ensure_success(response, "count")
            .await?
            .json()
            .await
            .context("invalid Qdrant count response")?;
        Ok(body.result.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn index_for(server: &Server) -> QdrantIndex {
        QdrantIndex::new(&VectorIndexConfig {
            backend: "qdrant".into(),
            collection: "logs".into(),
            url: server.url(),
            api_key: Some("secret".into()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn creates_missing_collection_with_cosine_distance() {
        let mut server = Server::new_async().await;
        let lookup = server
            .mock("GET", "/collections/logs")
            .with_status(404)
            .with_body(r#"{"status":{"error":"Not found"}}"#)
            .create_async()
            .await;
        let create = server
            .mock("PUT", "/collections/logs")
            .match_header("api-key", "secret")
            .match_body(Matcher::PartialJson(
                json!({"vectors": {"size": 384, "distance": "Cosine"}}),
            ))
            .with_status(200)
            .with_body(r#"{"result":true,"status":"ok"}"#)
            .create_async()
            .await;

        index_for(&server).ensure_collection(384).await.unwrap();

        lookup.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn existing_collection_is_left_alone() {
        let mut server = Server::new_async().await;
        let lookup = server
            .mock("GET", "/collections/logs")
            .with_status(200)
            .with_body(r#"{"result":{"status":"green"},"status":"ok"}"#)
            .create_async()
            .await;
        let create = server
            .mock("PUT", "/collections/logs")
            .expect(0)
            .create_async()
            .await;

        index_for(&server).ensure_collection(384).await.unwrap();

        lookup.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn upsert_sends_point_with_payload() {
        let mut server = Server::new_async().await;
        let upsert = server
            .mock("PUT", "/collections/logs/points")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({
                "points": [{"id": "p-1", "vector": [0.5, 0.5], "payload": {"type": "url_visit"}}]
            })))
            .with_status(200)
            .with_body(r#"{"result":{"operation_id":1,"status":"completed"},"status":"ok"}"#)
            .create_async()
            .await;

        index_for(&server)
            .upsert("p-1", vec![0.5, 0.5], json!({"type": "url_visit"}))
            .await
            .unwrap();
        upsert.assert_async().await;
    }

    #[tokio::test]
    async fn search_parses_scored_points() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("POST", "/collections/logs/points/search")
            .match_body(Matcher::PartialJson(json!({"limit": 5, "with_payload": true})))
            .with_status(200)
            .with_body(
                r#"{"result":[
                    {"id":"a","version":0,"score":0.82,"payload":{"type":"url_visit","title":"Docs","url":"https://docs.x"}},
                    {"id":"b","version":0,"score":0.4}
                ],"status":"ok","time":0.001}"#,
            )
            .create_async()
            .await;

        let hits = index_for(&server).search(vec![1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!((hits[0].score - 0.82).abs() < 1e-6);
        assert_eq!(hits[0].payload["title"], "Docs");
        assert_eq!(hits[1].payload, json!({}));
    }

    #[tokio::test]
    async fn server_errors_surface_with_body() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("POST", "/collections/logs/points/search")
            .with_status(400)
            .with_body(r#"{"status":{"error":"Wrong input: Vector dimension error"}}"#)
            .create_async()
            .await;

        let err = index_for(&server).search(vec![1.0], 5).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("400"), "{message}");
        assert!(message.contains("Vector dimension error"), "{message}");
    }

    #[tokio::test]
    async fn count_reads_exact_count() {
        let mut server = Server::new_async().await;
        let _count = server
            .mock("POST", "/collections/logs/points/count")
            .with_status(200)
            .with_body(r#"{"result":{"count":42},"status":"ok"}"#)
            .create_async()
            .await;

        assert_eq!(index_for(&server).count().await.unwrap(), 42);
    }
}
