use std::{collections::HashSet, time::Duration};

use alloy_primitives::U256;
use async_trait::async_trait;
use blockseek_core::{BlockDocument, BulkSummary, Document, IndexKind, IndexStore, StoreError};
use reqwest::{header::CONTENT_TYPE, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use serde_with::{serde_as, DisplayFromStr};
use url::Url;

use super::{bulk, IndexNames};

/// [`IndexStore`] over the Elasticsearch REST API.
#[derive(Clone, Debug)]
pub struct ElasticStore {
    client: reqwest::Client,
    base: Url,
    auth: Option<(String, Option<String>)>,
    indices: IndexNames,
}

#[derive(Deserialize)]
struct SearchResponse<T> {
    hits: Hits<T>,
}

#[derive(Deserialize)]
struct Hits<T> {
    hits: Vec<Hit<T>>,
}

#[derive(Deserialize)]
struct Hit<T> {
    #[serde(rename = "_source")]
    source: T,
}

#[serde_as]
#[derive(Deserialize)]
struct BlockHeight {
    #[serde_as(as = "DisplayFromStr")]
    number: U256,
}

#[derive(Deserialize)]
struct MgetResponse {
    docs: Vec<MgetDoc>,
}

#[derive(Deserialize)]
struct MgetDoc {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    found: bool,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

impl ElasticStore {
    pub fn new(
        mut base: Url,
        timeout: Duration,
        auth: Option<(String, Option<String>)>,
        indices: IndexNames,
    ) -> anyhow::Result<ElasticStore> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ElasticStore {
            client,
            base,
            auth,
            indices,
        })
    }

    pub fn indices(&self) -> &IndexNames {
        &self.indices
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StoreError> {
        let url = self
            .base
            .join(path)
            .map_err(|err| StoreError::Malformed(format!("{path}: {err}")))?;
        tracing::debug!("Elasticsearch {method} {url}");
        let request = self.client.request(method, url);
        Ok(match &self.auth {
            Some((user, password)) => request.basic_auth(user, password.as_ref()),
            None => request,
        })
    }

    /// Creates the index with `mapping` unless it exists. Returns whether it was created.
    pub async fn ensure_index(
        &self,
        kind: IndexKind,
        mapping: &serde_json::Value,
    ) -> Result<bool, StoreError> {
        let name = self.indices.name(kind);
        let response = send(self.request(Method::HEAD, name)?).await?;
        match response.status() {
            StatusCode::OK => return Ok(false),
            StatusCode::NOT_FOUND => {}
            _ => return Err(rejected(response).await),
        }

        let response = send(self.request(Method::PUT, name)?.json(mapping)).await?;
        if response.status().is_success() {
            return Ok(true);
        }
        // Another process may have created it in between.
        let err = rejected(response).await;
        match &err {
            StoreError::Rejected { status: 400, body }
                if body.contains("resource_already_exists_exception") =>
            {
                Ok(false)
            }
            _ => Err(err),
        }
    }

    /// Number of documents in one index; a missing index counts as empty.
    pub async fn count(&self, kind: IndexKind) -> Result<u64, StoreError> {
        let path = format!("{}/_count", self.indices.name(kind));
        let response = send(self.request(Method::GET, &path)?).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        let parsed: CountResponse = parse(response).await?;
        Ok(parsed.count)
    }
}

async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
    request
        .send()
        .await
        .map_err(|err| StoreError::Unreachable(err.to_string()))
}

async fn rejected(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::Rejected { status, body }
}

/// Blocks sort by time, ties broken by the numeric view of the height. Both sorts
/// tolerate an index that has no mapping for the field yet.
fn latest_height_query() -> serde_json::Value {
    json!({
        "size": 1,
        "sort": [
            { "timestamp": { "order": "desc", "unmapped_type": "long" } },
            { "number.numeric": { "order": "desc", "unmapped_type": "long" } },
        ],
        "_source": ["number"],
    })
}

/// Maps the status of a single-document `_create` onto the create-only contract.
fn create_outcome(
    status: StatusCode,
    body: String,
    index: IndexKind,
    id: String,
) -> Result<(), StoreError> {
    match status {
        status if status.is_success() => Ok(()),
        StatusCode::CONFLICT => Err(StoreError::Conflict { index, id }),
        _ => Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        }),
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    if !response.status().is_success() {
        return Err(rejected(response).await);
    }
    let body = response
        .bytes()
        .await
        .map_err(|err| StoreError::Unreachable(err.to_string()))?;
    serde_json::from_slice(&body).map_err(|err| StoreError::Malformed(err.to_string()))
}

#[async_trait]
impl IndexStore for ElasticStore {
    async fn latest_indexed_height(&self) -> Result<Option<U256>, StoreError> {
        let path = format!("{}/_search", self.indices.block);
        let request = self
            .request(Method::POST, &path)?
            .json(&latest_height_query());
        let response = send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let parsed: SearchResponse<BlockHeight> = parse(response).await?;
        Ok(parsed.hits.hits.into_iter().next().map(|hit| hit.source.number))
    }

    async fn create_block(&self, doc: &BlockDocument) -> Result<(), StoreError> {
        let path = format!("{}/_create/{}", self.indices.block, doc.id());
        let response = send(self.request(Method::PUT, &path)?.json(doc)).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| StoreError::Unreachable(err.to_string()))?;
        create_outcome(status, body, IndexKind::Block, doc.id())
    }

    async fn bulk_create<D: Document>(&self, docs: &[D]) -> Result<BulkSummary, StoreError> {
        if docs.is_empty() {
            return Ok(BulkSummary::default());
        }

        let index = self.indices.name(D::KIND);
        let body =
            bulk::encode(index, docs).map_err(|err| StoreError::Malformed(err.to_string()))?;
        let request = self
            .request(Method::POST, "_bulk")?
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let response = send(request).await?;
        if !response.status().is_success() {
            let reason = match rejected(response).await {
                StoreError::Rejected { status, body } => format!("status {status}: {body}"),
                other => other.to_string(),
            };
            return Err(StoreError::PartialFailure {
                index: D::KIND,
                failed: docs.len(),
                reason,
            });
        }

        let parsed: bulk::BulkResponse = parse(response).await?;
        parsed.summarize(D::KIND, docs.len())
    }

    async fn find_existing_ids(
        &self,
        kind: IndexKind,
        ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let path = format!("{}/_mget", self.indices.name(kind));
        let request = self
            .request(Method::POST, &path)?
            .query(&[("_source", "false")])
            .json(&json!({ "ids": ids }));
        let response = send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(HashSet::new());
        }

        let parsed: MgetResponse = parse(response).await?;
        Ok(parsed
            .docs
            .into_iter()
            .filter(|doc| doc.found)
            .map(|doc| doc.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(url: &str) -> ElasticStore {
        let indices = IndexNames {
            block: "block".into(),
            tx: "tx".into(),
            address: "address".into(),
        };
        ElasticStore::new(Url::parse(url).unwrap(), Duration::from_secs(1), None, indices)
            .unwrap()
    }

    #[test]
    fn test_paths_keep_base_prefix() {
        let store = store("http://search.internal:9200/es");
        let request = store
            .request(Method::GET, "block/_count")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://search.internal:9200/es/block/_count"
        );
    }

    #[test]
    fn test_mget_docs_missing_found_are_absent() {
        let parsed: MgetResponse = serde_json::from_str(
            r#"{"docs":[
                {"_index":"address","_id":"0xA","found":true},
                {"_index":"address","_id":"0xB","found":false},
                {"_index":"address","_id":"0xC","error":{"type":"index_not_found_exception"}}
            ]}"#,
        )
        .unwrap();
        let found = parsed
            .docs
            .into_iter()
            .filter(|doc| doc.found)
            .map(|doc| doc.id)
            .collect::<Vec<_>>();
        assert_eq!(found, vec!["0xA"]);
    }

    #[test]
    fn test_search_hit_height() {
        let parsed: SearchResponse<BlockHeight> = serde_json::from_str(
            r#"{"took":1,"hits":{"total":{"value":1,"relation":"eq"},
                "hits":[{"_index":"block","_id":"17000000","_source":{"number":"17000000"}}]}}"#,
        )
        .unwrap();
        assert_eq!(parsed.hits.hits[0].source.number, U256::from(17_000_000));
    }

    #[test]
    fn test_create_outcome() {
        let outcome = |status| {
            create_outcome(status, "{}".into(), IndexKind::Block, "42".into())
        };

        assert!(outcome(StatusCode::CREATED).is_ok());
        assert!(matches!(
            outcome(StatusCode::CONFLICT),
            Err(StoreError::Conflict { index: IndexKind::Block, id }) if id == "42"
        ));
        assert!(matches!(
            outcome(StatusCode::BAD_REQUEST),
            Err(StoreError::Rejected { status: 400, .. })
        ));
        assert!(matches!(
            outcome(StatusCode::SERVICE_UNAVAILABLE),
            Err(StoreError::Rejected { status: 503, .. })
        ));
    }

    #[test]
    fn test_latest_height_query_breaks_timestamp_ties() {
        let query = latest_height_query();
        let sort = query["sort"].as_array().unwrap();

        assert_eq!(query["size"], 1);
        assert_eq!(sort.len(), 2);
        assert_eq!(sort[0]["timestamp"]["order"], "desc");
        assert_eq!(sort[1]["number.numeric"]["order"], "desc");
        for clause in sort {
            let (_, options) = clause.as_object().unwrap().iter().next().unwrap();
            assert_eq!(options["unmapped_type"], "long");
        }
    }

    #[tokio::test]
    async fn test_empty_writes_skip_the_network() {
        // Nothing listens on this port, so any request would fail.
        let store = store("http://127.0.0.1:9");

        let blocks: Vec<BlockDocument> = vec![];
        let summary = store.bulk_create(&blocks).await.unwrap();
        assert_eq!(summary, BulkSummary::default());

        let existing = store
            .find_existing_ids(IndexKind::Address, &[])
            .await
            .unwrap();
        assert!(existing.is_empty());
    }
}
