use blockseek_core::IndexKind;

use crate::config::Config;

mod bulk;
mod elastic;
pub mod stats;

pub use elastic::ElasticStore;

/// Index names as configured for this deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexNames {
    pub block: String,
    pub tx: String,
    pub address: String,
}

impl IndexNames {
    pub fn name(&self, kind: IndexKind) -> &str {
        match kind {
            IndexKind::Block => &self.block,
            IndexKind::Transaction => &self.tx,
            IndexKind::Address => &self.address,
        }
    }
}

static MAPPINGS: [(IndexKind, &str); 3] = [
    (
        IndexKind::Block,
        r#"{
            "mappings": {
                "properties": {
                    "number": {
                        "type": "keyword",
                        "fields": { "numeric": { "type": "unsigned_long" } }
                    },
                    "blockHash": { "type": "keyword" },
                    "parentHash": { "type": "keyword" },
                    "miner": { "type": "keyword" },
                    "timestamp": { "type": "long" },
                    "txns": { "type": "long" },
                    "logsBloom": { "type": "text", "index": false },
                    "extraData": { "type": "text", "index": false }
                }
            }
        }"#,
    ),
    (
        IndexKind::Transaction,
        r#"{
            "mappings": {
                "properties": {
                    "hash": { "type": "keyword" },
                    "number": { "type": "keyword" },
                    "blockHash": { "type": "keyword" },
                    "from": { "type": "keyword" },
                    "to": { "type": "keyword" },
                    "contractAddress": { "type": "keyword" },
                    "timestamp": { "type": "long" },
                    "status": { "type": "keyword" },
                    "input": { "type": "text", "index": false },
                    "logsBloom": { "type": "text", "index": false },
                    "logs": {
                        "properties": {
                            "address": { "type": "keyword" },
                            "topics": { "type": "keyword" },
                            "data": { "type": "text", "index": false }
                        }
                    }
                }
            }
        }"#,
    ),
    (
        IndexKind::Address,
        r#"{
            "mappings": {
                "properties": {
                    "address": { "type": "keyword" },
                    "type": { "type": "byte" }
                }
            }
        }"#,
    ),
];

/// Creates every missing index with its mapping and hands back the store.
pub async fn initialize(config: &Config) -> anyhow::Result<ElasticStore> {
    let store = config.elastic()?;

    for (kind, mapping) in &MAPPINGS {
        let mapping: serde_json::Value = serde_json::from_str(mapping)?;
        if store.ensure_index(*kind, &mapping).await? {
            tracing::info!("Created index {}", store.indices().name(*kind));
        } else {
            tracing::debug!("Index {} already exists", store.indices().name(*kind));
        }
    }

    Ok(store)
}
