use std::collections::HashMap;

use blockseek_core::{BulkSummary, Document, IndexKind, StoreError};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::json;

/// NDJSON body of a create-only bulk request: one action line, one source line per document.
pub(super) fn encode<D: Document>(index: &str, docs: &[D]) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for doc in docs {
        let action = json!({ "create": { "_index": index, "_id": doc.id() } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    Ok(body)
}

#[derive(Deserialize, Debug)]
pub(super) struct BulkResponse {
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Deserialize, Debug)]
struct BulkItem {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    status: u16,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl BulkItem {
    fn reason(&self) -> String {
        let field = |name: &str| {
            self.error
                .as_ref()
                .and_then(|err| err.get(name))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
                .to_string()
        };
        format!(
            "{} ({}): {}",
            self.id.as_deref().unwrap_or("?"),
            field("type"),
            field("reason")
        )
    }
}

impl BulkResponse {
    /// Counts created and already-existing documents. Any other per-item error fails the batch.
    pub(super) fn summarize(self, index: IndexKind, sent: usize) -> Result<BulkSummary, StoreError> {
        let items = self
            .items
            .into_iter()
            .flat_map(HashMap::into_values)
            .collect::<Vec<_>>();
        if items.len() != sent {
            return Err(StoreError::Malformed(format!(
                "bulk response to {index} has {} item(s) for {sent} document(s)",
                items.len()
            )));
        }

        let mut summary = BulkSummary::default();
        let mut failures = vec![];
        for item in items {
            match item.status {
                200..=299 => summary.created += 1,
                409 => summary.conflicts += 1,
                _ => failures.push(item),
            }
        }

        if !failures.is_empty() {
            return Err(StoreError::PartialFailure {
                index,
                failed: failures.len(),
                reason: failures.iter().take(3).map(BulkItem::reason).join("; "),
            });
        }
        Ok(summary)
    }
}
