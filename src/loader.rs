use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::db::DocumentStore;

pub const DEFAULT_COLLECTION: &str = "restaurants";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub collection: String,
    pub inserted: u64,
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} documents were inserted.", self.inserted)
    }
}

/// Read the file as a JSON array; any other top level value is an error.
pub async fn read_documents(path: &Path) -> anyhow::Result<Vec<Value>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("fail to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    match value {
        Value::Array(documents) => Ok(documents),
        other => anyhow::bail!(
            "{} must hold a JSON array, found {}",
            path.display(),
            kind(&other)
        ),
    }
}

/// Insert every element of the array in `path` into `collection`.
///
/// Running it twice inserts everything twice.
pub async fn load(
    store: &DocumentStore,
    collection: &str,
    path: &Path,
) -> anyhow::Result<LoadReport> {
    let documents = read_documents(path).await?;
    tracing::info!(
        "loading {} documents from {} into {collection}",
        documents.len(),
        path.display()
    );

    let collection = store.collection(collection).await?;
    let inserted = collection.insert_many(&documents).await?;

    Ok(LoadReport {
        collection: collection.name().to_string(),
        inserted,
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.json");
        std::fs::write(&path, r#"{ "restaurant": { "name": "KFC" } }"#).unwrap();

        let err = read_documents(&path).await.unwrap_err();
        assert!(err.to_string().contains("found an object"), "{err}");
    }

    #[tokio::test]
    async fn rejects_missing_file() {
        assert!(read_documents(Path::new("/nonexistent/restaurants.json"))
            .await
            .is_err());
    }

    #[test]
    fn report_message() {
        let report = LoadReport {
            collection: DEFAULT_COLLECTION.to_string(),
            inserted: 42,
        };
        assert_eq!(report.to_string(), "42 documents were inserted.");
    }
}
