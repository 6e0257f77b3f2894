use std::str::FromStr;

use anyhow::Context;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

/// A document store on top of SQLite: each collection is a table holding one
/// JSON document per row.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("fail to connect to {url}"))?;
        Ok(Self { pool })
    }

    /// Open (and create on first use) the named collection.
    pub async fn collection(&self, name: &str) -> anyhow::Result<Collection> {
        if !is_valid_name(name) {
            anyhow::bail!("invalid collection name {name:?}");
        }

        sqlx::query(&format!(
            r#"
CREATE TABLE IF NOT EXISTS "{name}" (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    document TEXT NOT NULL
)"#
        ))
        .execute(&self.pool)
        .await
        .with_context(|| format!("fail to create collection {name}"))?;

        Ok(Collection {
            pool: self.pool.clone(),
            name: name.to_string(),
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

pub struct Collection {
    pool: SqlitePool,
    name: String,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert every document in one transaction and return how many were
    /// written. Nothing is deduplicated.
    pub async fn insert_many(&self, documents: &[Value]) -> anyhow::Result<u64> {
        let statement = format!(r#"INSERT INTO "{}" (document) VALUES (?)"#, self.name);
        let mut tx = self.pool.begin().await?;

        let mut inserted = 0;
        for (index, document) in documents.iter().enumerate() {
            inserted += sqlx::query(&statement)
                .bind(document.to_string())
                .execute(&mut tx)
                .await
                .with_context(|| format!("fail to insert document #{index} into {}", self.name))?
                .rows_affected();
        }

        tx.commit()
            .await
            .with_context(|| format!("fail to commit into {}", self.name))?;
        Ok(inserted)
    }

    pub async fn count(&self) -> anyhow::Result<u64> {
        let row = sqlx::query(&format!(r#"SELECT COUNT(*) AS n FROM "{}""#, self.name))
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as u64)
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
