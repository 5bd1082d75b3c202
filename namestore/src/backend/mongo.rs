//! MongoDB adapter: documents addressed by a hex-encoded key field.
//!
//! Keys are stored uppercase-hex under a unique index, which turns the
//! byte-prefix scan into an anchored `$regex` query. Batch upserts are
//! issued per document; partial failure is engine-defined, as the backend
//! contract permits.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, spec::BinarySubtype, Binary, Bson, Document};
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Client, Collection, IndexModel};
use namestore_core::Timestamp;

use super::PersistenceBackend;
use crate::error::StorageError;

/// Error type for MongoDB backend operations.
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("mongodb driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("stored document is malformed: {0}")]
    MalformedDocument(String),
}

impl From<MongoError> for StorageError {
    fn from(e: MongoError) -> Self {
        StorageError::Backend {
            reason: e.to_string(),
        }
    }
}

/// MongoDB-backed persistence engine.
pub struct MongoBackend {
    collection: Collection<Document>,
}

impl MongoBackend {
    /// Connect to the server, verify it is reachable, and ensure the
    /// unique key index exists.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, MongoError> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);
        database.run_command(doc! { "ping": 1 }, None).await?;
        let collection = database.collection::<Document>(collection);

        let index = IndexModel::builder()
            .keys(doc! { "key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(index, None).await?;

        Ok(Self { collection })
    }

    fn document_for(key_hex: &str, packet: &[u8], expire_at: Option<Timestamp>) -> Document {
        doc! {
            "key": key_hex,
            "value": Binary {
                subtype: BinarySubtype::Generic,
                bytes: packet.to_vec(),
            },
            "expire_time_ms": expire_at
                .map(|t| Bson::Int64(t.timestamp_millis()))
                .unwrap_or(Bson::Null),
        }
    }

    fn freshness_clause(now_ms: i64) -> Bson {
        Bson::Array(vec![
            Bson::Document(doc! { "expire_time_ms": Bson::Null }),
            Bson::Document(doc! { "expire_time_ms": { "$gt": now_ms } }),
        ])
    }
}

#[async_trait]
impl PersistenceBackend for MongoBackend {
    async fn put(
        &self,
        key: &[u8],
        packet: &[u8],
        expire_at: Option<Timestamp>,
    ) -> Result<(), StorageError> {
        let key_hex = hex::encode_upper(key);
        let replacement = Self::document_for(&key_hex, packet, expire_at);
        self.collection
            .replace_one(
                doc! { "key": &key_hex },
                replacement,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(MongoError::from)?;
        Ok(())
    }

    async fn put_batch(
        &self,
        keys: &[Vec<u8>],
        packets: &[Vec<u8>],
        expirations: &[Option<Timestamp>],
    ) -> Result<(), StorageError> {
        for ((key, packet), expire_at) in keys.iter().zip(packets).zip(expirations) {
            self.put(key, packet, *expire_at).await?;
        }
        Ok(())
    }

    async fn get(
        &self,
        key: &[u8],
        can_be_prefix: bool,
        must_be_fresh: bool,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let key_hex = hex::encode_upper(key);
        let mut filter = if can_be_prefix {
            doc! { "key": { "$regex": format!("^{key_hex}") } }
        } else {
            doc! { "key": &key_hex }
        };
        if must_be_fresh {
            filter.insert("$or", Self::freshness_clause(Utc::now().timestamp_millis()));
        }

        let found = self
            .collection
            .find_one(filter, None)
            .await
            .map_err(MongoError::from)?;
        match found {
            Some(document) => {
                let packet = document
                    .get_binary_generic("value")
                    .map_err(|e| MongoError::MalformedDocument(e.to_string()))?;
                Ok(Some(packet.clone()))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &[u8]) -> Result<bool, StorageError> {
        let key_hex = hex::encode_upper(key);
        let result = self
            .collection
            .delete_one(doc! { "key": &key_hex }, None)
            .await
            .map_err(MongoError::from)?;
        Ok(result.deleted_count > 0)
    }
}

// Exercising this adapter needs a running MongoDB server; the shared
// backend battery lives in the lmdb and sqlite adapter tests.
