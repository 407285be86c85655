//! DynamoDB key-value backend (requires the `dynamodb` feature).

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use crate::config::StoreConfig;
use crate::error::{ErrorKind, StoreError};
use crate::record::{ExpiryFilter, RecordPatch, ScanItem, SessionRecord};
use crate::result::StoreResult;
use crate::traits::KeyValueBackend;

const ATTR_ID: &str = "id";
const ATTR_SESS: &str = "sess";
const ATTR_EXPIRES: &str = "expires";
const ATTR_TYPE: &str = "type";

/// Key-value backend over a DynamoDB table with a string partition key
/// named `id`.
#[derive(Debug, Clone)]
pub struct DynamoDbBackend {
    client: Client,
}

impl DynamoDbBackend {
    /// Wrap a pre-constructed DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the store configuration.
    ///
    /// Explicit `access_key_id`/`secret_access_key` take precedence; when
    /// absent the SDK's default credential provider chain applies. The
    /// SDK's default transport is TLS.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(key), Some(secret)) => {
                loader = loader.credentials_provider(Credentials::new(
                    key.clone(),
                    secret.clone(),
                    None,
                    None,
                    "dynamodb-sessions",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(StoreError::configuration(
                    "access_key_id and secret_access_key must be set together",
                ));
            }
        }
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;
        Ok(Self::new(Client::new(&shared)))
    }
}

#[async_trait]
impl KeyValueBackend for DynamoDbBackend {
    fn backend_type(&self) -> &str {
        "dynamodb"
    }

    async fn get_item(&self, table: &str, key: &str) -> StoreResult<Option<SessionRecord>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(ATTR_ID, AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(|err| {
                StoreError::with_source(ErrorKind::Backend, format!("GetItem failed for `{key}`"), err)
            })?;

        match output.item() {
            Some(item) => Ok(Some(item_to_record(item)?)),
            None => Ok(None),
        }
    }

    async fn put_item(&self, table: &str, record: &SessionRecord) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|err| {
                StoreError::with_source(
                    ErrorKind::Backend,
                    format!("PutItem failed for `{}`", record.id),
                    err,
                )
            })?;
        Ok(())
    }

    async fn update_item(&self, table: &str, key: &str, patch: &RecordPatch) -> StoreResult<()> {
        self.client
            .update_item()
            .table_name(table)
            .key(ATTR_ID, AttributeValue::S(key.to_string()))
            .update_expression("SET #sess = :sess, #expires = :expires")
            .expression_attribute_names("#sess", ATTR_SESS)
            .expression_attribute_names("#expires", ATTR_EXPIRES)
            .expression_attribute_values(":sess", AttributeValue::S(patch.sess.clone()))
            .expression_attribute_values(":expires", AttributeValue::N(patch.expires.to_string()))
            .send()
            .await
            .map_err(|err| {
                StoreError::with_source(
                    ErrorKind::Backend,
                    format!("UpdateItem failed for `{key}`"),
                    err,
                )
            })?;
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &str) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(table)
            .key(ATTR_ID, AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(|err| {
                StoreError::with_source(
                    ErrorKind::Backend,
                    format!("DeleteItem failed for `{key}`"),
                    err,
                )
            })?;
        Ok(())
    }

    async fn scan(
        &self,
        table: &str,
        filter: &ExpiryFilter,
        projection: &[&str],
    ) -> StoreResult<Vec<ScanItem>> {
        // Every attribute goes through an expression alias so reserved
        // words in the table schema never break the expression.
        let aliases: Vec<String> = (0..projection.len()).map(|i| format!("#p{i}")).collect();

        let mut items = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;
        loop {
            let mut request = self
                .client
                .scan()
                .table_name(table)
                .filter_expression("#f < :cutoff")
                .expression_attribute_names("#f", filter.attribute.clone())
                .expression_attribute_values(
                    ":cutoff",
                    AttributeValue::N(filter.less_than.to_string()),
                )
                .set_exclusive_start_key(exclusive_start_key.take());

            if !projection.is_empty() {
                request = request.projection_expression(aliases.join(", "));
                for (alias, name) in aliases.iter().zip(projection) {
                    request = request.expression_attribute_names(alias.clone(), name.to_string());
                }
            }

            let output = request.send().await.map_err(|err| {
                StoreError::with_source(ErrorKind::Backend, format!("Scan failed on `{table}`"), err)
            })?;

            items.extend(output.items().iter().map(item_to_scan_item));

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
                _ => break,
            }
        }
        Ok(items)
    }
}

fn record_to_item(record: &SessionRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (ATTR_ID.to_string(), AttributeValue::S(record.id.clone())),
        (ATTR_SESS.to_string(), AttributeValue::S(record.sess.clone())),
        (
            ATTR_EXPIRES.to_string(),
            AttributeValue::N(record.expires.to_string()),
        ),
        (
            ATTR_TYPE.to_string(),
            AttributeValue::S(record.record_type.clone()),
        ),
    ])
}

fn item_to_record(item: &HashMap<String, AttributeValue>) -> StoreResult<SessionRecord> {
    Ok(SessionRecord {
        id: string_attr(item, ATTR_ID)?,
        sess: string_attr(item, ATTR_SESS)?,
        expires: number_attr(item, ATTR_EXPIRES)?,
        // Records written by other tools may lack the tag.
        record_type: item
            .get(ATTR_TYPE)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default(),
    })
}

fn item_to_scan_item(item: &HashMap<String, AttributeValue>) -> ScanItem {
    ScanItem {
        id: item.get(ATTR_ID).and_then(|v| v.as_s().ok()).cloned(),
        sess: item.get(ATTR_SESS).and_then(|v| v.as_s().ok()).cloned(),
        expires: item
            .get(ATTR_EXPIRES)
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok()),
    }
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> StoreResult<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| {
            StoreError::serialization(format!("missing or non-string attribute `{name}`"))
        })
}

fn number_attr(item: &HashMap<String, AttributeValue>, name: &str) -> StoreResult<i64> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse::<i64>().ok())
        .ok_or_else(|| {
            StoreError::serialization(format!("missing or non-numeric attribute `{name}`"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_item_roundtrip() {
        let record = SessionRecord::new("sess:a".to_string(), r#"{"n":1}"#.to_string(), 5_000);
        let item = record_to_item(&record);
        assert_eq!(item_to_record(&item).unwrap(), record);
    }

    #[test]
    fn test_item_missing_sess_is_serialization_error() {
        let item = HashMap::from([(
            ATTR_ID.to_string(),
            AttributeValue::S("sess:a".to_string()),
        )]);
        let err = item_to_record(&item).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);
    }

    #[test]
    fn test_scan_item_projection_gaps() {
        let item = HashMap::from([(
            ATTR_ID.to_string(),
            AttributeValue::S("sess:a".to_string()),
        )]);
        let scan_item = item_to_scan_item(&item);
        assert_eq!(scan_item.id.as_deref(), Some("sess:a"));
        assert_eq!(scan_item.sess, None);
        assert_eq!(scan_item.expires, None);
    }
}
