use serde_json::{json, Value};
use stockpulse_core::{PersistentCache, StockDataClient};

use crate::cli::{CacheArgs, CacheCommand};
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &CacheArgs, client: &StockDataClient) -> Result<CommandResult, CliError> {
    let data = match &args.command {
        CacheCommand::List => list(client).await,
        CacheCommand::Show(key_args) => show(client, &key_args.key).await,
        CacheCommand::ClearKey(key_args) => clear_key(client, &key_args.key).await,
    };
    Ok(CommandResult::plain(data))
}

async fn list(client: &StockDataClient) -> Value {
    let keys = client.cache().keys().await;
    json!({ "count": keys.len(), "keys": keys })
}

async fn show(client: &StockDataClient, key: &str) -> Value {
    let cache = client.cache();
    let Some(entry) = cache.get::<Value>(key).await else {
        return json!({ "key": key, "cached": false });
    };

    let now = cache.now_epoch_millis();
    json!({
        "key": key,
        "storage_key": PersistentCache::storage_key(key),
        "cached": true,
        "stored_at_epoch_millis": entry.stored_at_epoch_millis,
        "age_ms": entry.age_millis(now),
        "fresh": entry.is_fresh(client.cache_ttl(), now),
        "value": entry.value,
    })
}

async fn clear_key(client: &StockDataClient, key: &str) -> Value {
    let cache = client.cache();
    let existed = cache.contains(key).await;
    if existed {
        cache.remove(key).await;
    }
    json!({ "key": key, "removed": existed })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stockpulse_core::{ClientConfig, MemoryStorage, ReqwestHttpClient};

    use super::*;

    fn offline_client() -> StockDataClient {
        StockDataClient::new(
            ClientConfig::default(),
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    #[tokio::test]
    async fn clear_key_reports_whether_an_entry_existed() {
        let client = offline_client();
        client.cache().put("quote_IBM", &json!({"05. price": "1"})).await;

        let first = clear_key(&client, "quote_IBM").await;
        let second = clear_key(&client, "quote_IBM").await;

        assert_eq!(first["removed"], json!(true));
        assert_eq!(second["removed"], json!(false));
        assert!(client.cache().keys().await.is_empty());
    }

    #[tokio::test]
    async fn list_shows_cache_keys_without_namespace() {
        let client = offline_client();
        client.cache().put("market_status", &json!({})).await;
        client.cache().put("quote_IBM", &json!({})).await;

        let listed = list(&client).await;

        assert_eq!(listed, json!({ "count": 2, "keys": ["market_status", "quote_IBM"] }));
    }
}
