// Trello card creation

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;
use url::Url;

use super::client::UpstreamClient;
use crate::config::TrelloConfig;
use crate::tools::{JsonObject, ToolExecutor, UpstreamError, UpstreamErrorKind, arg_str};

pub struct TrelloCards {
    client: Arc<UpstreamClient>,
    config: TrelloConfig,
}

impl TrelloCards {
    pub fn new(client: Arc<UpstreamClient>, config: TrelloConfig) -> Self {
        Self { client, config }
    }

    /// `{api_base}/cards` carrying the credentials and card fields as query
    /// parameters. Fails with `not_configured` when credentials are incomplete.
    fn cards_url(&self, name: &str, desc: &str) -> Result<Url, UpstreamError> {
        let (key, token, list_id) = self
            .config
            .credentials()
            .ok_or_else(|| UpstreamError::not_configured("Trello key, token or list id"))?;

        let base = format!("{}/cards", self.config.api_base.trim_end_matches('/'));
        let mut url = Url::parse(&base).map_err(|e| {
            UpstreamError::new(
                UpstreamErrorKind::NotConfigured,
                format!("Trello API base `{}` is invalid: {}", base, e),
            )
        })?;
        url.query_pairs_mut()
            .append_pair("key", key)
            .append_pair("token", token)
            .append_pair("idList", list_id)
            .append_pair("name", name)
            .append_pair("desc", desc);
        Ok(url)
    }
}

#[async_trait]
impl ToolExecutor for TrelloCards {
    async fn execute(&self, args: &JsonObject) -> Result<Value, UpstreamError> {
        let name = arg_str(args, "name").unwrap_or_default();
        let desc = arg_str(args, "desc").unwrap_or_default();
        let url = self.cards_url(name, desc)?;

        let card = self.client.post_json(url.as_str(), &json!({})).await?;
        let card_url = card
            .get("url")
            .or_else(|| card.get("shortUrl"))
            .and_then(Value::as_str)
            .ok_or_else(|| UpstreamError::new(UpstreamErrorKind::Decode, "card response has no url"))?;

        info!(name, url = card_url, "Created card");
        Ok(json!({
            "id": card.get("id").cloned().unwrap_or(Value::Null),
            "url": card_url,
            "message": format!("Card created: {}", card_url),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cards(config: TrelloConfig) -> TrelloCards {
        let client = Arc::new(UpstreamClient::new(Duration::from_secs(1)).unwrap());
        TrelloCards::new(client, config)
    }

    #[test]
    fn test_cards_url_carries_credentials() {
        let cards = cards(TrelloConfig {
            key: Some("k".to_string()),
            token: Some("t".to_string()),
            list_id: Some("list 1".to_string()),
            api_base: "https://api.trello.com/1/".to_string(),
        });
        let url = cards.cards_url("Q3 review", "").unwrap();
        assert_eq!(url.path(), "/1/cards");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("key".to_string(), "k".to_string()),
                ("token".to_string(), "t".to_string()),
                ("idList".to_string(), "list 1".to_string()),
                ("name".to_string(), "Q3 review".to_string()),
                ("desc".to_string(), String::new()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_is_not_configured() {
        let cards = cards(TrelloConfig {
            key: Some("k".to_string()),
            ..TrelloConfig::default()
        });
        let mut args = JsonObject::new();
        args.insert("name".to_string(), json!("Follow up"));

        let err = cards.execute(&args).await.unwrap_err();
        assert_eq!(err.kind, UpstreamErrorKind::NotConfigured);
    }
}
