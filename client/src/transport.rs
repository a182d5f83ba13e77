use std::future::Future;
use std::time::Duration;

use arcade_shared::{EntityPayload, Notification, Query};
use futures::stream::BoxStream;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Response, Url};
use tracing::debug;

use crate::config::{ClientConfig, ENTITIES_PATH, SUBSCRIBE_PATH, USER_AGENT};
use crate::error::{Error, Result};
use crate::sse::notification_stream;

pub type NotificationStream = BoxStream<'static, Result<Notification>>;

/// Connection to the entity indexing service.
pub trait IndexerTransport: Send + Sync + 'static {
    fn fetch_entities(&self, query: &Query) -> impl Future<Output = Result<EntityPayload>> + Send;

    /// Resolves once the service has accepted the subscription.
    fn subscribe_entities(
        &self,
        query: &Query,
    ) -> impl Future<Output = Result<NotificationStream>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    entities_url: Url,
    subscribe_url: Url,
    fetch_timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = config.indexer_base()?;
        let join = |path: &str| {
            base.join(path).map_err(|e| Error::InvalidConfig {
                key: "INDEXER_URL",
                reason: e.to_string(),
            })
        };
        // No client-wide timeout: it would also cut the long-lived subscription body.
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            entities_url: join(ENTITIES_PATH)?,
            subscribe_url: join(SUBSCRIBE_PATH)?,
            fetch_timeout: config.indexer_http_timeout,
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Http {
        status: status.as_u16(),
        body,
    })
}

impl IndexerTransport for HttpTransport {
    async fn fetch_entities(&self, query: &Query) -> Result<EntityPayload> {
        let mut request = self.client.post(self.entities_url.clone()).json(query);
        if let Some(timeout) = self.fetch_timeout {
            request = request.timeout(timeout);
        }
        let response = ensure_success(request.send().await?).await?;
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(EntityPayload::Absent);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn subscribe_entities(&self, query: &Query) -> Result<NotificationStream> {
        let response = self
            .client
            .post(self.subscribe_url.clone())
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(query)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        debug!(url = %self.subscribe_url, "entity subscription accepted");
        Ok(notification_stream(response.bytes_stream()))
    }
}
