//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP adapter for the StyleSense backend. It is the
//! concrete implementation of the `RemoteService` port and owns transport,
//! payload validation and the mapping of HTTP failures into `PortError`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use stylesense_core::domain::{
    ItemToBuy, OrderHistoryResult, OwnedItem, StyleRecommendation, StyleRequest, UploadAck,
    UserIdentity, UserStatusRecord,
};
use stylesense_core::ports::{PortError, PortResult, RemoteService};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `RemoteService` port over HTTP.
#[derive(Clone)]
pub struct HttpRemoteAdapter {
    client: Client,
    base_url: String,
}

impl HttpRemoteAdapter {
    /// Creates a new `HttpRemoteAdapter` talking to `base_url` (no trailing slash).
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PortError::Unexpected(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

//=========================================================================================
// "Impure" Wire Payload Structs
//=========================================================================================

#[derive(Serialize)]
struct UploadImageBody<'a> {
    user_id: &'a str,
    image_base64: String,
}

#[derive(Serialize)]
struct RecommendBody<'a> {
    user_id: &'a str,
    user_prompt: &'a str,
    current_location: &'a str,
}

#[derive(Deserialize)]
struct UserStatusPayload {
    #[serde(alias = "exists")]
    user_exists: bool,
    wardrobe_items_count: u32,
    purchase_history_count: u32,
    total_items: u32,
    #[serde(default)]
    message: String,
}
impl UserStatusPayload {
    fn to_domain(self) -> UserStatusRecord {
        UserStatusRecord {
            exists: self.user_exists,
            wardrobe_items_count: self.wardrobe_items_count,
            purchase_history_count: self.purchase_history_count,
            total_items: self.total_items,
            message: self.message,
        }
    }
}

#[derive(Deserialize)]
struct OrderHistoryPayload {
    success: bool,
    #[serde(default)]
    message: String,
}
impl OrderHistoryPayload {
    fn to_domain(self) -> OrderHistoryResult {
        OrderHistoryResult {
            success: self.success,
            message: self.message,
        }
    }
}

// The backend sometimes sends bare item names instead of full objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum OwnedItemPayload {
    Detailed {
        item: String,
        owned_item: String,
        confidence: f64,
        source: String,
    },
    Name(String),
}
impl OwnedItemPayload {
    fn to_domain(self) -> OwnedItem {
        match self {
            Self::Detailed {
                item,
                owned_item,
                confidence,
                source,
            } => OwnedItem {
                item,
                owned_item,
                confidence,
                source,
            },
            Self::Name(item) => OwnedItem {
                item,
                ..Default::default()
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemToBuyPayload {
    Detailed {
        item: String,
        suggested_product: String,
        brand: String,
        link: String,
        confidence: f64,
    },
    Name(String),
}
impl ItemToBuyPayload {
    fn to_domain(self) -> ItemToBuy {
        match self {
            Self::Detailed {
                item,
                suggested_product,
                brand,
                link,
                confidence,
            } => ItemToBuy {
                item,
                suggested_product,
                brand,
                link,
                confidence,
            },
            Self::Name(item) => ItemToBuy {
                item,
                ..Default::default()
            },
        }
    }
}

#[derive(Deserialize)]
struct StyleRecommendationPayload {
    celebrity_twin: String,
    weather_info: String,
    final_recommendation: String,
    items_owned: Vec<OwnedItemPayload>,
    items_to_buy: Vec<ItemToBuyPayload>,
    #[serde(default)]
    extracted_emotion: Option<String>,
}
impl StyleRecommendationPayload {
    fn to_domain(self) -> StyleRecommendation {
        StyleRecommendation {
            celebrity_twin: self.celebrity_twin,
            weather_info: self.weather_info,
            final_recommendation: self.final_recommendation,
            items_owned: self.items_owned.into_iter().map(|i| i.to_domain()).collect(),
            items_to_buy: self.items_to_buy.into_iter().map(|i| i.to_domain()).collect(),
            extracted_emotion: self.extracted_emotion,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

//=========================================================================================
// Response Handling Helpers
//=========================================================================================

fn transport(e: reqwest::Error) -> PortError {
    PortError::Transport(e.to_string())
}

/// Picks the server-supplied message out of an error body, if there is one.
///
/// FastAPI validation errors carry `detail` as a list of objects with a `msg` field.
fn server_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let detail = match parsed.detail {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Array(entries)) => {
            let msgs: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    };
    detail
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
}

fn status_message(operation: &str, status: StatusCode) -> String {
    format!(
        "{} failed: {}",
        operation,
        status.canonical_reason().unwrap_or(status.as_str())
    )
}

/// Maps a non-2xx response into `PortError::Remote`, passing 2xx responses through.
async fn check_status(response: Response, operation: &str) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = server_message(&body).unwrap_or_else(|| status_message(operation, status));
    debug!(%status, operation, "Remote call rejected: {}", message);
    Err(PortError::remote(status.as_u16(), message))
}

/// Checks the status and decodes a JSON body, rejecting payloads that do not match `T`.
async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> PortResult<T> {
    let response = check_status(response, operation).await?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&body).map_err(|e| {
        PortError::remote(
            status.as_u16(),
            format!("Malformed {} payload: {}", operation, e),
        )
    })
}

//=========================================================================================
// `RemoteService` Trait Implementation
//=========================================================================================

#[async_trait]
impl RemoteService for HttpRemoteAdapter {
    async fn check_health(&self) -> PortResult<()> {
        let response = self
            .client
            .get(self.endpoint(&["health"])?)
            .send()
            .await
            .map_err(transport)?;
        check_status(response, "Health check").await?;
        Ok(())
    }

    async fn fetch_status(&self, identity: &UserIdentity) -> PortResult<UserStatusRecord> {
        let response = self
            .client
            .get(self.endpoint(&["user", identity.as_str(), "status"])?)
            .send()
            .await
            .map_err(transport)?;
        let payload: UserStatusPayload = decode(response, "Get user status").await?;
        Ok(payload.to_domain())
    }

    async fn upload_image(&self, identity: &UserIdentity, image: Bytes) -> PortResult<UploadAck> {
        let body = UploadImageBody {
            user_id: identity.as_str(),
            image_base64: STANDARD.encode(&image),
        };
        let response = self
            .client
            .post(self.endpoint(&["user", "styles", "upload-base64"])?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        // The ack shape is not fixed; only a top-level `message` is surfaced.
        let ack: serde_json::Value = decode(response, "Upload image").await?;
        Ok(UploadAck {
            message: ack
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
        })
    }

    async fn load_order_history(&self, identity: &UserIdentity) -> PortResult<OrderHistoryResult> {
        let response = self
            .client
            .post(self.endpoint(&["user", "styles", "load-orders"])?)
            .form(&[("user_id", identity.as_str())])
            .send()
            .await
            .map_err(transport)?;
        let payload: OrderHistoryPayload = decode(response, "Load order history").await?;
        Ok(payload.to_domain())
    }

    async fn request_recommendation(
        &self,
        request: &StyleRequest,
    ) -> PortResult<StyleRecommendation> {
        let body = RecommendBody {
            user_id: request.user_id.as_str(),
            user_prompt: &request.user_prompt,
            current_location: &request.current_location,
        };
        let response = self
            .client
            .post(self.endpoint(&["recommend"])?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let payload: StyleRecommendationPayload = decode(response, "Recommendation").await?;
        Ok(payload.to_domain())
    }
}
