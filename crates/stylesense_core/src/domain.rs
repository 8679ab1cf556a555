//! crates/stylesense_core/src/domain.rs
//!
//! Defines the pure, core data structures for the StyleSense client.
//! These structs are independent of any transport or serialization format.

use std::fmt;

/// The identity used when nothing has been persisted yet.
pub const DEFAULT_USER_ID: &str = "test_user";

/// An opaque token naming the current user for all remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity(String);

impl UserIdentity {
    /// Builds an identity from a raw string, rejecting blank values.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserIdentity {
    fn default() -> Self {
        Self(DEFAULT_USER_ID.to_string())
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-reported usage counts for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatusRecord {
    pub exists: bool,
    pub wardrobe_items_count: u32,
    pub purchase_history_count: u32,
    pub total_items: u32,
    pub message: String,
}

/// Locates one image the user picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub uri: String,
}

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Outcome of a finished upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchResult {
    pub uploaded: usize,
    pub failed: usize,
    pub total: usize,
}

/// Acknowledgement returned by the server for a single image upload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadAck {
    pub message: Option<String>,
}

// Result of asking the server to import the user's order history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHistoryResult {
    pub success: bool,
    pub message: String,
}

/// A request for an outfit recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRequest {
    pub user_id: UserIdentity,
    pub user_prompt: String,
    pub current_location: String,
}

/// A wardrobe item the recommendation suggests reusing.
///
/// When the server only sends a name, `item` holds it and the rest is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OwnedItem {
    pub item: String,
    pub owned_item: String,
    pub confidence: f64,
    pub source: String,
}

/// A product the recommendation suggests buying.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemToBuy {
    pub item: String,
    pub suggested_product: String,
    pub brand: String,
    pub link: String,
    pub confidence: f64,
}

/// The full recommendation as returned by the server, passed on to presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRecommendation {
    pub celebrity_twin: String,
    pub weather_info: String,
    pub final_recommendation: String,
    pub items_owned: Vec<OwnedItem>,
    pub items_to_buy: Vec<ItemToBuy>,
    pub extracted_emotion: Option<String>,
}
