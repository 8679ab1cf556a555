//! services/client/src/sync/requests.rs
//!
//! Single-shot remote operations. Unlike per-image uploads, any failure here is
//! returned to the caller with the best message available for display.

use crate::error::SyncError;
use crate::sync::state::ClientState;
use stylesense_core::domain::{OrderHistoryResult, StyleRecommendation, StyleRequest};
use stylesense_core::ports::PortResult;
use tracing::{info, warn};

/// Liveness probe against the remote service.
pub async fn check_health(state: &ClientState) -> PortResult<()> {
    state.remote.check_health().await?;
    info!("Remote service is healthy.");
    Ok(())
}

/// Asks the server to import the current user's order history.
///
/// A load reported as successful changes the server-side counts, so the status
/// cache is refreshed afterwards; a failure of that refresh is returned as
/// `SyncError::StatusRefresh`.
pub async fn load_order_history(state: &ClientState) -> Result<OrderHistoryResult, SyncError> {
    let identity = state.identities.current().await;
    let result = state.remote.load_order_history(&identity).await?;

    if result.success {
        info!(user_id = %identity, "Order history loaded: {}", result.message);
        state
            .status
            .refresh()
            .await
            .map_err(SyncError::StatusRefresh)?;
    } else {
        warn!(user_id = %identity, "Order history not loaded: {}", result.message);
    }
    Ok(result)
}

/// Requests an outfit recommendation for the current user.
///
/// `location` falls back to the configured default when absent or blank.
pub async fn request_recommendation(
    state: &ClientState,
    prompt: &str,
    location: Option<&str>,
) -> PortResult<StyleRecommendation> {
    let current_location = location
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(state.default_location.as_str())
        .to_string();
    let request = StyleRequest {
        user_id: state.identities.current().await,
        user_prompt: prompt.to_string(),
        current_location,
    };

    let recommendation = state.remote.request_recommendation(&request).await?;
    info!(
        user_id = %request.user_id,
        twin = %recommendation.celebrity_twin,
        "Received style recommendation"
    );
    Ok(recommendation)
}
