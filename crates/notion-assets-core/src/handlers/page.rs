//! `GET /api/page/{pageId}`: the page's record map with stable file links.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{error, warn};

use notion_assets_types::{ProxyError, RecordMap};

use super::ErrorResponse;
use crate::notion::{normalize_id, FetchOptions};
use crate::server::AppState;

pub async fn handle_page(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Result<Json<RecordMap>, ErrorResponse> {
    if normalize_id(&page_id).is_none() {
        return Err(ProxyError::InvalidId { id: page_id }.into());
    }

    let record_map = match state.fetcher.get_page(&page_id, FetchOptions::signed()).await {
        Ok(map) => map,
        Err(e) => {
            warn!(%page_id, "Signed page fetch failed, retrying unsigned: {}", e);
            state.fetcher.get_page(&page_id, FetchOptions::unsigned()).await.map_err(|e| {
                error!(%page_id, "Page fetch failed: {}", e);
                ProxyError::upstream(e.to_string())
            })?
        },
    };

    Ok(Json(state.rewriter.rewrite(&record_map, &page_id, &state.hosts)))
}
