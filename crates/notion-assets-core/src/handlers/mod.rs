// Handlers module - file proxy endpoints

pub mod page;
pub mod redirect;
pub mod stream;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use notion_assets_types::{FileRef, ProxyError};

/// `?blockId=..&pageId=..`
#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(rename = "blockId")]
    pub block_id: Option<String>,
    #[serde(rename = "pageId")]
    pub page_id: Option<String>,
}

impl FileQuery {
    pub fn into_file_ref(self) -> Result<FileRef, ProxyError> {
        FileRef::from_params(self.block_id, self.page_id)
    }
}

/// HTTP rendering of a [`ProxyError`]: status plus a fixed message.
#[derive(Debug)]
pub struct ErrorResponse(pub ProxyError);

impl From<ProxyError> for ErrorResponse {
    fn from(err: ProxyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.0.client_message()).into_response();
        if let ProxyError::MethodNotAllowed { allowed, .. } = &self.0 {
            if let Ok(value) = HeaderValue::from_str(allowed) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}

/// Reject methods outside `allowed` with 405.
pub(crate) fn ensure_method(method: &Method, allowed: &[Method]) -> Result<(), ProxyError> {
    if allowed.contains(method) {
        return Ok(());
    }
    Err(ProxyError::MethodNotAllowed {
        method: method.to_string(),
        allowed: allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", "),
    })
}
