//! JSON envelope shared by every endpoint
//!
//! `{success, message?, data?, error?, count?, total?, page?, pages?}`; absent
//! fields are left out of the body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Successful response carrying `data`
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
            count: None,
            total: None,
            page: None,
            pages: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Attach pagination totals
    pub fn paged(mut self, total: u64, page: u32, pages: u64) -> Self {
        self.total = Some(total);
        self.page = Some(page);
        self.pages = Some(pages);
        self
    }

    /// Send with `201 Created`
    pub fn created(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

impl ApiResponse<()> {
    /// Successful response with only a message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            data: None,
            ..ApiResponse::data(())
        }
    }

    /// Failure body with a message and an error code or detail
    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error,
            ..ApiResponse::data(())
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_are_omitted() {
        let body = serde_json::to_value(ApiResponse::ok("Event deleted successfully")).unwrap();
        assert_eq!(
            body,
            json!({"success": true, "message": "Event deleted successfully"})
        );
    }

    #[test]
    fn test_paged_list_body() {
        let body = ApiResponse::data(vec![1, 2]).count(2).paged(12, 2, 6);
        let body = serde_json::to_value(body).unwrap();
        assert_eq!(
            body,
            json!({"success": true, "data": [1, 2], "count": 2, "total": 12, "page": 2, "pages": 6})
        );
    }

    #[test]
    fn test_failure_body() {
        let body = ApiResponse::failure("Event not found", Some("NOT_FOUND_ERROR".into()));
        let body = serde_json::to_value(body).unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Event not found", "error": "NOT_FOUND_ERROR"})
        );
    }
}
