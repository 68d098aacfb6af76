//! Request and response shapes shared by the Tavola server and its admin client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

pub const SESSION_COOKIE: &str = "tavola_session";

// ----- Pages -----

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageResponse {
    pub page_key: String,
    pub content: Value,
    /// `None` while the page still serves its built-in defaults.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageUpdateRequest {
    pub content: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlacedFileResponse {
    pub field: String,
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadResponse {
    pub page: PageResponse,
    pub placed: Vec<PlacedFileResponse>,
}

/// Build the `{ "<field>": [..] }` body accepted by the reorder endpoints.
pub fn order_body<T: Serialize>(field: &str, items: &[T]) -> Value {
    let mut body = Map::new();
    body.insert(
        field.to_string(),
        Value::Array(
            items
                .iter()
                .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
                .collect(),
        ),
    );
    Value::Object(body)
}

// ----- Posts -----

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub image: Option<String>,
    pub position: i32,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostCreateRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostUpdateRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostReorderRequest {
    pub posts: Vec<i64>,
}

// ----- Menu -----

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MenuItemResponse {
    pub id: i64,
    pub category: String,
    pub name: String,
    pub description: String,
    pub price_cents: i32,
    pub available: bool,
    pub position: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MenuItemRequest {
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i32,
    #[serde(default = "default_available")]
    pub available: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MenuReorderRequest {
    pub items: Vec<i64>,
}

// ----- Auth -----

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

// ----- Errors -----

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_body_wraps_items_under_field() {
        let body = order_body("logos", &["/a.png", "/b.png"]);
        assert_eq!(body, serde_json::json!({ "logos": ["/a.png", "/b.png"] }));
    }

    #[test]
    fn page_response_accepts_missing_timestamp() {
        let page: PageResponse =
            serde_json::from_str(r#"{"page_key":"footer","content":{}}"#).expect("decode");
        assert!(page.updated_at.is_none());
    }

    #[test]
    fn error_body_omits_empty_hint() {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: "not_found".into(),
                message: "page not found".into(),
                hint: None,
            },
        };
        let encoded = serde_json::to_string(&body).expect("encode");
        assert_eq!(
            encoded,
            r#"{"error":{"code":"not_found","message":"page not found"}}"#
        );
    }
}
