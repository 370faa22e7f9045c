//! # Wire Protocol
//!
//! One JSON object per line in each direction.
//!
//! ```text
//! stdin   {"id":1,"command":"login","username":"cashier","password":"cashier"}
//! stdout  {"id":1,"ok":true,"data":{"sessionId":"…","user":{…}}}
//!
//! stdin   {"id":2,"sessionId":"…","command":"add_to_cart","productId":1,"quantity":2}
//! stdout  {"id":2,"ok":true,"data":{"state":"open","lines":[…],…}}
//!
//! stdin   {"id":3,"sessionId":"…","command":"checkout"}
//! stdout  {"id":3,"ok":false,"error":{"code":"INSUFFICIENT_STOCK",…}}
//! ```
//!
//! `id` is optional and echoed back verbatim so a client can match
//! responses to requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// A request line: routing fields plus the command itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub session_id: Option<Uuid>,

    #[serde(flatten)]
    pub request: Request,
}

/// Every command the terminal understands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Login {
        username: String,
        password: String,
    },
    Logout,
    GetConfig,
    SearchProducts {
        #[serde(default)]
        query: String,
    },
    #[serde(rename_all = "camelCase")]
    GetProduct {
        #[serde(default)]
        product_id: Option<u32>,
        #[serde(default)]
        barcode: Option<String>,
    },
    ListInventory,
    #[serde(rename_all = "camelCase")]
    AdjustStock {
        product_id: u32,
        delta: i64,
    },
    GetCart,
    #[serde(rename_all = "camelCase")]
    AddToCart {
        product_id: u32,
        #[serde(default = "default_quantity")]
        quantity: i64,
    },
    #[serde(rename_all = "camelCase")]
    RemoveFromCart {
        product_id: u32,
    },
    SetDiscount {
        percent: f64,
    },
    SetChannel {
        channel: String,
    },
    ClearCart,
    #[serde(rename_all = "camelCase")]
    Checkout {
        #[serde(default)]
        idempotency_key: Option<String>,
    },
    SalesSummary,
    RecentSales {
        #[serde(default = "default_recent_limit")]
        limit: usize,
    },
}

fn default_quantity() -> i64 {
    1
}

fn default_recent_limit() -> usize {
    10
}

impl Request {
    /// Command name as it appears on the wire, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Login { .. } => "login",
            Request::Logout => "logout",
            Request::GetConfig => "get_config",
            Request::SearchProducts { .. } => "search_products",
            Request::GetProduct { .. } => "get_product",
            Request::ListInventory => "list_inventory",
            Request::AdjustStock { .. } => "adjust_stock",
            Request::GetCart => "get_cart",
            Request::AddToCart { .. } => "add_to_cart",
            Request::RemoveFromCart { .. } => "remove_from_cart",
            Request::SetDiscount { .. } => "set_discount",
            Request::SetChannel { .. } => "set_channel",
            Request::ClearCart => "clear_cart",
            Request::Checkout { .. } => "checkout",
            Request::SalesSummary => "sales_summary",
            Request::RecentSales { .. } => "recent_sales",
        }
    }
}

/// A response line.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Response {
    pub fn success(id: Option<Value>, data: Value) -> Self {
        Response {
            id,
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: ApiError) -> Self {
        Response {
            id,
            ok: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn from_result(id: Option<Value>, result: Result<Value, ApiError>) -> Self {
        match result {
            Ok(data) => Response::success(id, data),
            Err(error) => Response::failure(id, error),
        }
    }
}

/// Parses a request line.
///
/// On failure the `id` is still recovered when the line is a JSON object,
/// so the error response can be matched to its request.
pub fn parse_line(line: &str) -> Result<Envelope, (Option<Value>, ApiError)> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| (None, ApiError::bad_request(format!("Invalid JSON: {e}"))))?;
    let id = value.get("id").cloned();

    serde_json::from_value(value)
        .map_err(|e| (id, ApiError::bad_request(format!("Invalid request: {e}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_parse_add_to_cart() {
        let session = Uuid::new_v4();
        let line = format!(
            r#"{{"id":7,"sessionId":"{session}","command":"add_to_cart","productId":2}}"#
        );
        let envelope = parse_line(&line).unwrap();

        assert_eq!(envelope.id, Some(json!(7)));
        assert_eq!(envelope.session_id, Some(session));
        assert_eq!(
            envelope.request,
            Request::AddToCart {
                product_id: 2,
                quantity: 1
            }
        );
    }

    #[test]
    fn test_parse_defaults() {
        let envelope = parse_line(r#"{"command":"recent_sales"}"#).unwrap();
        assert_eq!(envelope.request, Request::RecentSales { limit: 10 });
        assert!(envelope.id.is_none());

        let envelope = parse_line(r#"{"command":"checkout","idempotencyKey":"k-1"}"#).unwrap();
        assert_eq!(
            envelope.request,
            Request::Checkout {
                idempotency_key: Some("k-1".to_string())
            }
        );
    }

    #[test]
    fn test_unknown_command_keeps_id() {
        let (id, err) = parse_line(r#"{"id":"abc","command":"refund"}"#).unwrap_err();
        assert_eq!(id, Some(json!("abc")));
        assert_eq!(err.code, ErrorCode::BadRequest);
    }

    #[test]
    fn test_garbage_line() {
        let (id, err) = parse_line("not json").unwrap_err();
        assert!(id.is_none());
        assert_eq!(err.code, ErrorCode::BadRequest);
    }

    #[test]
    fn test_response_shape() {
        let ok = serde_json::to_value(Response::success(Some(json!(1)), json!({"n": 1}))).unwrap();
        assert_eq!(ok, json!({"id": 1, "ok": true, "data": {"n": 1}}));

        let err = serde_json::to_value(Response::failure(
            None,
            ApiError::unauthorized("Sign in first"),
        ))
        .unwrap();
        assert_eq!(err["ok"], false);
        assert_eq!(err["error"]["code"], "UNAUTHORIZED");
        assert!(err.get("data").is_none());
        assert!(err.get("id").is_none());
    }
}
