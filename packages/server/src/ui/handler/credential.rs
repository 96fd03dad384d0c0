//! Credential extraction shared by the WebSocket and HTTP handlers.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use serde::Deserialize;

/// `?token=<jwt>` query parameter
#[derive(Debug, Deserialize)]
pub struct CredentialQuery {
    pub token: Option<String>,
}

/// `Authorization: Bearer <token>` からトークンを取り出す
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// クエリパラメータを優先し、なければ Authorization ヘッダーを使う
pub fn credential(query: CredentialQuery, headers: &HeaderMap) -> Option<String> {
    query.token.or_else(|| bearer_token(headers))
}
