//! JWT (HS256) を使った TokenVerifier 実装
//!
//! 署名と `exp` を検証し、`sub` クレームをユーザー ID として返します。
//! トークンの発行はこのサービスの責務ではありません。

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};

use crate::domain::{TokenError, TokenVerifier, UserId, VerifiedToken};

pub struct JwtTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = decode::<serde_json::Value>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;

        let subject = data
            .claims
            .get("sub")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| TokenError::Invalid("sub claim is not a string".to_string()))?;
        let user_id = UserId::new(subject.to_string())
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        Ok(VerifiedToken {
            user_id,
            claims: data.claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        // テスト項目: 正しい署名と有効期限のトークンから subject が取り出せる
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = sign(
            json!({"sub": "alice", "exp": Utc::now().timestamp() + 3600, "role": "trainer"}),
            SECRET,
        );

        // when (操作):
        let verified = verifier.verify(&token).await.unwrap();

        // then (期待する結果):
        assert_eq!(verified.user_id.as_str(), "alice");
        assert_eq!(verified.claims["role"], "trainer");
    }

    #[tokio::test]
    async fn test_verify_expired_token() {
        // テスト項目: 期限切れのトークンは Expired になる
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = sign(
            json!({"sub": "alice", "exp": Utc::now().timestamp() - 3600}),
            SECRET,
        );

        // when (操作):
        let result = verifier.verify(&token).await;

        // then (期待する結果):
        assert_eq!(result, Err(TokenError::Expired));
    }

    #[tokio::test]
    async fn test_verify_wrong_secret() {
        // テスト項目: 別の鍵で署名されたトークンは Invalid になる
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = sign(
            json!({"sub": "alice", "exp": Utc::now().timestamp() + 3600}),
            "other-secret",
        );

        // when (操作):
        let result = verifier.verify(&token).await;

        // then (期待する結果):
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_verify_garbage_and_missing_subject() {
        // テスト項目: 壊れたトークンや sub のないトークンは Invalid になる
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let no_sub = sign(json!({"exp": Utc::now().timestamp() + 3600}), SECRET);

        // then (期待する結果):
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            verifier.verify(&no_sub).await,
            Err(TokenError::Invalid(_))
        ));
    }
}
