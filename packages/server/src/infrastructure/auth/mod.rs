//! 認証まわりの外部コラボレーター実装
//!
//! - `jwt`: HS256 の JWT を検証する TokenVerifier
//! - `user_directory`: インメモリ / HTTP のユーザーディレクトリ

pub mod jwt;
pub mod user_directory;

pub use jwt::JwtTokenVerifier;
pub use user_directory::{HttpUserDirectory, InMemoryUserDirectory};
