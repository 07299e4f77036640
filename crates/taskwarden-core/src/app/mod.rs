//! App - アプリケーションの構築とワイヤリング
//!
//! # 主要コンポーネント
//! - **AppBuilder**: ポート実装を集めてサービスを組み立てる（composition root）
//! - **App**: 組み立て済みのサービス一式

pub mod builder;

pub use self::builder::{App, AppBuilder, BuildError};
