//! tolgee-sync
//!
//! ローカライズ SDK のコア: 翻訳キャッシュ、バックエンドとの同期、オフライン用の同梱スナップショット、
//! 描画済みテキストに埋め込む不可視のキーマーカー

pub mod codec;
pub mod config;
pub mod error;
pub mod language;
pub mod position;
pub mod preferences;
pub mod preload;
pub mod remote;
pub mod sdk;
pub mod storage;
pub mod sync;
pub mod translation;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use error::SyncError;
pub use sdk::{
    InstanceRegistry,
    Sdk,
    SdkBuilder,
    TranslationState,
};
