//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    SdkConfig,
};

/// JSON の設定ファイルを読み込んでバリデーションする
///
/// # Arguments
/// * `path` - 設定ファイルのパス
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
/// - バリデーションエラー
pub fn load_from_file(path: &Path) -> Result<SdkConfig, ConfigError> {
    tracing::debug!("Loading configuration from: {:?}", path);

    let content = std::fs::read_to_string(path)?;
    let config: SdkConfig = serde_json::from_str(&content)?;
    config.validate().map_err(ConfigError::ValidationErrors)?;

    tracing::debug!(mode = ?config.mode, base_url = %config.base_url, "Configuration loaded");
    Ok(config)
}
