//! UseCase errors.

use thiserror::Error;

/// 接続処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 同じ接続 ID が既に登録されている（状態は変更しない）
    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(String),
}
