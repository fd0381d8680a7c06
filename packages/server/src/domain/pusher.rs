//! MessagePusher trait 定義
//!
//! ドメイン層が必要とする「接続へのフレーム送信」のインターフェースです。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, Notification};

/// 接続ごとの送信チャンネル
///
/// UI 層が WebSocket ごとに生成し、Infrastructure 層が保持する。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
///
/// 通知のエンコード（JSON 化）は実装側の責務。
/// 送信はファイア・アンド・フォーゲットで、到達確認は行わない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続と送信チャンネルを登録する
    async fn register_connection(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(), MessagePushError>;

    /// 接続の登録を解除する（未登録なら何もしない）
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 単一の接続に送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続に送信する（一部の失敗は許容する）
    async fn broadcast(&self, targets: Vec<ConnectionId>, notification: &Notification);
}
