//! UseCase: 接続の開始
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続の登録、プレゼンスのエッジ通知、初期スナップショットの送信
//!
//! ### どのような状況を想定しているか
//! - 正常系：ユーザーの最初の接続、2 つ目のタブ、ゲスト接続
//! - 異常系：同じ接続 ID での二重登録

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{MessagePusher, PusherChannel, Timestamp};

use super::{
    delivery::{ConnectionContext, SharedState, deliver, now},
    error::ConnectError,
    presence, voice,
};

/// 接続開始のユースケース
pub struct ConnectParticipantUseCase {
    /// 全トラッカーの共有状態
    state: SharedState,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        state: SharedState,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            message_pusher,
            clock,
        }
    }

    /// 接続を開始する
    ///
    /// 1. 送信チャンネルを MessagePusher に登録
    /// 2. Connection Registry に登録
    /// 3. 最初の接続なら全体へ `presence:update`
    /// 4. 新しい接続へ `presence:state` と各ボイスチャンネルの名簿
    ///
    /// # Returns
    ///
    /// * `Ok(Timestamp)` - 接続時刻
    /// * `Err(ConnectError)` - 二重登録（状態は変更しない）
    pub async fn execute(
        &self,
        ctx: &ConnectionContext,
        sender: PusherChannel,
    ) -> Result<Timestamp, ConnectError> {
        let mut state = self.state.lock().await;

        if state.registry.contains(&ctx.connection_id) {
            return Err(ConnectError::DuplicateConnection(
                ctx.connection_id.to_string(),
            ));
        }
        self.message_pusher
            .register_connection(ctx.connection_id.clone(), sender)
            .await
            .map_err(|_| ConnectError::DuplicateConnection(ctx.connection_id.to_string()))?;

        let connected_at = now(self.clock.as_ref());
        let registered = state.registry.register(
            ctx.connection_id.clone(),
            ctx.user_id.clone(),
            connected_at,
        );

        let mut outbound =
            presence::on_registered(&state, &ctx.connection_id, ctx.user_id.as_ref(), registered);
        outbound.extend(voice::initial_rosters(&state, &ctx.connection_id));
        deliver(&state, self.message_pusher.as_ref(), outbound).await;

        match &ctx.user_id {
            Some(user_id) => tracing::info!(
                "Connection '{}' opened (user: '{}')",
                ctx.connection_id,
                user_id
            ),
            None => tracing::info!("Connection '{}' opened (guest)", ctx.connection_id),
        }
        Ok(connected_at)
    }
}
