//! UseCase: 接続の終了
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断時の後始末（ボイス → ルーム → レジストリ → プレゼンス の順）
//!
//! ### どのような状況を想定しているか
//! - 正常系：ボイス参加中・ルーム参加中の唯一の接続が突然切断される
//! - エッジケース：同じユーザーの別タブが残っている場合（offline を通知しない）
//! - 異常系：未登録の接続の切断（冪等、何もしない）

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{ChannelId, MessagePusher, RoomId, UserId};

use super::{
    delivery::{ConnectionContext, SharedState, deliver, now},
    presence, typing, voice,
};

/// 切断処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReport {
    /// 参加していたボイスチャンネル
    pub voice_channel: Option<ChannelId>,
    /// 退出したルーム
    pub vacated_rooms: Vec<RoomId>,
    /// オフラインになったユーザー
    pub became_offline: Option<UserId>,
}

/// 接続終了のユースケース
pub struct DisconnectParticipantUseCase {
    state: SharedState,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
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

    /// 接続を終了する
    ///
    /// 1. ボイスチャンネルから外し、名簿を全体へ送る
    /// 2. 全てのルームから退出
    /// 3. Connection Registry から削除
    /// 4. 最後の接続だった場合は `presence:update` と入力中表示の消去
    ///
    /// # Returns
    ///
    /// * `Some(DisconnectReport)` - 後始末の内容
    /// * `None` - 未登録の接続（何もしない）
    pub async fn execute(&self, ctx: &ConnectionContext) -> Option<DisconnectReport> {
        let mut state = self.state.lock().await;
        if !state.registry.contains(&ctx.connection_id) {
            self.message_pusher
                .unregister_connection(&ctx.connection_id)
                .await;
            return None;
        }

        let mut outbound = Vec::new();

        // 1. ボイス（レジストリから消す前に行う）
        let voice_channel = state.voice.channel_of(&ctx.connection_id).cloned();
        outbound.extend(voice::disconnect_voice(&mut state, &ctx.connection_id));

        // 2. ルーム
        let vacated_rooms = state.rooms.leave_all(&ctx.connection_id);

        // 3. レジストリ
        let unregistered = state.registry.unregister(&ctx.connection_id);

        // 4. プレゼンス
        let mut became_offline = None;
        if let Some(unregistered) = &unregistered {
            outbound.extend(presence::on_unregistered(unregistered));
            if let Some(user_id) = &unregistered.became_offline {
                let at = now(self.clock.as_ref());
                outbound.extend(typing::clear_user(&mut state, at, user_id));
                became_offline = Some(user_id.clone());
            }
        }

        deliver(&state, self.message_pusher.as_ref(), outbound).await;
        self.message_pusher
            .unregister_connection(&ctx.connection_id)
            .await;

        tracing::info!(
            "Connection '{}' closed (left {} room(s))",
            ctx.connection_id,
            vacated_rooms.len()
        );

        Some(DisconnectReport {
            voice_channel,
            vacated_rooms,
            became_offline,
        })
    }
}
