//! UseCase: 受信イベントの振り分け
//!
//! 接続の開始・終了と、その間に届くイベントの処理を 1 か所にまとめる。
//! イベントごとにロックを 1 回取り、状態の変更と送信先の解決、配送までを
//! ロックを保持したまま行う。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - EventDispatcher::dispatch() と handle() によるイベントの振り分け
//! - 複数接続をまたぐシナリオ（チャット中継、ボイス切り替え、切断）
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人がチャンネルに参加してメッセージを送り合う
//! - 正常系：ボイスチャンネルの切り替え
//! - エッジケース：送信者自身へのエコーが無いこと
//! - 異常系：未登録の接続からのイベント（無視）

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{InboundEvent, MessagePusher, PusherChannel, RealtimeState, Timestamp};

use super::{
    channel,
    connect_participant::ConnectParticipantUseCase,
    delivery::{ConnectionContext, Outbound, SharedState, deliver, now},
    disconnect_participant::{DisconnectParticipantUseCase, DisconnectReport},
    error::ConnectError,
    message, typing, voice,
};

/// イベントの振り分け
pub struct EventDispatcher {
    connect: ConnectParticipantUseCase,
    disconnect: DisconnectParticipantUseCase,
    state: SharedState,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl EventDispatcher {
    /// 新しい EventDispatcher を作成
    pub fn new(
        state: SharedState,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connect: ConnectParticipantUseCase::new(
                state.clone(),
                message_pusher.clone(),
                clock.clone(),
            ),
            disconnect: DisconnectParticipantUseCase::new(
                state.clone(),
                message_pusher.clone(),
                clock.clone(),
            ),
            state,
            message_pusher,
            clock,
        }
    }

    /// 接続を開始する
    pub async fn open(
        &self,
        ctx: &ConnectionContext,
        sender: PusherChannel,
    ) -> Result<Timestamp, ConnectError> {
        self.connect.execute(ctx, sender).await
    }

    /// 受信イベントを処理する
    ///
    /// 未登録の接続からのイベントは無視する。
    pub async fn dispatch(&self, ctx: &ConnectionContext, event: InboundEvent) {
        let mut state = self.state.lock().await;
        if !state.registry.contains(&ctx.connection_id) {
            tracing::warn!(
                "Dropping '{}' from unregistered connection '{}'",
                event.name(),
                ctx.connection_id
            );
            return;
        }

        tracing::debug!("'{}' from '{}'", event.name(), ctx.connection_id);
        let at = now(self.clock.as_ref());
        let outbound = handle(ctx, &mut state, at, event);
        deliver(&state, self.message_pusher.as_ref(), outbound).await;
    }

    /// 接続を終了する
    pub async fn close(&self, ctx: &ConnectionContext) -> Option<DisconnectReport> {
        self.disconnect.execute(ctx).await
    }
}

/// イベント名ごとのハンドラ表
///
/// 状態を変更し、送るべき通知を返す。配送は呼び出し側が行う。
pub fn handle(
    ctx: &ConnectionContext,
    state: &mut RealtimeState,
    now: Timestamp,
    event: InboundEvent,
) -> Vec<Outbound> {
    match event {
        InboundEvent::ChannelJoin(channel_id) => channel::join_channel(ctx, state, channel_id),
        InboundEvent::ChannelLeave(channel_id) => channel::leave_channel(ctx, state, channel_id),
        InboundEvent::MessageSend { channel_id, body } => {
            message::send_message(ctx, state, now, channel_id, body)
        }
        InboundEvent::MessageUpdate { channel_id, body } => {
            message::update_message(ctx, channel_id, body)
        }
        InboundEvent::MessageDelete { channel_id, body } => {
            message::delete_message(ctx, channel_id, body)
        }
        InboundEvent::TypingStart {
            channel_id,
            user_id,
            display_name,
        } => typing::start_typing(ctx, state, now, channel_id, user_id, display_name),
        InboundEvent::TypingStop {
            channel_id,
            user_id,
        } => typing::stop_typing(ctx, state, now, channel_id, user_id),
        InboundEvent::VoiceJoin {
            channel_id,
            profile,
            flags,
        } => voice::join_voice(ctx, state, channel_id, profile, flags),
        InboundEvent::VoiceStateChange { channel_id, flags } => {
            voice::change_voice_state(ctx, state, channel_id, flags)
        }
        InboundEvent::VoiceLeave(channel_id) => voice::leave_voice(ctx, state, channel_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ChannelId, ConnectionId, MessageBody, Notification, UserId, VoiceFlags, VoiceProfile,
        },
        usecase::test_support::RecordingPusher,
    };
    use serde_json::json;
    use tokio::sync::{Mutex, mpsc};
    use tsudoi_shared::time::FixedClock;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::try_from(id).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::try_from(id).unwrap()
    }

    fn channel(id: &str) -> ChannelId {
        ChannelId::try_from(id).unwrap()
    }

    fn body(value: serde_json::Value) -> MessageBody {
        value.as_object().cloned().unwrap()
    }

    fn profile(user_id: &str) -> VoiceProfile {
        VoiceProfile {
            user_id: user(user_id),
            display_name: user_id.to_string(),
            avatar: None,
        }
    }

    fn create_dispatcher() -> (EventDispatcher, SharedState, Arc<RecordingPusher>) {
        let (dispatcher, state, pusher, _clock) = create_dispatcher_with_clock();
        (dispatcher, state, pusher)
    }

    fn create_dispatcher_with_clock() -> (
        EventDispatcher,
        SharedState,
        Arc<RecordingPusher>,
        Arc<FixedClock>,
    ) {
        let state: SharedState = Arc::new(Mutex::new(RealtimeState::default()));
        let pusher = Arc::new(RecordingPusher::default());
        let clock = Arc::new(FixedClock::new(1000));
        let dispatcher = EventDispatcher::new(state.clone(), pusher.clone(), clock.clone());
        (dispatcher, state, pusher, clock)
    }

    async fn open(dispatcher: &EventDispatcher, conn_id: &str, user_id: &str) -> ConnectionContext {
        let ctx = ConnectionContext::new(conn(conn_id), Some(user(user_id)));
        let (tx, _rx) = mpsc::unbounded_channel();
        dispatcher.open(&ctx, tx).await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_chat_relay_between_two_users() {
        // テスト項目: 同じチャンネルの 2 人の間でメッセージが中継される
        // given (前提条件):
        let (dispatcher, _state, pusher) = create_dispatcher();
        let a = open(&dispatcher, "x", "u1").await;
        let b = open(&dispatcher, "y", "u2").await;
        dispatcher
            .dispatch(&a, InboundEvent::ChannelJoin(channel("c1")))
            .await;
        dispatcher
            .dispatch(&b, InboundEvent::ChannelJoin(channel("c1")))
            .await;
        pusher.take();

        // when (操作):
        let message = body(json!({"id": "m1", "channelId": "c1", "content": "hi"}));
        dispatcher
            .dispatch(
                &a,
                InboundEvent::MessageSend {
                    channel_id: channel("c1"),
                    body: message.clone(),
                },
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            pusher.received_by(&conn("y")),
            vec![Notification::MessageNew(message)]
        );
        // 送信者自身には届かない
        assert!(pusher.received_by(&conn("x")).is_empty());
    }

    #[tokio::test]
    async fn test_message_not_relayed_outside_room() {
        // テスト項目: ルームに参加していない接続にはメッセージが届かない
        // given (前提条件):
        let (dispatcher, _state, pusher) = create_dispatcher();
        let a = open(&dispatcher, "x", "u1").await;
        let _outsider = open(&dispatcher, "z", "u3").await;
        dispatcher
            .dispatch(&a, InboundEvent::ChannelJoin(channel("c1")))
            .await;
        pusher.take();

        // when (操作):
        dispatcher
            .dispatch(
                &a,
                InboundEvent::MessageDelete {
                    channel_id: channel("c1"),
                    body: body(json!({"messageId": "m1", "channelId": "c1"})),
                },
            )
            .await;

        // then (期待する結果):
        assert!(pusher.received_by(&conn("z")).is_empty());
        assert!(pusher.received_by(&conn("x")).is_empty());
    }

    #[tokio::test]
    async fn test_text_channel_named_like_voice_room_stays_separate() {
        // テスト項目: "voice:v1" という名前のテキストチャンネル宛てのメッセージは
        //             ボイスチャンネル v1 の参加者に届かない
        // given (前提条件):
        let (dispatcher, state, pusher) = create_dispatcher();
        let speaker = open(&dispatcher, "x", "u1").await;
        let writer = open(&dispatcher, "y", "u2").await;
        dispatcher
            .dispatch(
                &speaker,
                InboundEvent::VoiceJoin {
                    channel_id: channel("v1"),
                    profile: profile("u1"),
                    flags: VoiceFlags::default(),
                },
            )
            .await;
        dispatcher
            .dispatch(&writer, InboundEvent::ChannelJoin(channel("voice:v1")))
            .await;
        pusher.take();

        // when (操作):
        dispatcher
            .dispatch(
                &writer,
                InboundEvent::MessageSend {
                    channel_id: channel("voice:v1"),
                    body: body(json!({"channelId": "voice:v1", "content": "secret"})),
                },
            )
            .await;
        dispatcher
            .dispatch(&speaker, InboundEvent::ChannelLeave(channel("voice:v1")))
            .await;

        // then (期待する結果):
        assert!(pusher.received_by(&conn("x")).is_empty());
        let state = state.lock().await;
        assert!(
            state
                .rooms
                .is_member(&crate::domain::RoomId::voice(&channel("v1")), &conn("x"))
        );
    }

    #[tokio::test]
    async fn test_typing_entry_expires_after_ttl() {
        // テスト項目: 更新されない入力中表示は TTL 経過後のスナップショットから消える
        // given (前提条件):
        let (dispatcher, _state, pusher, clock) = create_dispatcher_with_clock();
        let a = open(&dispatcher, "x", "u1").await;
        let b = open(&dispatcher, "y", "u2").await;
        for ctx in [&a, &b] {
            dispatcher
                .dispatch(ctx, InboundEvent::ChannelJoin(channel("c1")))
                .await;
        }
        dispatcher
            .dispatch(
                &a,
                InboundEvent::TypingStart {
                    channel_id: channel("c1"),
                    user_id: user("u1"),
                    display_name: "alice".to_string(),
                },
            )
            .await;
        pusher.take();

        // when (操作):
        clock.advance(3_000);
        dispatcher
            .dispatch(
                &b,
                InboundEvent::TypingStop {
                    channel_id: channel("c1"),
                    user_id: user("u2"),
                },
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            pusher.received_by(&conn("y")),
            vec![Notification::TypingUpdate {
                channel_id: channel("c1"),
                users: Vec::new(),
            }]
        );
    }

    #[tokio::test]
    async fn test_voice_switch_sends_old_then_new_roster() {
        // テスト項目: ボイスチャンネルの切り替えで旧・新の順に名簿が全体へ送られる
        // given (前提条件):
        let (dispatcher, state, pusher) = create_dispatcher();
        let a = open(&dispatcher, "x", "u1").await;
        let _observer = open(&dispatcher, "y", "u2").await;
        dispatcher
            .dispatch(
                &a,
                InboundEvent::VoiceJoin {
                    channel_id: channel("v1"),
                    profile: profile("u1"),
                    flags: VoiceFlags::default(),
                },
            )
            .await;
        pusher.take();

        // when (操作):
        dispatcher
            .dispatch(
                &a,
                InboundEvent::VoiceJoin {
                    channel_id: channel("v2"),
                    profile: profile("u1"),
                    flags: VoiceFlags::default(),
                },
            )
            .await;

        // then (期待する結果):
        let received = pusher.received_by(&conn("y"));
        assert_eq!(received.len(), 2);
        match (&received[0], &received[1]) {
            (Notification::VoiceStateUpdate(old), Notification::VoiceStateUpdate(new)) => {
                assert_eq!(old.channel_id, channel("v1"));
                assert!(old.participants.is_empty());
                assert_eq!(new.channel_id, channel("v2"));
                assert_eq!(new.participants.len(), 1);
            }
            other => panic!("unexpected notifications: {other:?}"),
        }
        let state = state.lock().await;
        assert_eq!(state.voice.channel_of(&conn("x")), Some(&channel("v2")));
    }

    #[tokio::test]
    async fn test_close_broadcasts_offline() {
        // テスト項目: 唯一の接続を閉じると他の接続へ offline が届く
        // given (前提条件):
        let (dispatcher, _state, pusher) = create_dispatcher();
        let a = open(&dispatcher, "x", "u1").await;
        let _b = open(&dispatcher, "y", "u2").await;
        pusher.take();

        // when (操作):
        let report = dispatcher.close(&a).await;

        // then (期待する結果):
        assert_eq!(report.unwrap().became_offline, Some(user("u1")));
        assert_eq!(
            pusher.received_by(&conn("y")),
            vec![Notification::PresenceUpdate {
                user_id: user("u1"),
                is_online: false
            }]
        );
    }

    #[tokio::test]
    async fn test_dispatch_from_unregistered_connection_is_ignored() {
        // テスト項目: 未登録の接続からのイベントは状態を変更しない
        // given (前提条件):
        let (dispatcher, state, pusher) = create_dispatcher();
        let ghost = ConnectionContext::new(conn("ghost"), None);

        // when (操作):
        dispatcher
            .dispatch(&ghost, InboundEvent::ChannelJoin(channel("c1")))
            .await;

        // then (期待する結果):
        assert_eq!(state.lock().await.rooms.room_count(), 0);
        assert!(pusher.take().is_empty());
    }

    #[test]
    fn test_handle_typing_start_targets_room_including_sender() {
        // テスト項目: typing:start の通知は送信者を含むルーム全員が対象
        // given (前提条件):
        let mut state = RealtimeState::default();
        let ctx = ConnectionContext::new(conn("x"), Some(user("u1")));

        // when (操作):
        let outbound = handle(
            &ctx,
            &mut state,
            Timestamp::new(0),
            InboundEvent::TypingStart {
                channel_id: channel("c1"),
                user_id: user("u1"),
                display_name: "alice".to_string(),
            },
        );

        // then (期待する結果):
        assert_eq!(outbound.len(), 1);
        assert_eq!(
            outbound[0].audience,
            crate::usecase::delivery::Audience::Room {
                room_id: crate::domain::RoomId::channel(&channel("c1")),
                except: None
            }
        );
    }
}
