//! UseCase: メッセージ中継
//!
//! メッセージ本体の永続化は REST 層の責務で、ここではルームの他のメンバーへ中継するだけ。
//! 送信者自身には送り返さない。

use crate::domain::{ChannelId, MessageBody, Notification, RealtimeState, RoomId, Timestamp};

use super::{
    delivery::{ConnectionContext, Outbound},
    typing,
};

/// `message:send` → `message:new`
///
/// 送信者の入力中表示も同時に消す。
pub fn send_message(
    ctx: &ConnectionContext,
    state: &mut RealtimeState,
    now: Timestamp,
    channel_id: ChannelId,
    body: MessageBody,
) -> Vec<Outbound> {
    let mut outbound = vec![Outbound::to_room(
        RoomId::channel(&channel_id),
        Some(ctx.connection_id.clone()),
        Notification::MessageNew(body),
    )];

    if let Some(user_id) = &ctx.user_id
        && state.typing.stop(&channel_id, user_id)
    {
        outbound.push(typing::typing_update(state, now, &channel_id));
    }
    outbound
}

/// `message:update`
pub fn update_message(
    ctx: &ConnectionContext,
    channel_id: ChannelId,
    body: MessageBody,
) -> Vec<Outbound> {
    vec![Outbound::to_room(
        RoomId::channel(&channel_id),
        Some(ctx.connection_id.clone()),
        Notification::MessageUpdate(body),
    )]
}

/// `message:delete`
pub fn delete_message(
    ctx: &ConnectionContext,
    channel_id: ChannelId,
    body: MessageBody,
) -> Vec<Outbound> {
    vec![Outbound::to_room(
        RoomId::channel(&channel_id),
        Some(ctx.connection_id.clone()),
        Notification::MessageDelete(body),
    )]
}
