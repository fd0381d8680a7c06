//! UseCase: テキストチャンネルのルーム参加・退出

use crate::domain::{ChannelId, RealtimeState, RoomId};

use super::delivery::{ConnectionContext, Outbound};

/// `channel:join`
pub fn join_channel(
    ctx: &ConnectionContext,
    state: &mut RealtimeState,
    channel_id: ChannelId,
) -> Vec<Outbound> {
    if state
        .rooms
        .join(RoomId::channel(&channel_id), ctx.connection_id.clone())
    {
        tracing::debug!("Connection '{}' joined channel '{}'", ctx.connection_id, channel_id);
    }
    Vec::new()
}

/// `channel:leave`
pub fn leave_channel(
    ctx: &ConnectionContext,
    state: &mut RealtimeState,
    channel_id: ChannelId,
) -> Vec<Outbound> {
    if state
        .rooms
        .leave(&RoomId::channel(&channel_id), &ctx.connection_id)
    {
        tracing::debug!("Connection '{}' left channel '{}'", ctx.connection_id, channel_id);
    }
    Vec::new()
}
