//! UseCase: ボイスチャンネルの参加・退出・状態変更
//!
//! 名簿はサイドバーでサーバー全体から見えるため、`voice:state-update` はルームではなく
//! 全ての接続へ送る。差分ではなく名簿全体を毎回送る。

use crate::domain::{
    ChannelId, ConnectionId, Notification, RealtimeState, RoomId, VoiceFlags, VoiceProfile,
    VoiceRoster,
};

use super::delivery::{ConnectionContext, Outbound};

fn roster_update(roster: VoiceRoster) -> Outbound {
    Outbound::to_everyone(Notification::VoiceStateUpdate(roster))
}

/// `voice:join`
///
/// 別のチャンネルにいる場合は退出と参加を 1 つの操作で確定させてから、
/// 旧チャンネル・新チャンネルの順に名簿を送る。
pub fn join_voice(
    ctx: &ConnectionContext,
    state: &mut RealtimeState,
    channel_id: ChannelId,
    profile: VoiceProfile,
    flags: VoiceFlags,
) -> Vec<Outbound> {
    let joined = state.voice.join(
        channel_id.clone(),
        ctx.connection_id.clone(),
        profile,
        flags,
    );

    let mut outbound = Vec::with_capacity(2);
    if let Some(left) = joined.left {
        state
            .rooms
            .leave(&RoomId::voice(&left.channel_id), &ctx.connection_id);
        tracing::info!(
            "Connection '{}' switched voice channel '{}' -> '{}'",
            ctx.connection_id,
            left.channel_id,
            channel_id
        );
        outbound.push(roster_update(left));
    } else {
        tracing::info!(
            "Connection '{}' joined voice channel '{}'",
            ctx.connection_id,
            channel_id
        );
    }
    state
        .rooms
        .join(RoomId::voice(&channel_id), ctx.connection_id.clone());
    outbound.push(roster_update(joined.joined));
    outbound
}

/// `voice:state-change`。参加していないチャンネルへの変更は無視する。
pub fn change_voice_state(
    ctx: &ConnectionContext,
    state: &mut RealtimeState,
    channel_id: ChannelId,
    flags: VoiceFlags,
) -> Vec<Outbound> {
    match state
        .voice
        .update_flags(&channel_id, &ctx.connection_id, flags)
    {
        Some(roster) => vec![roster_update(roster)],
        None => {
            tracing::debug!(
                "Ignoring voice state change from '{}' for '{}' (not a participant)",
                ctx.connection_id,
                channel_id
            );
            Vec::new()
        }
    }
}

/// `voice:leave`。参加していなければ何もしない。
pub fn leave_voice(
    ctx: &ConnectionContext,
    state: &mut RealtimeState,
    channel_id: ChannelId,
) -> Vec<Outbound> {
    match state.voice.leave(&channel_id, &ctx.connection_id) {
        Some(roster) => {
            state
                .rooms
                .leave(&RoomId::voice(&channel_id), &ctx.connection_id);
            tracing::info!(
                "Connection '{}' left voice channel '{}'",
                ctx.connection_id,
                channel_id
            );
            vec![roster_update(roster)]
        }
        None => Vec::new(),
    }
}

/// 切断時の後始末。参加していたチャンネル（あれば）の名簿を送る。
pub fn disconnect_voice(state: &mut RealtimeState, connection_id: &ConnectionId) -> Option<Outbound> {
    let roster = state.voice.disconnect(connection_id)?;
    state
        .rooms
        .leave(&RoomId::voice(&roster.channel_id), connection_id);
    tracing::info!(
        "Connection '{}' removed from voice channel '{}' on disconnect",
        connection_id,
        roster.channel_id
    );
    Some(roster_update(roster))
}

/// 新しい接続へ送る、参加者のいる全チャンネルの名簿
pub fn initial_rosters(state: &RealtimeState, connection_id: &ConnectionId) -> Vec<Outbound> {
    state
        .voice
        .rosters()
        .into_iter()
        .map(|roster| {
            Outbound::to_connection(
                connection_id.clone(),
                Notification::VoiceStateUpdate(roster),
            )
        })
        .collect()
}
