//! Value Objects
//!
//! リアルタイム層が扱う識別子は全て外部（REST 層・認証層）から渡される不透明な文字列です。
//! ここでは空文字列だけを拒否し、内容や長さの検証は行いません。

use std::fmt;

use serde::Serialize;

use super::error::ValueObjectError;

fn validate_id(kind: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(ValueObjectError::Empty(kind));
    }
    Ok(())
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// 値を検証して生成する
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate_id($kind, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// トランスポート接続の識別子（サーバー側で採番）
    ConnectionId,
    "connection id"
);

opaque_id!(
    /// ユーザー ID（認証層が保証する不透明な外部キー）
    UserId,
    "user id"
);

opaque_id!(
    /// テキスト / ボイスチャンネル ID（永続化層の不透明な外部キー）
    ChannelId,
    "channel id"
);

impl ConnectionId {
    /// 新しい接続 ID を採番する
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// ブロードキャストのスコープとなるルームの識別子
///
/// テキストチャンネルとボイスチャンネルは別の名前空間で、
/// 同じ文字列のチャンネル ID でも別のルームになる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomId {
    /// テキストチャンネルのルーム
    Channel(ChannelId),
    /// ボイスチャンネル参加者のルーム
    Voice(ChannelId),
}

impl RoomId {
    pub fn channel(channel_id: &ChannelId) -> Self {
        Self::Channel(channel_id.clone())
    }

    pub fn voice(channel_id: &ChannelId) -> Self {
        Self::Voice(channel_id.clone())
    }

    pub fn is_voice(&self) -> bool {
        matches!(self, Self::Voice(_))
    }

    pub fn channel_id(&self) -> &ChannelId {
        match self {
            Self::Channel(channel_id) | Self::Voice(channel_id) => channel_id,
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(channel_id) => write!(f, "channel:{}", channel_id),
            Self::Voice(channel_id) => write!(f, "voice:{}", channel_id),
        }
    }
}

/// タイムスタンプ（Unix ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// `earlier` からの経過ミリ秒（負にはならない）
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0).max(0)
    }
}
