//! UseCase テスト用の MessagePusher

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, Notification, PusherChannel};

/// 送信内容を記録するだけの MessagePusher
#[derive(Default)]
pub struct RecordingPusher {
    pub sent: Mutex<Vec<(Vec<ConnectionId>, Notification)>>,
}

impl RecordingPusher {
    /// 記録された通知を取り出す
    pub fn take(&self) -> Vec<(Vec<ConnectionId>, Notification)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// 特定の接続に届いた通知
    pub fn received_by(&self, connection_id: &ConnectionId) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(targets, _)| targets.contains(connection_id))
            .map(|(_, notification)| notification.clone())
            .collect()
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_connection(
        &self,
        _connection_id: ConnectionId,
        _sender: PusherChannel,
    ) -> Result<(), MessagePushError> {
        Ok(())
    }

    async fn unregister_connection(&self, _connection_id: &ConnectionId) {}

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        self.sent
            .lock()
            .unwrap()
            .push((vec![connection_id.clone()], notification.clone()));
        Ok(())
    }

    async fn broadcast(&self, mut targets: Vec<ConnectionId>, notification: &Notification) {
        targets.sort();
        self.sent
            .lock()
            .unwrap()
            .push((targets, notification.clone()));
    }
}
