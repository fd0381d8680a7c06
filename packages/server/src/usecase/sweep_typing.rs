//! UseCase: 期限切れの入力中エントリの掃除
//!
//! 期限切れのエントリはスナップショットに現れないため、通知は送らない。
//! メモリに残り続けないように定期的に削除するだけ。

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use super::delivery::{SharedState, now};

pub struct SweepExpiredTypingUseCase {
    state: SharedState,
    clock: Arc<dyn Clock>,
}

impl SweepExpiredTypingUseCase {
    pub fn new(state: SharedState, clock: Arc<dyn Clock>) -> Self {
        Self { state, clock }
    }

    /// 削除したエントリ数を返す
    pub async fn execute(&self) -> usize {
        let mut state = self.state.lock().await;
        let removed = state.typing.purge_expired(now(self.clock.as_ref()));
        if removed > 0 {
            tracing::debug!("Purged {} expired typing entries", removed);
        }
        removed
    }
}
