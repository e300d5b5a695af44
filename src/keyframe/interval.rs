use std::time::{Duration, Instant};

/// プランクのキーフレーム間隔（秒）
pub const DEFAULT_PLANK_INTERVAL_SECS: u64 = 10;

/// 一定時間ごとにキーフレームを発火するタイマー
///
/// 最初の呼び出しは必ず発火する。
/// 時刻が巻き戻った場合は経過 0 として扱う。
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    pub fn check(&mut self, now: Instant) -> bool {
        match self.last_fired {
            None => {
                self.last_fired = Some(now);
                true
            }
            Some(last) => {
                if now.saturating_duration_since(last) >= self.interval {
                    self.last_fired = Some(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_PLANK_INTERVAL_SECS))
    }
}
