use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use super::interval::IntervalTimer;
use super::phase::Phase;
use super::rep::RepTracker;
use crate::pose::LandmarkSet;

/// セッション識別子（呼び出し側が払い出す不透明な値）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1セッション分の可変状態（検出器の外からは触れない）
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    /// None は未処理（最初のフレーム待ち）
    pub(crate) last_phase: Option<Phase>,
    pub(crate) last_landmarks: Option<LandmarkSet>,
    pub(crate) interval: IntervalTimer,
    pub(crate) rep: RepTracker,
    pub(crate) last_seen: Instant,
}

impl SessionState {
    pub(crate) fn new(plank_interval: Duration, now: Instant) -> Self {
        Self {
            last_phase: None,
            last_landmarks: None,
            interval: IntervalTimer::new(plank_interval),
            rep: RepTracker::new(),
            last_seen: now,
        }
    }
}

pub(crate) type SharedSession = Arc<Mutex<SessionState>>;

/// セッション状態の置き場
///
/// マップのロックは検索・挿入・削除の間だけ保持する。
/// 同一セッションの更新はセッションごとの Mutex で直列化される。
pub(crate) struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
    plank_interval: Duration,
}

impl SessionStore {
    pub(crate) fn new(plank_interval: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            plank_interval,
        }
    }

    pub(crate) fn get(&self, id: SessionId) -> Option<SharedSession> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(&id).cloned()
    }

    pub(crate) fn get_or_create(&self, id: SessionId, now: Instant) -> SharedSession {
        if let Some(session) = self.get(id) {
            return session;
        }
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(SessionState::new(self.plank_interval, now))))
            .clone()
    }

    /// 未知・リセット済みの ID でも何もしないだけ
    pub(crate) fn reset(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(&id).is_some()
    }

    /// last_seen が max_idle より古いセッションを破棄し、件数を返す
    pub(crate) fn evict_idle(&self, now: Instant, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, session| {
            let state = lock_session(session);
            now.saturating_duration_since(state.last_seen) <= max_idle
        });
        before - sessions.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// セッション状態をロックする（poison は無視して中身を使う）
pub(crate) fn lock_session(session: &SharedSession) -> MutexGuard<'_, SessionState> {
    session.lock().unwrap_or_else(|e| e.into_inner())
}
