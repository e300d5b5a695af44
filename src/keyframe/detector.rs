use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::exercise::Exercise;
use super::phase::{Phase, PhaseClassifier};
use super::session::{lock_session, SessionId, SessionState, SessionStore};
use crate::config::DetectorConfig;
use crate::pose::LandmarkSet;

/// 保存すべきキーフレームの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyframeKind {
    Top,
    Bottom,
    Middle,
    PlankInterval,
}

impl KeyframeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Middle => "middle",
            Self::PlankInterval => "plank_interval",
        }
    }
}

/// 1フレームの判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSignal {
    pub keyframe: Option<KeyframeKind>,
    pub rep_completed: bool,
}

impl FrameSignal {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn keyframe(kind: KeyframeKind) -> Self {
        Self {
            keyframe: Some(kind),
            rep_completed: false,
        }
    }
}

/// キーフレーム検出器
///
/// セッションごとの位相・レップ状態を保持し、フレームごとに
/// キーフレーム種別とレップ完了を返す。
/// - プランク: 一定間隔でキーフレーム、レップは数えない
/// - スクワット・腕立て・ランジ: 位相の遷移でキーフレーム、Bottom と Top が揃えば1レップ
/// - その他: 最初のフレームのみキーフレーム
///
/// セッション状態は検出器の中に閉じており、外から書き換えることはできない。
///
/// ```compile_fail
/// let d = rep_tracker::keyframe::KeyframeDetector::default();
/// let _ = d.sessions();
/// ```
///
/// ```compile_fail
/// use rep_tracker::keyframe::session::SessionStore;
/// ```
pub struct KeyframeDetector {
    classifier: PhaseClassifier,
    store: SessionStore,
}

impl KeyframeDetector {
    pub fn new(classifier: PhaseClassifier, plank_interval: Duration) -> Self {
        Self {
            classifier,
            store: SessionStore::new(plank_interval),
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(
            PhaseClassifier::from_config(config),
            Duration::from_secs(config.plank_interval_secs),
        )
    }

    pub fn process_frame(
        &self,
        session_id: SessionId,
        exercise: &Exercise,
        landmarks: &LandmarkSet,
        timestamp: Instant,
    ) -> FrameSignal {
        if exercise.is_timed() {
            return match self.check_interval(session_id, timestamp) {
                Some(kind) => FrameSignal::keyframe(kind),
                None => FrameSignal::none(),
            };
        }

        // ポーズ未検出は最初のフレームとして扱わない
        if landmarks.is_empty() {
            return FrameSignal::none();
        }

        let session = self.store.get_or_create(session_id, timestamp);
        let mut state = lock_session(&session);
        state.last_seen = timestamp;

        let phase = self.classifier.classify(exercise, landmarks);
        let previous_rep = state.rep.last_completed_at();
        let signal = transition(&mut state, exercise, phase, timestamp);

        if state.last_phase != Some(phase) {
            let moved = state
                .last_landmarks
                .as_ref()
                .and_then(|prev| primary_dy(exercise, prev, landmarks));
            log::debug!(
                "session {}: phase {:?} -> {:?} (primary dy {:?}, seen {:?})",
                session_id,
                state.last_phase,
                phase,
                moved,
                state.rep.phases_seen()
            );
        }
        if signal.rep_completed {
            match previous_rep {
                Some(prev) => log::info!(
                    "session {}: rep #{} completed ({:.1}s after previous)",
                    session_id,
                    state.rep.total_reps(),
                    timestamp.saturating_duration_since(prev).as_secs_f64()
                ),
                None => log::info!("session {}: rep #{} completed", session_id, state.rep.total_reps()),
            }
        }

        state.last_phase = Some(phase);
        state.last_landmarks = Some(landmarks.clone());
        signal
    }

    /// プランク用の間隔チェック
    pub fn check_interval(&self, session_id: SessionId, timestamp: Instant) -> Option<KeyframeKind> {
        let session = self.store.get_or_create(session_id, timestamp);
        let mut state = lock_session(&session);
        state.last_seen = timestamp;
        if state.interval.check(timestamp) {
            log::debug!("session {}: plank interval keyframe", session_id);
            Some(KeyframeKind::PlankInterval)
        } else {
            None
        }
    }

    pub fn get_rep_count(&self, session_id: SessionId) -> u32 {
        self.store
            .get(session_id)
            .map(|session| lock_session(&session).rep.total_reps())
            .unwrap_or(0)
    }

    pub fn reset_session(&self, session_id: SessionId) {
        if self.store.reset(session_id) {
            log::info!("session {}: reset", session_id);
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    pub fn evict_idle(&self, now: Instant, max_idle: Duration) -> usize {
        let evicted = self.store.evict_idle(now, max_idle);
        if evicted > 0 {
            log::info!("evicted {} idle session(s)", evicted);
        }
        evicted
    }

    pub(crate) fn sessions(&self) -> &SessionStore {
        &self.store
    }
}

impl Default for KeyframeDetector {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

/// 前フレームからの primary ランドマークのY移動量
fn primary_dy(exercise: &Exercise, prev: &LandmarkSet, cur: &LandmarkSet) -> Option<f64> {
    let (primary, _) = exercise.primary_pair()?;
    Some(cur.get(primary)?.y - prev.get(primary)?.y)
}

/// 位相・レップの状態遷移（last_phase の更新は呼び出し側）
fn transition(state: &mut SessionState, exercise: &Exercise, phase: Phase, now: Instant) -> FrameSignal {
    let Some(last_phase) = state.last_phase else {
        // 最初のフレームは位相によらず保存する
        return FrameSignal::keyframe(KeyframeKind::Middle);
    };

    if !exercise.counts_reps() || phase == last_phase {
        return FrameSignal::none();
    }

    match phase {
        Phase::Bottom => {
            state.rep.observe(Phase::Bottom, now);
            FrameSignal::keyframe(KeyframeKind::Bottom)
        }
        Phase::Top => FrameSignal {
            keyframe: Some(KeyframeKind::Top),
            rep_completed: state.rep.observe(Phase::Top, now),
        },
        Phase::Middle => FrameSignal::keyframe(KeyframeKind::Middle),
        Phase::Unknown => FrameSignal::none(),
    }
}
