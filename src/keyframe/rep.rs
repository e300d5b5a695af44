use std::time::Instant;

use super::phase::Phase;

/// 進行中レップで観測した極値位相
///
/// 観測順は問わないが、完了判定は Top の遷移でのみ行う。
/// Bottom と Top が揃った状態で Top に入れば1レップ完了。
#[derive(Debug, Clone, Default)]
pub struct RepTracker {
    seen_bottom: bool,
    seen_top: bool,
    total_reps: u32,
    last_completed_at: Option<Instant>,
}

impl RepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 位相の遷移を記録し、レップが完了したら true を返す
    ///
    /// Top/Bottom 以外の位相は何も変えない。
    pub fn observe(&mut self, phase: Phase, now: Instant) -> bool {
        match phase {
            Phase::Bottom => {
                self.seen_bottom = true;
                return false;
            }
            Phase::Top => self.seen_top = true,
            Phase::Middle | Phase::Unknown => return false,
        }

        if self.seen_bottom {
            self.total_reps += 1;
            self.seen_bottom = false;
            self.seen_top = false;
            self.last_completed_at = Some(now);
            true
        } else {
            false
        }
    }

    pub fn total_reps(&self) -> u32 {
        self.total_reps
    }

    pub fn last_completed_at(&self) -> Option<Instant> {
        self.last_completed_at
    }

    /// 現在のレップで観測済みの位相
    pub fn phases_seen(&self) -> Vec<Phase> {
        let mut phases = Vec::with_capacity(2);
        if self.seen_top {
            phases.push(Phase::Top);
        }
        if self.seen_bottom {
            phases.push(Phase::Bottom);
        }
        phases
    }
}
