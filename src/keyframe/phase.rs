use serde::{Deserialize, Serialize};

use super::exercise::Exercise;
use crate::config::DetectorConfig;
use crate::pose::LandmarkSet;

/// 位相判定の不感帯（正規化座標）
pub const DEFAULT_PHASE_THRESHOLD: f64 = 0.05;

/// 動作の位相
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Top,
    Bottom,
    Middle,
    Unknown,
}

/// ランドマーク対のY差から位相を判定する
///
/// d = y(primary) - y(secondary) とし、
/// - d > threshold  → Bottom（primary が secondary より下）
/// - d < -threshold → Top
/// - それ以外      → Middle
///
/// 対が定義されていない種目やランドマーク欠損は Unknown。
/// 未知の種目は常に Middle。前フレームは参照しない。
pub fn classify(exercise: &Exercise, landmarks: &LandmarkSet, threshold: f64) -> Phase {
    if let Exercise::Other(_) = exercise {
        return Phase::Middle;
    }

    let Some((primary, secondary)) = exercise.primary_pair() else {
        return Phase::Unknown;
    };

    let (Some(p), Some(s)) = (landmarks.get(primary), landmarks.get(secondary)) else {
        return Phase::Unknown;
    };

    let d = p.y - s.y;
    if d > threshold {
        Phase::Bottom
    } else if d < -threshold {
        Phase::Top
    } else {
        Phase::Middle
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PhaseClassifier {
    threshold: f64,
}

impl PhaseClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.phase_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, exercise: &Exercise, landmarks: &LandmarkSet) -> Phase {
        classify(exercise, landmarks, self.threshold)
    }
}

impl Default for PhaseClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PHASE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, LandmarkName};

    fn make_pair(primary: LandmarkName, py: f64, secondary: LandmarkName, sy: f64) -> LandmarkSet {
        LandmarkSet::new(vec![
            Landmark::named(primary, 0.5, py),
            Landmark::named(secondary, 0.5, sy),
        ])
        .unwrap()
    }

    fn squat(hip_y: f64, knee_y: f64) -> LandmarkSet {
        make_pair(LandmarkName::LeftHip, hip_y, LandmarkName::LeftKnee, knee_y)
    }

    #[test]
    fn test_squat_phases() {
        let c = PhaseClassifier::default();
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.60, 0.50)), Phase::Bottom);
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.40, 0.50)), Phase::Top);
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.50, 0.50)), Phase::Middle);
    }

    #[test]
    fn test_dead_zone_edges() {
        let c = PhaseClassifier::default();
        // 不感帯の内側は Middle、外側は Bottom / Top
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.53, 0.50)), Phase::Middle);
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.47, 0.50)), Phase::Middle);
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.56, 0.50)), Phase::Bottom);
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.44, 0.50)), Phase::Top);
    }

    #[test]
    fn test_threshold_boundary_in_f64() {
        let c = PhaseClassifier::default();
        // 0.45 - 0.50 は f64 で -0.04999... なので不感帯の内側
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.45, 0.50)), Phase::Middle);
        // 0.55 - 0.50 は f64 で 0.05000...04 なので Bottom
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.55, 0.50)), Phase::Bottom);
    }

    #[test]
    fn test_lunges_use_hip_knee() {
        let c = PhaseClassifier::default();
        assert_eq!(c.classify(&Exercise::Lunges, &squat(0.70, 0.50)), Phase::Bottom);
    }

    #[test]
    fn test_pushup_phases() {
        let c = PhaseClassifier::default();
        let bottom = make_pair(LandmarkName::LeftShoulder, 0.70, LandmarkName::LeftElbow, 0.60);
        let top = make_pair(LandmarkName::LeftShoulder, 0.40, LandmarkName::LeftElbow, 0.60);
        assert_eq!(c.classify(&Exercise::Pushup, &bottom), Phase::Bottom);
        assert_eq!(c.classify(&Exercise::Pushup, &top), Phase::Top);
        // スクワット用のランドマークでは判定できない
        assert_eq!(c.classify(&Exercise::Pushup, &squat(0.7, 0.5)), Phase::Unknown);
    }

    #[test]
    fn test_missing_landmark_is_unknown() {
        let only_hip = LandmarkSet::new(vec![Landmark::named(LandmarkName::LeftHip, 0.5, 0.9)]).unwrap();
        assert_eq!(classify(&Exercise::Squat, &only_hip, 0.05), Phase::Unknown);
        assert_eq!(classify(&Exercise::Squat, &LandmarkSet::empty(), 0.05), Phase::Unknown);
    }

    #[test]
    fn test_plank_has_no_pair() {
        assert_eq!(classify(&Exercise::Plank, &squat(0.9, 0.1), 0.05), Phase::Unknown);
    }

    #[test]
    fn test_other_is_always_middle() {
        let e = Exercise::parse("jumping_jack");
        assert_eq!(classify(&e, &LandmarkSet::empty(), 0.05), Phase::Middle);
        assert_eq!(classify(&e, &squat(0.9, 0.1), 0.05), Phase::Middle);
    }

    #[test]
    fn test_custom_threshold() {
        let c = PhaseClassifier::new(0.2);
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.60, 0.50)), Phase::Middle);
        assert_eq!(c.classify(&Exercise::Squat, &squat(0.80, 0.50)), Phase::Bottom);
    }
}
