use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MediaPipe Pose のランドマーク名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkName {
    Nose,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftIndex,
    RightIndex,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkName {
    /// 上流モデルが出力する名前
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "NOSE",
            Self::LeftEar => "LEFT_EAR",
            Self::RightEar => "RIGHT_EAR",
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftWrist => "LEFT_WRIST",
            Self::RightWrist => "RIGHT_WRIST",
            Self::LeftIndex => "LEFT_INDEX",
            Self::RightIndex => "RIGHT_INDEX",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftAnkle => "LEFT_ANKLE",
            Self::RightAnkle => "RIGHT_ANKLE",
            Self::LeftHeel => "LEFT_HEEL",
            Self::RightHeel => "RIGHT_HEEL",
            Self::LeftFootIndex => "LEFT_FOOT_INDEX",
            Self::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f64,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f64,
}

impl Landmark {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }

    pub fn named(name: LandmarkName, x: f64, y: f64) -> Self {
        Self::new(name.as_str(), x, y)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LandmarkError {
    #[error("landmark {name} has non-finite coordinates ({x}, {y})")]
    NonFinite { name: String, x: f64, y: f64 },
}

/// 1フレーム分のランドマーク集合（名前で一意）
///
/// 同名のランドマークが複数あれば最初のものを採用する。
/// 有限値の座標は 0.0〜1.0 にクランプされ、NaN/∞ はエラーになる。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new<I>(landmarks: I) -> Result<Self, LandmarkError>
    where
        I: IntoIterator<Item = Landmark>,
    {
        let mut set = Vec::new();
        for lm in landmarks {
            if !lm.x.is_finite() || !lm.y.is_finite() {
                return Err(LandmarkError::NonFinite {
                    name: lm.name,
                    x: lm.x,
                    y: lm.y,
                });
            }
            if set.iter().any(|l: &Landmark| l.name == lm.name) {
                continue;
            }
            set.push(Landmark {
                x: lm.x.clamp(0.0, 1.0),
                y: lm.y.clamp(0.0, 1.0),
                name: lm.name,
            });
        }
        Ok(Self { landmarks: set })
    }

    /// ポーズ未検出フレーム
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.get_by_name(name.as_str())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.name == name)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_duplicate_wins() {
        let set = LandmarkSet::new(vec![
            Landmark::named(LandmarkName::LeftHip, 0.1, 0.2),
            Landmark::named(LandmarkName::LeftHip, 0.9, 0.9),
        ])
        .unwrap();
        assert_eq!(set.len(), 1);
        let hip = set.get(LandmarkName::LeftHip).unwrap();
        assert_eq!(hip.x, 0.1);
        assert_eq!(hip.y, 0.2);
    }

    #[test]
    fn test_clamp_out_of_range() {
        let set = LandmarkSet::new(vec![Landmark::named(LandmarkName::LeftKnee, -0.2, 1.3)]).unwrap();
        let knee = set.get(LandmarkName::LeftKnee).unwrap();
        assert_eq!(knee.x, 0.0);
        assert_eq!(knee.y, 1.0);
    }

    #[test]
    fn test_reject_nan() {
        let err = LandmarkSet::new(vec![Landmark::named(LandmarkName::LeftKnee, 0.5, f64::NAN)]);
        assert!(matches!(err, Err(LandmarkError::NonFinite { .. })));
    }

    #[test]
    fn test_unknown_names_are_kept() {
        let set = LandmarkSet::new(vec![Landmark::new("MOUTH_LEFT", 0.5, 0.5)]).unwrap();
        assert!(set.get_by_name("MOUTH_LEFT").is_some());
        assert!(set.get(LandmarkName::Nose).is_none());
    }

    #[test]
    fn test_empty() {
        assert!(LandmarkSet::empty().is_empty());
        assert!(LandmarkSet::new(Vec::new()).unwrap().is_empty());
    }
}
