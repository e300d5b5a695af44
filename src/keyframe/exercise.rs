use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pose::LandmarkName;

/// 種目
///
/// 未知の識別子は `Other` として受け付ける（レップは数えない）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Exercise {
    Squat,
    Pushup,
    Lunges,
    Plank,
    Other(String),
}

impl Exercise {
    pub fn parse(s: &str) -> Self {
        match s {
            "squat" => Self::Squat,
            "pushup" => Self::Pushup,
            "lunges" => Self::Lunges,
            "plank" => Self::Plank,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Squat => "squat",
            Self::Pushup => "pushup",
            Self::Lunges => "lunges",
            Self::Plank => "plank",
            Self::Other(s) => s.as_str(),
        }
    }

    /// 位相判定に使うランドマーク対 (primary, secondary)
    pub fn primary_pair(&self) -> Option<(LandmarkName, LandmarkName)> {
        match self {
            Self::Squat | Self::Lunges => Some((LandmarkName::LeftHip, LandmarkName::LeftKnee)),
            Self::Pushup => Some((LandmarkName::LeftShoulder, LandmarkName::LeftElbow)),
            Self::Plank | Self::Other(_) => None,
        }
    }

    /// レップを数える種目か
    pub fn counts_reps(&self) -> bool {
        matches!(self, Self::Squat | Self::Pushup | Self::Lunges)
    }

    /// 時間間隔でキーフレームを取る種目か
    pub fn is_timed(&self) -> bool {
        matches!(self, Self::Plank)
    }
}

impl From<String> for Exercise {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Exercise> for String {
    fn from(e: Exercise) -> Self {
        e.as_str().to_string()
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
