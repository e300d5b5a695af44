pub mod config;
pub mod keyframe;
pub mod pose;
pub mod protocol;
