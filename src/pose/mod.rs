pub mod landmark;

pub use landmark::{Landmark, LandmarkError, LandmarkName, LandmarkSet};
