//! Schedule computation: materializing lessons and classifying changes

pub mod change_detector;
pub mod materializer;

pub use change_detector::{detect, ChangeSet};
pub use materializer::{materialize, MaterializeContext};
