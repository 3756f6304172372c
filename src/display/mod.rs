//! Display mode heuristics selecting the large-display layout.

mod core;
mod tracker;

pub use core::{
    ASPECT_RATIO_TOLERANCE, DeviceHints, DisplayMode, SalesLayout, TV_ASPECT_RATIO, TV_MIN_WIDTH,
    classify,
};
pub use tracker::{DisplayModeReceiver, DisplayModeTracker};
