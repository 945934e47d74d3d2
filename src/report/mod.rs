//! Reply rendering: chat text and chart images.

pub mod chart;
pub mod messages;

pub use chart::{Chart, ChartRenderer};
pub use messages::SnapshotInfo;
