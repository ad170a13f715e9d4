//! Strategy Layer - Spread construction and band-crossing detection
//!
//! - `params`: window lengths and history depth
//! - `zscore_gate`: rolling sum and rolling z-score windows
//! - `spread`: two price series -> momentum and standardized spread
//! - `detector`: spread -> Entry/Exit events

pub mod params;
pub mod zscore_gate;
pub mod spread;
pub mod detector;

pub use params::{AnalysisConfig, ConfigError};
pub use zscore_gate::{RollingSum, ZScoreGate, ZScoreResult};
pub use spread::{SpreadBuilder, SpreadError, SpreadFrame};
pub use detector::{Detections, DetectorState, SignalDetector, SignalSeries};
