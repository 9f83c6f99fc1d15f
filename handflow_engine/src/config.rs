//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "genre": "vortex", "calibration": { "open_range": 0.3 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::genre::Genre;
use crate::hand::SqueezeCalibration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub genre:       Genre,
    pub calibration: SqueezeCalibration,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        self.calibration.validate().map_err(SessionError::Config)
    }
}
