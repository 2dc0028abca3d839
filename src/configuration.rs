use std::fs::File;
use std::io::BufReader;

use serde::{
    Deserialize,
    Serialize
};

use crate::curve::curve::Time;
use crate::curve::curveerror::CurveError;

fn default_minimum_measurements() -> u32 { 1 }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplingPolicyConfig {
    #[serde(default = "default_minimum_measurements")]
    minimum_measurements: u32,
    #[serde(default)]
    min_sampling_period: Time
}

impl Default for SamplingPolicyConfig {
    fn default() -> Self {
        SamplingPolicyConfig {
            minimum_measurements: default_minimum_measurements(),
            min_sampling_period: 0
        }
    }
}

impl SamplingPolicyConfig {
    pub fn new(minimum_measurements: u32, min_sampling_period: Time) -> SamplingPolicyConfig {
        SamplingPolicyConfig { minimum_measurements, min_sampling_period }
    }

    pub fn minimum_measurements(&self) -> u32 {
        self.minimum_measurements
    }

    pub fn min_sampling_period(&self) -> Time {
        self.min_sampling_period
    }
}

/// 曲線設定檔，例如：
///
/// ```json
/// { "sampling": { "minimum_measurements": 3, "min_sampling_period": 1000000 } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveConfiguration {
    #[serde(default)]
    sampling: SamplingPolicyConfig
}

impl CurveConfiguration {
    pub fn new(sampling: SamplingPolicyConfig) -> CurveConfiguration {
        CurveConfiguration { sampling }
    }

    pub fn sampling(&self) -> &SamplingPolicyConfig {
        &self.sampling
    }

    pub fn from_json_str(json: &str) -> Result<CurveConfiguration, CurveError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(file_path: &str) -> Result<CurveConfiguration, CurveError> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
