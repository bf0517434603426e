use serde::{Deserialize, Serialize};

use crate::acquisition::AcquisitionConfig;
use crate::flatfield::FlatFieldConfig;
use crate::mixins::FollowConfig;
use crate::pipeline::PipelineConfig;
use crate::safety::SafetyConfig;
use crate::scheduler::SchedulerConfig;

/// Root configuration for one orchestrator process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The instrument section is the only one without defaults; an
    /// orchestrator must know which instrument it drives.
    pub instrument: InstrumentConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub flatfield: FlatFieldConfig,

    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub follow: FollowConfig,
}

/// Identity of the instrument this process drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Instrument name as known to the portal; also prefixes the device
    /// gate names.
    pub name: String,
}
