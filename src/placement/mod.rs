//! Resource placement strategy.
//!
//! Decides how model weights occupy memory for one invocation. The image
//! pipelines choose between keeping the whole model on the accelerator and
//! staging components through it on demand; the audio pipeline only chooses
//! between accelerator and host. Placement never fails: an accelerator that
//! was asked for but is absent degrades to host execution with a
//! `DEVICE_UNAVAILABLE` warning.

mod probe;
mod residency;

pub use probe::{FixedProbe, HardwareProbe, SystemProbe};
pub use residency::StagedResidency;

use serde::{Deserialize, Serialize};

use crate::config::Device;
use crate::error::SynthError;
use crate::types::GenerationRequest;

/// An accelerator and its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    Cuda(usize),
    Metal(usize),
}

impl Accelerator {
    /// Returns true if this accelerator satisfies an explicit device request.
    pub fn matches(&self, device: Device) -> bool {
        matches!(
            (self, device),
            (Accelerator::Cuda(_), Device::Cuda) | (Accelerator::Metal(_), Device::Metal)
        )
    }
}

impl std::fmt::Display for Accelerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accelerator::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
            Accelerator::Metal(ordinal) => write!(f, "metal:{}", ordinal),
        }
    }
}

/// Where compute runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    Host,
    Accelerator(Accelerator),
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Host => write!(f, "cpu"),
            ComputeDevice::Accelerator(accelerator) => write!(f, "{}", accelerator),
        }
    }
}

/// How model weights occupy memory for one invocation.
///
/// Exactly one plan is active per invocation and it does not change once
/// generation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPlan {
    /// Every component stays resident on one accelerator.
    FullDeviceResidency(Accelerator),
    /// Components live in host memory and visit the compute device one at a time.
    StagedOffload(ComputeDevice),
    /// Everything runs on the host.
    HostOnly,
}

impl PlacementPlan {
    /// Returns the device compute runs on.
    pub fn compute_device(&self) -> ComputeDevice {
        match self {
            PlacementPlan::FullDeviceResidency(accelerator) => ComputeDevice::Accelerator(*accelerator),
            PlacementPlan::StagedOffload(device) => *device,
            PlacementPlan::HostOnly => ComputeDevice::Host,
        }
    }

    pub fn is_staged(&self) -> bool {
        matches!(self, PlacementPlan::StagedOffload(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementPlan::FullDeviceResidency(_) => "full_device_residency",
            PlacementPlan::StagedOffload(_) => "staged_offload",
            PlacementPlan::HostOnly => "host_only",
        }
    }
}

impl std::fmt::Display for PlacementPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.compute_device())
    }
}

/// What the user asked for, per pipeline family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementIntent {
    /// Image pipelines: staged offload unless full residency is requested.
    Offloadable { full_residency: bool },
    /// Audio pipeline: accelerator or host, no offload mode.
    Binary { device: Option<Device> },
}

impl PlacementIntent {
    /// Extracts the placement intent carried by a request.
    pub fn from_request(request: &GenerationRequest) -> Self {
        match request {
            GenerationRequest::Image(r) => PlacementIntent::Offloadable {
                full_residency: r.full_residency,
            },
            GenerationRequest::Edit(r) => PlacementIntent::Offloadable {
                full_residency: r.full_residency,
            },
            GenerationRequest::Audio(r) => PlacementIntent::Binary { device: r.device },
        }
    }
}

/// The selected plan plus any degradation warning.
#[derive(Debug)]
pub struct PlacementDecision {
    pub plan: PlacementPlan,
    /// Set when a requested accelerator was not available.
    pub warning: Option<SynthError>,
}

impl PlacementDecision {
    fn plan(plan: PlacementPlan) -> Self {
        Self { plan, warning: None }
    }

    fn degraded(plan: PlacementPlan, requested: impl Into<String>) -> Self {
        Self {
            plan,
            warning: Some(SynthError::device_unavailable(requested)),
        }
    }
}

/// Selects a placement plan.
///
/// The probe is consulted at most once; an explicit `--device cpu` skips it.
pub fn select_placement(intent: PlacementIntent, probe: &dyn HardwareProbe) -> PlacementDecision {
    let decision = match intent {
        PlacementIntent::Offloadable { full_residency: true } => match probe.accelerator() {
            Some(accelerator) => PlacementDecision::plan(PlacementPlan::FullDeviceResidency(accelerator)),
            None => PlacementDecision::degraded(PlacementPlan::HostOnly, "full residency"),
        },
        PlacementIntent::Offloadable { full_residency: false } => match probe.accelerator() {
            Some(accelerator) => PlacementDecision::plan(PlacementPlan::StagedOffload(
                ComputeDevice::Accelerator(accelerator),
            )),
            None => PlacementDecision::plan(PlacementPlan::StagedOffload(ComputeDevice::Host)),
        },
        PlacementIntent::Binary {
            device: Some(Device::Cpu),
        } => PlacementDecision::plan(PlacementPlan::HostOnly),
        PlacementIntent::Binary {
            device: Some(requested),
        } if requested != Device::Auto => match probe.accelerator() {
            Some(accelerator) if accelerator.matches(requested) => {
                PlacementDecision::plan(PlacementPlan::FullDeviceResidency(accelerator))
            }
            _ => PlacementDecision::degraded(PlacementPlan::HostOnly, requested.as_str()),
        },
        PlacementIntent::Binary { .. } => match probe.accelerator() {
            Some(accelerator) => PlacementDecision::plan(PlacementPlan::FullDeviceResidency(accelerator)),
            None => PlacementDecision::plan(PlacementPlan::HostOnly),
        },
    };

    match &decision.warning {
        Some(warning) => tracing::warn!(plan = %decision.plan, "{}", warning.message),
        None => tracing::info!(plan = %decision.plan, "placement selected"),
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::cell::Cell;

    const CUDA: Option<Accelerator> = Some(Accelerator::Cuda(0));

    struct CountingProbe {
        answer: Option<Accelerator>,
        calls: Cell<usize>,
    }

    impl HardwareProbe for CountingProbe {
        fn accelerator(&self) -> Option<Accelerator> {
            self.calls.set(self.calls.get() + 1);
            self.answer
        }
    }

    fn offload(full_residency: bool) -> PlacementIntent {
        PlacementIntent::Offloadable { full_residency }
    }

    #[test]
    fn default_is_staged_offload() {
        for answer in [CUDA, Some(Accelerator::Metal(0)), None] {
            let decision = select_placement(offload(false), &FixedProbe(answer));
            assert!(decision.plan.is_staged(), "{:?}", answer);
        }
    }

    #[test]
    fn staged_offload_on_host_is_not_a_degradation() {
        let decision = select_placement(offload(false), &FixedProbe(None));
        assert_eq!(decision.plan, PlacementPlan::StagedOffload(ComputeDevice::Host));
        assert!(decision.warning.is_none());
    }

    #[test]
    fn full_residency_is_honored() {
        let decision = select_placement(offload(true), &FixedProbe(CUDA));
        assert_eq!(decision.plan, PlacementPlan::FullDeviceResidency(Accelerator::Cuda(0)));
        assert!(decision.warning.is_none());
    }

    #[test]
    fn full_residency_without_accelerator_degrades() {
        let decision = select_placement(offload(true), &FixedProbe(None));
        assert_eq!(decision.plan, PlacementPlan::HostOnly);
        assert_eq!(decision.warning.unwrap().code, ErrorCode::DeviceUnavailable);
    }

    #[test]
    fn audio_auto_uses_detected_accelerator() {
        let with_gpu = select_placement(PlacementIntent::Binary { device: None }, &FixedProbe(CUDA));
        assert_eq!(with_gpu.plan, PlacementPlan::FullDeviceResidency(Accelerator::Cuda(0)));

        let without = select_placement(PlacementIntent::Binary { device: None }, &FixedProbe(None));
        assert_eq!(without.plan, PlacementPlan::HostOnly);
        assert!(without.warning.is_none());
    }

    #[test]
    fn audio_explicit_cpu_skips_detection() {
        let probe = CountingProbe {
            answer: CUDA,
            calls: Cell::new(0),
        };
        let decision = select_placement(
            PlacementIntent::Binary {
                device: Some(Device::Cpu),
            },
            &probe,
        );
        assert_eq!(decision.plan, PlacementPlan::HostOnly);
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn audio_mismatched_accelerator_degrades() {
        let decision = select_placement(
            PlacementIntent::Binary {
                device: Some(Device::Metal),
            },
            &FixedProbe(CUDA),
        );
        assert_eq!(decision.plan, PlacementPlan::HostOnly);
        assert_eq!(decision.warning.unwrap().code, ErrorCode::DeviceUnavailable);
    }

    #[test]
    fn hardware_queried_once() {
        let probe = CountingProbe {
            answer: None,
            calls: Cell::new(0),
        };
        select_placement(PlacementIntent::Binary { device: Some(Device::Cuda) }, &probe);
        assert_eq!(probe.calls.get(), 1);
    }

    #[test]
    fn plan_display() {
        let plan = PlacementPlan::StagedOffload(ComputeDevice::Accelerator(Accelerator::Cuda(0)));
        assert_eq!(plan.to_string(), "staged_offload (cuda:0)");
        assert_eq!(PlacementPlan::HostOnly.compute_device(), ComputeDevice::Host);
    }
}
