//! Component residency tracking for staged offload.
//!
//! Engines run each sub-model (text encoder, denoiser, decoder, ...) through
//! a [`StagedResidency`]. Under staged offload a component is moved onto the
//! compute device when it is needed and every other resident component is
//! evicted first, so at most one component occupies device memory at a time.

use super::{ComputeDevice, PlacementPlan};

/// Tracks which named components are on the compute device.
#[derive(Debug, Clone)]
pub struct StagedResidency {
    plan: PlacementPlan,
    components: Vec<String>,
    resident: Vec<String>,
    transfers: usize,
}

impl StagedResidency {
    /// Creates a tracker for the given components under `plan`.
    ///
    /// Full residency moves every component onto the accelerator up front.
    pub fn new(plan: PlacementPlan, components: &[&str]) -> Self {
        let components: Vec<String> = components.iter().map(|c| c.to_string()).collect();
        let (resident, transfers) = match plan {
            PlacementPlan::FullDeviceResidency(_) => (components.clone(), components.len()),
            _ => (Vec::new(), 0),
        };
        if !resident.is_empty() {
            tracing::debug!(count = resident.len(), device = %plan.compute_device(), "components resident");
        }
        Self {
            plan,
            components,
            resident,
            transfers,
        }
    }

    /// Runs `compute` with `component` available on the compute device.
    pub fn run<T, F>(&mut self, component: &str, compute: F) -> T
    where
        F: FnOnce(ComputeDevice) -> T,
    {
        debug_assert!(
            self.components.iter().any(|c| c == component),
            "unknown component {}",
            component
        );

        if let PlacementPlan::StagedOffload(device) = self.plan {
            if !self.is_resident(component) {
                for evicted in self.resident.drain(..) {
                    tracing::debug!(component = %evicted, "evicted to host");
                }
                tracing::debug!(component, %device, "onloaded");
                self.resident.push(component.to_string());
                self.transfers += 1;
            }
        }

        compute(self.plan.compute_device())
    }

    /// Moves everything back to host memory.
    pub fn release_all(&mut self) {
        if self.plan.is_staged() && !self.resident.is_empty() {
            tracing::debug!(count = self.resident.len(), "releasing staged components");
            self.resident.clear();
        }
    }

    pub fn is_resident(&self, component: &str) -> bool {
        self.resident.iter().any(|c| c == component)
    }

    /// Components currently on the compute device.
    pub fn resident(&self) -> &[String] {
        &self.resident
    }

    /// Number of host-to-device moves so far.
    pub fn transfers(&self) -> usize {
        self.transfers
    }
}
