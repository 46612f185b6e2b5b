//! Hardware capability probing.

use std::path::Path;

use super::Accelerator;

/// Answers whether an accelerator is attached to this host.
pub trait HardwareProbe {
    /// Returns the first usable accelerator, if any.
    fn accelerator(&self) -> Option<Accelerator>;
}

/// Probe backed by the running system.
///
/// NVIDIA GPUs are detected through the kernel driver's device nodes;
/// Apple Silicon is assumed to carry a Metal device.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

const NVIDIA_MARKERS: &[&str] = &["/proc/driver/nvidia/version", "/dev/nvidiactl", "/dev/nvidia0"];

impl HardwareProbe for SystemProbe {
    fn accelerator(&self) -> Option<Accelerator> {
        if NVIDIA_MARKERS.iter().any(|marker| Path::new(marker).exists()) {
            return Some(Accelerator::Cuda(0));
        }
        if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
            return Some(Accelerator::Metal(0));
        }
        None
    }
}

/// Probe with a fixed answer, for hosts where detection must not run.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub Option<Accelerator>);

impl HardwareProbe for FixedProbe {
    fn accelerator(&self) -> Option<Accelerator> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_probe_reports_its_answer() {
        assert_eq!(FixedProbe(None).accelerator(), None);
        assert_eq!(
            FixedProbe(Some(Accelerator::Cuda(1))).accelerator(),
            Some(Accelerator::Cuda(1))
        );
    }

    #[test]
    fn system_probe_does_not_panic() {
        let _ = SystemProbe.accelerator();
    }
}
