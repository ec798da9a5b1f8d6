use candle_core::Device;
use tracing::{info, warn};

type Opener = fn() -> candle_core::Result<Device>;

/// Accelerators compiled into this build, in preference order.
#[allow(unused_mut)]
fn accelerators() -> Vec<(&'static str, Opener)> {
    let mut openers: Vec<(&'static str, Opener)> = Vec::new();
    #[cfg(feature = "cuda")]
    openers.push(("cuda", || Device::new_cuda(0)));
    #[cfg(feature = "metal")]
    openers.push(("metal", || Device::new_metal(0)));
    openers
}

/// Chooses where the model weights live for the lifetime of the process.
///
/// `FORCE_CPU` wins; otherwise the first accelerator that opens is used and
/// anything that fails to open falls through to CPU.
pub fn select_device(force_cpu: bool) -> Device {
    if force_cpu {
        info!(device = "cpu", "Accelerators disabled by FORCE_CPU");
        return Device::Cpu;
    }

    for (label, open) in accelerators() {
        match open() {
            Ok(device) => return device,
            Err(e) => warn!(device = label, error = %e, "Accelerator unavailable"),
        }
    }
    Device::Cpu
}

pub fn device_label(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else if device.is_metal() {
        "metal"
    } else {
        "cpu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_cpu_skips_accelerators() {
        assert_eq!(device_label(&select_device(true)), "cpu");
    }

    #[cfg(not(any(feature = "cuda", feature = "metal")))]
    #[test]
    fn test_cpu_only_build_has_no_accelerators() {
        assert!(accelerators().is_empty());
        assert_eq!(device_label(&select_device(false)), "cpu");
    }

    #[test]
    fn test_selection_yields_a_known_device() {
        let label = device_label(&select_device(false));
        assert!(["cpu", "cuda", "metal"].contains(&label));
    }
}
