use candle_core::Device;

/// Compute device for the embedding model.
///
/// `APP_DEVICE=cpu` forces the CPU. Otherwise Metal is used when the `metal`
/// feature is enabled and a device is present.
pub fn select_device() -> Device {
    if cpu_forced() {
        tracing::info!(device = "cpu", "device forced by APP_DEVICE");
        return Device::Cpu;
    }
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => {
                tracing::info!(device = "metal", "embedding device selected");
                return dev;
            }
            Err(e) => tracing::warn!(error = %e, "metal unavailable, falling back to cpu"),
        }
    }
    tracing::info!(device = "cpu", "embedding device selected");
    Device::Cpu
}

fn cpu_forced() -> bool {
    std::env::var("APP_DEVICE").map(|v| v.eq_ignore_ascii_case("cpu")).unwrap_or(false)
}
