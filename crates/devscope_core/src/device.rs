//! Input Device Enumeration
//!
//! The analyzer only ever captures, so output devices are not listed.

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Sample rates probed against each device's supported ranges
const COMMON_RATES: [u32; 6] = [44100, 48000, 88200, 96000, 176400, 192000];

/// A capture device as presented to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDevice {
    /// Unique identifier for this device
    pub id: String,

    /// Human-readable device name
    pub name: String,

    /// Whether this is the system default input
    pub is_default: bool,

    /// Supported common sample rates (may be empty if querying failed)
    pub sample_rates: Vec<u32>,

    /// Maximum supported channels
    pub max_channels: u16,

    /// Sample rate a session on this device will run at
    pub default_sample_rate: Option<u32>,
}

impl InputDevice {
    /// Enumerate all capture devices on the default host
    pub fn enumerate() -> EngineResult<Vec<InputDevice>> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices: Vec<InputDevice> = host
            .input_devices()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?
            .filter_map(|device| Self::from_cpal_device(&device, default_name.as_deref()).ok())
            .collect();

        if devices.is_empty() {
            return Err(EngineError::NoDevicesFound);
        }

        Ok(devices)
    }

    /// Get the default input device
    pub fn default_input() -> EngineResult<InputDevice> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(EngineError::NoDevicesFound)?;

        Self::from_cpal_device(&device, None).map(|mut d| {
            d.is_default = true;
            d
        })
    }

    /// Resolve a device by name, or the system default when `name` is `None`
    pub fn find(name: Option<&str>) -> EngineResult<cpal::Device> {
        let host = cpal::default_host();

        let Some(name) = name else {
            return host.default_input_device().ok_or(EngineError::NoDevicesFound);
        };

        host.input_devices()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(name.to_string()))
    }

    fn from_cpal_device(device: &cpal::Device, default_name: Option<&str>) -> EngineResult<Self> {
        let name = device
            .name()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?;

        // CPAL has no stable device IDs, the name doubles as one
        let id = name.clone();
        let is_default = default_name.map(|d| d == name).unwrap_or(false);

        let (sample_rates, max_channels) = match device.supported_input_configs() {
            Ok(configs) => extract_config_info(configs.map(|c| {
                (c.min_sample_rate().0, c.max_sample_rate().0, c.channels())
            })),
            Err(_) => (vec![], 0),
        };

        let default_sample_rate = device
            .default_input_config()
            .ok()
            .map(|c| c.sample_rate().0);

        Ok(InputDevice {
            id,
            name,
            is_default,
            sample_rates,
            max_channels,
            default_sample_rate,
        })
    }
}

/// Collapse `(min_rate, max_rate, channels)` ranges into supported common
/// rates and the channel maximum
fn extract_config_info(ranges: impl Iterator<Item = (u32, u32, u16)>) -> (Vec<u32>, u16) {
    let mut sample_rates = Vec::new();
    let mut max_channels = 0u16;

    for (min, max, channels) in ranges {
        max_channels = max_channels.max(channels);

        for &rate in &COMMON_RATES {
            if rate >= min && rate <= max && !sample_rates.contains(&rate) {
                sample_rates.push(rate);
            }
        }
    }

    sample_rates.sort_unstable();
    (sample_rates, max_channels)
}
