//! Doppler shift helpers. Frequencies in MHz.

use crate::kernel::SPEED_OF_LIGHT_M_S;

/// Doppler shift in Hz of a 100 MHz carrier for a range rate in km/s.
/// Negative when the satellite recedes.
pub fn doppler100(range_rate_km_s: f64) -> f64 {
    -100.0e6 * (range_rate_km_s * 1000.0) / SPEED_OF_LIGHT_M_S
}

/// Frequency to expect on the ground for a satellite transmitting at
/// `freq_mhz`.
pub fn downlink_mhz(freq_mhz: f64, doppler100: f64) -> f64 {
    freq_mhz + 1.0e-8 * doppler100 * freq_mhz
}

/// Frequency to transmit so that the satellite receives `freq_mhz`.
pub fn uplink_mhz(freq_mhz: f64, doppler100: f64) -> f64 {
    freq_mhz - 1.0e-8 * doppler100 * freq_mhz
}
