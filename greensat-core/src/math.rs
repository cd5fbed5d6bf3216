//! Rounding helpers shared by the producer and the bridge
//!
//! Uses `libm` so the same code runs without `std` on the microcontroller.

/// Round to a fixed number of decimal places, halves away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = libm::pow(10.0, places as f64);
    libm::round(value * factor) / factor
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}
