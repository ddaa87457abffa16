// Rounding and unit conversion shared by daily and monthly aggregation.

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Rounds half-up to `places` decimals. NaN and infinities become 0.0, including
/// values that only overflow once scaled.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let rounded = (value * factor + 0.5).floor() / factor;
    if rounded.is_finite() { rounded } else { 0.0 }
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Bytes to GB (1024^3), rounded to 2 decimals; zero maps to 0.0.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    if bytes == 0 {
        return 0.0;
    }
    round2(bytes as f64 / BYTES_PER_GB)
}
