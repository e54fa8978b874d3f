//! Table-driven sine & cosine
//!
//! Lookups trade roughly 0.18° of precision (half a table step) for speed. The table size and
//! rounding are part of the contract: animations driven through these functions must produce the
//! same values on every platform.

use std::{f32::consts::TAU, sync::LazyLock};

/// Number of entries covering one full turn
pub const TABLE_SIZE: usize = 2048;

const MASK: i32 = TABLE_SIZE as i32 - 1;
const QUARTER_TURN: i32 = TABLE_SIZE as i32 / 4;
const INDEX_PER_RADIAN: f32 = TABLE_SIZE as f32 / TAU;

static SIN_TABLE: LazyLock<[f32; TABLE_SIZE]> = LazyLock::new(|| {
    let mut table = [0.0; TABLE_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = (i as f32 * TAU / TABLE_SIZE as f32).sin();
    }
    table
});

/// Table slot for `angle`, already wrapped into `0..TABLE_SIZE`
///
/// The float to int cast saturates (NaN maps to 0), so any input yields a valid slot.
#[inline]
fn table_index(angle: f32) -> i32 {
    (angle * INDEX_PER_RADIAN).round() as i32 & MASK
}

/// Approximate `angle.sin()` (radians)
#[inline]
pub fn fast_sin(angle: f32) -> f32 {
    SIN_TABLE[table_index(angle) as usize]
}

/// Approximate `angle.cos()` (radians)
#[inline]
pub fn fast_cos(angle: f32) -> f32 {
    SIN_TABLE[((table_index(angle) + QUARTER_TURN) & MASK) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn cardinal_angles_are_exact_entries() {
        assert_eq!(fast_sin(0.0), 0.0);
        assert!((fast_sin(FRAC_PI_2) - 1.0).abs() < 1e-6);
        assert!((fast_cos(0.0) - 1.0).abs() < 1e-6);
        assert!(fast_cos(FRAC_PI_2).abs() < 1e-6);
        assert!((fast_cos(PI) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn negative_and_wrapped_angles() {
        assert!((fast_sin(-FRAC_PI_2) + 1.0).abs() < 1e-6);
        assert!((fast_sin(5.0 * PI + FRAC_PI_2) + 1.0).abs() < 1e-5);
    }

    #[test]
    fn huge_angles_stay_in_range() {
        for angle in [1.0e7, -1.0e7, 3.0e9, f32::MAX, f32::MIN, f32::INFINITY, f32::NAN] {
            let (sin, cos) = (fast_sin(angle), fast_cos(angle));
            assert!((-1.0..=1.0).contains(&sin), "sin({angle})");
            assert!((-1.0..=1.0).contains(&cos), "cos({angle})");
        }
        // saturated index i32::MAX lands on the last slot, cos wraps to slot 511
        assert_eq!(fast_cos(f32::MAX), SIN_TABLE[511]);
    }

    #[test]
    fn error_stays_within_half_a_step() {
        // half a table step is PI / 2048 radians, sin' <= 1
        let tolerance = PI / TABLE_SIZE as f32 + 1e-6;
        let mut angle = -10.0_f32;
        while angle < 10.0 {
            assert!((fast_sin(angle) - angle.sin()).abs() <= tolerance, "sin({angle})");
            assert!((fast_cos(angle) - angle.cos()).abs() <= tolerance, "cos({angle})");
            angle += 0.0137;
        }
    }
}
