//! Shared numeric normalization for the whole engine.
//!
//! Every derived quantity passes through one of the rounding helpers here
//! immediately after the arithmetic step that produced it, so repeated
//! recomputation over the same plan is idempotent. Rounding is half-up at a
//! fixed decimal, away from zero for negative values.
//!
//! This module also owns the clock-speed power curve. Per-building power
//! draw scales super-linearly with clock speed:
//!
//! ```text
//! power = base * (clock / 100) ^ 1.321928
//! ```
//!
//! Applied to a fractional building count, whole buildings cost linearly and
//! the fractional remainder is treated as one building running at a partial
//! clock.

/// Exponent of the clock-speed power curve.
pub const CLOCK_EXPONENT: f64 = 1.321928;

/// Lowest legal overclock percentage.
pub const CLOCK_MIN: f64 = 1.0;

/// Highest legal overclock percentage.
pub const CLOCK_MAX: f64 = 250.0;

/// Tolerance between an item's aggregate building requirement and the summed
/// effective count of its building groups before the item is flagged.
pub const GROUP_TOLERANCE: f64 = 0.1;

/// Slack used when testing float remainders against zero.
const REMAINDER_EPSILON: f64 = 1e-9;

/// Round half-up at `decimals` fractional digits. Negative values round away
/// from zero, so `round_to(-2.5, 0) == -3.0`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let scaled = value.abs() * factor;
    // Nudge by one ulp-scale epsilon so values like 2.675 (stored just below
    // the exact decimal) still round up as written.
    let rounded = (scaled + 0.5 + f64::EPSILON * scaled).floor() / factor;
    rounded.copysign(value)
}

/// General display precision: 3 decimals.
pub fn round3(value: f64) -> f64 {
    round_to(value, 3)
}

/// Power amounts round-trip at 1 decimal.
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

/// Overclock percentages carry up to 4 fractional digits.
pub fn round4(value: f64) -> f64 {
    round_to(value, 4)
}

/// Multiplier applied to a base power draw for a fractional building count:
/// whole buildings are linear, the fractional building pays the clock curve.
pub fn power_curve(building_count: f64) -> f64 {
    if building_count <= 0.0 || !building_count.is_finite() {
        return 0.0;
    }
    let whole = building_count.floor();
    let frac = building_count - whole;
    if frac < REMAINDER_EPSILON {
        whole
    } else {
        whole + frac.powf(CLOCK_EXPONENT)
    }
}

/// Inverse of [`power_curve`]: recovers the building count that produces the
/// given multiplier. Round-trips with `power_curve` to display precision.
pub fn power_curve_inverse(multiplier: f64) -> f64 {
    if multiplier <= 0.0 || !multiplier.is_finite() {
        return 0.0;
    }
    let whole = multiplier.floor();
    let frac = multiplier - whole;
    if frac < REMAINDER_EPSILON {
        whole
    } else {
        whole + frac.powf(1.0 / CLOCK_EXPONENT)
    }
}

/// `target mod divisor` with an epsilon snap to zero, so whole-number splits
/// like `6 mod 2` classify as exact even after float accumulation.
pub fn mod_remainder(target: f64, divisor: f64) -> f64 {
    if divisor <= 0.0 {
        return 0.0;
    }
    let rem = target - divisor * (target / divisor).floor();
    if rem.abs() < REMAINDER_EPSILON || (divisor - rem).abs() < REMAINDER_EPSILON {
        0.0
    } else {
        rem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Half-up semantics are pinned: these exact cases must not drift.
    // -----------------------------------------------------------------------
    #[test]
    fn round_half_up_at_three_decimals() {
        assert_eq!(round3(1.0005), 1.001);
        assert_eq!(round3(1.0004), 1.0);
        assert_eq!(round3(2.6665), 2.667);
        assert_eq!(round3(0.1234), 0.123);
    }

    #[test]
    fn round_half_up_negative_rounds_away_from_zero() {
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round3(-1.0005), -1.001);
        assert_eq!(round3(-1.0004), -1.0);
    }

    #[test]
    fn round_one_decimal_for_power() {
        assert_eq!(round1(74.96), 75.0);
        assert_eq!(round1(74.94), 74.9);
    }

    #[test]
    fn round_four_decimals_for_clocks() {
        assert_eq!(round4(83.33333), 83.3333);
        assert_eq!(round4(99.31818), 99.3182);
    }

    #[test]
    fn round_is_idempotent() {
        for v in [0.0005, 1.2345, 99.31818, 131.1, 250.0] {
            let once = round4(v);
            assert_eq!(round4(once), once);
        }
    }

    #[test]
    fn round_passes_non_finite_through() {
        assert!(round3(f64::NAN).is_nan());
        assert_eq!(round3(f64::INFINITY), f64::INFINITY);
    }

    // -----------------------------------------------------------------------
    // Power curve
    // -----------------------------------------------------------------------
    #[test]
    fn whole_building_counts_cost_linearly() {
        assert_eq!(power_curve(8.0), 8.0);
        assert_eq!(power_curve(1.0), 1.0);
        assert_eq!(power_curve(0.0), 0.0);
    }

    #[test]
    fn fractional_building_pays_the_curve() {
        // 1.92 buildings: one whole plus 0.92^1.321928.
        let expected = 1.0 + 0.92f64.powf(CLOCK_EXPONENT);
        assert!((power_curve(1.92) - expected).abs() < 1e-12);
        // The fractional building costs less than a linear share.
        assert!(power_curve(1.92) < 1.92);
    }

    #[test]
    fn power_curve_inverse_round_trips() {
        for count in [0.5, 1.0, 1.92, 3.25, 131.1] {
            let m = power_curve(count);
            assert!(
                (power_curve_inverse(m) - count).abs() < 1e-9,
                "round trip failed for {count}"
            );
        }
    }

    #[test]
    fn power_curve_rejects_garbage() {
        assert_eq!(power_curve(-1.0), 0.0);
        assert_eq!(power_curve(f64::NAN), 0.0);
        assert_eq!(power_curve_inverse(-1.0), 0.0);
    }

    // -----------------------------------------------------------------------
    // Remainder classification
    // -----------------------------------------------------------------------
    #[test]
    fn whole_splits_have_zero_remainder() {
        assert_eq!(mod_remainder(6.0, 2.0), 0.0);
        assert_eq!(mod_remainder(9.0, 3.0), 0.0);
        // Accumulated float error must still snap to zero.
        assert_eq!(mod_remainder(0.1 + 0.2, 0.3), 0.0);
    }

    #[test]
    fn fractional_splits_report_their_remainder() {
        assert_eq!(mod_remainder(5.0, 2.0), 1.0);
        assert!((mod_remainder(131.1, 1.0) - 0.1).abs() < 1e-9);
    }
}
