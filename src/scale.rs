//! Coordinate spaces and scale conversion
//!
//! Three spaces are involved:
//!
//! - **logical**: what the application sees
//! - **protocol**: surface-local units used by enter/motion and resize requests
//! - **device**: backing buffer pixels
//!
//! The effective (logical to device) scale is stored in 1/120ths, the way
//! `wp_fractional_scale_v1` reports it, so every conversion is exact integer
//! arithmetic. Positions round down so they never overshoot a boundary; sizes
//! round up so they never leave a gap.

use serde::{Deserialize, Serialize};

/// Denominator of the fractional effective scale.
pub const SCALE_DENOMINATOR: u32 = 120;

/// Per-surface scale information. Replaced wholesale when the surface moves
/// to an output with a different scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaleContext {
    /// Logical to device scale, in 1/120ths
    effective_scale_120: u32,
    /// Integer buffer scale of the output
    output_scale: u32,
    /// Skip logical/protocol conversions entirely
    identity_conversions: bool,
}

impl Default for ScaleContext {
    fn default() -> Self {
        Self::from_fraction(SCALE_DENOMINATOR, 1)
    }
}

impl ScaleContext {
    /// Build from a floating point effective scale; it is rounded to 1/120.
    pub fn new(effective_scale: f64, output_scale: u32) -> Self {
        let scaled = (effective_scale * SCALE_DENOMINATOR as f64).round();
        let effective_scale_120 = if scaled.is_finite() && scaled >= 1.0 {
            scaled as u32
        } else {
            SCALE_DENOMINATOR
        };
        Self::from_fraction(effective_scale_120, output_scale)
    }

    pub fn from_fraction(effective_scale_120: u32, output_scale: u32) -> Self {
        Self {
            effective_scale_120: effective_scale_120.max(1),
            output_scale: output_scale.max(1),
            identity_conversions: false,
        }
    }

    /// The output's integer scale used for both logical and device scale.
    pub fn integer(output_scale: u32) -> Self {
        Self::from_fraction(output_scale.max(1) * SCALE_DENOMINATOR, output_scale)
    }

    pub fn with_identity_conversions(self, identity_conversions: bool) -> Self {
        Self {
            identity_conversions,
            ..self
        }
    }

    pub fn effective_scale(&self) -> f64 {
        self.effective_scale_120 as f64 / SCALE_DENOMINATOR as f64
    }

    pub fn effective_scale_120(&self) -> u32 {
        self.effective_scale_120
    }

    pub fn output_scale(&self) -> u32 {
        self.output_scale
    }

    pub fn identity_conversions(&self) -> bool {
        self.identity_conversions
    }

    pub fn transformer(&self) -> CoordinateTransformer {
        CoordinateTransformer::new(*self)
    }
}

/// Stateless conversions for one [`ScaleContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateTransformer {
    ctx: ScaleContext,
}

impl CoordinateTransformer {
    pub fn new(ctx: ScaleContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> ScaleContext {
        self.ctx
    }

    // logical * eff / (out * 120)
    fn logical_to_protocol_ratio(&self) -> (i64, i64) {
        (
            self.ctx.effective_scale_120 as i64,
            self.ctx.output_scale as i64 * SCALE_DENOMINATOR as i64,
        )
    }

    pub fn logical_to_protocol_point(&self, value: i32) -> i32 {
        if self.ctx.identity_conversions {
            return value;
        }
        let (num, den) = self.logical_to_protocol_ratio();
        floor_mul_div(value, num, den)
    }

    pub fn logical_to_protocol_size(&self, value: i32) -> i32 {
        if self.ctx.identity_conversions {
            return value;
        }
        let (num, den) = self.logical_to_protocol_ratio();
        ceil_mul_div(value, num, den)
    }

    pub fn protocol_to_logical_point(&self, value: i32) -> i32 {
        if self.ctx.identity_conversions {
            return value;
        }
        let (den, num) = self.logical_to_protocol_ratio();
        floor_mul_div(value, num, den)
    }

    pub fn protocol_to_logical_size(&self, value: i32) -> i32 {
        if self.ctx.identity_conversions {
            return value;
        }
        let (den, num) = self.logical_to_protocol_ratio();
        ceil_mul_div(value, num, den)
    }

    /// Fractional surface-local position (`wl_fixed`) to a logical point.
    pub fn protocol_to_logical_position(&self, value: f64) -> i32 {
        let logical = if self.ctx.identity_conversions {
            value
        } else {
            let (den, num) = self.logical_to_protocol_ratio();
            value * num as f64 / den as f64
        };
        saturate(logical.floor())
    }

    pub fn protocol_to_device_point(&self, value: i32) -> i32 {
        saturate_i64(value as i64 * self.ctx.output_scale as i64)
    }

    pub fn protocol_to_device_size(&self, value: i32) -> i32 {
        self.protocol_to_device_point(value)
    }

    pub fn device_to_protocol_point(&self, value: i32) -> i32 {
        floor_mul_div(value, 1, self.ctx.output_scale as i64)
    }

    pub fn device_to_protocol_size(&self, value: i32) -> i32 {
        ceil_mul_div(value, 1, self.ctx.output_scale as i64)
    }

    pub fn logical_to_device_point(&self, value: i32) -> i32 {
        if self.ctx.identity_conversions {
            return self.protocol_to_device_point(value);
        }
        floor_mul_div(value, self.ctx.effective_scale_120 as i64, SCALE_DENOMINATOR as i64)
    }

    pub fn logical_to_device_size(&self, value: i32) -> i32 {
        if self.ctx.identity_conversions {
            return self.protocol_to_device_size(value);
        }
        ceil_mul_div(value, self.ctx.effective_scale_120 as i64, SCALE_DENOMINATOR as i64)
    }

    pub fn device_to_logical_point(&self, value: i32) -> i32 {
        if self.ctx.identity_conversions {
            return self.device_to_protocol_point(value);
        }
        floor_mul_div(value, SCALE_DENOMINATOR as i64, self.ctx.effective_scale_120 as i64)
    }

    pub fn device_to_logical_size(&self, value: i32) -> i32 {
        if self.ctx.identity_conversions {
            return self.device_to_protocol_size(value);
        }
        ceil_mul_div(value, SCALE_DENOMINATOR as i64, self.ctx.effective_scale_120 as i64)
    }
}

fn floor_mul_div(value: i32, num: i64, den: i64) -> i32 {
    saturate_i64((value as i64 * num).div_euclid(den))
}

fn ceil_mul_div(value: i32, num: i64, den: i64) -> i32 {
    saturate_i64(-((-(value as i64 * num)).div_euclid(den)))
}

fn saturate_i64(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn saturate(value: f64) -> i32 {
    if value.is_nan() {
        0
    } else {
        value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Logical units at 1x on a 2x output: protocol units are half-size.
    fn half() -> CoordinateTransformer {
        ScaleContext::from_fraction(SCALE_DENOMINATOR, 2).transformer()
    }

    #[test]
    fn test_size_round_trip_never_shrinks() {
        let t = half();
        let protocol = t.logical_to_protocol_size(11);
        assert_eq!(protocol, 6);
        assert!(t.protocol_to_logical_size(protocol) >= 11);
    }

    #[test]
    fn test_position_round_trip_never_overshoots() {
        let t = half();
        let protocol = t.logical_to_protocol_point(11);
        assert_eq!(protocol, 5);
        let back = t.protocol_to_logical_point(protocol);
        assert!(back <= 11);
        assert_eq!(t.logical_to_protocol_point(back), protocol);
    }

    #[test]
    fn test_negative_points_floor() {
        let t = half();
        assert_eq!(t.logical_to_protocol_point(-1), -1);
        assert_eq!(t.logical_to_protocol_size(-1), 0);
    }

    #[test]
    fn test_fractional_scale_device_sizes() {
        let t = ScaleContext::new(1.25, 2).transformer();
        assert_eq!(t.context().effective_scale_120(), 150);
        assert_eq!(t.logical_to_device_size(10), 13);
        assert_eq!(t.logical_to_device_point(10), 12);
        assert_eq!(t.device_to_logical_point(13), 10);
        assert_eq!(t.device_to_logical_size(13), 11);
    }

    #[test]
    fn test_identity_skips_logical_protocol_scaling() {
        let ctx = ScaleContext::from_fraction(3 * SCALE_DENOMINATOR, 2).with_identity_conversions(true);
        let t = ctx.transformer();
        assert_eq!(t.logical_to_protocol_point(7), 7);
        assert_eq!(t.protocol_to_logical_size(7), 7);
        assert_eq!(t.protocol_to_logical_position(7.9), 7);
        // Device space is still real pixels.
        assert_eq!(t.logical_to_device_size(7), 14);
    }

    #[test]
    fn test_position_from_fixed_point() {
        let t = ScaleContext::integer(2).transformer();
        // Integer scale: logical and protocol coincide.
        assert_eq!(t.protocol_to_logical_position(12.75), 12);
        assert_eq!(t.protocol_to_logical_position(-0.5), -1);
        assert_eq!(half().protocol_to_logical_position(5.5), 11);
    }

    #[test]
    fn test_invalid_scale_falls_back_to_one() {
        let ctx = ScaleContext::new(f64::NAN, 0);
        assert_eq!(ctx.effective_scale_120(), SCALE_DENOMINATOR);
        assert_eq!(ctx.output_scale(), 1);
    }

    #[test]
    fn test_device_protocol_conversions() {
        let t = ScaleContext::integer(2).transformer();
        assert_eq!(t.protocol_to_device_size(5), 10);
        assert_eq!(t.device_to_protocol_point(11), 5);
        assert_eq!(t.device_to_protocol_size(11), 6);
    }
}
