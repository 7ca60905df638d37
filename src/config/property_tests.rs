//! Property-based tests for configuration module
//!
//! These tests use proptest to generate random configurations and verify
//! invariants, serialization round-trips, and validation bounds.

use super::*;
use proptest::prelude::*;

// Strategy for generating valid click configurations
prop_compose! {
    fn valid_click_config()(
        multi_click_time_ms in 1u32..=5000,
        drag_threshold_px in 0u32..=1000,
        click_position_tolerance_px in 0u32..50,
    ) -> ClickConfig {
        ClickConfig {
            multi_click_time_ms,
            drag_threshold_px,
            click_position_tolerance_px,
        }
    }
}

fn keyboard_modifier() -> impl Strategy<Value = Modifiers> {
    prop_oneof![
        Just(Modifiers::empty()),
        Just(Modifiers::SHIFT),
        Just(Modifiers::CTRL),
        Just(Modifiers::ALT),
        Just(Modifiers::SHIFT | Modifiers::META),
    ]
}

// Strategy for generating valid wheel configurations
prop_compose! {
    fn valid_wheel_config()(
        vector_rotation_factor in 0.01f64..10.0,
        notch_scroll_amount in 1u32..20,
        vector_scroll_amount in 1u32..20,
        notches_per_rotation in 1i32..480,
        horizontal_scroll_modifier in keyboard_modifier(),
    ) -> WheelConfig {
        WheelConfig {
            vector_rotation_factor,
            notch_scroll_amount,
            vector_scroll_amount,
            notches_per_rotation,
            horizontal_scroll_modifier,
        }
    }
}

// Strategy for generating full valid configurations
prop_compose! {
    fn valid_normalizer_config()(
        click in valid_click_config(),
        wheel in valid_wheel_config(),
        identity_conversions in any::<bool>(),
        idle_timeout_ms in 1u64..1000,
        debug in any::<bool>(),
    ) -> NormalizerConfig {
        NormalizerConfig {
            click,
            wheel,
            scale: ScaleConfig { identity_conversions },
            dispatch: DispatchConfig { idle_timeout_ms },
            general: GeneralConfig { debug },
        }
    }
}

proptest! {
    /// Test that all valid configurations pass validation
    #[test]
    fn test_valid_configs_validate(config in valid_normalizer_config()) {
        prop_assert!(config.validate().is_ok());
    }

    /// Test TOML serialization round-trip preserves data
    #[test]
    fn test_config_toml_roundtrip(config in valid_normalizer_config()) {
        let toml_str = toml::to_string(&config)?;
        let parsed: NormalizerConfig = toml::from_str(&toml_str)?;

        prop_assert_eq!(&config.click, &parsed.click);
        prop_assert_eq!(config.wheel.horizontal_scroll_modifier, parsed.wheel.horizontal_scroll_modifier);
        prop_assert_eq!(config.wheel.notches_per_rotation, parsed.wheel.notches_per_rotation);
        prop_assert_eq!(&config.dispatch, &parsed.dispatch);

        // Floating point values compared with tolerance
        prop_assert!((config.wheel.vector_rotation_factor - parsed.wheel.vector_rotation_factor).abs() < 1e-9);
    }

    /// Multi-click window bounds
    #[test]
    fn test_multi_click_time_bounds(time in 0u32..20_000) {
        let mut config = NormalizerConfig::default();
        config.click.multi_click_time_ms = time;

        let result = config.validate();
        if time >= 1 && time <= 5000 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Rotation factor must be positive and finite
    #[test]
    fn test_rotation_factor_bounds(factor in -5.0f64..5.0) {
        let mut config = NormalizerConfig::default();
        config.wheel.vector_rotation_factor = factor;

        let result = config.validate();
        if factor > 0.0 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Merging a default partial never changes anything
    #[test]
    fn test_merge_default_is_identity(config in valid_normalizer_config()) {
        let merged = config.clone().merge_partial(NormalizerConfig::default());
        prop_assert_eq!(merged, config);
    }
}
