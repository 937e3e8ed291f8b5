//! Conversions between bus units and bridge units
//!
//! Brightness and saturation use the bridge's 8-bit wire range, hue its
//! 16-bit range. Color temperature travels as mireds on the wire and as
//! kelvin on the bus. Transitions are tenths of a second on the wire and
//! milliseconds on the bus.

use crate::error::{HueError, Result};
use crate::protocol::NativeColor;
use crate::types::{ColorValue, TransitionMs};

const MIRED_SCALE: f64 = 1_000_000.0;

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn brightness_to_native(brightness: f64) -> u8 {
    (unit_interval(brightness) * f64::from(u8::MAX)).round() as u8
}

pub fn brightness_from_native(bri: u8) -> f64 {
    f64::from(bri) / f64::from(u8::MAX)
}

pub fn hue_to_native(hue: f64) -> u16 {
    (unit_interval(hue) * f64::from(u16::MAX)).round() as u16
}

pub fn hue_from_native(hue: u16) -> f64 {
    f64::from(hue) / f64::from(u16::MAX)
}

pub fn saturation_to_native(saturation: f64) -> u8 {
    (unit_interval(saturation) * f64::from(u8::MAX)).round() as u8
}

pub fn saturation_from_native(sat: u8) -> f64 {
    f64::from(sat) / f64::from(u8::MAX)
}

/// Kelvin to mireds, rounded to the nearest integer
pub fn mired_from_kelvin(kelvin: f64) -> Result<u16> {
    let invalid = HueError::InvalidUnitValue {
        what: "color temperature",
        value: kelvin,
    };
    if !kelvin.is_finite() || kelvin <= 0.0 {
        return Err(invalid);
    }
    let mired = (MIRED_SCALE / kelvin).round();
    if mired < 1.0 || mired > f64::from(u16::MAX) {
        return Err(invalid);
    }
    Ok(mired as u16)
}

/// Mireds to kelvin
pub fn kelvin_from_mired(mired: u16) -> Result<f64> {
    if mired == 0 {
        return Err(HueError::InvalidUnitValue {
            what: "mired",
            value: 0.0,
        });
    }
    Ok(MIRED_SCALE / f64::from(mired))
}

/// Milliseconds to tenths of a second
///
/// Non-positive durations, and durations too long for the wire field,
/// become 0, which the bridge treats as its default speed.
pub fn transition_to_native(transition_ms: TransitionMs) -> u16 {
    if transition_ms <= 0 {
        return 0;
    }
    u16::try_from(transition_ms / 100).unwrap_or(0)
}

pub fn transition_from_native(tenths: u16) -> TransitionMs {
    TransitionMs::from(tenths) * 100
}

fn finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(HueError::InvalidUnitValue { what, value })
    }
}

/// Convert a whole color; non-finite components are rejected, the rest clamped
pub fn color_to_native(color: &ColorValue) -> Result<NativeColor> {
    match *color {
        ColorValue::Hue { hue, saturation } => Ok(NativeColor::HueSat {
            hue: hue_to_native(finite("hue", hue)?),
            sat: saturation_to_native(finite("saturation", saturation)?),
        }),
        ColorValue::Xy { x, y } => Ok(NativeColor::Xy([
            unit_interval(finite("x coordinate", x)?),
            unit_interval(finite("y coordinate", y)?),
        ])),
        ColorValue::Temperature { kelvin } => Ok(NativeColor::Mired(mired_from_kelvin(kelvin)?)),
    }
}

pub fn color_from_native(color: NativeColor) -> Result<ColorValue> {
    match color {
        NativeColor::HueSat { hue, sat } => Ok(ColorValue::Hue {
            hue: hue_from_native(hue),
            saturation: saturation_from_native(sat),
        }),
        NativeColor::Xy([x, y]) => Ok(ColorValue::Xy { x, y }),
        NativeColor::Mired(ct) => Ok(ColorValue::Temperature {
            kelvin: kelvin_from_mired(ct)?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_converges_after_one_round_trip() {
        for step in 0..=1000 {
            let brightness = f64::from(step) / 1000.0;
            let native = brightness_to_native(brightness);
            let again = brightness_to_native(brightness_from_native(native));
            assert_eq!(native, again, "brightness {}", brightness);
        }
    }

    #[test]
    fn brightness_endpoints() {
        assert_eq!(brightness_to_native(0.0), 0);
        assert_eq!(brightness_to_native(1.0), 255);
        assert_eq!(brightness_to_native(0.5), 128);
        assert_eq!(brightness_to_native(1.7), 255);
        assert_eq!(brightness_to_native(-0.3), 0);
        assert_eq!(brightness_to_native(f64::NAN), 0);
        assert_eq!(brightness_from_native(255), 1.0);
    }

    #[test]
    fn hue_uses_sixteen_bits_and_saturation_eight() {
        assert_eq!(hue_to_native(1.0), 65535);
        assert_eq!(hue_to_native(0.5), 32768);
        assert_eq!(saturation_to_native(1.0), 255);
        assert_eq!(saturation_to_native(0.5), 128);
    }

    #[test]
    fn temperature_round_trips_within_one_mired() {
        for kelvin in (1000..=10000).step_by(37) {
            let kelvin = f64::from(kelvin);
            let mired = mired_from_kelvin(kelvin).unwrap();
            let back = kelvin_from_mired(mired).unwrap();
            let mired_again = mired_from_kelvin(back).unwrap();
            assert!(mired.abs_diff(mired_again) <= 1, "kelvin {}", kelvin);
            assert!((MIRED_SCALE / back - MIRED_SCALE / kelvin).abs() <= 1.0);
        }
    }

    #[test]
    fn mired_round_trips_exactly() {
        for mired in [153u16, 250, 366, 454, 500] {
            let kelvin = kelvin_from_mired(mired).unwrap();
            assert_eq!(mired_from_kelvin(kelvin).unwrap(), mired);
        }
    }

    #[test]
    fn zero_temperature_is_invalid_not_a_crash() {
        assert!(matches!(
            mired_from_kelvin(0.0),
            Err(HueError::InvalidUnitValue { .. })
        ));
        assert!(matches!(
            kelvin_from_mired(0),
            Err(HueError::InvalidUnitValue { .. })
        ));
        assert!(mired_from_kelvin(-2700.0).is_err());
        assert!(mired_from_kelvin(f64::INFINITY).is_err());
        assert!(mired_from_kelvin(1.0).is_err());
    }

    #[test]
    fn transition_converts_to_tenths() {
        assert_eq!(transition_to_native(500), 5);
        assert_eq!(transition_to_native(1049), 10);
        assert_eq!(transition_to_native(0), 0);
        assert_eq!(transition_to_native(-400), 0);
        assert_eq!(transition_to_native(6_553_500), 65535);
        assert_eq!(transition_to_native(6_553_600), 0);
        assert_eq!(transition_from_native(5), 500);
    }

    #[test]
    fn color_dispatch_produces_matching_payload() {
        assert_eq!(
            color_to_native(&ColorValue::Hue {
                hue: 0.5,
                saturation: 1.0
            })
            .unwrap(),
            NativeColor::HueSat {
                hue: 32768,
                sat: 255
            }
        );
        assert_eq!(
            color_to_native(&ColorValue::Temperature { kelvin: 2500.0 }).unwrap(),
            NativeColor::Mired(400)
        );
        assert_eq!(
            color_to_native(&ColorValue::Xy { x: 0.3, y: 0.3 }).unwrap(),
            NativeColor::Xy([0.3, 0.3])
        );
        assert!(color_to_native(&ColorValue::Xy {
            x: f64::NAN,
            y: 0.3
        })
        .is_err());
    }

    #[test]
    fn non_finite_hue_or_saturation_is_rejected() {
        assert!(matches!(
            color_to_native(&ColorValue::Hue {
                hue: f64::NAN,
                saturation: 0.5
            }),
            Err(HueError::InvalidUnitValue { what: "hue", .. })
        ));
        assert!(matches!(
            color_to_native(&ColorValue::Hue {
                hue: 0.5,
                saturation: f64::INFINITY
            }),
            Err(HueError::InvalidUnitValue {
                what: "saturation",
                ..
            })
        ));
        // Finite but out of range still clamps
        assert_eq!(
            color_to_native(&ColorValue::Hue {
                hue: 1.5,
                saturation: -1.0
            })
            .unwrap(),
            NativeColor::HueSat { hue: 65535, sat: 0 }
        );
    }

    #[test]
    fn reported_color_converts_back() {
        assert_eq!(
            color_from_native(NativeColor::Mired(250)).unwrap(),
            ColorValue::Temperature { kelvin: 4000.0 }
        );
        assert!(color_from_native(NativeColor::Mired(0)).is_err());
    }
}
