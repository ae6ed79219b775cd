//! Helpers for reading typed configuration overrides out of a JSON object.
//!
//! Each helper takes a JSON value, a key name, and a default. If the key is
//! missing or holds the wrong type, the default is returned.

use glam::DVec2;
use serde_json::Value;

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
///
/// JSON integers are accepted and converted.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts a `usize` from `params[name]`, returning `default` if missing or wrong type.
///
/// Only non-negative integers are accepted.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Extracts an optional `u64` from `params[name]`.
///
/// A missing key keeps `default`; an explicit `null` clears it.
pub fn param_opt_u64(params: &Value, name: &str, default: Option<u64>) -> Option<u64> {
    match params.get(name) {
        Some(Value::Null) => None,
        Some(v) => v.as_u64().or(default),
        None => default,
    }
}

/// Extracts a 2D point from `params[name]` written as `[x, y]`.
///
/// Anything other than a two-element numeric array yields `default`.
pub fn param_point(params: &Value, name: &str, default: DVec2) -> DVec2 {
    match params.get(name).and_then(Value::as_array).map(Vec::as_slice) {
        Some([x, y]) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => DVec2::new(x, y),
            _ => default,
        },
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- param_f64 --

    #[test]
    fn param_f64_extracts_existing_float() {
        let params = json!({"max_speed": 2.5});
        assert!((param_f64(&params, "max_speed", 1.0) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_extracts_integer_as_float() {
        let params = json!({"energy_capacity": 500});
        assert!((param_f64(&params, "energy_capacity", 0.0) - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_returns_default_when_wrong_type() {
        let params = json!({"max_speed": "fast"});
        assert!((param_f64(&params, "max_speed", 1.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_returns_default_for_non_object() {
        let params = json!("not an object");
        assert!((param_f64(&params, "max_speed", 7.0) - 7.0).abs() < f64::EPSILON);
    }

    // -- param_usize --

    #[test]
    fn param_usize_extracts_existing_integer() {
        let params = json!({"resolution": 64});
        assert_eq!(param_usize(&params, "resolution", 0), 64);
    }

    #[test]
    fn param_usize_returns_default_for_negative_or_float() {
        assert_eq!(param_usize(&json!({"resolution": -1}), "resolution", 5), 5);
        assert_eq!(param_usize(&json!({"resolution": 2.5}), "resolution", 9), 9);
    }

    // -- param_opt_u64 --

    #[test]
    fn param_opt_u64_reads_value_and_null() {
        assert_eq!(param_opt_u64(&json!({"seed": 42}), "seed", None), Some(42));
        assert_eq!(param_opt_u64(&json!({"seed": null}), "seed", Some(1)), None);
        assert_eq!(param_opt_u64(&json!({}), "seed", Some(1)), Some(1));
        assert_eq!(param_opt_u64(&json!({"seed": "x"}), "seed", Some(3)), Some(3));
    }

    // -- param_point --

    #[test]
    fn param_point_reads_pair() {
        let params = json!({"start": [12.5, 30]});
        let p = param_point(&params, "start", DVec2::ZERO);
        assert_eq!(p, DVec2::new(12.5, 30.0));
    }

    #[test]
    fn param_point_rejects_wrong_shapes() {
        let d = DVec2::new(1.0, 2.0);
        assert_eq!(param_point(&json!({"start": [1.0]}), "start", d), d);
        assert_eq!(param_point(&json!({"start": [1.0, 2.0, 3.0]}), "start", d), d);
        assert_eq!(param_point(&json!({"start": ["a", 2.0]}), "start", d), d);
        assert_eq!(param_point(&json!({"start": {"x": 1}}), "start", d), d);
    }
}
