//! Name-based guesses for catalog entries that have no declared metadata.
//!
//! The guesses only fill in display hints; they never change stored values.

use crate::catalog::SignalType;

const BOOL_HINTS: &[&str] = &["pressed", "active", "valid", "enabled", "detected", "bool"];
const INT_HINTS: &[&str] = &["type", "state", "mode", "index", "count", "id", "frame"];

pub fn infer_type(signal_name: &str) -> SignalType {
    let leaf = leaf_name(signal_name).to_ascii_lowercase();
    if BOOL_HINTS.iter().any(|h| leaf.contains(h)) {
        SignalType::Bool
    } else if INT_HINTS.iter().any(|h| leaf.contains(h)) {
        SignalType::Int
    } else {
        SignalType::Float
    }
}

pub fn infer_unit(signal_name: &str) -> &'static str {
    let name = leaf_name(signal_name).to_ascii_lowercase();
    let has = |s: &str| name.contains(s);

    if has("speed") || has("velocity") {
        "m/s"
    } else if has("accel") {
        "m/s^2"
    } else if has("rate") && (has("deg") || has("yaw") || has("pitch")) {
        "deg/s"
    } else if has("angle") && has("deg") {
        "deg"
    } else if has("distance") || has("drel") {
        "m"
    } else if has("torque") {
        "Nm"
    } else if has("temp") {
        "degC"
    } else if has("percent") {
        "%"
    } else if has("voltage") {
        "V"
    } else if has("current") {
        "A"
    } else if has("rpm") {
        "rpm"
    } else if has("time") && (has("ms") || has("milli")) {
        "ms"
    } else if has("time") {
        "s"
    } else {
        ""
    }
}

/// Last dotted component of a signal path, e.g. `vEgo` for `carState.vEgo`.
pub fn leaf_name(signal_name: &str) -> &str {
    signal_name.rsplit('.').next().unwrap_or(signal_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_from_name() {
        assert_eq!(infer_type("carState.brakePressed"), SignalType::Bool);
        assert_eq!(infer_type("carState.cruiseState.enabled"), SignalType::Bool);
        assert_eq!(infer_type("controlsState.state"), SignalType::Int);
        assert_eq!(infer_type("roadEncodeIdx.frameId"), SignalType::Int);
        assert_eq!(infer_type("carState.vEgo"), SignalType::Float);
    }

    #[test]
    fn only_leaf_is_considered() {
        // `carState` contains "state" but the leaf does not
        assert_eq!(infer_type("carState.steeringTorque"), SignalType::Float);
    }

    #[test]
    fn units_from_name() {
        assert_eq!(infer_unit("carState.vEgo"), "");
        assert_eq!(infer_unit("carState.wheelSpeed"), "m/s");
        assert_eq!(infer_unit("carState.aEgoAccel"), "m/s^2");
        assert_eq!(infer_unit("carState.steeringAngleDeg"), "deg");
        assert_eq!(infer_unit("carState.steeringRateDeg"), "deg/s");
        assert_eq!(infer_unit("radarState.leadOne.dRel"), "m");
        assert_eq!(infer_unit("carState.steeringTorque"), "Nm");
        assert_eq!(infer_unit("deviceState.cpuTempC"), "degC");
        assert_eq!(infer_unit("deviceState.batteryPercent"), "%");
        assert_eq!(infer_unit("peripheralState.voltage"), "V");
        assert_eq!(infer_unit("peripheralState.current"), "A");
        assert_eq!(infer_unit("carState.engineRpm"), "rpm");
        assert_eq!(infer_unit("modelV2.frameDropPerc"), "");
        assert_eq!(infer_unit("modelV2.executionTimeMs"), "ms");
        assert_eq!(infer_unit("modelV2.gpuExecutionTime"), "s");
    }
}
