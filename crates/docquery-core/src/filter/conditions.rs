//! Condition operator keys written into condition maps

pub const NOT_EQUAL: &str = "$ne";
pub const IN: &str = "$in";
pub const NOT_IN: &str = "$nin";
pub const ALL: &str = "$all";
pub const GREATER_THAN: &str = "$gt";
pub const GREATER_THAN_OR_EQUAL: &str = "$gte";
pub const LESS_THAN: &str = "$lt";
pub const LESS_THAN_OR_EQUAL: &str = "$lte";
pub const EXISTS: &str = "$exists";
pub const MOD: &str = "$mod";
pub const REGEX: &str = "$regex";
pub const OPTIONS: &str = "$options";
pub const NEAR_SPHERE: &str = "$nearSphere";
pub const MAX_DISTANCE: &str = "$maxDistance";
pub const WITHIN: &str = "$within";
pub const BOX: &str = "$box";
pub const POLYGON: &str = "$polygon";
pub const SIZE: &str = "$size";

/// Conditions that cannot be evaluated against a local copy of the data.
pub const OFFLINE_UNSUPPORTED: &[&str] = &[NEAR_SPHERE];
