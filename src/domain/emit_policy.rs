// Location emit policy - how fixes are requested and which ones get forwarded
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quality hint handed to the positioning provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestQuality {
    #[default]
    HighAccuracy,
    Balanced,
    LowPower,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("{field} must be {constraint}, got {value}")]
    OutOfRange {
        field: &'static str,
        constraint: &'static str,
        value: f64,
    },
}

/// Raw policy fields. Defaults are the LoRa-friendly preset.
///
/// Request fields are consumed by the positioning provider; emit fields drive
/// the debouncer: emit when `Δd >= emit_min_distance_m` OR
/// `Δt >= emit_max_interval_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitPolicyParams {
    pub request_interval_ms: u64,
    pub request_min_distance_m: f32,
    pub request_quality: RequestQuality,

    pub emit_min_distance_m: f32,
    pub emit_max_interval_ms: u64,

    /// Fixes reporting a worse accuracy than this are dropped outright
    pub emit_max_accuracy_m: f32,

    /// Emit at once when accuracy shrinks to this fraction of the last emitted one
    pub emit_on_accuracy_improvement_factor: f32,
    /// Emit at once when accuracy improves by at least this many meters
    pub emit_on_accuracy_improvement_abs_m: f32,
}

impl Default for EmitPolicyParams {
    fn default() -> Self {
        Self {
            request_interval_ms: 30_000,
            request_min_distance_m: 0.0,
            request_quality: RequestQuality::HighAccuracy,
            emit_min_distance_m: 25.0,
            emit_max_interval_ms: 5 * 60_000,
            emit_max_accuracy_m: 200.0,
            emit_on_accuracy_improvement_factor: 0.5,
            emit_on_accuracy_improvement_abs_m: 50.0,
        }
    }
}

impl EmitPolicyParams {
    /// Frequent, permissive tracking for distress or intentional live tracking.
    pub fn live() -> Self {
        Self {
            request_interval_ms: 10_000,
            emit_min_distance_m: 5.0,
            emit_max_interval_ms: 30_000,
            emit_max_accuracy_m: 300.0,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), PolicyError> {
        check_positive_ms("request_interval_ms", self.request_interval_ms)?;
        check_non_negative("request_min_distance_m", self.request_min_distance_m)?;
        check_non_negative("emit_min_distance_m", self.emit_min_distance_m)?;
        check_positive_ms("emit_max_interval_ms", self.emit_max_interval_ms)?;
        if !(self.emit_max_accuracy_m > 0.0) {
            return Err(out_of_range(
                "emit_max_accuracy_m",
                "> 0",
                self.emit_max_accuracy_m,
            ));
        }
        if !(0.0..=1.0).contains(&self.emit_on_accuracy_improvement_factor) {
            return Err(out_of_range(
                "emit_on_accuracy_improvement_factor",
                "in [0, 1]",
                self.emit_on_accuracy_improvement_factor,
            ));
        }
        check_non_negative(
            "emit_on_accuracy_improvement_abs_m",
            self.emit_on_accuracy_improvement_abs_m,
        )
    }
}

fn out_of_range(field: &'static str, constraint: &'static str, value: f32) -> PolicyError {
    PolicyError::OutOfRange {
        field,
        constraint,
        value: value as f64,
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), PolicyError> {
    // NaN fails this comparison too
    if value >= 0.0 {
        Ok(())
    } else {
        Err(out_of_range(field, ">= 0", value))
    }
}

fn check_positive_ms(field: &'static str, value: u64) -> Result<(), PolicyError> {
    if value > 0 {
        Ok(())
    } else {
        Err(PolicyError::OutOfRange {
            field,
            constraint: "> 0",
            value: value as f64,
        })
    }
}

/// Validated, immutable emit policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LocationEmitPolicy {
    params: EmitPolicyParams,
}

impl LocationEmitPolicy {
    pub fn new(params: EmitPolicyParams) -> Result<Self, PolicyError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn live() -> Self {
        Self {
            params: EmitPolicyParams::live(),
        }
    }

    pub fn params(&self) -> EmitPolicyParams {
        self.params
    }

    pub fn request_interval_ms(&self) -> u64 {
        self.params.request_interval_ms
    }

    pub fn request_min_distance_m(&self) -> f32 {
        self.params.request_min_distance_m
    }

    pub fn request_quality(&self) -> RequestQuality {
        self.params.request_quality
    }

    pub fn emit_min_distance_m(&self) -> f32 {
        self.params.emit_min_distance_m
    }

    pub fn emit_max_interval_ms(&self) -> u64 {
        self.params.emit_max_interval_ms
    }

    pub fn emit_max_accuracy_m(&self) -> f32 {
        self.params.emit_max_accuracy_m
    }

    pub fn emit_on_accuracy_improvement_factor(&self) -> f32 {
        self.params.emit_on_accuracy_improvement_factor
    }

    pub fn emit_on_accuracy_improvement_abs_m(&self) -> f32 {
        self.params.emit_on_accuracy_improvement_abs_m
    }
}

impl Default for LocationEmitPolicy {
    fn default() -> Self {
        Self {
            params: EmitPolicyParams::default(),
        }
    }
}

impl TryFrom<EmitPolicyParams> for LocationEmitPolicy {
    type Error = PolicyError;

    fn try_from(params: EmitPolicyParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}
