//! Shared parameter validation
//!
//! Cube operations validate their dynamic arguments (labels, sample records,
//! CLI input) against a small constraint set before acting. Failures are
//! always `ValidationError` with the offending parameter name.

use crate::errors::{CubeError, Result};
use serde_json::Value;

/// Allowed JSON type names for a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Constraint set for a single parameter
#[derive(Debug, Clone)]
pub struct ParamSpec<'a> {
    pub name: &'a str,
    pub required: bool,
    pub nullable: bool,
    /// Allowed types for the value (or, with `array`, for its elements);
    /// empty means any type
    pub allowed_types: &'a [ParamType],
    /// Value must be a sequence; element constraints apply per element
    pub array: bool,
    /// Numeric values must be whole numbers
    pub integer: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl<'a> ParamSpec<'a> {
    /// A required, non-nullable parameter of any type
    #[must_use]
    pub const fn required(name: &'a str) -> Self {
        Self {
            name,
            required: true,
            nullable: false,
            allowed_types: &[],
            array: false,
            integer: false,
            min: None,
            max: None,
        }
    }

    /// An optional parameter of any type
    #[must_use]
    pub const fn optional(name: &'a str) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn types(mut self, allowed: &'a [ParamType]) -> Self {
        self.allowed_types = allowed;
        self
    }

    #[must_use]
    pub const fn array(mut self) -> Self {
        self.array = true;
        self
    }

    #[must_use]
    pub const fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    #[must_use]
    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub const fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    fn fail(&self, reason: impl Into<String>) -> CubeError {
        CubeError::ValidationError {
            parameter: self.name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Checks a value against a parameter constraint set.
///
/// # Errors
///
/// Returns `ValidationError` naming the parameter when any constraint fails:
/// a missing required value, an unexpected null, a type outside the allowed
/// set, a non-sequence where one is required, a fractional value where an
/// integer is required, or a number outside the min/max range.
pub fn check_parameter(value: Option<&Value>, spec: &ParamSpec<'_>) -> Result<()> {
    let value = match value {
        None => {
            return if spec.required {
                Err(spec.fail("parameter is required"))
            } else {
                Ok(())
            };
        }
        Some(v) => v,
    };

    if value.is_null() {
        return if spec.nullable {
            Ok(())
        } else {
            Err(spec.fail("parameter must not be null"))
        };
    }

    if spec.array {
        let items = value
            .as_array()
            .ok_or_else(|| spec.fail("parameter must be a sequence"))?;
        for item in items {
            check_scalar(item, spec)?;
        }
        Ok(())
    } else {
        check_scalar(value, spec)
    }
}

fn check_scalar(value: &Value, spec: &ParamSpec<'_>) -> Result<()> {
    if !spec.allowed_types.is_empty() && !spec.allowed_types.iter().any(|t| t.matches(value)) {
        let allowed: Vec<&str> = spec.allowed_types.iter().map(|t| t.as_str()).collect();
        return Err(spec.fail(format!("expected one of: {}", allowed.join(", "))));
    }
    if let Some(n) = value.as_f64() {
        if spec.integer && n.fract() != 0.0 {
            return Err(spec.fail("value must be an integer"));
        }
        if let Some(min) = spec.min {
            if n < min {
                return Err(spec.fail(format!("value must be >= {}", min)));
            }
        }
        if let Some(max) = spec.max {
            if n > max {
                return Err(spec.fail(format!("value must be <= {}", max)));
            }
        }
    } else if spec.integer || spec.min.is_some() || spec.max.is_some() {
        return Err(spec.fail("numeric constraints require a numeric value"));
    }
    Ok(())
}
