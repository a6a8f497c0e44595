//! Field-level marshaling: how one declared field reads raw JSON and how it
//! flattens back into a JSON-safe value.

use core::fmt::Display;
use core::str::FromStr;

use chrono::FixedOffset;
use serde_json::{Number, Value};

use crate::error::{MarshalError, MarshalResult};

/// ISO-8601 rendering used for native instant fields (`+0200` style offset).
pub const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Static metadata for one declared entity field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    /// JSON key of the field (also the name used by dynamic accessors).
    pub name: &'static str,
    /// Read-only fields are populated from input but never encoded.
    pub read_only: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, read_only: bool) -> Self {
        Self { name, read_only }
    }
}

/// A value that can live in an entity field.
///
/// `assign` replaces the current value from raw input (nested entities,
/// collections and date adapters build a fresh instance and populate it).
/// `flatten` produces the JSON-safe form used by encode; an unset value
/// flattens to `Value::Null`.
pub trait Field {
    fn assign(&mut self, raw: &Value) -> MarshalResult<()>;

    fn flatten(&self, allow_null: bool) -> MarshalResult<Value>;

    fn is_populated(&self) -> bool;
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mismatch(expected: &str, raw: &Value) -> MarshalError {
    MarshalError::validation(format!("expected {expected}, got {}", json_kind(raw)))
}

macro_rules! impl_option_field {
    ($t:ty, $expected:literal, |$raw:ident| $extract:expr, |$v:ident| $flatten:expr) => {
        impl Field for Option<$t> {
            fn assign(&mut self, $raw: &Value) -> MarshalResult<()> {
                if $raw.is_null() {
                    *self = None;
                    return Ok(());
                }
                let extracted: Option<$t> = $extract;
                *self = Some(extracted.ok_or_else(|| mismatch($expected, $raw))?);
                Ok(())
            }

            fn flatten(&self, _allow_null: bool) -> MarshalResult<Value> {
                match self {
                    None => Ok(Value::Null),
                    Some($v) => $flatten,
                }
            }

            fn is_populated(&self) -> bool {
                self.is_some()
            }
        }
    };
}

impl_option_field!(i64, "an integer", |raw| raw.as_i64(), |v| Ok(Value::from(*v)));
impl_option_field!(u64, "a non-negative integer", |raw| raw.as_u64(), |v| Ok(Value::from(*v)));
impl_option_field!(bool, "a boolean", |raw| raw.as_bool(), |v| Ok(Value::Bool(*v)));
impl_option_field!(
    String,
    "a string",
    |raw| raw.as_str().map(str::to_owned),
    |v| Ok(Value::String(v.clone()))
);
impl_option_field!(f64, "a number", |raw| raw.as_f64(), |v| {
    Number::from_f64(*v)
        .map(Value::Number)
        .ok_or_else(|| MarshalError::unrepresentable("", format!("non-finite float {v}")))
});
impl_option_field!(
    chrono::DateTime<FixedOffset>,
    "an RFC 3339 timestamp",
    |raw| raw
        .as_str()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok()),
    |v| Ok(Value::String(v.format(ISO8601_FORMAT).to_string()))
);

/// Free-form JSON carried through untouched.
impl Field for Option<Value> {
    fn assign(&mut self, raw: &Value) -> MarshalResult<()> {
        *self = if raw.is_null() { None } else { Some(raw.clone()) };
        Ok(())
    }

    fn flatten(&self, _allow_null: bool) -> MarshalResult<Value> {
        Ok(self.clone().unwrap_or(Value::Null))
    }

    fn is_populated(&self) -> bool {
        self.is_some()
    }
}

/// Field wrapper for native values that travel as text.
///
/// Populated by parsing a JSON string through `FromStr`, flattened through
/// `Display` (e.g. `AsText<uuid::Uuid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsText<T>(pub Option<T>);

impl<T> AsText<T> {
    pub fn new(value: T) -> Self {
        Self(Some(value))
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T> Default for AsText<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> From<T> for AsText<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Field for AsText<T>
where
    T: Display + FromStr,
    T::Err: Display,
{
    fn assign(&mut self, raw: &Value) -> MarshalResult<()> {
        match raw {
            Value::Null => self.0 = None,
            Value::String(s) => {
                let parsed = s
                    .parse::<T>()
                    .map_err(|e| MarshalError::validation(format!("cannot parse '{s}': {e}")))?;
                self.0 = Some(parsed);
            }
            other => return Err(mismatch("a string", other)),
        }
        Ok(())
    }

    fn flatten(&self, _allow_null: bool) -> MarshalResult<Value> {
        Ok(self
            .0
            .as_ref()
            .map_or(Value::Null, |v| Value::String(v.to_string())))
    }

    fn is_populated(&self) -> bool {
        self.0.is_some()
    }
}
