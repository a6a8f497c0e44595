//! Entity trait: typed objects populated from raw JSON and encoded back to a
//! filtered JSON structure.

use serde_json::{Map, Value};

use crate::error::{MarshalError, MarshalResult};
use crate::field::{json_kind, Field, FieldDef};
use crate::registry::MetadataRegistry;

/// A typed domain object with a static field table.
///
/// Implementations are normally generated by [`entity!`](crate::entity!),
/// which keeps `FIELDS`, `field` and `field_mut` in sync with the struct
/// declaration. Hand-written implementations must uphold the same contract:
/// every `FIELDS` entry resolves through `field`/`field_mut`.
pub trait Entity: Default + 'static {
    /// Type name used in logs and error messages.
    const TYPE_NAME: &'static str;

    /// Declared fields in declaration order.
    const FIELDS: &'static [FieldDef];

    /// Look up a field by JSON key.
    fn field(&self, key: &str) -> Option<&dyn Field>;

    /// Mutable lookup of a field by JSON key.
    fn field_mut(&mut self, key: &str) -> Option<&mut dyn Field>;

    /// Assign every recognized key of `data` onto the matching field.
    ///
    /// Unknown keys are ignored. `null` is a no-op. The first failing field
    /// aborts population; fields assigned before it keep their new values.
    fn populate(&mut self, data: &Value) -> MarshalResult<&mut Self> {
        let map = match data {
            Value::Null => return Ok(self),
            Value::Object(map) => map,
            other => {
                return Err(MarshalError::validation(format!(
                    "{} expects an object, got {}",
                    Self::TYPE_NAME,
                    json_kind(other)
                )));
            }
        };

        for (key, raw) in map {
            match self.field_mut(key) {
                Some(field) => field.assign(raw).map_err(|e| e.in_field(key))?,
                None => tracing::trace!(entity = Self::TYPE_NAME, key = %key, "ignoring unknown key"),
            }
        }

        Ok(self)
    }

    /// Construct an empty instance and populate it from `data`.
    fn from_raw(data: &Value) -> MarshalResult<Self> {
        let mut entity = Self::default();
        entity.populate(data)?;
        Ok(entity)
    }

    /// `true` when no declared field holds a value.
    fn is_empty(&self) -> bool {
        Self::FIELDS.iter().all(|def| {
            self.field(def.name)
                .map_or(true, |field| !field.is_populated())
        })
    }

    /// Encode into a JSON value holding only exportable fields.
    ///
    /// Returns `Value::Null` for an empty entity. With `allow_null` unset
    /// exportable fields appear as explicit `null`; without it they are
    /// omitted.
    fn encode_value(&self, allow_null: bool) -> MarshalResult<Value> {
        if self.is_empty() {
            return Ok(Value::Null);
        }

        let mut flattened = Vec::with_capacity(Self::FIELDS.len());
        for def in Self::FIELDS {
            let field = self.field(def.name).ok_or_else(|| {
                MarshalError::configuration(format!(
                    "{} declares '{}' but does not expose it",
                    Self::TYPE_NAME,
                    def.name
                ))
            })?;
            let value = field.flatten(allow_null).map_err(|e| e.in_field(def.name))?;
            flattened.push((def.name, value));
        }

        let exportable = MetadataRegistry::global().exportable_fields::<Self>();
        let mut out = Map::with_capacity(exportable.len());
        for (name, value) in flattened {
            if !exportable.contains(&name) || (value.is_null() && !allow_null) {
                continue;
            }
            out.insert(name.to_string(), value);
        }

        Ok(Value::Object(out))
    }

    /// Encode into JSON text, `None` for an empty entity.
    fn encode(&self, allow_null: bool) -> MarshalResult<Option<String>> {
        match self.encode_value(allow_null)? {
            Value::Null => Ok(None),
            value => Ok(Some(serde_json::to_string(&value)?)),
        }
    }

    /// Textual representation: the encoded JSON, `null` when empty.
    fn to_json(&self) -> MarshalResult<String> {
        Ok(self
            .encode(true)?
            .unwrap_or_else(|| Value::Null.to_string()))
    }

    /// Current value of the field with JSON key `key`, in its flattened form.
    ///
    /// The value is what `encode_value(true)` would emit for that field:
    /// nested entities drop their read-only fields and an unrepresentable value
    /// fails the same way encoding does. Read the struct field directly (or go
    /// through [`Entity::field`]) for the typed value.
    fn get_field(&self, key: &str) -> MarshalResult<Value> {
        let field = self.field(key).ok_or_else(|| {
            MarshalError::unknown_operation(format!("{} has no field '{key}'", Self::TYPE_NAME))
        })?;
        field.flatten(true).map_err(|e| e.in_field(key))
    }

    /// Resolve a `get<Field>` accessor name, e.g. `getId` reads `id`.
    fn call_getter(&self, method: &str) -> MarshalResult<Value> {
        let key = getter_key(method).ok_or_else(|| {
            MarshalError::unknown_operation(format!("unknown method {method}"))
        })?;
        if self.field(&key).is_none() {
            return Err(MarshalError::unknown_operation(format!(
                "unknown method {method} on {}",
                Self::TYPE_NAME
            )));
        }
        self.get_field(&key)
    }
}

/// `getBasePrice` -> `basePrice`.
fn getter_key(method: &str) -> Option<String> {
    let rest = method.strip_prefix("get")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

/// Declare an entity struct together with its field table.
///
/// Each field is `name: Type`, optionally followed by `as "jsonKey"` (the key
/// defaults to the field name) and `[read_only]`.
///
/// ```ignore
/// entity! {
///     pub struct Product {
///         pub id: Option<i64> [read_only],
///         pub name: Option<String>,
///         pub available_from: Date as "availableFrom",
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity {
    (@key $field:ident) => {
        stringify!($field)
    };
    (@key $field:ident $key:literal) => {
        $key
    };
    (@read_only) => {
        false
    };
    (@read_only read_only) => {
        true
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty $(as $key:literal)? $([$flag:ident])?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::Entity for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            const FIELDS: &'static [$crate::FieldDef] = &[
                $(
                    $crate::FieldDef::new(
                        $crate::entity!(@key $field $($key)?),
                        $crate::entity!(@read_only $($flag)?),
                    ),
                )*
            ];

            fn field(&self, key: &str) -> Option<&dyn $crate::Field> {
                $(
                    if key == $crate::entity!(@key $field $($key)?) {
                        return Some(&self.$field);
                    }
                )*
                None
            }

            fn field_mut(&mut self, key: &str) -> Option<&mut dyn $crate::Field> {
                $(
                    if key == $crate::entity!(@key $field $($key)?) {
                        return Some(&mut self.$field);
                    }
                )*
                None
            }
        }

        impl $crate::Field for $name {
            fn assign(&mut self, raw: &$crate::Value) -> $crate::MarshalResult<()> {
                let mut fresh = <Self as Default>::default();
                $crate::Entity::populate(&mut fresh, raw)?;
                *self = fresh;
                Ok(())
            }

            fn flatten(&self, allow_null: bool) -> $crate::MarshalResult<$crate::Value> {
                $crate::Entity::encode_value(self, allow_null)
            }

            fn is_populated(&self) -> bool {
                !$crate::Entity::is_empty(self)
            }
        }
    };
}
