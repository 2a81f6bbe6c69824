// SPDX-License-Identifier: Apache-2.0

//! Declarative field-to-type mapping consulted by [`crate::deserialize::into`].

use crate::document::Document;
use crate::error::Result;
use crate::number::Number;
use crate::value::{JsonType, OwnedValue};

type Setter<T> = Box<dyn Fn(&mut T, OwnedValue)>;

pub(crate) struct Field<T> {
    pub name: String,
    pub expected: JsonType,
    pub setter: Setter<T>,
}

/// Which JSON fields populate which attributes of a `T`, and with what type.
///
/// Built once per target type and passed explicitly to every deserialization:
///
/// ```
/// use lazyjson::{Parser, Schema};
///
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// let schema = Schema::new()
///     .number("id", |u: &mut User, n| u.id = n.as_i64().unwrap_or_default())
///     .string("name", |u: &mut User, s| u.name = s);
///
/// let parser = Parser::new();
/// let mut doc = parser.iterate_input(r#"{"id": 7, "name": "ada"}"#)?;
/// let user = schema.deserialize(&mut doc)?;
/// assert_eq!((user.id, user.name.as_str()), (7, "ada"));
/// # Ok::<(), lazyjson::Error>(())
/// ```
pub struct Schema<T> {
    fields: Vec<Field<T>>,
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schema<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare `name` with its expected type. `setter` receives the decoded
    /// value, which always has the declared type.
    pub fn field<F>(mut self, name: impl Into<String>, expected: JsonType, setter: F) -> Self
    where
        F: Fn(&mut T, OwnedValue) + 'static,
    {
        self.fields.push(Field {
            name: name.into(),
            expected,
            setter: Box::new(setter),
        });
        self
    }

    pub fn number<F>(self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, Number) + 'static,
    {
        self.field(name, JsonType::Number, move |target, value| {
            if let OwnedValue::Number(n) = &value {
                setter(target, n.clone());
            }
        })
    }

    pub fn string<F>(self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, String) + 'static,
    {
        self.field(name, JsonType::String, move |target, mut value| {
            if let OwnedValue::String(s) = &mut value {
                setter(target, core::mem::take(s));
            }
        })
    }

    pub fn boolean<F>(self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, bool) + 'static,
    {
        self.field(name, JsonType::Boolean, move |target, value| {
            if let OwnedValue::Bool(b) = &value {
                setter(target, *b);
            }
        })
    }

    /// A field that must be `null`; the setter only records its presence.
    pub fn null<F>(self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T) + 'static,
    {
        self.field(name, JsonType::Null, move |target, _| setter(target))
    }

    pub fn array<F>(self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, Vec<OwnedValue>) + 'static,
    {
        self.field(name, JsonType::Array, move |target, mut value| {
            if let OwnedValue::Array(items) = &mut value {
                setter(target, core::mem::take(items));
            }
        })
    }

    pub fn object<F>(self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, Vec<(String, OwnedValue)>) + 'static,
    {
        self.field(name, JsonType::Object, move |target, mut value| {
            if let OwnedValue::Object(fields) = &mut value {
                setter(target, core::mem::take(fields));
            }
        })
    }

    /// Declared `(name, type)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, JsonType)> + '_ {
        self.fields.iter().map(|f| (f.name.as_str(), f.expected))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn entries(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Deserialize into a fresh `T::default()`.
    pub fn deserialize(&self, document: &mut Document) -> Result<T>
    where
        T: Default,
    {
        let mut target = T::default();
        crate::deserialize::into(document, &mut target, self)?;
        Ok(target)
    }
}

impl<T> core::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.fields()).finish()
    }
}
