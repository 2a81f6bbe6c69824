// SPDX-License-Identifier: Apache-2.0

//! Schema-driven population of caller-owned targets.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::schema::Schema;

/// Populate `target` from the root object of `document`.
///
/// Fields are visited in schema order and looked up with unordered search,
/// so document key order does not matter. For each declared field:
///
/// * absent: skipped, and it does not count as a match;
/// * present with a different JSON type: fails at once with
///   [`Error::TypeMismatch`]; setters for earlier fields have already run,
///   later ones never do;
/// * present with the declared type: decoded and handed to its setter.
///
/// When no declared field was present the call fails with
/// [`Error::NoFieldsMatched`]. There is no coercion between types and
/// `null` only satisfies fields declared as null.
pub fn into<'t, T>(
    document: &mut Document,
    target: &'t mut T,
    schema: &Schema<T>,
) -> Result<&'t mut T> {
    let mut matched = 0usize;
    for field in schema.entries() {
        let owned = {
            let Some(value) = document.find_field_unordered(&field.name)? else {
                log::trace!("deserialize: `{}` absent, skipping", field.name);
                continue;
            };
            let found = value.json_type();
            if found != field.expected {
                log::debug!(
                    "deserialize: `{}` is {}, schema expects {}",
                    field.name,
                    found,
                    field.expected
                );
                return Err(Error::TypeMismatch {
                    attribute: field.name.clone(),
                    expected: field.expected,
                    found,
                });
            }
            value.to_owned_value()?
        };
        (field.setter)(target, owned);
        matched += 1;
    }
    if matched == 0 {
        return Err(Error::NoFieldsMatched);
    }
    log::trace!("deserialize: {} of {} fields matched", matched, schema.len());
    Ok(target)
}
