//! Composite key codec
//!
//! A composite key is `prefix#v1#v2...` with the values taken in the key's
//! resolved order. Encoding is defined only when every contributing variable
//! has a value. Delimiters inside values are not escaped, so only the last
//! segment of a key may itself contain `#`.

use crate::error::{KeyError, ModelResult};
use crate::schema::EntitySchema;
use crate::value::AttributeValue;

/// Delimiter between the prefix and the values of a composite key
pub const KEY_DELIMITER: char = '#';

/// Encode `key` from the current component values.
///
/// Returns `None` when any contributing variable has no value.
pub fn compute_key_value<F>(
    schema: &EntitySchema,
    key: &str,
    lookup: F,
) -> ModelResult<Option<String>>
where
    F: Fn(&str) -> Option<AttributeValue>,
{
    let prefix = schema.prefix(key)?;
    let variables = schema
        .key_array(key)
        .ok_or_else(|| KeyError::EmptyKey { key: key.to_string() })?;

    let mut encoded = String::from(prefix);
    for variable in variables {
        match lookup(variable).and_then(|v| v.to_key_segment()) {
            Some(segment) => {
                encoded.push(KEY_DELIMITER);
                encoded.push_str(&segment);
            }
            None => return Ok(None),
        }
    }
    Ok(Some(encoded))
}

/// Split a key string into `(variable, value)` pairs in resolved order.
///
/// Variables without a segment in the key string are left out.
pub fn decode_key(
    schema: &EntitySchema,
    key: &str,
    key_value: &str,
) -> ModelResult<Vec<(String, String)>> {
    let prefix = schema.prefix(key)?;
    let variables = schema
        .key_array(key)
        .ok_or_else(|| KeyError::EmptyKey { key: key.to_string() })?;

    let remainder = key_value
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(KEY_DELIMITER))
        .ok_or_else(|| KeyError::MalformedKey {
            key: key.to_string(),
            value: key_value.to_string(),
        })?;

    Ok(variables
        .iter()
        .zip(remainder.splitn(variables.len(), KEY_DELIMITER))
        .map(|(variable, segment)| (variable.clone(), segment.to_string()))
        .collect())
}

/// Read the value of `variable` out of a key string
pub fn compute_value_from_key(
    schema: &EntitySchema,
    key: &str,
    key_value: &str,
    variable: &str,
) -> ModelResult<Option<String>> {
    Ok(decode_key(schema, key, key_value)?
        .into_iter()
        .find(|(name, _)| name == variable)
        .map(|(_, value)| value))
}
