//! JSON to tag-tree conversion for command-line payloads.

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crocon_nbt::{Compound, Tag};

/// Parse a JSON object into a compound.
///
/// Booleans become bytes, integers become ints (longs when out of range),
/// other numbers become doubles. `null` is rejected.
pub fn parse_compound(text: &str) -> Result<Compound> {
    let value: Value = serde_json::from_str(text).context("Payload is not valid JSON")?;
    match to_tag(value)? {
        Tag::Compound(compound) => Ok(compound),
        other => bail!("Payload must be a JSON object, got {}", other.type_name()),
    }
}

fn to_tag(value: Value) -> Result<Tag> {
    Ok(match value {
        Value::Null => bail!("null has no tag representation"),
        Value::Bool(flag) => Tag::from(flag),
        Value::Number(number) => match number.as_i64() {
            Some(n) => i32::try_from(n).map_or(Tag::Long(n), Tag::Int),
            None => Tag::Double(number.as_f64().context("Number out of range")?),
        },
        Value::String(text) => Tag::String(text),
        Value::Array(items) => Tag::List(items.into_iter().map(to_tag).collect::<Result<_>>()?),
        Value::Object(fields) => Tag::Compound(
            fields
                .into_iter()
                .map(|(name, value)| Ok((name, to_tag(value)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Parse a `name=value` block state argument.
pub fn parse_state(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{arg}'")),
    }
}
