//! Wire envelope exchanged with the native engine.
//!
//! Requests travel as `{fromVersion, toVersion, fromEdition, toEdition, data}`
//! and replies as `{success, data?, error?, stackTrace?}`. Both are encoded as
//! a little-endian tag tree and then base-64 wrapped so they can cross the
//! native boundary as C strings.
//!
//! Little-endian encoding is what the engine's parser expects, independent of
//! the editions being converted.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crocon_common::ConverterError;
use crocon_nbt::{Compound, Tag};

use crate::types::{ConversionRequest, Edition, Payload};

const FROM_VERSION: &str = "fromVersion";
const TO_VERSION: &str = "toVersion";
const FROM_EDITION: &str = "fromEdition";
const TO_EDITION: &str = "toEdition";
const DATA: &str = "data";
const SUCCESS: &str = "success";
const ERROR: &str = "error";
const STACK_TRACE: &str = "stackTrace";

/// Encode a request envelope for `header` carrying `data`.
///
/// The output is canonical: identical requests always produce identical text,
/// which makes it usable as a cache key.
pub fn encode_request(header: &ConversionRequest, data: Compound) -> Result<String, ConverterError> {
    let mut envelope = Compound::new();
    envelope.insert(FROM_VERSION.into(), Tag::from(header.from_version()));
    envelope.insert(TO_VERSION.into(), Tag::from(header.to_version()));
    envelope.insert(FROM_EDITION.into(), Tag::from(header.from_edition().as_str()));
    envelope.insert(TO_EDITION.into(), Tag::from(header.to_edition().as_str()));
    envelope.insert(DATA.into(), Tag::Compound(data));

    encode_tree(&envelope)
}

/// Decode an engine reply into the output shape of `P`.
///
/// A reply whose `success` flag is missing or zero becomes
/// [`ConverterError::Conversion`], with absent fields read as empty strings.
pub fn decode_response<P: Payload>(text: &str) -> Result<P::Output, ConverterError> {
    let mut envelope = decode_tree(text)?;

    if !is_success(&envelope) {
        return Err(ConverterError::conversion(
            string_field(&envelope, ERROR),
            string_field(&envelope, STACK_TRACE),
        ));
    }

    let data = match envelope.remove(DATA) {
        Some(Tag::Compound(data)) => data,
        Some(other) => {
            return Err(ConverterError::payload_shape(
                P::KIND.name(),
                format!("'data' is a {}, expected compound", other.type_name()),
            ));
        }
        None if P::WHOLE_ENVELOPE_FALLBACK => envelope,
        None => {
            return Err(ConverterError::payload_shape(
                P::KIND.name(),
                "reply has no 'data' field",
            ));
        }
    };

    P::decode_output(data)
}

/// A decoded request envelope.
///
/// The gateway never needs this; it exists for engines implemented in Rust,
/// such as test doubles, which must read what the gateway sends.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub header: ConversionRequest,
    pub data: Compound,
}

impl RequestEnvelope {
    pub fn encode(&self) -> Result<String, ConverterError> {
        encode_request(&self.header, self.data.clone())
    }

    pub fn decode(text: &str) -> Result<Self, ConverterError> {
        let mut envelope = decode_tree(text)?;

        let header = ConversionRequest::new(
            required_string(&envelope, FROM_VERSION)?,
            required_string(&envelope, TO_VERSION)?,
            required_edition(&envelope, FROM_EDITION)?,
            required_edition(&envelope, TO_EDITION)?,
        );
        let data = match envelope.remove(DATA) {
            Some(Tag::Compound(data)) => data,
            _ => return Err(ConverterError::decoding("request has no 'data' compound")),
        };
        Ok(Self { header, data })
    }
}

/// A response envelope, as an engine produces it.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Success { data: Compound },
    Failure { error: String, stack_trace: String },
}

impl ResponseEnvelope {
    pub fn success(data: Compound) -> Self {
        Self::Success { data }
    }

    pub fn failure(error: impl Into<String>, stack_trace: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            stack_trace: stack_trace.into(),
        }
    }

    pub fn to_compound(&self) -> Compound {
        let mut envelope = Compound::new();
        match self {
            Self::Success { data } => {
                envelope.insert(SUCCESS.into(), Tag::Byte(1));
                envelope.insert(DATA.into(), Tag::Compound(data.clone()));
            }
            Self::Failure { error, stack_trace } => {
                envelope.insert(SUCCESS.into(), Tag::Byte(0));
                envelope.insert(ERROR.into(), Tag::from(error.as_str()));
                envelope.insert(STACK_TRACE.into(), Tag::from(stack_trace.as_str()));
            }
        }
        envelope
    }

    pub fn encode(&self) -> Result<String, ConverterError> {
        encode_tree(&self.to_compound())
    }
}

/// Tree-encode and base-64 wrap an arbitrary compound.
pub fn encode_tree(tree: &Compound) -> Result<String, ConverterError> {
    let bytes = crocon_nbt::to_bytes(tree).map_err(|e| ConverterError::encoding(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

/// Reverse [`encode_tree`].
pub fn decode_tree(text: &str) -> Result<Compound, ConverterError> {
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| ConverterError::decoding(format!("Invalid base64: {e}")))?;
    crocon_nbt::from_bytes(&bytes)
        .map_err(|e| ConverterError::decoding(format!("Malformed envelope: {e}")))
}

fn is_success(envelope: &Compound) -> bool {
    matches!(envelope.get(SUCCESS), Some(Tag::Byte(flag)) if *flag != 0)
}

fn string_field(envelope: &Compound, name: &str) -> String {
    envelope
        .get(name)
        .and_then(Tag::as_str)
        .unwrap_or_default()
        .to_string()
}

fn required_string(envelope: &Compound, name: &str) -> Result<String, ConverterError> {
    envelope
        .get(name)
        .and_then(Tag::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConverterError::decoding(format!("request has no '{name}' string")))
}

fn required_edition(envelope: &Compound, name: &str) -> Result<Edition, ConverterError> {
    required_string(envelope, name)?
        .parse()
        .map_err(|e: crate::types::ParseEditionError| ConverterError::decoding(e.to_string()))
}
