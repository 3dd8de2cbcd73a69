//! Request and payload types for each data kind.
//!
//! Every conversion is a [`Request`]: a shared [`ConversionRequest`] header plus
//! a kind-specific payload. The set of payloads is closed; each implements
//! [`Payload`], which names its native operation and its decode target.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crocon_common::ConverterError;
use crocon_nbt::{Compound, Tag};

/// A data-format edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    Java,
    Bedrock,
}

impl Edition {
    /// The wire tag of this edition.
    pub fn as_str(self) -> &'static str {
        match self {
            Edition::Java => "java",
            Edition::Bedrock => "bedrock",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown edition name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown edition: {0}")]
pub struct ParseEditionError(String);

impl FromStr for Edition {
    type Err = ParseEditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("java") {
            Ok(Edition::Java)
        } else if s.eq_ignore_ascii_case("bedrock") {
            Ok(Edition::Bedrock)
        } else {
            Err(ParseEditionError(s.to_string()))
        }
    }
}

/// The data kinds the engine can convert.
///
/// Each kind maps to exactly one native entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Block,
    Item,
    Entity,
    Biome,
    BlockEntity,
}

impl DataKind {
    pub const ALL: [DataKind; 5] = [
        DataKind::Block,
        DataKind::Item,
        DataKind::Entity,
        DataKind::Biome,
        DataKind::BlockEntity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DataKind::Block => "block",
            DataKind::Item => "item",
            DataKind::Entity => "entity",
            DataKind::Biome => "biome",
            DataKind::BlockEntity => "block_entity",
        }
    }

    /// The native symbol invoked for this kind.
    pub fn symbol(self) -> &'static str {
        match self {
            DataKind::Block => "convert_block",
            DataKind::Item => "convert_item",
            DataKind::Entity => "convert_entity",
            DataKind::Biome => "convert_biome",
            DataKind::BlockEntity => "convert_block_entity",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common parameters of every conversion. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversionRequest {
    from_version: String,
    to_version: String,
    from_edition: Edition,
    to_edition: Edition,
}

impl ConversionRequest {
    pub fn new(
        from_version: impl Into<String>,
        to_version: impl Into<String>,
        from_edition: Edition,
        to_edition: Edition,
    ) -> Self {
        Self {
            from_version: from_version.into(),
            to_version: to_version.into(),
            from_edition,
            to_edition,
        }
    }

    /// Java `java_version` to Bedrock `bedrock_version`.
    pub fn java_to_bedrock(
        java_version: impl Into<String>,
        bedrock_version: impl Into<String>,
    ) -> Self {
        Self::new(java_version, bedrock_version, Edition::Java, Edition::Bedrock)
    }

    /// Bedrock `bedrock_version` to Java `java_version`.
    pub fn bedrock_to_java(
        bedrock_version: impl Into<String>,
        java_version: impl Into<String>,
    ) -> Self {
        Self::new(bedrock_version, java_version, Edition::Bedrock, Edition::Java)
    }

    pub fn from_version(&self) -> &str {
        &self.from_version
    }

    pub fn to_version(&self) -> &str {
        &self.to_version
    }

    pub fn from_edition(&self) -> Edition {
        self.from_edition
    }

    pub fn to_edition(&self) -> Edition {
        self.to_edition
    }

    /// Attach a payload, producing a typed request.
    pub fn with<P: Payload>(self, data: P) -> Request<P> {
        Request { header: self, data }
    }
}

/// A typed conversion request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request<P> {
    pub header: ConversionRequest,
    pub data: P,
}

pub type BlockRequest = Request<Block>;
pub type ItemRequest = Request<Item>;
pub type EntityRequest = Request<Entity>;
pub type BiomeRequest = Request<BiomeQuery>;
pub type BlockEntityRequest = Request<BlockEntity>;

mod sealed {
    pub trait Sealed {}
}

/// A payload the engine knows how to convert.
///
/// Implemented only for the payload types in this module.
pub trait Payload: sealed::Sealed + Send + Sync {
    /// The decoded shape of the engine's reply.
    type Output: Send;

    /// The data kind, which selects the native operation.
    const KIND: DataKind;

    /// Whether a reply without a `data` field is decoded from the whole envelope.
    const WHOLE_ENVELOPE_FALLBACK: bool = false;

    /// Build the `data` sub-tree of the request envelope.
    fn to_compound(&self) -> Compound;

    /// Decode the reply payload into the output shape.
    fn decode_output(data: Compound) -> Result<Self::Output, ConverterError>;
}

/// A block identifier and its state properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Block {
    /// Namespaced identifier, e.g. `minecraft:stone_bricks`.
    pub id: String,
    /// State properties, e.g. `{"stone_brick_type": "mossy"}`.
    pub states: Compound,
}

impl Block {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            states: Compound::new(),
        }
    }

    pub fn with_state(mut self, name: impl Into<String>, value: impl Into<Tag>) -> Self {
        self.states.insert(name.into(), value.into());
        self
    }
}

impl sealed::Sealed for Block {}

impl Payload for Block {
    type Output = Block;
    const KIND: DataKind = DataKind::Block;

    fn to_compound(&self) -> Compound {
        let mut data = Compound::new();
        data.insert("id".into(), Tag::String(self.id.clone()));
        data.insert("states".into(), Tag::Compound(self.states.clone()));
        data
    }

    fn decode_output(mut data: Compound) -> Result<Block, ConverterError> {
        let id = match data.remove("id") {
            Some(Tag::String(id)) => id,
            Some(other) => {
                return Err(ConverterError::payload_shape(
                    "block",
                    format!("'id' is a {}, expected string", other.type_name()),
                ));
            }
            None => return Err(ConverterError::payload_shape("block", "missing 'id'")),
        };
        // The engine omits `states` when the block has none.
        let states = match data.remove("states") {
            Some(Tag::Compound(states)) => states,
            Some(other) => {
                return Err(ConverterError::payload_shape(
                    "block",
                    format!("'states' is a {}, expected compound", other.type_name()),
                ));
            }
            None => Compound::new(),
        };
        Ok(Block { id, states })
    }
}

/// Defines a payload that is an arbitrary named-value tree.
macro_rules! tree_payload {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub Compound);

        impl $name {
            pub fn into_inner(self) -> Compound {
                self.0
            }
        }

        impl From<Compound> for $name {
            fn from(tree: Compound) -> Self {
                Self(tree)
            }
        }

        impl std::ops::Deref for $name {
            type Target = Compound;

            fn deref(&self) -> &Compound {
                &self.0
            }
        }

        impl sealed::Sealed for $name {}

        impl Payload for $name {
            type Output = $name;
            const KIND: DataKind = $kind;

            fn to_compound(&self) -> Compound {
                self.0.clone()
            }

            fn decode_output(data: Compound) -> Result<$name, ConverterError> {
                Ok($name(data))
            }
        }
    };
}

tree_payload!(
    /// An item stack, as its full tag tree.
    Item,
    DataKind::Item
);
tree_payload!(
    /// An entity, as its full tag tree.
    Entity,
    DataKind::Entity
);
tree_payload!(
    /// A block entity, as its full tag tree.
    BlockEntity,
    DataKind::BlockEntity
);

/// A biome lookup.
///
/// Java biomes are addressed by name, Bedrock biomes by numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiomeQuery {
    Name(String),
    Id(i32),
}

/// The converted biome. Only the field for the target edition is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BiomeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl sealed::Sealed for BiomeQuery {}

impl Payload for BiomeQuery {
    type Output = BiomeResponse;
    const KIND: DataKind = DataKind::Biome;
    const WHOLE_ENVELOPE_FALLBACK: bool = true;

    fn to_compound(&self) -> Compound {
        let mut data = Compound::new();
        match self {
            BiomeQuery::Name(name) => data.insert("name".into(), Tag::String(name.clone())),
            BiomeQuery::Id(id) => data.insert("id".into(), Tag::Int(*id)),
        };
        data
    }

    fn decode_output(data: Compound) -> Result<BiomeResponse, ConverterError> {
        let name = match data.get("name") {
            Some(Tag::String(name)) => Some(name.clone()),
            Some(other) => {
                return Err(ConverterError::payload_shape(
                    "biome",
                    format!("'name' is a {}, expected string", other.type_name()),
                ));
            }
            None => None,
        };
        let id = match data.get("id") {
            Some(tag) => Some(tag.as_i32().ok_or_else(|| {
                ConverterError::payload_shape(
                    "biome",
                    format!("'id' is a {}, expected integer", tag.type_name()),
                )
            })?),
            None => None,
        };
        Ok(BiomeResponse { name, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edition_parse() {
        assert_eq!("java".parse::<Edition>(), Ok(Edition::Java));
        assert_eq!("BEDROCK".parse::<Edition>(), Ok(Edition::Bedrock));
        assert!("pocket".parse::<Edition>().is_err());
        assert_eq!(Edition::Bedrock.to_string(), "bedrock");
    }

    #[test]
    fn test_data_kind_symbols() {
        assert_eq!(DataKind::Block.symbol(), "convert_block");
        assert_eq!(DataKind::BlockEntity.symbol(), "convert_block_entity");
        assert_eq!(DataKind::BlockEntity.to_string(), "block_entity");
    }

    #[test]
    fn test_conversion_request_helpers() {
        let header = ConversionRequest::bedrock_to_java("1.20.80", "1.20.4");
        assert_eq!(header.from_version(), "1.20.80");
        assert_eq!(header.to_version(), "1.20.4");
        assert_eq!(header.from_edition(), Edition::Bedrock);
        assert_eq!(header.to_edition(), Edition::Java);
    }

    #[test]
    fn test_block_to_compound() {
        let block = Block::new("minecraft:stone_bricks").with_state("stone_brick_type", "mossy");
        let data = block.to_compound();

        assert_eq!(data["id"], Tag::from("minecraft:stone_bricks"));
        let states = data["states"].as_compound().unwrap();
        assert_eq!(states["stone_brick_type"], Tag::from("mossy"));
    }

    #[test]
    fn test_block_decode_without_states() {
        let mut data = Compound::new();
        data.insert("id".into(), Tag::from("minecraft:stone"));

        let block = Block::decode_output(data).unwrap();
        assert_eq!(block, Block::new("minecraft:stone"));
    }

    #[test]
    fn test_block_decode_missing_id() {
        let err = Block::decode_output(Compound::new()).unwrap_err();
        assert!(matches!(err, ConverterError::PayloadShape { kind: "block", .. }));
    }

    #[test]
    fn test_block_decode_wrong_id_type() {
        let mut data = Compound::new();
        data.insert("id".into(), Tag::Int(1));

        let err = Block::decode_output(data).unwrap_err();
        assert!(err.is_contract_mismatch());
    }

    #[test]
    fn test_biome_query_to_compound() {
        let data = BiomeQuery::Id(127).to_compound();
        assert_eq!(data["id"], Tag::Int(127));

        let data = BiomeQuery::Name("minecraft:plains".into()).to_compound();
        assert_eq!(data["name"], Tag::from("minecraft:plains"));
    }

    #[test]
    fn test_biome_decode_ignores_unrelated_fields() {
        let mut data = Compound::new();
        data.insert("success".into(), Tag::Byte(1));
        data.insert("id".into(), Tag::Int(1));

        let biome = BiomeQuery::decode_output(data).unwrap();
        assert_eq!(
            biome,
            BiomeResponse {
                name: None,
                id: Some(1)
            }
        );
    }

    #[test]
    fn test_tree_payload_passthrough() {
        let mut tree = Compound::new();
        tree.insert("Count".into(), Tag::Byte(64));

        let item = Item::from(tree.clone());
        assert_eq!(item.to_compound(), tree);
        assert_eq!(Item::decode_output(tree.clone()).unwrap().into_inner(), tree);
        assert_eq!(item.get("Count"), Some(&Tag::Byte(64)));
    }
}
