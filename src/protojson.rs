//! Proto-JSON encoding of dynamic protobuf messages.
//!
//! Message types are resolved by full name from a [`DescriptorPool`]; values
//! are [`DynamicMessage`]s. The JSON mapping is the canonical proto3 one as
//! implemented by `prost-reflect`.

use prost_reflect::{
    DescriptorError, DescriptorPool, DeserializeOptions, DynamicMessage, MessageDescriptor,
    ReflectMessage, SerializeOptions,
};
use serde_json::ser::PrettyFormatter;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("marshal: {0}")]
    Marshal(String),

    #[error("unmarshal: {0}")]
    Unmarshal(String),

    #[error("format: {0}")]
    Format(String),

    #[error("invalid descriptor set: {0}")]
    Descriptor(#[from] DescriptorError),
}

/// Options for [`ProtoJson::marshal`]. The default is compact output that
/// omits default values and writes enums by name with camelCase keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarshalOptions {
    /// Also write fields that hold their default value.
    pub emit_defaults: bool,
    pub enum_as_number: bool,
    /// Keep the `.proto` field names instead of their JSON names.
    pub use_proto_names: bool,
    /// Pretty-print with this indent when non-empty.
    pub indent: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnmarshalOptions {
    /// Ignore unknown fields instead of failing.
    pub discard_unknown: bool,
}

/// Proto-JSON codec bound to a message registry.
#[derive(Clone, Debug)]
pub struct ProtoJson {
    pool: DescriptorPool,
}

impl ProtoJson {
    pub fn new(pool: DescriptorPool) -> Self {
        ProtoJson { pool }
    }

    /// Build the registry from a serialized `FileDescriptorSet`.
    pub fn from_descriptor_set(bytes: &[u8]) -> Result<Self, CodecError> {
        let pool = DescriptorPool::decode(bytes)?;
        Ok(ProtoJson { pool })
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Resolve a message type by its full name, e.g. `pkg.Message`.
    pub fn message_type(&self, name: &str) -> Result<MessageDescriptor, CodecError> {
        if let Some(desc) = self.pool.get_message_by_name(name) {
            return Ok(desc);
        }
        if self.pool.get_enum_by_name(name).is_some() {
            return Err(CodecError::Unmarshal(format!("not a message type: {}", name)));
        }
        Err(CodecError::Unmarshal(format!("unknown type: {}", name)))
    }

    /// An empty message of the named type.
    pub fn new_message(&self, name: &str) -> Result<DynamicMessage, CodecError> {
        self.message_type(name).map(DynamicMessage::new)
    }

    pub fn marshal(
        &self,
        msg: &DynamicMessage,
        options: &MarshalOptions,
    ) -> Result<String, CodecError> {
        encode(msg, options).map_err(CodecError::Marshal)
    }

    /// Multi-line output with a two-space indent.
    pub fn format(&self, msg: &DynamicMessage) -> Result<String, CodecError> {
        let options = MarshalOptions {
            indent: "  ".to_string(),
            ..MarshalOptions::default()
        };
        encode(msg, &options).map_err(CodecError::Format)
    }

    /// Parse `json` as a message of type `type_name`.
    pub fn unmarshal(
        &self,
        type_name: &str,
        json: &str,
        options: &UnmarshalOptions,
    ) -> Result<DynamicMessage, CodecError> {
        let desc = self.message_type(type_name)?;
        let de_options = DeserializeOptions::new().deny_unknown_fields(!options.discard_unknown);
        let mut de = serde_json::Deserializer::from_str(json);
        let msg = DynamicMessage::deserialize_with_options(desc, &mut de, &de_options)
            .map_err(|e| CodecError::Unmarshal(e.to_string()))?;
        de.end().map_err(|e| CodecError::Unmarshal(e.to_string()))?;
        Ok(msg)
    }
}

/// Name of the field currently set in the oneof `oneof`, if any.
pub fn which_oneof(msg: &DynamicMessage, oneof: &str) -> Option<String> {
    let desc = msg.descriptor();
    let decl = desc.oneofs().find(|o| o.name() == oneof)?;
    let set = decl.fields().find(|f| msg.has_field(f));
    set.map(|f| f.name().to_string())
}

fn encode(msg: &DynamicMessage, options: &MarshalOptions) -> Result<String, String> {
    let ser_options = SerializeOptions::new()
        .skip_default_fields(!options.emit_defaults)
        .use_enum_numbers(options.enum_as_number)
        .use_proto_field_name(options.use_proto_names);

    let mut buf = Vec::with_capacity(128);
    if options.indent.is_empty() {
        let mut ser = serde_json::Serializer::new(&mut buf);
        msg.serialize_with_options(&mut ser, &ser_options)
            .map_err(|e| e.to_string())?;
    } else {
        let formatter = PrettyFormatter::with_indent(options.indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        msg.serialize_with_options(&mut ser, &ser_options)
            .map_err(|e| e.to_string())?;
    }
    String::from_utf8(buf).map_err(|e| e.to_string())
}
