//! Identifier codec - converts between the ids carried in model attributes and
//! the ids the document store keys documents by.
//!
//! A model id that is a 24-character hex string is stored as a binary
//! [`ObjectId`]; anything else is stored as-is. Callers may therefore address a
//! record by either a natural key or a store-native key.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::{BoxError, SyncError, SyncResult};
use crate::model::Model;

/// Length of the hex form of an [`ObjectId`].
pub const OBJECT_ID_HEX_LEN: usize = 24;

/// Attribute consulted last when resolving a model's id.
const GENERIC_ID_ATTRIBUTE: &str = "id";

/// Error returned when a string is not a valid [`ObjectId`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid object id {0:?}")]
pub struct ParseObjectIdError(pub String);

/// 12-byte store-native identifier.
///
/// Layout: 4-byte big-endian seconds since the epoch, 5 bytes unique to this
/// process, 3-byte big-endian counter. Ids generated by one process sort in
/// creation order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

impl ObjectId {
    /// Generate a new globally-unique id.
    pub fn new() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let process = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..0x00ff_ffff)))
            .fetch_add(1, Ordering::SeqCst)
            & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        ObjectId(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        ObjectId(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Seconds since the epoch at which this id was generated.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Parse a 24-character hex string.
    pub fn parse_str(s: &str) -> Result<Self, ParseObjectIdError> {
        if s.len() != OBJECT_ID_HEX_LEN || !s.is_ascii() {
            return Err(ParseObjectIdError(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        for (i, pair) in s.as_bytes().chunks(2).enumerate() {
            let hi = hex_value(pair[0]).ok_or_else(|| ParseObjectIdError(s.to_string()))?;
            let lo = hex_value(pair[1]).ok_or_else(|| ParseObjectIdError(s.to_string()))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(ObjectId(bytes))
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(OBJECT_ID_HEX_LEN);
        for byte in self.0 {
            out.push(DIGITS[(byte >> 4) as usize] as char);
            out.push(DIGITS[(byte & 0x0f) as usize] as char);
        }
        out
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ObjectId::parse_str(&s).map_err(de::Error::custom)
    }
}

/// Identifier in the form the store keys documents by.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreId {
    Object(ObjectId),
    Value(Value),
}

impl StoreId {
    /// External (attribute) form. Object ids become their hex string.
    pub fn to_value(&self) -> Value {
        match self {
            StoreId::Object(oid) => Value::String(oid.to_hex()),
            StoreId::Value(value) => value.clone(),
        }
    }
}

impl From<ObjectId> for StoreId {
    fn from(oid: ObjectId) -> Self {
        StoreId::Object(oid)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreId::Object(oid) => write!(f, "{}", oid),
            StoreId::Value(Value::String(s)) => f.write_str(s),
            StoreId::Value(value) => write!(f, "{}", value),
        }
    }
}

/// Convert an external id into its store form.
///
/// 24-character strings that parse as hex become an [`ObjectId`]; a failed
/// parse falls back to the raw string. Never fails.
pub fn coerce_id(value: Value) -> StoreId {
    if let Value::String(s) = &value {
        if s.len() == OBJECT_ID_HEX_LEN {
            if let Ok(oid) = ObjectId::parse_str(s) {
                return StoreId::Object(oid);
            }
        }
    }
    StoreId::Value(value)
}

/// JS-style truthiness, used where a "set" identifier must also be non-empty.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Resolve the store id addressing `model`.
///
/// Tries the model's declared id attribute (if truthy), then the reserved
/// field, then a generic `id` attribute.
pub fn resolve_id(model: &Model, reserved_field: &str) -> Option<StoreId> {
    let declared = model
        .get(model.schema().id_attribute_name())
        .filter(|v| is_truthy(v));
    let reserved = || model.get(reserved_field).filter(|v| is_truthy(v));
    let generic = || model.get(GENERIC_ID_ATTRIBUTE).filter(|v| !v.is_null());

    declared
        .or_else(reserved)
        .or_else(generic)
        .cloned()
        .map(coerce_id)
}

/// Custom identifier generator declared on a model schema.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<Value, BoxError>;
}

impl<F> IdGenerator for F
where
    F: Fn() -> Result<Value, BoxError> + Send + Sync,
{
    fn generate(&self) -> Result<Value, BoxError> {
        self()
    }
}

/// Assign a fresh id to `model`, using the schema's generator when present.
///
/// The model is mutated in place; on failure it is left untouched.
pub fn create_id(model: &mut Model) -> SyncResult<()> {
    let id = match model.schema().generator() {
        Some(generator) => generator.generate().map_err(SyncError::IdGeneration)?,
        None => Value::String(ObjectId::new().to_hex()),
    };
    if id.is_null() {
        return Err(SyncError::IdGeneration(
            format!("generator for {} produced an empty id", model.type_name()).into(),
        ));
    }
    debug!(model_type = model.type_name(), id = %id, "created id");

    let attribute = model.schema().id_attribute_name().to_string();
    model.set(attribute, id);
    Ok(())
}
