use bytes::Bytes;
use serde::Deserialize;
use serde::{Deserializer, Serializer};

/// Enable serde to serialize [`Bytes`] as a utf8 [`String`]
///
/// # Errors
/// This function returns an error if [`String::from_utf8`] returns an error
pub fn serialize<S: Serializer>(v: &Bytes, s: S) -> Result<S::Ok, S::Error> {
    let stringified = std::str::from_utf8(v).map_err(|e| {
        serde::ser::Error::custom(format!("Unable to convert bytes into utf8 string - {}", e))
    })?;
    s.serialize_str(stringified)
}

/// Enable serde to deserialize a utf8 [`String`] into [`Bytes`]
pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
    let stringified = String::deserialize(d)?;
    Ok(Bytes::from(stringified))
}
