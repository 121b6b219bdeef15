//! Same as [`super::serde_utf8_bytes`] but for optional values. `None` is encoded as json `null`.
use bytes::Bytes;
use serde::Deserialize;
use serde::{Deserializer, Serializer};

pub fn serialize<S: Serializer>(v: &Option<Bytes>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(v) => {
            let stringified = std::str::from_utf8(v).map_err(|e| {
                serde::ser::Error::custom(format!(
                    "Unable to convert bytes into utf8 string - {}",
                    e
                ))
            })?;
            s.serialize_some(stringified)
        }
        None => s.serialize_none(),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Bytes>, D::Error> {
    let stringified = Option::<String>::deserialize(d)?;
    Ok(stringified.map(Bytes::from))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        value: Option<Bytes>,
    }

    #[test]
    fn none_is_null() {
        let w = Wrapper { value: None };
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"value":null}"#);
        let parsed: Wrapper = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert_eq!(parsed, w);
    }

    #[test]
    fn some_is_plain_string() {
        let w = Wrapper {
            value: Some(Bytes::from("bar")),
        };
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"value":"bar"}"#);
    }

    #[test]
    fn non_utf8_fails_to_serialize() {
        let w = Wrapper {
            value: Some(Bytes::from_static(&[0xff, 0xfe])),
        };
        assert!(serde_json::to_string(&w).is_err());
    }
}
