use ftpgate_error::{short_type_name, StoreError, StoreResult};
use serde::{de::DeserializeOwned, Serialize};

/// Encodes a record as MessagePack with named fields, so adding a field to a
/// record type keeps older blobs readable.
pub fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| StoreError::SerializationFailed {
        type_name: short_type_name::<T>(),
        reason: e.to_string(),
    })
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    rmp_serde::from_slice(bytes).map_err(|e| StoreError::DeserializationFailed {
        type_name: short_type_name::<T>(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct V1 {
        name: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct V2 {
        name: String,
        #[serde(default)]
        flags: Vec<String>,
    }

    /// A blob written before a field was added still decodes.
    #[test]
    fn test_added_field_defaults() {
        let bytes = encode(&V1 {
            name: "alice".into(),
        })
        .unwrap();
        let v2: V2 = decode(&bytes).unwrap();
        assert_eq!(v2.name, "alice");
        assert!(v2.flags.is_empty());
    }

    #[test]
    fn test_garbage_reports_type_name() {
        let err = decode::<V1>(&[0xc1, 0x00, 0x13]).unwrap_err();
        match err {
            StoreError::DeserializationFailed { type_name, .. } => assert_eq!(type_name, "V1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
