//! Wire payloads for the transit encrypt and decrypt endpoints

use base64::{decode_config, encode_config};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::TransitError;

/// Base64 encode bytes the way the transit API expects them (standard alphabet, padded)
pub fn encode(bytes: &[u8]) -> String {
    encode_config(bytes, base64::STANDARD)
}

/// Decode a base64 string returned by the transit API
pub fn decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    decode_config(encoded, base64::STANDARD)
}

// An empty context is treated the same as no context at all
fn encode_context(context: Option<&[u8]>) -> Option<String> {
    context.filter(|c| !c.is_empty()).map(encode)
}

/// Body of a `transit/encrypt/{key}` request
#[derive(Serialize, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptPayload {
    pub plaintext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Body of a `transit/decrypt/{key}` request
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct DecryptPayload {
    pub ciphertext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

pub fn build_encrypt_payload(plaintext: &[u8], context: Option<&[u8]>) -> EncryptPayload {
    EncryptPayload {
        plaintext: encode(plaintext),
        context: encode_context(context),
    }
}

pub fn build_decrypt_payload(ciphertext: &str, context: Option<&[u8]>) -> DecryptPayload {
    DecryptPayload {
        ciphertext: ciphertext.to_string(),
        context: encode_context(context),
    }
}

#[derive(Deserialize)]
pub(crate) struct TransitResponse<T> {
    data: Option<T>,
}

impl<T> TransitResponse<T> {
    pub(crate) fn into_data(self) -> Result<T, TransitError> {
        self.data
            .ok_or_else(|| TransitError::ResponseShape(String::from("data not returned")))
    }
}

#[derive(Deserialize)]
pub(crate) struct EncryptedData {
    pub ciphertext: Option<String>,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub(crate) struct DecryptedData {
    pub plaintext: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{
        build_decrypt_payload, build_encrypt_payload, decode, encode, DecryptedData,
        EncryptedData, TransitResponse,
    };
    use serde_json::json;

    const VALID_STRING: &str = "the quick brown fox";
    const ENCODED_VALID_STRING: &str = "dGhlIHF1aWNrIGJyb3duIGZveA==";
    const ENCRYPTED_VALUE: &str =
        "vault:v1:UEhQVW5pdF9GcmFtZXdvcmtfTW9ja09iamVjdF9Nb2NrT2JqZWN0";

    #[test]
    fn test_encodes_to_base64() {
        assert_eq!(encode(VALID_STRING.as_bytes()), ENCODED_VALID_STRING);
    }

    #[test]
    fn test_decodes_from_base64() {
        assert_eq!(decode(ENCODED_VALID_STRING).unwrap(), VALID_STRING.as_bytes());
    }

    #[test]
    fn test_decode_inverts_encode() {
        let samples: [&[u8]; 4] = [b"", b"a", &[0, 255, 128, 7, 9], VALID_STRING.as_bytes()];

        for sample in samples {
            assert_eq!(decode(&encode(sample)).unwrap(), sample);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not base64!").is_err());
    }

    #[test]
    fn test_contextless_encrypt_payload() {
        let payload = build_encrypt_payload(VALID_STRING.as_bytes(), None);

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "plaintext": ENCODED_VALID_STRING })
        );
    }

    #[test]
    fn test_contextful_encrypt_payload() {
        let payload = build_encrypt_payload(VALID_STRING.as_bytes(), Some(b"test"));

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "plaintext": ENCODED_VALID_STRING, "context": "dGVzdA==" })
        );
    }

    #[test]
    fn test_empty_context_is_omitted() {
        let payload = build_encrypt_payload(VALID_STRING.as_bytes(), Some(b""));

        assert_eq!(payload.context, None);
    }

    #[test]
    fn test_contextless_decrypt_payload() {
        let payload = build_decrypt_payload(ENCRYPTED_VALUE, None);

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "ciphertext": ENCRYPTED_VALUE })
        );
    }

    #[test]
    fn test_contextful_decrypt_payload() {
        let payload = build_decrypt_payload("vault:v1:ABC", Some(b"test"));

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "ciphertext": "vault:v1:ABC", "context": "dGVzdA==" })
        );
    }

    #[test]
    fn test_parses_encrypt_response() {
        let response: TransitResponse<EncryptedData> = serde_json::from_value(json!({
            "request_id": "abc",
            "data": { "ciphertext": ENCRYPTED_VALUE }
        }))
        .unwrap();

        assert_eq!(
            response.into_data().unwrap().ciphertext.as_deref(),
            Some(ENCRYPTED_VALUE)
        );
    }

    #[test]
    fn test_missing_data_is_shape_error() {
        let response: TransitResponse<DecryptedData> =
            serde_json::from_value(json!({ "errors": [] })).unwrap();

        assert_eq!(
            response
                .into_data()
                .map(|_| ())
                .map_err(|e| e.to_string())
                .expect_err("Missing data was accepted"),
            "malformed response: data not returned"
        );
    }
}
