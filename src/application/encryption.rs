use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use crate::domain::{
    DecodeError, EncodedFields, EncodingError, FieldValue, IntegrityProof, PlaintextRecord,
    RecordField, TokenPayload, digest_hex, encode_payload, encode_proof, ensure_finite,
    parse_payload, parse_proof,
};

use super::{Entropy, SystemEntropy};

/// The encode/decode/verify contract a confidential backend has to meet.
///
/// `EncryptionService` is the simulated implementation; a real homomorphic
/// backend slots in here without callers changing.
pub trait RecordCipher: Send + Sync {
    fn encode_record(&self, record: &PlaintextRecord) -> Result<EncodedFields, EncodingError>;

    fn encode_field(&self, value: &FieldValue) -> Result<String, EncodingError>;

    fn decode_token(&self, token: &str) -> Result<FieldValue, DecodeError>;

    /// `Ok(false)` on any mismatch or malformed proof. Errors only when the
    /// token itself cannot be decoded.
    fn verify_integrity(&self, token: &str, proof: &str) -> Result<bool, DecodeError>;
}

/// Encoded amount and price of a trade order, with their proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeFields {
    pub encrypted_amount: String,
    pub encrypted_price: String,
    pub proof: String,
}

/// Simulated field-level encryption.
///
/// Tokens are `0x` + hex(base64(json {value, timestamp, nonce})). Every call
/// draws a fresh timestamp and nonce, so encoding the same plaintext twice
/// never yields the same token.
pub struct EncryptionService {
    entropy: Arc<dyn Entropy>,
}

impl Default for EncryptionService {
    fn default() -> Self {
        Self::new(Arc::new(SystemEntropy))
    }
}

impl EncryptionService {
    pub fn new(entropy: Arc<dyn Entropy>) -> Self {
        Self { entropy }
    }

    /// Encode each field independently, then prove over the whole record.
    pub fn encode_record(&self, record: &PlaintextRecord) -> Result<EncodedFields, EncodingError> {
        let encode = |field| self.encode_field(&record.field_value(field));

        let encoded = EncodedFields {
            encrypted_amount: encode(RecordField::Amount)?,
            encrypted_price: encode(RecordField::Price)?,
            encrypted_credit_type: encode(RecordField::CreditType)?,
            encrypted_vintage: encode(RecordField::Vintage)?,
            proof: self.prove(
                serde_json::to_value(record)?,
                &RecordField::ALL.map(|field| (field, record.field_value(field))),
            )?,
        };

        tracing::debug!(credit_type = %record.credit_type, "encoded plaintext record");
        Ok(encoded)
    }

    /// Encode the amount and price of a trade order.
    pub fn encode_trade(&self, amount: f64, price: f64) -> Result<TradeFields, EncodingError> {
        let amount = FieldValue::Number(amount);
        let price = FieldValue::Number(price);

        let encrypted_amount = self.encode_field(&amount)?;
        let encrypted_price = self.encode_field(&price)?;
        let proof = self.prove(
            json!({ "amount": amount, "price": price }),
            &[(RecordField::Amount, amount), (RecordField::Price, price)],
        )?;

        Ok(TradeFields {
            encrypted_amount,
            encrypted_price,
            proof,
        })
    }

    pub fn encode_field(&self, value: &FieldValue) -> Result<String, EncodingError> {
        let payload = TokenPayload {
            value: value.clone(),
            timestamp: self.entropy.now().timestamp_millis(),
            nonce: self.entropy.nonce(),
        };
        encode_payload(&payload)
    }

    pub fn decode_token(&self, token: &str) -> Result<FieldValue, DecodeError> {
        Ok(self.decode_payload(token)?.value)
    }

    /// Decode a token including its timestamp and nonce.
    pub fn decode_payload(&self, token: &str) -> Result<TokenPayload, DecodeError> {
        parse_payload(token).inspect_err(|err| {
            tracing::debug!(error = %err, "token decode failed");
        })
    }

    pub fn decode_proof(&self, proof: &str) -> Result<IntegrityProof, DecodeError> {
        parse_proof(proof)
    }

    pub fn verify_integrity(&self, token: &str, proof: &str) -> Result<bool, DecodeError> {
        let value = self.decode_token(token)?;
        let Some((digest, proof)) = self.digest_and_proof(&value, proof) else {
            return Ok(false);
        };
        Ok(proof.contains_digest(&digest))
    }

    /// Check one token against the digest recorded for `field` only.
    pub fn verify_field(
        &self,
        field: RecordField,
        token: &str,
        proof: &str,
    ) -> Result<bool, DecodeError> {
        let value = self.decode_token(token)?;
        let Some((digest, proof)) = self.digest_and_proof(&value, proof) else {
            return Ok(false);
        };
        Ok(proof.field_digest(field.as_str()) == Some(digest.as_str()))
    }

    fn digest_and_proof(&self, value: &FieldValue, proof: &str) -> Option<(String, IntegrityProof)> {
        let digest = digest_hex(value)
            .inspect_err(|err| tracing::debug!(error = %err, "cannot digest decoded value"))
            .ok()?;
        let proof = parse_proof(proof)
            .inspect_err(|err| tracing::debug!(error = %err, "malformed proof"))
            .ok()?;
        Some((digest, proof))
    }

    fn prove(
        &self,
        data: serde_json::Value,
        fields: &[(RecordField, FieldValue)],
    ) -> Result<String, EncodingError> {
        let mut digests = BTreeMap::new();
        for (field, value) in fields {
            ensure_finite(value)?;
            digests.insert(field.as_str().to_string(), digest_hex(value)?);
        }

        let proof = IntegrityProof {
            hash: digest_hex(&data)?,
            data,
            timestamp: self.entropy.now().timestamp_millis(),
            fields: digests,
        };
        encode_proof(&proof)
    }
}

impl RecordCipher for EncryptionService {
    fn encode_record(&self, record: &PlaintextRecord) -> Result<EncodedFields, EncodingError> {
        EncryptionService::encode_record(self, record)
    }

    fn encode_field(&self, value: &FieldValue) -> Result<String, EncodingError> {
        EncryptionService::encode_field(self, value)
    }

    fn decode_token(&self, token: &str) -> Result<FieldValue, DecodeError> {
        EncryptionService::decode_token(self, token)
    }

    fn verify_integrity(&self, token: &str, proof: &str) -> Result<bool, DecodeError> {
        EncryptionService::verify_integrity(self, token, proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SeededEntropy;

    fn service() -> EncryptionService {
        EncryptionService::new(Arc::new(SeededEntropy::from_seed(42)))
    }

    fn sample_record() -> PlaintextRecord {
        PlaintextRecord::new(100.0, 50.0, "renewable_energy", 2024)
    }

    #[test]
    fn test_encode_record_round_trips_each_field() {
        let svc = service();
        let record = sample_record();
        let encoded = svc.encode_record(&record).unwrap();

        for field in RecordField::ALL {
            let decoded = svc.decode_token(encoded.token(field)).unwrap();
            assert_eq!(decoded, record.field_value(field), "field {}", field);
        }
    }

    #[test]
    fn test_tokens_hide_cleartext() {
        let encoded = service().encode_record(&sample_record()).unwrap();
        assert!(!encoded.encrypted_credit_type.contains("renewable"));
        assert!(!encoded.proof.contains("renewable"));
    }

    #[test]
    fn test_same_value_encodes_differently() {
        let svc = service();
        let a = svc.encode_field(&FieldValue::Number(100.0)).unwrap();
        let b = svc.encode_field(&FieldValue::Number(100.0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(svc.decode_token(&a).unwrap(), svc.decode_token(&b).unwrap());
    }

    #[test]
    fn test_payload_carries_timestamp_and_nonce() {
        let svc = service();
        let token = svc.encode_field(&FieldValue::Integer(7)).unwrap();
        let payload = svc.decode_payload(&token).unwrap();
        assert_eq!(payload.value, FieldValue::Integer(7));
        // Seeded clock starts at the epoch
        assert_eq!(payload.timestamp, 0);
        assert!(!payload.nonce.is_empty());
    }

    #[test]
    fn test_verify_each_field_against_its_proof() {
        let svc = service();
        let encoded = svc.encode_record(&sample_record()).unwrap();
        for field in RecordField::ALL {
            assert!(svc.verify_integrity(encoded.token(field), &encoded.proof).unwrap());
            assert!(
                svc.verify_field(field, encoded.token(field), &encoded.proof)
                    .unwrap()
            );
        }
    }

    #[test]
    fn test_verify_fails_for_mutated_record() {
        let svc = service();
        let original = svc.encode_record(&sample_record()).unwrap();

        let mut mutated = sample_record();
        mutated.amount = 101.0;
        let tampered = svc.encode_record(&mutated).unwrap();

        assert!(
            !svc.verify_integrity(&tampered.encrypted_amount, &original.proof)
                .unwrap()
        );
    }

    #[test]
    fn test_verify_field_rejects_token_of_other_field() {
        let svc = service();
        let encoded = svc.encode_record(&sample_record()).unwrap();
        assert!(
            !svc.verify_field(RecordField::Price, &encoded.encrypted_amount, &encoded.proof)
                .unwrap()
        );
    }

    #[test]
    fn test_malformed_proof_is_a_negative_result() {
        let svc = service();
        let encoded = svc.encode_record(&sample_record()).unwrap();
        assert!(!svc.verify_integrity(&encoded.encrypted_amount, "0xzz").unwrap());
        assert!(
            !svc.verify_integrity(&encoded.encrypted_amount, &encoded.encrypted_price)
                .unwrap()
        );
    }

    #[test]
    fn test_malformed_token_is_an_error() {
        let svc = service();
        let encoded = svc.encode_record(&sample_record()).unwrap();
        let result = svc.verify_integrity("not-a-valid-token", &encoded.proof);
        assert!(matches!(result, Err(DecodeError::InvalidHex(_))));
    }

    #[test]
    fn test_non_finite_amount_is_rejected() {
        let mut record = sample_record();
        record.price = f64::INFINITY;
        let err = service().encode_record(&record).unwrap_err();
        assert!(matches!(err, EncodingError::NonFiniteNumber(_)));
    }

    #[test]
    fn test_negative_values_are_encoded() {
        let svc = service();
        let token = svc.encode_field(&FieldValue::Number(-3.5)).unwrap();
        assert_eq!(svc.decode_token(&token).unwrap(), FieldValue::Number(-3.5));
    }

    #[test]
    fn test_trade_fields_verify() {
        let svc = service();
        let trade = svc.encode_trade(1250.0, 45.2).unwrap();
        assert!(svc.verify_integrity(&trade.encrypted_amount, &trade.proof).unwrap());
        assert!(
            svc.verify_field(RecordField::Price, &trade.encrypted_price, &trade.proof)
                .unwrap()
        );
        assert_eq!(
            svc.decode_token(&trade.encrypted_price).unwrap(),
            FieldValue::Number(45.2)
        );
    }

    #[test]
    fn test_proof_embeds_record_digest() {
        let svc = service();
        let record = sample_record();
        let encoded = svc.encode_record(&record).unwrap();
        let proof = svc.decode_proof(&encoded.proof).unwrap();

        assert_eq!(proof.data["creditType"], "renewable_energy");
        assert_eq!(proof.hash, digest_hex(&serde_json::to_value(&record).unwrap()).unwrap());
        assert_eq!(proof.fields.len(), 4);
    }

    #[test]
    fn test_seeded_services_are_reproducible() {
        let a = service().encode_record(&sample_record()).unwrap();
        let b = service().encode_record(&sample_record()).unwrap();
        assert_eq!(a, b);
    }
}
