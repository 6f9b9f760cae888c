//! Canonical request serialization.
//!
//! Both sides of the exchange must derive the verification hash from
//! byte-identical input, so the request has exactly one serialized form:
//! compact JSON (no whitespace), UTF-8, with keys in the fixed order
//! `HashBack`, `IssuerUrl`, `Now`, `Rounds`, `TypeOfResponse`, `Unus`,
//! `VerifyUrl`. The field declaration order of
//! [`AuthenticationRequest`] pins that order, and the same serialization is
//! used as the POST body to the issuer, so the wire form and the hashed form
//! cannot drift apart.

use crate::{error::HashBackError, request::AuthenticationRequest, Result};

/// Serializes a request into its canonical byte form.
///
/// The output is a deterministic function of the field values alone: the
/// same request always yields identical bytes, on any machine.
///
/// # Errors
///
/// Returns [`HashBackError::InvalidRequest`] if a field value is not
/// representable as JSON. With the current field types this cannot happen in
/// practice, but the contract is kept explicit for callers.
pub fn canonical_bytes(request: &AuthenticationRequest) -> Result<Vec<u8>> {
    serde_json::to_vec(request)
        .map_err(|e| HashBackError::InvalidRequest(format!("request not serializable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ProtocolVersion, ResponseType};

    fn documented_request() -> AuthenticationRequest {
        AuthenticationRequest {
            hash_back: ProtocolVersion::Draft30,
            issuer_url: "https://issuer.example/api/generate_bearer_token".to_owned(),
            now: 529297200,
            rounds: 1,
            type_of_response: ResponseType::BearerToken,
            unus: "iZ5kWQaBRd3EaMtJpC4AS40JzfFgSepLpvPxMTAbt6w=".to_owned(),
            verify_url: "https://caller.example/hashback_files/my_json_hash.txt".to_owned(),
        }
    }

    #[test]
    fn test_canonical_form_matches_documented_example() {
        let bytes = canonical_bytes(&documented_request()).unwrap();
        let expected = concat!(
            "{\"HashBack\":\"HASHBACK-PUBLIC-DRAFT-3-0\",",
            "\"IssuerUrl\":\"https://issuer.example/api/generate_bearer_token\",",
            "\"Now\":529297200,",
            "\"Rounds\":1,",
            "\"TypeOfResponse\":\"BearerToken\",",
            "\"Unus\":\"iZ5kWQaBRd3EaMtJpC4AS40JzfFgSepLpvPxMTAbt6w=\",",
            "\"VerifyUrl\":\"https://caller.example/hashback_files/my_json_hash.txt\"}",
        );
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[test]
    fn test_canonical_form_has_no_whitespace() {
        let bytes = canonical_bytes(&documented_request()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains(' '));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_canonical_form_is_deterministic() {
        let req = documented_request();
        assert_eq!(canonical_bytes(&req).unwrap(), canonical_bytes(&req).unwrap());
        assert_eq!(canonical_bytes(&req).unwrap(), canonical_bytes(&req.clone()).unwrap());
    }

    #[test]
    fn test_canonical_form_survives_wire_round_trip() {
        // A request deserialized from shuffled keys must re-canonicalize to
        // the same bytes the sender hashed.
        let req = documented_request();
        let canonical = canonical_bytes(&req).unwrap();

        let shuffled = format!(
            "{{\"VerifyUrl\":{v},\"Unus\":{u},\"TypeOfResponse\":\"BearerToken\",\
             \"Rounds\":1,\"Now\":529297200,\"IssuerUrl\":{i},\
             \"HashBack\":\"HASHBACK-PUBLIC-DRAFT-3-0\"}}",
            v = serde_json::to_string(&req.verify_url).unwrap(),
            u = serde_json::to_string(&req.unus).unwrap(),
            i = serde_json::to_string(&req.issuer_url).unwrap(),
        );
        let parsed: AuthenticationRequest = serde_json::from_str(&shuffled).unwrap();

        assert_eq!(canonical_bytes(&parsed).unwrap(), canonical);
    }

    #[test]
    fn test_each_field_reaches_canonical_form() {
        let base = canonical_bytes(&documented_request()).unwrap();

        let mut other = documented_request();
        other.hash_back = ProtocolVersion::Draft31;
        assert_ne!(canonical_bytes(&other).unwrap(), base);

        let mut other = documented_request();
        other.issuer_url.push('x');
        assert_ne!(canonical_bytes(&other).unwrap(), base);

        let mut other = documented_request();
        other.now += 1;
        assert_ne!(canonical_bytes(&other).unwrap(), base);

        let mut other = documented_request();
        other.rounds += 1;
        assert_ne!(canonical_bytes(&other).unwrap(), base);

        let mut other = documented_request();
        other.type_of_response = ResponseType::Jwt;
        assert_ne!(canonical_bytes(&other).unwrap(), base);

        let mut other = documented_request();
        other.unus = "TmDFGekvQ+CRgANj9QPZQtBnF077gAc4AeRASFSDXo8=".to_owned();
        assert_ne!(canonical_bytes(&other).unwrap(), base);

        let mut other = documented_request();
        other.verify_url.push('x');
        assert_ne!(canonical_bytes(&other).unwrap(), base);
    }
}
