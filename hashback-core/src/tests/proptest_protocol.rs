use proptest::prelude::*;

use crate::canonical::canonical_bytes;
use crate::hash::verification_hash;
use crate::request::{AuthenticationRequest, ProtocolVersion, ResponseType};

fn arb_version() -> impl Strategy<Value = ProtocolVersion> {
    prop_oneof![Just(ProtocolVersion::Draft30), Just(ProtocolVersion::Draft31)]
}

fn arb_response_type() -> impl Strategy<Value = ResponseType> {
    prop_oneof![
        Just(ResponseType::BearerToken),
        Just(ResponseType::Jwt),
        Just(ResponseType::SetCookie),
    ]
}

prop_compose! {
    fn arb_request()(
        version in arb_version(),
        response_type in arb_response_type(),
        issuer_host in "[a-z][a-z0-9]{2,12}\\.example",
        now in 1_000_000_000i64..2_000_000_000i64,
        rounds in 1u32..=3,
        unus_bytes in any::<[u8; 32]>(),
        verify_path in "[a-z0-9]{1,16}",
    ) -> AuthenticationRequest {
        AuthenticationRequest {
            hash_back: version,
            issuer_url: format!("https://{issuer_host}/issuer"),
            now,
            rounds,
            type_of_response: response_type,
            unus: base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                unus_bytes,
            ),
            verify_url: format!("https://{issuer_host}/hashes?id={verify_path}"),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_hash_is_deterministic(req in arb_request()) {
        let first = verification_hash(&req).unwrap();
        let second = verification_hash(&req.clone()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_canonical_form_round_trips_through_the_wire(req in arb_request()) {
        // Whatever order the issuer receives the keys in, re-canonicalizing
        // the parsed request must reproduce the caller's bytes.
        let canonical = canonical_bytes(&req).unwrap();
        let parsed: AuthenticationRequest = serde_json::from_slice(&canonical).unwrap();
        prop_assert_eq!(canonical_bytes(&parsed).unwrap(), canonical);
        prop_assert_eq!(
            verification_hash(&parsed).unwrap(),
            verification_hash(&req).unwrap()
        );
    }

    #[test]
    fn test_nonce_change_changes_the_hash(
        req in arb_request(),
        other_unus in any::<[u8; 32]>(),
    ) {
        let mut other = req.clone();
        other.unus = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            other_unus,
        );
        prop_assume!(other.unus != req.unus);

        prop_assert_ne!(
            verification_hash(&req).unwrap(),
            verification_hash(&other).unwrap()
        );
    }

    #[test]
    fn test_timestamp_change_changes_the_hash(req in arb_request(), delta in 1i64..100_000) {
        let mut other = req.clone();
        other.now += delta;

        prop_assert_ne!(
            verification_hash(&req).unwrap(),
            verification_hash(&other).unwrap()
        );
    }
}
