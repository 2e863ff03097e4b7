//! Integration tests for decoding keys from SubjectPublicKeyInfo and PKCS#8.

use std::sync::Arc;

use ecx_keymgmt::{
    names, ContainerKind, CurveFamily, DecodeOutcome, Decoder, KeyManager, KeyMgmtError, KeyRef,
    Param, ParamList, ProviderContext, Selection,
};
use pkcs8::der::asn1::{BitStringRef, OctetStringRef};
use pkcs8::der::Encode;
use pkcs8::spki::{AlgorithmIdentifierRef, SubjectPublicKeyInfoRef};
use pkcs8::PrivateKeyInfo;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn algorithm(family: CurveFamily) -> AlgorithmIdentifierRef<'static> {
    AlgorithmIdentifierRef {
        oid: family.descriptor().oid,
        parameters: None,
    }
}

fn encode(value: &impl Encode) -> Vec<u8> {
    let mut buf = [0u8; 256];
    value.encode_to_slice(&mut buf).unwrap().to_vec()
}

fn spki(family: CurveFamily, public: &[u8]) -> Vec<u8> {
    encode(&SubjectPublicKeyInfoRef {
        algorithm: algorithm(family),
        subject_public_key: BitStringRef::from_bytes(public).unwrap(),
    })
}

/// PKCS#8 v1 without `public`, v2 with it embedded.
fn pkcs8_der(family: CurveFamily, private: &[u8], public: Option<&[u8]>) -> Vec<u8> {
    let curve_private_key = encode(&OctetStringRef::new(private).unwrap());
    encode(&PrivateKeyInfo {
        algorithm: algorithm(family),
        private_key: &curve_private_key,
        public_key: public,
    })
}

fn generate(provider: &Arc<ProviderContext>, km: KeyManager, seed: u64) -> KeyRef {
    let mut ctx = km
        .gen_init_with_rng(
            provider,
            Selection::KEYPAIR,
            &ParamList::new(),
            Box::new(StdRng::seed_from_u64(seed)),
        )
        .unwrap();
    km.gen(&mut ctx).unwrap()
}

fn raw_keys(km: KeyManager, key: &KeyRef) -> (Vec<u8>, Vec<u8>) {
    let mut params = ParamList::new()
        .with(Param::octet_buffer(names::PUBLIC_KEY, 64))
        .with(Param::octet_buffer(names::PRIVATE_KEY, 64));
    km.get_params(key, &mut params).unwrap();
    let get = |name: &str| {
        params
            .locate(name)
            .and_then(|p| p.as_octet_string())
            .unwrap()
            .to_vec()
    };
    (get(names::PUBLIC_KEY), get(names::PRIVATE_KEY))
}

fn decode_one(
    decoder: &mut Decoder,
    der: &[u8],
    selection: Selection,
) -> Result<Option<(&'static str, KeyRef)>, KeyMgmtError> {
    let mut decoded = None;
    let outcome = decoder.decode(der, selection, |obj| {
        decoded = Some((obj.data_type, obj.key));
        Ok(())
    })?;
    assert_eq!(outcome == DecodeOutcome::Decoded, decoded.is_some());
    Ok(decoded)
}

#[test]
fn test_public_container_all_families() {
    let provider = ProviderContext::with_defaults();
    for family in CurveFamily::ALL {
        let km = KeyManager::for_family(family);
        let source = generate(&provider, km, 21);
        let (public, _) = raw_keys(km, &source);

        let mut decoder =
            Decoder::new(&provider, family, ContainerKind::SubjectPublicKeyInfo).unwrap();
        let (tag, key) = decode_one(&mut decoder, &spki(family, &public), Selection::PUBLIC_KEY)
            .unwrap()
            .unwrap();

        assert_eq!(tag, km.query_operation_name());
        assert!(km.has(Some(&key), Selection::PUBLIC_KEY));
        assert!(!km.has(Some(&key), Selection::PRIVATE_KEY));
        assert!(km.matches(&source, &key, Selection::PUBLIC_KEY));
    }
}

#[test]
fn test_private_container_all_families() {
    let provider = ProviderContext::with_defaults();
    for family in CurveFamily::ALL {
        let km = KeyManager::for_family(family);
        let source = generate(&provider, km, 22);
        let (public, private) = raw_keys(km, &source);

        let mut decoder = Decoder::new(&provider, family, ContainerKind::PrivateKeyInfo).unwrap();
        let v1 = pkcs8_der(family, &private, None);
        let v2 = pkcs8_der(family, &private, Some(&public));
        for der in [v1, v2] {
            let (tag, key) = decode_one(&mut decoder, &der, Selection::KEYPAIR)
                .unwrap()
                .unwrap();
            assert_eq!(tag, family.as_str());
            assert!(km.has(Some(&key), Selection::KEYPAIR));
            assert!(km.matches(&source, &key, Selection::KEYPAIR), "{family}");
        }
    }
}

#[test]
fn test_inconsistent_embedded_public_is_error() {
    let provider = ProviderContext::with_defaults();
    let km = KeyManager::ed25519();
    let (_, private) = raw_keys(km, &generate(&provider, km, 1));
    let (other_public, _) = raw_keys(km, &generate(&provider, km, 2));

    let mut decoder =
        Decoder::new(&provider, CurveFamily::Ed25519, ContainerKind::PrivateKeyInfo).unwrap();
    let der = pkcs8_der(CurveFamily::Ed25519, &private, Some(&other_public));
    assert!(matches!(
        decode_one(&mut decoder, &der, Selection::KEYPAIR),
        Err(KeyMgmtError::Decode(_))
    ));
    assert_eq!(provider.stats().live_keys(), 0);
}

#[test]
fn test_wrong_length_after_recognition_is_error() {
    let provider = ProviderContext::with_defaults();
    let mut decoder =
        Decoder::new(&provider, CurveFamily::X448, ContainerKind::PrivateKeyInfo).unwrap();
    let der = pkcs8_der(CurveFamily::X448, &[0x42; 32], None);
    assert!(matches!(
        decode_one(&mut decoder, &der, Selection::KEYPAIR),
        Err(KeyMgmtError::Decode(_))
    ));
    assert_eq!(provider.stats().live_keys(), 0);
}

#[test]
fn test_non_matching_inputs() {
    let provider = ProviderContext::with_defaults();
    let mut spki_decoder =
        Decoder::new(&provider, CurveFamily::X25519, ContainerKind::SubjectPublicKeyInfo).unwrap();
    let mut pkcs8_decoder =
        Decoder::new(&provider, CurveFamily::X25519, ContainerKind::PrivateKeyInfo).unwrap();

    let other_family = spki(CurveFamily::Ed25519, &[9u8; 32]);
    let private_container = pkcs8_der(CurveFamily::X25519, &[9u8; 32], None);
    let public_container = spki(CurveFamily::X25519, &[9u8; 32]);

    for input in [
        &b""[..],
        &b"not der"[..],
        other_family.as_slice(),
        private_container.as_slice(),
    ] {
        assert!(decode_one(&mut spki_decoder, input, Selection::PUBLIC_KEY)
            .unwrap()
            .is_none());
    }
    assert!(decode_one(&mut pkcs8_decoder, &public_container, Selection::KEYPAIR)
        .unwrap()
        .is_none());
    assert_eq!(provider.stats().keys_created, 0);
}

#[test]
fn test_export_object_uses_decode_selection() {
    let provider = ProviderContext::with_defaults();
    let km = KeyManager::x25519();
    let (_, private) = raw_keys(km, &generate(&provider, km, 3));

    let mut decoder =
        Decoder::new(&provider, CurveFamily::X25519, ContainerKind::PrivateKeyInfo).unwrap();
    let (_, key) = decode_one(
        &mut decoder,
        &pkcs8_der(CurveFamily::X25519, &private, None),
        Selection::PUBLIC_KEY,
    )
    .unwrap()
    .unwrap();

    let mut exported = Vec::new();
    decoder
        .export_object(&key, |list| {
            exported = list.iter().map(|p| p.name().to_string()).collect();
            Ok(())
        })
        .unwrap();
    assert_eq!(exported, vec![names::PUBLIC_KEY.to_string()]);

    let ed = generate(&provider, KeyManager::ed25519(), 4);
    assert!(decoder.export_object(&ed, |_| Ok(())).is_err());
}
