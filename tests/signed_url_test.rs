//! End-to-end signing and verification of URLs.

mod common;

use chrono::Duration;
use common::fixtures::{self, signing_time, CONFIRM_BASE, SECRET};
use hmac_url::models::{FieldValue, FIELD_HMAC_TIMESTAMP, FIELD_HMAC_TTL};
use hmac_url::services::canonical::{self, Delimiters};
use hmac_url::{Charset, ExpiryReason, FieldError, HmacAlgorithm, HmacError, SignedUrl};
use pretty_assertions::assert_eq;

fn sign(pairs: &[(&str, &str)]) -> String {
    SignedUrl::builder()
        .secret(SECRET)
        .algorithm(HmacAlgorithm::HmacSha256)
        .base(CONFIRM_BASE)
        .fields(fixtures::fields(pairs))
        .build()
        .unwrap()
        .calculate_url()
        .unwrap()
}

#[test]
fn test_worked_example() {
    let url = sign(&[("uid", "42")]);

    assert!(url.starts_with("https://x.test/confirm/?hmac="));
    common::assert_query_names(&url, &["hmac", "uid"]);
    assert!(url.ends_with("&uid=42"));
    common::assert_clean_query(&url);

    assert!(fixtures::verifier().validate_url(&url, true).unwrap());

    let tampered = url.replace("uid=42", "uid=43");
    assert!(!fixtures::verifier().validate_url(&tampered, true).unwrap());
}

#[test]
fn test_worked_example_mac_value() {
    let url = sign(&[("uid", "42")]);
    let (_, hmac) = common::query_items(&url).into_iter().next().unwrap();

    let expected = hmac_url::services::mac::sign(
        &SECRET.into(),
        Charset::Utf8,
        HmacAlgorithm::HmacSha256,
        "uid=42",
    )
    .unwrap();
    assert_eq!(hmac, canonical::encode_component(&expected, Charset::Utf8).unwrap());
}

#[test]
fn test_query_is_sorted_regardless_of_insertion_order() {
    let a = sign(&[("zeta", "1"), ("alpha", "2"), ("mid", "3")]);
    let b = sign(&[("mid", "3"), ("zeta", "1"), ("alpha", "2")]);

    assert_eq!(a, b);
    common::assert_query_names(&a, &["alpha", "hmac", "mid", "zeta"]);
}

#[test]
fn test_every_field_mutation_is_detected() {
    let url = SignedUrl::builder()
        .secret(SECRET)
        .base(CONFIRM_BASE)
        .field("uid", "42")
        .field("purpose", "confirm")
        .timestamp(signing_time())
        .time_to_live(3600)
        .build()
        .unwrap()
        .calculate_url()
        .unwrap();
    let now = signing_time() + Duration::seconds(10);

    assert!(fixtures::verifier().validate_url_at(&url, true, now).unwrap());

    for (from, to) in [
        ("uid=42", "uid=420"),
        ("purpose=confirm", "purpose=delete"),
        ("hmac-ttl=3600", "hmac-ttl=36000"),
        ("hmac-ts=20240601120000", "hmac-ts=20240601130000"),
    ] {
        let tampered = url.replace(from, to);
        assert_ne!(tampered, url);
        assert!(
            !fixtures::verifier().validate_url_at(&tampered, true, now).unwrap(),
            "tampering {from} -> {to} went unnoticed"
        );
    }
}

#[test]
fn test_added_field_is_detected() {
    let url = sign(&[("uid", "42")]);
    let extended = format!("{url}&role=admin");

    assert!(!fixtures::verifier().validate_url(&extended, true).unwrap());
}

#[test]
fn test_wrong_algorithm_is_mismatch() {
    let url = sign(&[("uid", "42")]);
    let mut checker = SignedUrl::builder()
        .secret(SECRET)
        .algorithm(HmacAlgorithm::HmacSha1)
        .build()
        .unwrap();

    assert!(!checker.validate_url(&url, true).unwrap());
}

#[test]
fn test_expiry_boundary_is_inclusive() {
    let url = SignedUrl::builder()
        .secret(SECRET)
        .base(CONFIRM_BASE)
        .field("uid", "42")
        .timestamp(signing_time())
        .time_to_live(30)
        .build()
        .unwrap()
        .calculate_url()
        .unwrap();

    let last_valid = signing_time() + Duration::milliseconds(30 * 1000 - 1);
    let first_expired = signing_time() + Duration::milliseconds(30 * 1000);

    assert!(fixtures::verifier().validate_url_at(&url, true, last_valid).unwrap());
    assert!(!fixtures::verifier().validate_url_at(&url, false, first_expired).unwrap());
    assert!(matches!(
        fixtures::verifier().validate_url_at(&url, true, first_expired),
        Err(HmacError::UrlExpired(ExpiryReason::Elapsed))
    ));
}

#[test]
fn test_default_timestamp_round_trips() {
    let url = SignedUrl::builder()
        .secret(SECRET)
        .base(CONFIRM_BASE)
        .field("uid", "42")
        .time_to_live(3600)
        .build()
        .unwrap()
        .calculate_url()
        .unwrap();

    let mut checker = fixtures::verifier();
    assert!(checker.validate_url(&url, true).unwrap());
    assert!(checker.timestamp().is_some());
    assert_eq!(checker.field(FIELD_HMAC_TTL), Some(FieldValue::Integer(3600)));
}

#[test]
fn test_expired_url_with_tampering_is_plain_mismatch() {
    // MAC is checked before expiry, so a forged URL never reports "expired"
    let url = SignedUrl::builder()
        .secret(SECRET)
        .field("uid", "42")
        .timestamp(signing_time())
        .time_to_live(1)
        .build()
        .unwrap()
        .calculate_url()
        .unwrap();
    let tampered = url.replace("uid=42", "uid=1");
    let much_later = signing_time() + Duration::days(30);

    assert!(!fixtures::verifier()
        .validate_url_at(&tampered, true, much_later)
        .unwrap());
}

#[test]
fn test_ttl_without_timestamp_is_reported_as_expired() {
    // The timestamp is excepted from the MAC and dropped from the URL, so the
    // MAC matches but the time-to-live cannot be evaluated. This is reported
    // as an expiry, not as a field error.
    let url = SignedUrl::builder()
        .secret(SECRET)
        .field("uid", "42")
        .timestamp(signing_time())
        .time_to_live(3600)
        .excepted_field(FIELD_HMAC_TIMESTAMP)
        .build()
        .unwrap()
        .calculate_url()
        .unwrap()
        .replace("&hmac-ts=20240601120000", "");

    let checker = || {
        SignedUrl::builder()
            .secret(SECRET)
            .excepted_field(FIELD_HMAC_TIMESTAMP)
            .build()
            .unwrap()
    };

    assert!(matches!(
        checker().validate_url(&url, true),
        Err(HmacError::UrlExpired(ExpiryReason::MissingTimestamp))
    ));
    assert!(!checker().validate_url(&url, false).unwrap());
}

#[test]
fn test_url_without_query_is_field_error() {
    for url in ["https://x.test/confirm", "", "https://x.test/#frag"] {
        let result = fixtures::verifier().validate_url(url, false);
        assert!(
            matches!(result, Err(HmacError::Field(FieldError::MissingQuery))),
            "{url:?} gave {result:?}"
        );
    }
}

#[test]
fn test_fragment_and_special_characters() {
    let mut signer = SignedUrl::builder()
        .secret(SECRET)
        .base("https://x.test/confirm/")
        .fragment("#step-2")
        .field("email", "zoë+test@example.com")
        .field("next", "/account?tab=security&x=1#top")
        .build()
        .unwrap();
    let url = signer.calculate_url().unwrap();

    assert!(url.starts_with("https://x.test/confirm/?"));
    assert!(url.ends_with("#step-2"));
    assert_eq!(url.matches('#').count(), 1);

    let mut checker = fixtures::verifier();
    assert!(checker.validate_url(&url, true).unwrap());
    assert_eq!(checker.fragment(), "step-2");
    assert_eq!(
        checker.field("next"),
        Some(FieldValue::from("/account?tab=security&x=1#top"))
    );
    assert_eq!(
        checker.field("email"),
        Some(FieldValue::from("zoë+test@example.com"))
    );
}

#[test]
fn test_extract_fields_skips_verification() {
    let url = sign(&[("uid", "42")]).replace("uid=42", "uid=43");
    let fields = fixtures::verifier().extract_fields_from_url(&url).unwrap();

    assert_eq!(fields.get("uid"), Some(&FieldValue::from("43")));
}

#[test]
fn test_canonical_round_trip_for_text_maps() {
    let original = fixtures::fields(&[
        ("a", "1"),
        ("space name", "space value"),
        ("unicode", "日本語"),
        ("symbols", "!@#$%^&*()=+[]{}"),
    ]);
    let raw = canonical::serialize(
        &original,
        Charset::Utf8,
        Delimiters::URL,
        &Default::default(),
    )
    .unwrap();

    assert_eq!(
        canonical::deserialize(&raw, Charset::Utf8, Delimiters::URL).unwrap(),
        original
    );
}
