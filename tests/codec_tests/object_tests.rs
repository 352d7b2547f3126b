//! Object Codec Tests
//!
//! Tests verify:
//! - Round-trips for primitives, records, containers and dynamic values
//! - Null handling
//! - Rejection of truncated, corrupted and mismatched bytes
//! - Unsupported types and size limits

use std::collections::{BTreeMap, HashMap};

use atlascache::codec::{ObjectCodec, Value, FORMAT_VERSION, HEADER_SIZE, MAGIC};
use atlascache::{CacheError, CodecConfig};
use proptest::prelude::*;
use serde::{Deserialize, Serialize, Serializer};

// =============================================================================
// Helper Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: u32,
    sex: u8,
    address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Shape {
    Circle { radius: f64 },
    Rect { w: u32, h: u32 },
    Empty,
}

/// A value whose serialization always fails
struct LiveHandle;

impl Serialize for LiveHandle {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("live resource handles cannot be cached"))
    }
}

/// A sequence whose length is unknown until iterated
struct EvenNumbers(Vec<u32>);

impl Serialize for EvenNumbers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().filter(|n| *n % 2 == 0))
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(u64),
    Text(String),
}

fn sample_user() -> User {
    User {
        name: "小白".to_string(),
        age: 18,
        sex: 0,
        address: "大明湖畔200号".to_string(),
    }
}

fn codec() -> ObjectCodec {
    ObjectCodec::default()
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_round_trip_record() {
    let codec = codec();
    let user = sample_user();

    let bytes = codec.encode(&user).unwrap();
    let decoded: User = codec.decode(&bytes).unwrap();

    assert_eq!(decoded, user);
}

#[test]
fn test_round_trip_string_and_primitives() {
    let codec = codec();

    let s: String = codec.decode(&codec.encode("hello").unwrap()).unwrap();
    assert_eq!(s, "hello");

    let n: i64 = codec.decode(&codec.encode(&-42i64).unwrap()).unwrap();
    assert_eq!(n, -42);

    let f: f64 = codec.decode(&codec.encode(&1.5f64).unwrap()).unwrap();
    assert_eq!(f, 1.5);

    let b: bool = codec.decode(&codec.encode(&true).unwrap()).unwrap();
    assert!(b);
}

#[test]
fn test_round_trip_containers() {
    let codec = codec();

    let mut map = HashMap::new();
    map.insert("a".to_string(), vec![sample_user()]);
    map.insert("b".to_string(), Vec::new());

    let decoded: HashMap<String, Vec<User>> = codec.decode(&codec.encode(&map).unwrap()).unwrap();
    assert_eq!(decoded, map);
}

#[test]
fn test_round_trip_enum_variants() {
    let codec = codec();
    let shapes = vec![
        Shape::Circle { radius: 2.5 },
        Shape::Rect { w: 3, h: 4 },
        Shape::Empty,
    ];

    let decoded: Vec<Shape> = codec.decode(&codec.encode(&shapes).unwrap()).unwrap();
    assert_eq!(decoded, shapes);
}

#[test]
fn test_round_trip_dynamic_value() {
    let codec = codec();

    let mut tags = BTreeMap::new();
    tags.insert("vip".to_string(), Value::Bool(true));

    let value = Value::List(vec![
        Value::Null,
        Value::from(-7),
        Value::from(7u64),
        Value::from(0.25),
        Value::from("text"),
        Value::bytes(vec![0x00, 0xFF]),
        Value::Map(tags),
        Value::record("User", [("name", Value::from("Bai")), ("age", Value::from(18))]),
    ]);

    let decoded: Value = codec.decode(&codec.encode(&value).unwrap()).unwrap();
    assert_eq!(decoded, value);
}

// =============================================================================
// Null Handling Tests
// =============================================================================

#[test]
fn test_none_round_trips_to_none() {
    let codec = codec();

    let bytes = codec.encode(&None::<User>).unwrap();
    assert!(bytes.len() > HEADER_SIZE);

    let decoded: Option<User> = codec.decode(&bytes).unwrap();
    assert_eq!(decoded, None);
}

#[test]
fn test_null_distinct_from_empty_containers() {
    let codec = codec();

    let null = codec.encode(&Value::Null).unwrap();
    let empty_list = codec.encode(&Value::List(Vec::new())).unwrap();
    let empty_map = codec.encode(&Value::Map(BTreeMap::new())).unwrap();

    assert_ne!(null, empty_list);
    assert_ne!(null, empty_map);
    assert_ne!(empty_list, empty_map);

    let decoded: Value = codec.decode(&null).unwrap();
    assert!(decoded.is_null());
}

#[test]
fn test_none_distinct_from_some_empty() {
    let codec = codec();

    let none = codec.encode(&None::<String>).unwrap();
    let some_empty = codec.encode(&Some(String::new())).unwrap();
    assert_ne!(none, some_empty);

    let decoded: Option<String> = codec.decode(&some_empty).unwrap();
    assert_eq!(decoded, Some(String::new()));
}

// =============================================================================
// Decode Error Tests
// =============================================================================

#[test]
fn test_decode_empty_bytes() {
    let result: Result<String, _> = codec().decode(&[]);
    assert!(matches!(result, Err(CacheError::Decode(_))));
}

#[test]
fn test_decode_truncated_header() {
    let codec = codec();
    let bytes = codec.encode(&sample_user()).unwrap();

    let result: Result<User, _> = codec.decode(&bytes[..HEADER_SIZE - 1]);
    assert!(matches!(result, Err(CacheError::Decode(_))));
}

#[test]
fn test_decode_truncated_payload() {
    let codec = codec();
    let bytes = codec.encode(&sample_user()).unwrap();

    let result: Result<User, _> = codec.decode(&bytes[..bytes.len() - 3]);
    assert!(matches!(result, Err(CacheError::Decode(_))));
}

#[test]
fn test_decode_corrupted_payload() {
    let codec = codec();
    let mut bytes = codec.encode(&sample_user()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    let result: Result<User, _> = codec.decode(&bytes);
    match result {
        Err(CacheError::Decode(msg)) => assert!(msg.contains("Checksum")),
        other => panic!("Expected checksum failure, got {:?}", other),
    }
}

#[test]
fn test_decode_foreign_marker() {
    let codec = codec();
    let mut bytes = codec.encode("x").unwrap();
    assert_eq!(bytes[0], MAGIC);
    bytes[0] = b'{';

    let result: Result<String, _> = codec.decode(&bytes);
    assert!(matches!(result, Err(CacheError::Decode(_))));
}

#[test]
fn test_decode_unknown_version() {
    let codec = codec();
    let mut bytes = codec.encode("x").unwrap();
    assert_eq!(bytes[1], FORMAT_VERSION);
    bytes[1] = FORMAT_VERSION + 1;

    let result: Result<String, _> = codec.decode(&bytes);
    match result {
        Err(CacheError::Decode(msg)) => assert!(msg.contains("version")),
        other => panic!("Expected version failure, got {:?}", other),
    }
}

#[test]
fn test_decode_mismatched_type() {
    let codec = codec();

    let bytes = codec.encode("hello").unwrap();
    let as_number: Result<u64, _> = codec.decode(&bytes);
    assert!(matches!(as_number, Err(CacheError::Decode(_))));

    let bytes = codec.encode(&7u8).unwrap();
    let as_user: Result<User, _> = codec.decode(&bytes);
    assert!(matches!(as_user, Err(CacheError::Decode(_))));
}

// =============================================================================
// Unsupported Type Tests
// =============================================================================

#[test]
fn test_encode_failing_serialize_is_unsupported() {
    let result = codec().encode(&LiveHandle);
    match result {
        Err(CacheError::UnsupportedType(msg)) => assert!(msg.contains("live resource")),
        other => panic!("Expected UnsupportedType, got {:?}", other),
    }
}

#[test]
fn test_encode_unknown_length_sequence_is_unsupported() {
    let result = codec().encode(&EvenNumbers(vec![1, 2, 3, 4]));
    assert!(matches!(result, Err(CacheError::UnsupportedType(_))));
}

#[test]
fn test_decode_self_describing_type_is_unsupported() {
    let codec = codec();
    let bytes = codec.encode(&Loose::Number(5)).unwrap();

    let result: Result<Loose, _> = codec.decode(&bytes);
    assert!(matches!(result, Err(CacheError::UnsupportedType(_))));
}

// =============================================================================
// Size Limit Tests
// =============================================================================

#[test]
fn test_encode_over_limit() {
    let codec = ObjectCodec::new(CodecConfig {
        max_value_size: 16,
        ..CodecConfig::default()
    });

    let result = codec.encode(&vec![1u8; 100]);
    match result {
        Err(CacheError::ValueTooLarge { size, limit }) => {
            assert!(size > 16);
            assert_eq!(limit, 16);
        }
        other => panic!("Expected ValueTooLarge, got {:?}", other),
    }

    // The engine is still usable afterwards
    let ok: Vec<u8> = codec.decode(&codec.encode(&vec![1u8; 4]).unwrap()).unwrap();
    assert_eq!(ok, vec![1u8; 4]);
}

#[test]
fn test_decode_over_limit() {
    let large = ObjectCodec::default().encode(&vec![1u8; 100]).unwrap();
    let small = ObjectCodec::new(CodecConfig {
        max_value_size: 16,
        ..CodecConfig::default()
    });

    let result: Result<Vec<u8>, _> = small.decode(&large);
    assert!(matches!(result, Err(CacheError::Decode(_))));
}

// =============================================================================
// Engine Reuse Tests
// =============================================================================

#[test]
fn test_engines_are_reused() {
    let codec = ObjectCodec::new(CodecConfig {
        engine_pool_capacity: 2,
        engine_prewarm: 1,
        ..CodecConfig::default()
    });
    assert_eq!(codec.idle_engines(), 1);
    assert_eq!(codec.engines_created(), 1);

    for i in 0..100u32 {
        let n: u32 = codec.decode(&codec.encode(&i).unwrap()).unwrap();
        assert_eq!(n, i);
    }

    // Sequential use never needs a second engine
    assert_eq!(codec.engines_created(), 1);
    assert_eq!(codec.idle_engines(), 1);
}

#[test]
fn test_encode_with_lends_frame() {
    let codec = codec();
    let owned = codec.encode(&sample_user()).unwrap();

    let lent_len = codec
        .encode_with(&sample_user(), |bytes| {
            assert_eq!(bytes, owned.as_slice());
            bytes.len()
        })
        .unwrap();

    assert_eq!(lent_len, owned.len());
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn prop_round_trip_tuples(
        name in ".*",
        age in any::<u32>(),
        scores in proptest::collection::vec(any::<i64>(), 0..32),
        flag in any::<Option<bool>>(),
    ) {
        let codec = ObjectCodec::default();
        let value = (name, age, scores, flag);

        let decoded: (String, u32, Vec<i64>, Option<bool>) =
            codec.decode(&codec.encode(&value).unwrap()).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn prop_round_trip_string_maps(
        map in proptest::collection::btree_map(".{0,8}", ".{0,16}", 0..16),
    ) {
        let codec = ObjectCodec::default();
        let decoded: BTreeMap<String, String> =
            codec.decode(&codec.encode(&map).unwrap()).unwrap();
        prop_assert_eq!(decoded, map);
    }

    #[test]
    fn prop_single_byte_corruption_detected(
        payload in proptest::collection::vec(any::<u8>(), 1..64),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let codec = ObjectCodec::default();
        let mut bytes = codec.encode(&payload).unwrap();
        let i = HEADER_SIZE + index.index(bytes.len() - HEADER_SIZE);
        bytes[i] ^= flip;

        let result: Result<Vec<u8>, _> = codec.decode(&bytes);
        prop_assert!(matches!(result, Err(CacheError::Decode(_))));
    }
}
