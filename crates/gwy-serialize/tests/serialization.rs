// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Object round trips, golden bytes and rejection of malformed blobs.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

mod common;

use common::{blob32, header, legacy_header, registry, SerTest, Tagged};
use gwy_serialize::{
    deserialize, deserialize_file, downcast, serialize, serialize_file, struct_size,
    AssignError, ComponentType, Container, DeserializeError, Item, Rgba, Serializable, SizeMode,
    Surface, Unit, Warning,
};

fn full_ser_test() -> SerTest {
    SerTest {
        flag: true,
        data: vec![1.0, -2.5, f64::MAX],
        s: Some("Hello, world!".into()),
        raw: [1, 2, 3, 4],
        child: Some(Box::new(SerTest {
            i64: -1,
            ss: vec!["a".into(), String::new(), "ccc".into()],
            ..SerTest::default()
        })),
        dbl: 0.125,
        i16: -1234,
        i32: 0x1234_5678,
        i64: i64::MIN,
        ss: vec!["one".into(), "two".into()],
    }
}

#[test]
fn simple_object_golden_bytes_u64() {
    let bytes = serialize(&SerTest::default(), SizeMode::U64).unwrap();
    let mut expected = b"GwySerTest\0".to_vec();
    expected.extend_from_slice(&0x11u64.to_le_bytes());
    expected.extend_from_slice(b"raw\0C");
    expected.extend_from_slice(&4u64.to_le_bytes());
    expected.extend_from_slice(&[0, 0, 0, 0]);
    assert_eq!(bytes, expected);
    assert_eq!(bytes.len(), 36);
}

#[test]
fn simple_object_golden_bytes_u32() {
    let object = SerTest {
        raw: [9, 8, 7, 6],
        ..SerTest::default()
    };
    let bytes = serialize(&object, SizeMode::U32).unwrap();
    let mut expected = b"GwySerTest\0\x0d\0\0\0raw\0C\x04\0\0\0".to_vec();
    expected.extend_from_slice(&[9, 8, 7, 6]);
    assert_eq!(bytes, expected);
    assert_eq!(
        struct_size("GwySerTest", &object.components(), SizeMode::U32),
        28
    );
}

#[test]
fn every_component_type_round_trips() {
    let registry = registry();
    let original = full_ser_test();
    for mode in [SizeMode::U32, SizeMode::U64] {
        let bytes = serialize(&original, mode).unwrap();
        let (back, warnings) = deserialize(&bytes, mode, &registry)
            .unwrap()
            .downcast::<SerTest>()
            .unwrap();
        assert_eq!(back, original);
        assert!(warnings.is_empty());
    }
}

#[test]
fn surface_round_trips_at_several_lengths() {
    let registry = registry();
    for n in [1usize, 7, 1025] {
        let mut surface = Surface::new();
        for k in 0..n {
            let t = k as f64;
            surface.push(t, -t, t * t);
        }
        surface.xyunit = Unit::symbol("m");
        surface.zunit = Unit::from_parts([("A", 1), ("s", -2)]);
        surface.name = Some(format!("points {n}"));

        let bytes = serialize_file(&surface, SizeMode::U32).unwrap();
        assert_eq!(&bytes[..4], b"GWYP");
        let (back, warnings) = deserialize_file(&bytes, &registry)
            .unwrap()
            .downcast::<Surface>()
            .unwrap();
        assert_eq!(back.len(), n);
        assert_eq!(back, surface);
        assert!(warnings.is_empty());
    }
}

#[test]
fn surface_data_not_multiple_of_three_is_rejected() {
    let mut body = header("data", b'D');
    body.extend_from_slice(&5u32.to_le_bytes());
    for v in [1.0f64, 2.0, 3.0, 4.0, 5.0] {
        body.extend_from_slice(&v.to_le_bytes());
    }
    let bytes = blob32("GwySurface", &body);
    let err = deserialize(&bytes, SizeMode::U32, &registry()).unwrap_err();
    assert!(matches!(
        err,
        DeserializeError::LengthNotMultiple { len: 5, stride: 3, .. }
    ));
    assert_eq!(
        err.to_string(),
        "Data length of GwySurface is 5 which is not a multiple of 3"
    );
}

#[test]
fn duplicate_component_is_rejected() {
    let mut body = header("i32", b'i');
    body.extend_from_slice(&7i32.to_le_bytes());
    body.extend_from_slice(&header("i32", b'i'));
    body.extend_from_slice(&8i32.to_le_bytes());
    let bytes = blob32("GwySerTest", &body);
    let err = deserialize(&bytes, SizeMode::U32, &registry()).unwrap_err();
    assert_eq!(
        err,
        DeserializeError::DuplicateComponent {
            position: 24,
            type_name: "GwySerTest".into(),
            component: "i32".into(),
        }
    );
}

#[test]
fn unknown_component_is_skipped_with_warning() {
    let mut body = header("extra", b'q');
    body.extend_from_slice(&99i64.to_le_bytes());
    body.extend_from_slice(&header("i32", b'i'));
    body.extend_from_slice(&5i32.to_le_bytes());
    let bytes = blob32("GwySerTest", &body);
    let deserialized = deserialize(&bytes, SizeMode::U32, &registry()).unwrap();
    let (object, warnings) = deserialized.downcast::<SerTest>().unwrap();
    assert_eq!(object.i32, 5);
    assert_eq!(
        warnings,
        [Warning::UnknownComponent {
            position: 15,
            type_name: "GwySerTest".into(),
            component: "extra".into(),
            ctype: ComponentType::Int64,
        }]
    );
}

#[test]
fn unknown_nested_object_of_unregistered_type_is_skipped() {
    let mut nested_body = header("x", b'c');
    nested_body.push(7);
    let nested = blob32("NoSuchType", &nested_body);
    let mut body = header("mystery", b'o');
    body.extend_from_slice(&nested);
    let bytes = blob32("GwySerTest", &body);
    let deserialized = deserialize(&bytes, SizeMode::U32, &registry()).unwrap();
    assert_eq!(deserialized.warnings.len(), 1);
    assert_eq!(deserialized.object.type_name(), "GwySerTest");
}

#[test]
fn known_component_with_other_type_is_skipped_with_warning() {
    let mut body = header("i32", b'd');
    body.extend_from_slice(&1.0f64.to_le_bytes());
    body.extend_from_slice(&header("i16", b'h'));
    body.extend_from_slice(&(-3i16).to_le_bytes());
    let bytes = blob32("GwySerTest", &body);
    let (object, warnings) = deserialize(&bytes, SizeMode::U32, &registry())
        .unwrap()
        .downcast::<SerTest>()
        .unwrap();
    assert_eq!(object.i32, 0);
    assert_eq!(object.i16, -3);
    assert_eq!(
        warnings,
        [Warning::UnknownComponent {
            position: 15,
            type_name: "GwySerTest".into(),
            component: "i32".into(),
            ctype: ComponentType::Double,
        }]
    );
}

#[test]
fn surface_name_of_other_type_is_ignored() {
    let mut body = header("name", b'i');
    body.extend_from_slice(&7i32.to_le_bytes());
    body.extend_from_slice(&header("data", b'D'));
    body.extend_from_slice(&3u32.to_le_bytes());
    for v in [1.0f64, 2.0, 3.0] {
        body.extend_from_slice(&v.to_le_bytes());
    }
    let bytes = blob32("GwySurface", &body);
    let (surface, warnings) = deserialize(&bytes, SizeMode::U32, &registry())
        .unwrap()
        .downcast::<Surface>()
        .unwrap();
    assert_eq!(surface, Surface::from_points(&[[1.0, 2.0, 3.0]]));
    assert!(matches!(
        warnings.as_slice(),
        [Warning::UnknownComponent { position: 15, ctype: ComponentType::Int32, .. }]
    ));
}

#[test]
fn unknown_type_tag_is_fatal() {
    let mut body = header("i32", b'z');
    body.extend_from_slice(&[0; 4]);
    let bytes = blob32("GwySerTest", &body);
    let err = deserialize(&bytes, SizeMode::U32, &registry()).unwrap_err();
    assert_eq!(
        err,
        DeserializeError::UnknownTypeTag {
            position: 19,
            tag: u32::from(b'z')
        }
    );
}

#[test]
fn wrong_raw_length_is_fixed_length_error() {
    let mut body = header("raw", b'C');
    body.extend_from_slice(&3u32.to_le_bytes());
    body.extend_from_slice(&[1, 2, 3]);
    let bytes = blob32("GwySerTest", &body);
    let err = deserialize(&bytes, SizeMode::U32, &registry()).unwrap_err();
    assert!(matches!(
        err,
        DeserializeError::FixedLength {
            expected: 4,
            found: 3,
            ..
        }
    ));
}

#[test]
fn unit_co_arrays_must_match() {
    let mut body = header("units", b'S');
    body.extend_from_slice(&2u32.to_le_bytes());
    body.extend_from_slice(b"m\0s\0");
    body.extend_from_slice(&header("powers", b'I'));
    body.extend_from_slice(&1u32.to_le_bytes());
    body.extend_from_slice(&2i32.to_le_bytes());
    let bytes = blob32("GwyUnit", &body);
    let err = deserialize(&bytes, SizeMode::U32, &registry()).unwrap_err();
    assert!(matches!(
        err,
        DeserializeError::LengthMismatch {
            first_len: 2,
            second_len: 1,
            ..
        }
    ));
}

#[test]
fn unit_powers_are_clamped_on_read() {
    let mut body = header("units", b'S');
    body.extend_from_slice(&2u32.to_le_bytes());
    body.extend_from_slice(b"m\0m\0");
    body.extend_from_slice(&header("powers", b'I'));
    body.extend_from_slice(&2u32.to_le_bytes());
    body.extend_from_slice(&20i32.to_le_bytes());
    body.extend_from_slice(&(-3i32).to_le_bytes());
    let bytes = blob32("GwyUnit", &body);
    let (unit, _) = deserialize(&bytes, SizeMode::U32, &registry())
        .unwrap()
        .downcast::<Unit>()
        .unwrap();
    assert_eq!(unit.to_string(), "m^9");
}

#[test]
fn nested_object_of_wrong_type_is_rejected() {
    let mut body = header("xyunit", b'o');
    body.extend_from_slice(&serialize(&Surface::new(), SizeMode::U32).unwrap());
    let bytes = blob32("GwySurface", &body);
    let err = deserialize(&bytes, SizeMode::U32, &registry()).unwrap_err();
    assert_eq!(
        err,
        DeserializeError::TypeNameMismatch {
            position: 23,
            expected: "GwyUnit".into(),
            found: "GwySurface".into(),
        }
    );
}

#[test]
fn object_in_boxed_value_warns_but_decodes() {
    let tagged = Tagged {
        unit: Unit::symbol("K"),
    };
    let bytes = serialize(&tagged, SizeMode::U32).unwrap();
    let (back, warnings) = deserialize(&bytes, SizeMode::U32, &registry())
        .unwrap()
        .downcast::<Tagged>()
        .unwrap();
    assert_eq!(back, tagged);
    assert_eq!(
        warnings,
        [Warning::ObjectInBoxed {
            position: 24,
            boxed_type: "GwyTestTagged".into(),
        }]
    );
}

#[test]
fn trailing_bytes_after_root_warn() {
    let mut bytes = serialize(&SerTest::default(), SizeMode::U32).unwrap();
    bytes.extend_from_slice(&[1, 2, 3]);
    let deserialized = deserialize(&bytes, SizeMode::U32, &registry()).unwrap();
    assert_eq!(
        deserialized.warnings,
        [Warning::TrailingData {
            position: 28,
            len: 3
        }]
    );
}

#[test]
fn every_truncation_of_a_valid_blob_fails_cleanly() {
    let bytes = serialize(&full_ser_test(), SizeMode::U32).unwrap();
    let registry = registry();
    for len in 0..bytes.len() {
        assert!(
            deserialize(&bytes[..len], SizeMode::U32, &registry).is_err(),
            "prefix of {len} bytes"
        );
    }
}

#[test]
fn legacy_file_decodes() {
    let mut child_body = legacy_header("i64", 40);
    child_body.extend_from_slice(&77i64.to_le_bytes());

    let mut body = legacy_header("flag", 20);
    body.push(1);
    body.extend_from_slice(&legacy_header("i32", 24));
    body.extend_from_slice(&(-9i32).to_le_bytes());
    body.extend_from_slice(&legacy_header("dbl", 60));
    body.extend_from_slice(&0.25f64.to_le_bytes());
    body.extend_from_slice(&legacy_header("s", 64));
    body.extend_from_slice(b"old\0");
    body.extend_from_slice(&legacy_header("child", 80));
    body.extend_from_slice(&blob32("GwySerTest", &child_body));

    let mut file = b"GWYO".to_vec();
    file.extend_from_slice(&blob32("GwySerTest", &body));

    let (object, warnings) = deserialize_file(&file, &registry())
        .unwrap()
        .downcast::<SerTest>()
        .unwrap();
    assert!(warnings.is_empty());
    let expected = SerTest {
        flag: true,
        i32: -9,
        dbl: 0.25,
        s: Some("old".into()),
        child: Some(Box::new(SerTest {
            i64: 77,
            ..SerTest::default()
        })),
        ..SerTest::default()
    };
    assert_eq!(object, expected);
}

#[test]
fn legacy_unknown_type_code_is_fatal() {
    let mut body = legacy_header("i32", 28);
    body.extend_from_slice(&[0; 4]);
    let mut file = b"GWYO".to_vec();
    file.extend_from_slice(&blob32("GwySerTest", &body));
    let err = deserialize_file(&file, &registry()).unwrap_err();
    assert_eq!(err, DeserializeError::UnknownTypeTag { position: 23, tag: 28 });
}

#[test]
fn bad_magic_is_rejected() {
    let err = deserialize_file(b"GWYX\0\0", &registry()).unwrap_err();
    assert_eq!(
        err,
        DeserializeError::BadMagic {
            found: b"GWYX".to_vec()
        }
    );
    assert!(matches!(
        deserialize_file(b"GW", &registry()),
        Err(DeserializeError::BadMagic { .. })
    ));
}

#[test]
fn quad_files_carry_their_magic() {
    let object = full_ser_test();
    let bytes = serialize_file(&object, SizeMode::U64).unwrap();
    assert_eq!(&bytes[..4], b"GWYQ");
    let (back, _) = deserialize_file(&bytes, &registry())
        .unwrap()
        .downcast::<SerTest>()
        .unwrap();
    assert_eq!(back, object);
}

#[test]
fn assign_copies_state_or_refuses_other_types() {
    let source = full_ser_test();
    let mut dest = SerTest::default();
    dest.assign(&source).unwrap();
    assert_eq!(dest, source);

    let err = dest.assign(&Surface::new()).unwrap_err();
    assert_eq!(
        err,
        AssignError::TypeMismatch {
            expected: "GwySerTest",
            found: "GwySurface"
        }
    );
    assert_eq!(dest, source);
}

#[test]
fn duplicate_is_a_deep_copy() {
    let source = full_ser_test();
    let mut copy = downcast::<SerTest>(source.duplicate()).unwrap();
    assert_eq!(copy, source);

    if let Some(child) = copy.child.as_mut() {
        child.i64 = 5;
    }
    assert_eq!(source.child.as_ref().unwrap().i64, -1);
    assert!(downcast::<Surface>(source.duplicate()).is_none());
}

#[test]
fn container_round_trips_mixed_items() {
    let mut container = Container::new();
    container.set("/0/data/title", Item::String("Topography".into()));
    container.set("/0/base/min", Item::Double(-1.5e-9));
    container.set("/0/visible", Item::Boolean(true));
    container.set("/counter", Item::Int64(1 << 40));
    container.set_object("/0/mask", Rgba::new(1.0, 0.0, 0.0, 0.5));
    container.set_object("/surface/0", Surface::from_points(&[[1.0, 2.0, 3.0]]));

    let bytes = serialize_file(&container, SizeMode::U32).unwrap();
    let (back, warnings) = deserialize_file(&bytes, &registry())
        .unwrap()
        .downcast::<Container>()
        .unwrap();
    assert!(warnings.is_empty());
    assert_eq!(back.len(), 6);
    assert_eq!(back.get_string("/0/data/title"), Some("Topography"));
    assert_eq!(back.get_double("/0/base/min"), Some(-1.5e-9));
    assert!(matches!(back.get("/0/visible"), Some(Item::Boolean(true))));
    assert!(matches!(back.get("/counter"), Some(Item::Int64(v)) if *v == 1 << 40));
    assert!(matches!(back.get("/0/mask"), Some(Item::Boxed(_))));
    assert_eq!(
        back.get_object::<Rgba>("/0/mask"),
        Some(&Rgba::new(1.0, 0.0, 0.0, 0.5))
    );
    assert_eq!(
        back.get_object::<Surface>("/surface/0").map(Surface::len),
        Some(1)
    );
    assert_eq!(back.keys().collect::<Vec<_>>(), container.keys().collect::<Vec<_>>());
}

#[test]
fn container_drops_unsupported_items_with_warning() {
    let mut body = header("/b", b'd');
    body.extend_from_slice(&2.0f64.to_le_bytes());
    body.extend_from_slice(&header("/a", b'h'));
    body.extend_from_slice(&3i16.to_le_bytes());
    let bytes = blob32("GwyContainer", &body);
    let (container, warnings) = deserialize(&bytes, SizeMode::U32, &registry())
        .unwrap()
        .downcast::<Container>()
        .unwrap();
    assert_eq!(container.len(), 1);
    assert_eq!(container.get_double("/b"), Some(2.0));
    assert!(matches!(
        warnings.as_slice(),
        [Warning::UnknownComponent { position: 29, component, ctype: ComponentType::Int16, .. }]
            if component == "/a"
    ));
}

#[test]
fn large_container_decodes_and_still_rejects_duplicates() {
    let mut container = Container::new();
    for k in 0..50_000 {
        container.set(format!("/{k}/data"), Item::Int32(k));
    }
    let bytes = serialize(&container, SizeMode::U32).unwrap();
    let (back, warnings) = deserialize(&bytes, SizeMode::U32, &registry())
        .unwrap()
        .downcast::<Container>()
        .unwrap();
    assert!(warnings.is_empty());
    assert_eq!(back.len(), 50_000);
    assert!(matches!(back.get("/49999/data"), Some(Item::Int32(49_999))));

    let mut body = Vec::new();
    for key in ["/x", "/y", "/x"] {
        body.extend_from_slice(&header(key, b'i'));
        body.extend_from_slice(&1i32.to_le_bytes());
    }
    let bytes = blob32("GwyContainer", &body);
    let err = deserialize(&bytes, SizeMode::U32, &registry()).unwrap_err();
    assert!(matches!(err, DeserializeError::DuplicateComponent { position: 33, .. }));
}

#[test]
fn boxed_value_stored_as_object_is_rejected() {
    let mut body = header("/c", b'o');
    body.extend_from_slice(&serialize(&Rgba::default(), SizeMode::U32).unwrap());
    let bytes = blob32("GwyContainer", &body);
    let err = deserialize(&bytes, SizeMode::U32, &registry()).unwrap_err();
    assert_eq!(
        err,
        DeserializeError::KindMismatch {
            position: 21,
            type_name: "GwyRGBA".into(),
            boxed: true,
        }
    );
}

#[test]
fn colours_are_clamped_on_read() {
    let wild = Rgba {
        r: 1.5,
        g: -0.5,
        b: f64::NAN,
        a: 0.25,
    };
    let bytes = serialize(&wild, SizeMode::U64).unwrap();
    let (colour, _) = deserialize(&bytes, SizeMode::U64, &registry())
        .unwrap()
        .downcast::<Rgba>()
        .unwrap();
    assert_eq!(colour, Rgba::new(1.0, 0.0, 0.0, 0.25));
}
