use redlilium_archive::{
    Archive, ArchiveError, DEFAULT_ROOT_BLOCK, ResourceFormat, load_resource,
    peek_resource_format, save_resource, serialize_optional, serialize_optional_vector,
    serialize_variant_in_block,
};
use redlilium_core::Variant;

#[derive(Debug, Default, Clone, PartialEq)]
struct Light {
    name: String,
    range: f32,
    shadows: bool,
    color: Variant,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Level {
    version: u32,
    seed: u64,
    title: String,
    lights: Vec<Light>,
}

impl Light {
    fn serialize_in_block(&mut self, ar: &mut dyn Archive) -> Result<(), ArchiveError> {
        ar.serialize_string("name", &mut self.name)?;
        ar.serialize_f32("range", &mut self.range)?;
        serialize_optional(ar, "shadows", &mut self.shadows, false, |ar, name, v| {
            ar.serialize_bool(name, v)
        })?;
        ar.begin_unordered_block("color")?;
        serialize_variant_in_block(ar, &mut self.color)?;
        ar.end_block()
    }
}

impl Level {
    fn serialize_in_block(&mut self, ar: &mut dyn Archive) -> Result<(), ArchiveError> {
        ar.serialize_vle("version", &mut self.version)?;
        ar.serialize_u64("seed", &mut self.seed)?;
        ar.serialize_string("title", &mut self.title)?;
        serialize_optional_vector(ar, "lights", "light", &mut self.lights, |ar, light| {
            light.serialize_in_block(ar)
        })
    }
}

fn sample_level() -> Level {
    Level {
        version: 3,
        seed: 0xDEAD_BEEF_0000_0001,
        title: "Caves <&> \"quotes\"".into(),
        lights: vec![
            Light {
                name: "Sun".into(),
                range: 1000.0,
                shadows: true,
                color: Variant::Color([1.0, 0.9, 0.8, 1.0]),
            },
            Light {
                name: "Torch".into(),
                range: 4.5,
                shadows: false,
                color: Variant::None,
            },
        ],
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn round_trip(format: ResourceFormat, level: &Level) -> (Vec<u8>, Level) {
    let mut source = level.clone();
    let bytes = save_resource::<ArchiveError, _>(format, DEFAULT_ROOT_BLOCK, |ar| {
        source.serialize_in_block(ar)
    })
    .unwrap();

    let mut loaded = Level::default();
    load_resource::<ArchiveError, _>(&bytes, DEFAULT_ROOT_BLOCK, |ar| {
        loaded.serialize_in_block(ar)
    })
    .unwrap();
    (bytes, loaded)
}

// ---------------------------------------------------------------------------
// Every format reproduces the same structure
// ---------------------------------------------------------------------------

#[test]
fn level_survives_all_formats() {
    init_logging();
    let level = sample_level();
    for format in [ResourceFormat::Binary, ResourceFormat::Json, ResourceFormat::Xml] {
        let (bytes, loaded) = round_trip(format, &level);
        assert_eq!(peek_resource_format(&bytes), format);
        assert_eq!(loaded, level, "format {format:?}");
    }
}

#[test]
fn infinite_floats_survive_all_formats() {
    init_logging();
    let mut level = sample_level();
    level.lights[0].range = f32::INFINITY;
    level.lights[1].range = f32::NEG_INFINITY;
    level.lights[1].color = Variant::Float(f32::INFINITY);
    for format in [ResourceFormat::Binary, ResourceFormat::Json, ResourceFormat::Xml] {
        let (_, loaded) = round_trip(format, &level);
        assert_eq!(loaded, level, "format {format:?}");
    }
}

#[test]
fn binary_is_smallest() {
    let level = sample_level();
    let (binary, _) = round_trip(ResourceFormat::Binary, &level);
    let (json, _) = round_trip(ResourceFormat::Json, &level);
    let (xml, _) = round_trip(ResourceFormat::Xml, &level);
    assert!(binary.len() < json.len());
    assert!(binary.len() < xml.len());
}

// ---------------------------------------------------------------------------
// Optional elements
// ---------------------------------------------------------------------------

#[test]
fn empty_optional_vector_is_omitted_from_json() {
    let mut level = Level {
        version: 1,
        ..Default::default()
    };
    let bytes = save_resource::<ArchiveError, _>(ResourceFormat::Json, DEFAULT_ROOT_BLOCK, |ar| {
        level.serialize_in_block(ar)
    })
    .unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(doc.get("lights").is_none());
    assert!(doc.get("version").is_some());
}

#[test]
fn missing_optional_elements_read_as_defaults() {
    let text = r#"{
        "version": 2,
        "seed": 5,
        "title": "old file",
        "lights": [ { "name": "Lamp", "range": 2.0, "color": { "type": "None" } } ]
    }"#;
    let mut level = Level::default();
    level.lights.push(Light::default());
    load_resource::<ArchiveError, _>(text.as_bytes(), DEFAULT_ROOT_BLOCK, |ar| {
        level.serialize_in_block(ar)
    })
    .unwrap();

    assert_eq!(level.title, "old file");
    assert_eq!(level.lights.len(), 1);
    assert!(!level.lights[0].shadows);
    assert_eq!(level.lights[0].color, Variant::None);
}

#[test]
fn missing_required_element_is_an_error() {
    let text = r#"<resource version="2" seed="5"/>"#;
    let mut level = Level::default();
    let result = load_resource::<ArchiveError, _>(text.as_bytes(), DEFAULT_ROOT_BLOCK, |ar| {
        level.serialize_in_block(ar)
    });
    assert!(matches!(
        result,
        Err(ArchiveError::ElementNotFound { ref name, .. }) if name == "title"
    ));
}

#[test]
fn truncated_binary_is_an_error() {
    let level = sample_level();
    let (bytes, _) = round_trip(ResourceFormat::Binary, &level);
    let truncated = &bytes[..bytes.len() - 3];

    let mut loaded = Level::default();
    let result = load_resource::<ArchiveError, _>(truncated, DEFAULT_ROOT_BLOCK, |ar| {
        loaded.serialize_in_block(ar)
    });
    assert!(matches!(result, Err(ArchiveError::UnexpectedEof { .. })));
}

#[test]
fn malformed_json_is_an_error() {
    let mut level = Level::default();
    let result = load_resource::<ArchiveError, _>(b"{ \"version\": ", DEFAULT_ROOT_BLOCK, |ar| {
        level.serialize_in_block(ar)
    });
    assert!(matches!(result, Err(ArchiveError::Json(_))));
}

#[test]
fn corrupt_array_count_is_an_error() {
    init_logging();
    let mut level = Level {
        version: 1,
        ..Default::default()
    };
    let mut bytes = save_resource::<ArchiveError, _>(ResourceFormat::Binary, DEFAULT_ROOT_BLOCK, |ar| {
        level.serialize_in_block(ar)
    })
    .unwrap();
    // The light count is the last byte; claim u32::MAX lights instead of none.
    assert_eq!(bytes.pop(), Some(0));
    bytes.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0x0f]);

    let mut loaded = Level::default();
    let result = load_resource::<ArchiveError, _>(&bytes, DEFAULT_ROOT_BLOCK, |ar| {
        loaded.serialize_in_block(ar)
    });
    assert!(matches!(
        result,
        Err(ArchiveError::InvalidValue { ref name, .. }) if name == "lights"
    ));
    assert!(loaded.lights.is_empty());
}

#[test]
fn corrupt_string_vector_count_is_an_error() {
    let mut value = Variant::StringVector(vec!["a".into()]);
    let mut bytes = save_resource::<ArchiveError, _>(ResourceFormat::Binary, DEFAULT_ROOT_BLOCK, |ar| {
        serialize_variant_in_block(ar, &mut value)
    })
    .unwrap();
    // Layout after the magic: type byte, count, then "a" as length + byte.
    let count_at = bytes.len() - 3;
    assert_eq!(bytes[count_at], 1);
    bytes.splice(count_at..=count_at, [0xff, 0xff, 0xff, 0xff, 0x0f]);

    let mut loaded = Variant::None;
    let result = load_resource::<ArchiveError, _>(&bytes, DEFAULT_ROOT_BLOCK, |ar| {
        serialize_variant_in_block(ar, &mut loaded)
    });
    assert!(matches!(result, Err(ArchiveError::InvalidValue { .. })));
}
