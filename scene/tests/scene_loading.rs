mod common;

use common::{BLUE, TestComponent, init_logging, make_test_prefab};
use redlilium_archive::{ArchiveError, ResourceFormat, peek_resource_format};
use redlilium_scene::{
    NodeId, NodePrefab, PrefabLoadFlags, PrefabSaveFlags, Scene, SceneError, Serializable,
    SerializationSettings,
};

fn test_scene() -> (Scene, NodeId) {
    let mut scene = Scene::new();
    scene.register::<TestComponent>();
    let root = scene.root();
    let node = scene
        .instantiate_prefab(root, &make_test_prefab(), PrefabLoadFlags::empty())
        .unwrap();
    (scene, node)
}

fn normalized(scene: &Scene, node: NodeId) -> NodePrefab {
    let mut prefab = scene
        .generate_prefab(node, PrefabSaveFlags::ENUMS_AS_STRINGS)
        .unwrap();
    prefab.normalize_ids();
    prefab
}

const SETTINGS: [&str; 4] = [
    r#"format = "binary""#,
    r#"
    format = "binary"
    compact_attribute_names = true
    enums_as_strings = false
    "#,
    r#"
    format = "json"
    compact_type_names = true
    save_default_values = true
    "#,
    r#"
    format = "xml"
    compact_attribute_names = true
    "#,
];

#[test]
fn scene_survives_every_configured_format() {
    init_logging();
    let (scene, node) = test_scene();
    let expected = normalized(&scene, node);

    for text in SETTINGS {
        let settings = SerializationSettings::from_toml_str(text).unwrap();
        let bytes = scene.save_to_bytes(node, &settings).unwrap();
        assert_eq!(peek_resource_format(&bytes), settings.format);

        let mut loaded = Scene::new();
        loaded.register::<TestComponent>();
        let root = loaded.root();
        loaded
            .load_from_bytes(root, &bytes, &settings, PrefabLoadFlags::empty())
            .unwrap();

        assert_eq!(normalized(&loaded, root), expected, "{text}");
        let root_node = loaded.node(root).unwrap();
        assert_eq!(root_node.name(), "Apple");
        assert_eq!(root_node.component::<TestComponent>().unwrap().color, BLUE);
    }
}

#[test]
fn compact_binary_is_smaller_than_json() {
    let (scene, node) = test_scene();
    let binary = SerializationSettings::from_toml_str(
        "format = \"binary\"\ncompact_attribute_names = true",
    )
    .unwrap();
    let json = SerializationSettings::default();

    let binary_len = scene.save_to_bytes(node, &binary).unwrap().len();
    let json_len = scene.save_to_bytes(node, &json).unwrap().len();
    assert!(binary_len < json_len, "{binary_len} >= {json_len}");
}

#[test]
fn ids_are_preserved_unless_discarded() {
    init_logging();
    let (scene, node) = test_scene();
    let settings = SerializationSettings::default();
    let bytes = scene.save_to_bytes(node, &settings).unwrap();

    let mut loaded = Scene::new();
    loaded.register::<TestComponent>();
    let root = loaded.root();
    loaded
        .load_from_bytes(root, &bytes, &settings, PrefabLoadFlags::empty())
        .unwrap();
    assert!(loaded.find_node(201).is_some());
    assert!(loaded.find_node(403).is_some());
    assert!(loaded.is_id_used(306));

    let mut discarded = Scene::new();
    discarded.register::<TestComponent>();
    let root = discarded.root();
    discarded
        .load_from_bytes(root, &bytes, &settings, PrefabLoadFlags::DISCARD_IDS)
        .unwrap();
    assert!(discarded.find_node(201).is_none());
    assert!(!discarded.is_id_used(306));
    assert_eq!(discarded.num_nodes(), 1 + 6);
}

#[test]
fn temporary_flags_survive_binary_when_serialized() {
    init_logging();
    let (mut scene, node) = test_scene();
    let worm = scene.node(node).unwrap().children()[1];
    scene.node_mut(worm).unwrap().set_temporary(true);

    let settings = SerializationSettings::from_toml_str(
        r#"
        format = "binary"
        save_temporary = true
        serialize_temporary = true
        "#,
    )
    .unwrap();
    let bytes = scene.save_to_bytes(node, &settings).unwrap();

    let mut loaded = Scene::new();
    loaded.register::<TestComponent>();
    let root = loaded.root();
    loaded
        .load_from_bytes(root, &bytes, &settings, PrefabLoadFlags::empty())
        .unwrap();
    let root_node = loaded.node(root).unwrap();
    assert_eq!(root_node.num_children(), 4);
    let flags: Vec<_> = root_node
        .children()
        .iter()
        .map(|&child| loaded.node(child).unwrap().is_temporary())
        .collect();
    assert_eq!(flags, [false, true, false, false]);

    let skipped = SerializationSettings::default();
    let bytes = scene.save_to_bytes(node, &skipped).unwrap();
    let mut loaded = Scene::new();
    loaded.register::<TestComponent>();
    let root = loaded.root();
    loaded
        .load_from_bytes(root, &bytes, &skipped, PrefabLoadFlags::empty())
        .unwrap();
    assert_eq!(loaded.node(root).unwrap().num_children(), 3);
}

#[test]
fn unknown_resource_format_is_an_error() {
    let mut scene = Scene::new();
    let root = scene.root();
    let settings = SerializationSettings::default();
    let err = scene
        .load_from_bytes(root, b"plain text", &settings, PrefabLoadFlags::empty())
        .unwrap_err();
    assert!(matches!(err, SceneError::Archive(ArchiveError::UnknownFormat)));

    let unknown = SerializationSettings {
        format: ResourceFormat::Unknown,
        ..Default::default()
    };
    assert!(scene.save_to_bytes(root, &unknown).is_err());
}

#[test]
fn truncated_binary_is_an_error() {
    let (scene, node) = test_scene();
    let settings = SerializationSettings {
        format: ResourceFormat::Binary,
        ..Default::default()
    };
    let bytes = scene.save_to_bytes(node, &settings).unwrap();

    let mut loaded = Scene::new();
    loaded.register::<TestComponent>();
    let root = loaded.root();
    let err = loaded
        .load_from_bytes(root, &bytes[..bytes.len() / 2], &settings, PrefabLoadFlags::empty())
        .unwrap_err();
    assert!(matches!(
        err,
        SceneError::Archive(ArchiveError::UnexpectedEof { .. })
    ));
}

#[test]
fn unregistered_components_are_skipped_on_load() {
    init_logging();
    let (scene, node) = test_scene();
    let bytes = scene
        .save_to_bytes(node, &SerializationSettings::default())
        .unwrap();

    let mut bare = Scene::new();
    let root = bare.root();
    bare.load_from_bytes(
        root,
        &bytes,
        &SerializationSettings::default(),
        PrefabLoadFlags::empty(),
    )
    .unwrap();
    let root_node = bare.node(root).unwrap();
    assert_eq!(root_node.name(), "Apple");
    assert_eq!(root_node.num_components(), 0);
    assert_eq!(bare.num_nodes(), 7);
}
