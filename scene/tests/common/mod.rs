#![allow(dead_code)]

use std::any::Any;
use std::sync::OnceLock;

use redlilium_core::Variant;
use redlilium_scene::{
    AttributeInfo, AttributePrefab, NodePrefab, ObjectReflection, Serializable, SerializablePrefab,
};

pub const ENUM_NAMES: [&str; 3] = ["Red", "Green", "Blue"];
pub const BLUE: i32 = 2;

/// Component with one attribute of each interesting kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TestComponent {
    pub vector: [i32; 2],
    pub color: i32,
    pub strings: Vec<String>,
    pub unchanged: String,
}

impl Default for TestComponent {
    fn default() -> Self {
        Self {
            vector: [0, 0],
            color: 0,
            strings: Vec::new(),
            unchanged: "default".into(),
        }
    }
}

impl Serializable for TestComponent {
    fn reflection(&self) -> &ObjectReflection {
        static REFLECTION: OnceLock<ObjectReflection> = OnceLock::new();
        REFLECTION.get_or_init(|| {
            ObjectReflection::new("TestComponent")
                .with_attribute(AttributeInfo::new("Vector", Variant::IntVector2([0, 0])))
                .with_attribute(AttributeInfo::new_enum("Enum", ENUM_NAMES, 0))
                .with_attribute(AttributeInfo::new(
                    "VectorString",
                    Variant::StringVector(Vec::new()),
                ))
                .with_attribute(AttributeInfo::new(
                    "UnchangedString",
                    Variant::String("default".into()),
                ))
        })
    }

    fn attribute(&self, index: usize) -> Variant {
        match index {
            0 => Variant::IntVector2(self.vector),
            1 => Variant::Int(self.color),
            2 => Variant::StringVector(self.strings.clone()),
            3 => Variant::String(self.unchanged.clone()),
            _ => Variant::None,
        }
    }

    fn set_attribute(&mut self, index: usize, value: Variant) {
        match (index, value) {
            (0, Variant::IntVector2(v)) => self.vector = v,
            (1, Variant::Int(v)) => self.color = v,
            (2, Variant::StringVector(v)) => self.strings = v,
            (3, Variant::String(v)) => self.unchanged = v,
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Root "Apple" (101) with two components, three "Worm" children
/// (201..=203) and a chain 401 -> 402 -> 403. Components 301..=306 sit on
/// the root and on the first and third worm.
pub fn make_test_prefab() -> NodePrefab {
    let mut source = NodePrefab::new(
        SerializablePrefab::new(101)
            .with_attribute(AttributePrefab::from_name("Name").with_value("Apple"))
            .with_attribute(AttributePrefab::from_name("Position").with_value([1.0f32, 2.0, 3.0])),
    );

    for i in 0..3 {
        source.children.push(NodePrefab::new(
            SerializablePrefab::new(201 + i)
                .with_attribute(AttributePrefab::from_name("Name").with_value("Worm"))
                .with_attribute(
                    AttributePrefab::from_name("Position").with_value([1.0f32, 1.0, 1.0]),
                ),
        ));
    }

    let mut component_id = 301;
    for path in [None, Some(0), Some(2)] {
        let parent = match path {
            None => &mut source,
            Some(index) => &mut source.children[index],
        };
        for _ in 0..2 {
            parent.components.push(
                SerializablePrefab::new(component_id)
                    .with_type("TestComponent")
                    .with_attribute(AttributePrefab::from_name("Enum").with_value("Blue")),
            );
            component_id += 1;
        }
    }

    let mut chain = NodePrefab::new(SerializablePrefab::new(401));
    let mut middle = NodePrefab::new(SerializablePrefab::new(402));
    middle
        .children
        .push(NodePrefab::new(SerializablePrefab::new(403)));
    chain.children.push(middle);
    source.children.push(chain);

    source
}
