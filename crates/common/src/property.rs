use serde::ser::{Serialize, SerializeSeq, SerializeStruct, Serializer};
use std::fmt;

/// Type tags understood by the save codec.
///
/// The serialized names (`"Bool"`, `"Int32"`, ...) are part of the IR
/// contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum PropertyType {
    Bool,
    Int32,
    Float,
    String,
    Enum,
    Struct,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Bool => "Bool",
            Self::Int32 => "Int32",
            Self::Float => "Float",
            Self::String => "String",
            Self::Enum => "Enum",
            Self::Struct => "Struct",
        };
        f.write_str(tag)
    }
}

/// A native value constrained by its property type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int32(i32),
    Float(f32),
    String(String),
    /// Enum values are carried by name, without the engine's type prefix.
    Enum(String),
    Struct(PropertyMap),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int32(_) => PropertyType::Int32,
            Self::Float(_) => PropertyType::Float,
            Self::String(_) => PropertyType::String,
            Self::Enum(_) => PropertyType::Enum,
            Self::Struct(_) => PropertyType::Struct,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Enum(v) => f.write_str(v),
            Self::Struct(map) => write!(f, "({} fields)", map.len()),
        }
    }
}

/// Serializes the bare value; nested structs become property lists.
impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int32(v) => serializer.serialize_i32(*v),
            Self::Float(v) => serializer.serialize_f32(*v),
            Self::String(v) | Self::Enum(v) => serializer.serialize_str(v),
            Self::Struct(map) => map.serialize(serializer),
        }
    }
}

/// A named, typed property of the world-option record.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Engine field name.
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn property_type(&self) -> PropertyType {
        self.value.property_type()
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Property", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("type", &self.property_type())?;
        s.serialize_field("value", &self.value)?;
        s.end()
    }
}

/// Two properties in one map shared a name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate property name: {0}")]
pub struct DuplicateProperty(pub String);

/// Ordered property list representing one serializable object.
///
/// Names are unique. There is no mutating API: a map is built once and
/// then only read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<Property>,
}

impl PropertyMap {
    /// Build a map from properties in their final order.
    pub fn from_properties(entries: Vec<Property>) -> Result<Self, DuplicateProperty> {
        for (i, prop) in entries.iter().enumerate() {
            if entries[..i].iter().any(|p| p.name == prop.name) {
                return Err(DuplicateProperty(prop.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for prop in &self.entries {
            seq.serialize_element(prop)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_follows_value() {
        let p = Property::new("bIsPvP", PropertyValue::Bool(false));
        assert_eq!(p.property_type(), PropertyType::Bool);
        let p = Property::new("Difficulty", PropertyValue::Enum("Hard".into()));
        assert_eq!(p.property_type(), PropertyType::Enum);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = PropertyMap::from_properties(vec![
            Property::new("ExpRate", PropertyValue::Float(1.0)),
            Property::new("ExpRate", PropertyValue::Float(2.0)),
        ])
        .unwrap_err();
        assert_eq!(err, DuplicateProperty("ExpRate".into()));
    }

    #[test]
    fn map_preserves_order() {
        let map = PropertyMap::from_properties(vec![
            Property::new("Zeta", PropertyValue::Int32(1)),
            Property::new("Alpha", PropertyValue::Int32(2)),
        ])
        .unwrap();
        assert_eq!(map.names().collect::<Vec<_>>(), ["Zeta", "Alpha"]);
        assert_eq!(map.get("Alpha").unwrap().value, PropertyValue::Int32(2));
        assert!(map.get("Missing").is_none());
    }

    #[test]
    fn serializes_name_type_value() {
        let inner = PropertyMap::from_properties(vec![Property::new(
            "Port",
            PropertyValue::Int32(8211),
        )])
        .unwrap();
        let map = PropertyMap::from_properties(vec![
            Property::new("DayTimeSpeedRate", PropertyValue::Float(3.0)),
            Property::new("ServerName", PropertyValue::String("My Server".into())),
            Property::new("Net", PropertyValue::Struct(inner)),
        ])
        .unwrap();

        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(
            value,
            json!([
                { "name": "DayTimeSpeedRate", "type": "Float", "value": 3.0 },
                { "name": "ServerName", "type": "String", "value": "My Server" },
                { "name": "Net", "type": "Struct", "value": [
                    { "name": "Port", "type": "Int32", "value": 8211 }
                ] }
            ])
        );
    }

    #[test]
    fn display_tags() {
        assert_eq!(PropertyType::Int32.to_string(), "Int32");
        assert_eq!(PropertyValue::Float(1.5).to_string(), "1.5");
        assert_eq!(PropertyValue::String("x".into()).to_string(), "\"x\"");
    }
}
