use crate::rules::{MappingRule, ValueKind, WORLD_OPTION_RULES};
use tracing::{debug, info, warn};
use worldoption_common::{
    Property, PropertyMap, PropertyValue, split_fields, strip_parens, unquote,
};
use worldoption_settings::RawSettings;

/// Validation failures. Each names the offending key (dotted for struct fields).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    #[error("setting {key}: {value:?} is not a valid {expected}")]
    TypeMismatch {
        key: String,
        value: String,
        expected: String,
    },
    #[error("setting {key}: {value:?} is not one of [{}]", .allowed.join(", "))]
    InvalidEnumValue {
        key: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("required setting {key} is missing and has no default")]
    MissingRequiredSetting { key: String },
    #[error("rule table maps more than one key to property {0}")]
    DuplicateProperty(String),
}

/// Result of a successful mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingReport {
    pub properties: PropertyMap,
    /// Input keys with no rule, as spelled in the input. Struct fields are dotted.
    pub unknown_keys: Vec<String>,
}

/// Applies a static rule table to raw settings.
#[derive(Debug, Clone, Copy)]
pub struct PropertyMapper {
    rules: &'static [MappingRule],
}

impl Default for PropertyMapper {
    fn default() -> Self {
        Self::new(WORLD_OPTION_RULES)
    }
}

impl PropertyMapper {
    pub fn new(rules: &'static [MappingRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [MappingRule] {
        self.rules
    }

    pub fn map(&self, raw: &RawSettings) -> Result<MappingReport, MappingError> {
        let fields: Vec<(&str, &str)> = raw
            .iter()
            .map(|s| (s.key.as_str(), s.value.as_str()))
            .collect();
        let mut unknown_keys = Vec::new();
        let properties = map_fields(self.rules, &fields, None, &mut unknown_keys)?;
        info!(
            properties = properties.len(),
            unknown = unknown_keys.len(),
            "mapped settings"
        );
        Ok(MappingReport {
            properties,
            unknown_keys,
        })
    }
}

/// Map raw settings with the built-in world option table.
pub fn map(raw: &RawSettings) -> Result<MappingReport, MappingError> {
    PropertyMapper::default().map(raw)
}

fn key_path(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{key}"),
        None => key.to_string(),
    }
}

fn map_fields(
    rules: &'static [MappingRule],
    fields: &[(&str, &str)],
    prefix: Option<&str>,
    unknown: &mut Vec<String>,
) -> Result<PropertyMap, MappingError> {
    for (key, _) in fields {
        if !rules.iter().any(|r| r.key.eq_ignore_ascii_case(key)) {
            let path = key_path(prefix, key);
            warn!(key = %path, "unknown setting ignored");
            unknown.push(path);
        }
    }

    let mut properties = Vec::new();
    for rule in rules {
        let path = key_path(prefix, rule.key);
        let raw = fields
            .iter()
            .find(|(key, _)| rule.key.eq_ignore_ascii_case(key))
            .map(|(_, value)| *value);

        let raw = match (raw, rule.default) {
            (Some(value), _) => value,
            (None, Some(default)) => {
                debug!(key = %path, default, "using default");
                default
            }
            (None, None) if rule.required => {
                return Err(MappingError::MissingRequiredSetting { key: path });
            }
            (None, None) => continue,
        };

        let value = convert_value(rule, raw, &path, unknown)?;
        debug!(key = %path, name = rule.name, %value, "mapped");
        properties.push(Property::new(rule.name, value));
    }

    PropertyMap::from_properties(properties).map_err(|e| MappingError::DuplicateProperty(e.0))
}

fn mismatch(path: &str, raw: &str, kind: &ValueKind) -> MappingError {
    MappingError::TypeMismatch {
        key: path.to_string(),
        value: raw.to_string(),
        expected: kind.describe(),
    }
}

/// Convert one raw value according to its rule.
pub(crate) fn convert_value(
    rule: &MappingRule,
    raw: &str,
    path: &str,
    unknown: &mut Vec<String>,
) -> Result<PropertyValue, MappingError> {
    let text = raw.trim();
    match rule.kind {
        ValueKind::Bool => {
            let text = unquote(text);
            if text.eq_ignore_ascii_case("true") {
                Ok(PropertyValue::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(PropertyValue::Bool(false))
            } else {
                Err(mismatch(path, raw, &rule.kind))
            }
        }
        ValueKind::Int32 { min, max } => text
            .parse::<i32>()
            .ok()
            .filter(|v| (min..=max).contains(v))
            .map(PropertyValue::Int32)
            .ok_or_else(|| mismatch(path, raw, &rule.kind)),
        ValueKind::Float => text
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(PropertyValue::Float)
            .ok_or_else(|| mismatch(path, raw, &rule.kind)),
        ValueKind::String => Ok(PropertyValue::String(unquote(text).to_string())),
        ValueKind::Enum(allowed) => {
            let name = unquote(text);
            if allowed.iter().any(|a| *a == name) {
                Ok(PropertyValue::Enum(name.to_string()))
            } else {
                Err(MappingError::InvalidEnumValue {
                    key: path.to_string(),
                    value: name.to_string(),
                    allowed: allowed.iter().map(|s| s.to_string()).collect(),
                })
            }
        }
        ValueKind::Struct(schema) => {
            let body = strip_parens(text).unwrap_or(text);
            let mut fields: Vec<(&str, &str)> = Vec::new();
            let parts = split_fields(body).ok_or_else(|| mismatch(path, raw, &rule.kind))?;
            for field in parts {
                let Some((key, value)) = field.split_once(':') else {
                    return Err(mismatch(path, raw, &rule.kind));
                };
                let key = key.trim();
                if key.is_empty() || fields.iter().any(|(k, _)| k.eq_ignore_ascii_case(key)) {
                    return Err(mismatch(path, raw, &rule.kind));
                }
                fields.push((key, value.trim()));
            }
            map_fields(schema, &fields, Some(path), unknown).map(PropertyValue::Struct)
        }
    }
}
