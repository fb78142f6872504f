//! Static mapping rules: one record per known settings key.

use std::collections::HashSet;
use worldoption_common::PropertyType;

/// How a raw string becomes a typed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Bool,
    Int32 { min: i32, max: i32 },
    Float,
    String,
    /// Allowed value names, matched case-sensitively.
    Enum(&'static [&'static str]),
    /// Nested schema for a `(Field:Value,...)` raw value.
    Struct(&'static [MappingRule]),
}

impl ValueKind {
    pub const INT32: Self = Self::Int32 {
        min: i32::MIN,
        max: i32::MAX,
    };

    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool => PropertyType::Bool,
            Self::Int32 { .. } => PropertyType::Int32,
            Self::Float => PropertyType::Float,
            Self::String => PropertyType::String,
            Self::Enum(_) => PropertyType::Enum,
            Self::Struct(_) => PropertyType::Struct,
        }
    }

    /// Human-readable constraint used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Bool => "Bool (true or false)".into(),
            Self::Int32 { min, max } if (*min, *max) == (i32::MIN, i32::MAX) => "Int32".into(),
            Self::Int32 { min, max } => format!("Int32 in {min}..={max}"),
            Self::Float => "finite Float".into(),
            Self::String => "String".into(),
            Self::Enum(allowed) => format!("Enum of [{}]", allowed.join(", ")),
            Self::Struct(_) => "Struct of (Field:Value,...)".into(),
        }
    }
}

/// Maps one raw settings key to an engine property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingRule {
    /// Key as written in the settings file (matched case-insensitively).
    pub key: &'static str,
    /// Engine field name written to the IR.
    pub name: &'static str,
    pub kind: ValueKind,
    /// Raw text used when the key is absent; goes through the same conversion.
    pub default: Option<&'static str>,
    /// Absent with no default fails the mapping when set.
    pub required: bool,
}

impl MappingRule {
    pub const fn new(key: &'static str, kind: ValueKind) -> Self {
        Self {
            key,
            name: key,
            kind,
            default: None,
            required: false,
        }
    }

    pub const fn bool(key: &'static str) -> Self {
        Self::new(key, ValueKind::Bool)
    }

    pub const fn float(key: &'static str) -> Self {
        Self::new(key, ValueKind::Float)
    }

    pub const fn int(key: &'static str, min: i32, max: i32) -> Self {
        Self::new(key, ValueKind::Int32 { min, max })
    }

    pub const fn string(key: &'static str) -> Self {
        Self::new(key, ValueKind::String)
    }

    pub const fn enumeration(key: &'static str, allowed: &'static [&'static str]) -> Self {
        Self::new(key, ValueKind::Enum(allowed))
    }

    pub const fn structure(key: &'static str, fields: &'static [MappingRule]) -> Self {
        Self::new(key, ValueKind::Struct(fields))
    }

    pub const fn renamed(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

const DIFFICULTY: &[&str] = &["None", "Casual", "Normal", "Hard"];
const DEATH_PENALTY: &[&str] = &["None", "Item", "ItemAndEquipment", "All"];
const COUNT: i32 = i32::MAX;
const PORT_MAX: i32 = 65535;

/// World settings in the engine's declaration order.
///
/// No rule carries a default: a field missing from the settings file is
/// left out of the record so the server applies its own value.
pub static WORLD_OPTION_RULES: &[MappingRule] = &[
    MappingRule::enumeration("Difficulty", DIFFICULTY),
    MappingRule::float("DayTimeSpeedRate"),
    MappingRule::float("NightTimeSpeedRate"),
    MappingRule::float("ExpRate"),
    MappingRule::float("PalCaptureRate"),
    MappingRule::float("PalSpawnNumRate"),
    MappingRule::float("PalDamageRateAttack"),
    MappingRule::float("PalDamageRateDefense"),
    MappingRule::float("PlayerDamageRateAttack"),
    MappingRule::float("PlayerDamageRateDefense"),
    MappingRule::float("PlayerStomachDecreaceRate"),
    MappingRule::float("PlayerStaminaDecreaceRate"),
    MappingRule::float("PlayerAutoHPRegeneRate"),
    MappingRule::float("PlayerAutoHpRegeneRateInSleep"),
    MappingRule::float("PalStomachDecreaceRate"),
    MappingRule::float("PalStaminaDecreaceRate"),
    MappingRule::float("PalAutoHPRegeneRate"),
    MappingRule::float("PalAutoHpRegeneRateInSleep"),
    MappingRule::float("BuildObjectDamageRate"),
    MappingRule::float("BuildObjectDeteriorationDamageRate"),
    MappingRule::float("CollectionDropRate"),
    MappingRule::float("CollectionObjectHpRate"),
    MappingRule::float("CollectionObjectRespawnSpeedRate"),
    MappingRule::float("EnemyDropItemRate"),
    MappingRule::enumeration("DeathPenalty", DEATH_PENALTY),
    MappingRule::bool("bEnablePlayerToPlayerDamage"),
    MappingRule::bool("bEnableFriendlyFire"),
    MappingRule::bool("bEnableInvaderEnemy"),
    MappingRule::bool("bActiveUNKO"),
    MappingRule::bool("bEnableAimAssistPad"),
    MappingRule::bool("bEnableAimAssistKeyboard"),
    MappingRule::int("DropItemMaxNum", 0, COUNT),
    MappingRule::int("DropItemMaxNum_UNKO", 0, COUNT),
    MappingRule::int("BaseCampMaxNum", 0, COUNT),
    MappingRule::int("BaseCampWorkerMaxNum", 1, 50),
    MappingRule::float("DropItemAliveMaxHours"),
    MappingRule::bool("bAutoResetGuildNoOnlinePlayers"),
    MappingRule::float("AutoResetGuildTimeNoOnlinePlayers"),
    MappingRule::int("GuildPlayerMaxNum", 1, 100),
    MappingRule::float("PalEggDefaultHatchingTime"),
    MappingRule::float("WorkSpeedRate"),
    MappingRule::bool("bIsMultiplay"),
    MappingRule::bool("bIsPvP"),
    MappingRule::bool("bCanPickupOtherGuildDeathPenaltyDrop"),
    MappingRule::bool("bEnableNonLoginPenalty"),
    MappingRule::bool("bEnableFastTravel"),
    MappingRule::bool("bIsStartLocationSelectByMap"),
    MappingRule::bool("bExistPlayerAfterLogout"),
    MappingRule::bool("bEnableDefenseOtherGuildPlayer"),
    MappingRule::int("CoopPlayerMaxNum", 1, COUNT),
    MappingRule::int("ServerPlayerMaxNum", 1, 32),
    MappingRule::string("ServerName"),
    MappingRule::string("ServerDescription"),
    MappingRule::string("AdminPassword"),
    MappingRule::string("ServerPassword"),
    MappingRule::int("PublicPort", 1, PORT_MAX),
    MappingRule::string("PublicIP"),
    MappingRule::bool("RCONEnabled"),
    MappingRule::int("RCONPort", 1, PORT_MAX),
    MappingRule::string("Region"),
    MappingRule::bool("bUseAuth"),
    MappingRule::string("BanListURL"),
];

/// A rule table that cannot be used as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("key {0} is declared more than once")]
    DuplicateKey(String),
    #[error("property name {0} is produced by more than one rule")]
    DuplicateName(String),
    #[error("rule {0} declares an enum with no allowed values")]
    EmptyEnum(String),
    #[error("rule {0} declares an empty Int32 range")]
    EmptyRange(String),
    #[error("rule {key} has an invalid default: {reason}")]
    InvalidDefault { key: String, reason: String },
}

/// Check a table (and any nested struct tables) for structural mistakes.
///
/// Defaults are validated by running them through the value conversion.
pub fn validate_rules(rules: &'static [MappingRule]) -> Result<(), RuleError> {
    let mut keys = HashSet::new();
    let mut names = HashSet::new();
    for rule in rules {
        if !keys.insert(rule.key.to_ascii_lowercase()) {
            return Err(RuleError::DuplicateKey(rule.key.into()));
        }
        if !names.insert(rule.name) {
            return Err(RuleError::DuplicateName(rule.name.into()));
        }
        match rule.kind {
            ValueKind::Enum([]) => return Err(RuleError::EmptyEnum(rule.key.into())),
            ValueKind::Int32 { min, max } if min > max => {
                return Err(RuleError::EmptyRange(rule.key.into()));
            }
            ValueKind::Struct(fields) => validate_rules(fields)?,
            _ => {}
        }
        if let Some(default) = rule.default {
            crate::mapper::convert_value(rule, default, rule.key, &mut Vec::new()).map_err(
                |e| RuleError::InvalidDefault {
                    key: rule.key.into(),
                    reason: e.to_string(),
                },
            )?;
        }
    }
    Ok(())
}
