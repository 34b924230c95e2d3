//! Per-property override state and resolution results

use serde::Serialize;
use std::fmt;

use crate::value::Value;

/// Local state of one property on one node
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    /// No local value; the effective value comes from the parent chain
    #[default]
    Inherited,
    /// Explicit local value
    Overridden(Value),
}

impl PropertyValue {
    pub fn is_overridden(&self) -> bool {
        matches!(self, PropertyValue::Overridden(_))
    }

    /// The local value, if this is an override
    pub fn overridden_value(&self) -> Option<&Value> {
        match self {
            PropertyValue::Overridden(v) => Some(v),
            PropertyValue::Inherited => None,
        }
    }
}

/// Where an effective value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSource {
    /// Overridden on the node itself
    Local,
    /// Overridden on an ancestor
    Inherited { from: String },
    /// No override on the chain; taken from the property defaults
    Default,
    /// No override and no default
    Unset,
}

/// The result of resolving a property on a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveValue {
    /// Resolved value, `None` when unset
    pub value: Option<Value>,
    /// Where the value was found
    pub source: ValueSource,
}

impl EffectiveValue {
    pub(crate) fn local(value: Value) -> Self {
        Self {
            value: Some(value),
            source: ValueSource::Local,
        }
    }

    pub(crate) fn inherited(value: Value, from: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            source: ValueSource::Inherited { from: from.into() },
        }
    }

    pub(crate) fn default_value(value: Value) -> Self {
        Self {
            value: Some(value),
            source: ValueSource::Default,
        }
    }

    pub(crate) fn unset() -> Self {
        Self {
            value: None,
            source: ValueSource::Unset,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_unset(&self) -> bool {
        self.value.is_none()
    }

    /// True when the value is the node's own override
    pub fn is_local(&self) -> bool {
        self.source == ValueSource::Local
    }
}

impl fmt::Display for EffectiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "<unset>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_inherited() {
        assert_eq!(PropertyValue::default(), PropertyValue::Inherited);
        assert!(!PropertyValue::Inherited.is_overridden());
        assert_eq!(PropertyValue::Inherited.overridden_value(), None);
    }

    #[test]
    fn test_effective_value_serializes_source() {
        let eff = EffectiveValue::inherited(Value::from("off"), "parent");
        let json = serde_json::to_value(&eff).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "value": "off",
                "source": { "kind": "inherited", "from": "parent" }
            })
        );
    }

    #[test]
    fn test_overridden_null_is_not_inherited() {
        // An explicit null override still shadows the parent
        let prop = PropertyValue::Overridden(Value::Null);
        assert!(prop.is_overridden());
        assert_eq!(prop.overridden_value(), Some(&Value::Null));
    }

    #[test]
    fn test_effective_value_display() {
        assert_eq!(EffectiveValue::unset().to_string(), "<unset>");
        assert_eq!(
            EffectiveValue::inherited(Value::from("off"), "parent").to_string(),
            "off"
        );
        assert!(EffectiveValue::local(Value::Integer(2)).is_local());
    }
}
