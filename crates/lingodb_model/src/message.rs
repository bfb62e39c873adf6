//! Message records: the child type of the bundle/message join.

use lingodb_codec::SlotRecord;
use serde::{Deserialize, Serialize};

/// The translation of one bundle into one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message id.
    pub id: String,
    /// Id of the bundle this message translates.
    pub bundle_id: String,
    /// BCP-47 locale tag, e.g. `"en"` or `"de-CH"`.
    pub locale: String,
    /// Input variables the variants match on, in match order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<String>,
    /// The concrete renderings of this message.
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Message {
    /// Creates a message with no selectors or variants.
    pub fn new(
        id: impl Into<String>,
        bundle_id: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            bundle_id: bundle_id.into(),
            locale: locale.into(),
            selectors: Vec::new(),
            variants: Vec::new(),
        }
    }

    /// Appends a variant.
    #[must_use]
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }
}

impl SlotRecord for Message {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One rendering of a message, selected by its `matches` against the
/// message selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Unique variant id within the message.
    pub id: String,
    /// Selector match values, aligned with the message's `selectors`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<String>,
    /// The pattern rendered for this variant.
    #[serde(default)]
    pub pattern: Vec<PatternPart>,
}

impl Variant {
    /// Creates a catch-all variant rendering a single text pattern.
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            matches: Vec::new(),
            pattern: vec![PatternPart::Text { value: text.into() }],
        }
    }
}

/// One element of a variant pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PatternPart {
    /// Literal text.
    Text {
        /// The literal value.
        value: String,
    },
    /// A reference to an input variable, interpolated at render time.
    VariableRef {
        /// The variable name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_round_trips() {
        let message = Message::new("greeting_en", "greeting", "en")
            .with_variant(Variant::text("v1", "Hello"));
        let json = serde_json::to_string(&message).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn bundle_id_serializes_camel_case() {
        let json = serde_json::to_string(&Message::new("m1", "b1", "en")).unwrap();
        assert!(json.contains(r#""bundleId":"b1""#));
    }

    #[test]
    fn pattern_parts_are_tagged() {
        let variant = Variant {
            id: "v1".into(),
            matches: vec!["one".into()],
            pattern: vec![
                PatternPart::Text {
                    value: "Hello ".into(),
                },
                PatternPart::VariableRef {
                    name: "name".into(),
                },
            ],
        };
        let json = serde_json::to_string(&variant).unwrap();
        assert!(json.contains(r#""type":"text""#));
        assert!(json.contains(r#""type":"variableRef""#));
        let back: Variant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, variant);
    }

    #[test]
    fn missing_optional_fields_default() {
        let back: Message =
            serde_json::from_str(r#"{"id":"m1","bundleId":"b1","locale":"en"}"#).unwrap();
        assert!(back.selectors.is_empty());
        assert!(back.variants.is_empty());
    }
}
