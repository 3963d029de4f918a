use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An animatable property of a target element.
///
/// Hosts map these onto whatever their surface supports (CSS transforms,
/// terminal cell styling, ...). Ordering is stable so commands for one
/// target are always emitted in the same property order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    Opacity,
    X,
    Y,
    Scale,
    ScaleY,
    /// Degrees.
    RotateX,
    RotateY,
    /// Width as a percentage of the parent (progress bars).
    Width,
    /// Free-form numeric value (counters, percentages shown as text).
    Value,
}

impl Property {
    /// Value the property has when nothing animates it.
    pub fn rest_value(self) -> f64 {
        match self {
            Property::Opacity | Property::Scale | Property::ScaleY => 1.0,
            Property::X
            | Property::Y
            | Property::RotateX
            | Property::RotateY
            | Property::Width
            | Property::Value => 0.0,
        }
    }
}

/// A set of property values, e.g. the `from` or `to` side of a tween.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyValues(BTreeMap<Property, f64>);

impl PropertyValues {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, property: Property, value: f64) -> Self {
        self.0.insert(property, value);
        self
    }

    pub fn set(&mut self, property: Property, value: f64) {
        self.0.insert(property, value);
    }

    pub fn get(&self, property: Property) -> Option<f64> {
        self.0.get(&property).copied()
    }

    pub fn properties(&self) -> impl Iterator<Item = Property> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, f64)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Property, f64)> for PropertyValues {
    fn from_iter<I: IntoIterator<Item = (Property, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_serialize_in_camel_case() {
        let values = PropertyValues::new()
            .with(Property::Opacity, 0.0)
            .with(Property::ScaleY, 0.5);
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"opacity":0.0,"scaleY":0.5}"#);
    }

    #[test]
    fn rest_values() {
        assert_eq!(Property::Opacity.rest_value(), 1.0);
        assert_eq!(Property::Y.rest_value(), 0.0);
    }
}
