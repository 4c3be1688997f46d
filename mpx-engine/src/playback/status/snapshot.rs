//! Fixed-shape property table used for snapshots and diffs

use super::properties::{StatusProperty, PROPERTY_COUNT};
use mpx_common::events::PropertyChange;
use mpx_common::PropertyValue;

/// Property name → value table, one slot per `StatusProperty`
///
/// Serves as a full snapshot target and as the working set of a diff: after
/// `Status::contrast_into` it holds only the properties that changed.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySnapshot {
    values: [Option<PropertyValue>; PROPERTY_COUNT],
}

impl PropertySnapshot {
    /// Empty table
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| None),
        }
    }

    /// Store a value, returning the previous one
    pub fn set(&mut self, property: StatusProperty, value: PropertyValue) -> Option<PropertyValue> {
        self.values[property.index()].replace(value)
    }

    pub fn get(&self, property: StatusProperty) -> Option<&PropertyValue> {
        self.values[property.index()].as_ref()
    }

    /// Look up by published name
    pub fn get_by_name(&self, name: &str) -> Option<&PropertyValue> {
        StatusProperty::from_name(name).and_then(|p| self.get(p))
    }

    pub fn remove(&mut self, property: StatusProperty) -> Option<PropertyValue> {
        self.values[property.index()].take()
    }

    pub fn contains(&self, property: StatusProperty) -> bool {
        self.values[property.index()].is_some()
    }

    /// Number of populated slots
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = None);
    }

    /// Populated slots in table order
    pub fn iter(&self) -> impl Iterator<Item = (StatusProperty, &PropertyValue)> + '_ {
        StatusProperty::ALL
            .iter()
            .zip(self.values.iter())
            .filter_map(|(property, value)| value.as_ref().map(|v| (*property, v)))
    }

    /// Populated properties, in table order
    pub fn properties(&self) -> Vec<StatusProperty> {
        self.iter().map(|(property, _)| property).collect()
    }

    /// Convert to the event payload form
    pub fn to_changes(&self) -> Vec<PropertyChange> {
        self.iter()
            .map(|(property, value)| PropertyChange {
                name: property.name(),
                value: value.clone(),
            })
            .collect()
    }
}

impl Default for PropertySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut snapshot = PropertySnapshot::new();
        assert!(snapshot.is_empty());

        assert!(snapshot.set(StatusProperty::IsSeeking, PropertyValue::Bool(false)).is_none());
        let previous = snapshot.set(StatusProperty::IsSeeking, PropertyValue::Bool(true));
        assert_eq!(previous, Some(PropertyValue::Bool(false)));
        assert_eq!(snapshot.get_by_name("is_seeking"), Some(&PropertyValue::Bool(true)));
        assert_eq!(snapshot.len(), 1);

        assert_eq!(snapshot.remove(StatusProperty::IsSeeking), Some(PropertyValue::Bool(true)));
        assert!(!snapshot.contains(StatusProperty::IsSeeking));
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_iter_follows_table_order() {
        let mut snapshot = PropertySnapshot::new();
        snapshot.set(StatusProperty::DownloadProgress, PropertyValue::Float(0.5));
        snapshot.set(StatusProperty::Source, PropertyValue::Text("a.flac".into()));

        assert_eq!(
            snapshot.properties(),
            vec![StatusProperty::Source, StatusProperty::DownloadProgress]
        );

        let changes = snapshot.to_changes();
        assert_eq!(changes[0].name, "source");
        assert_eq!(changes[1].value, PropertyValue::Float(0.5));
    }

    #[test]
    fn test_clear() {
        let mut snapshot = PropertySnapshot::new();
        snapshot.set(StatusProperty::Position, PropertyValue::Integer(1));
        snapshot.clear();
        assert!(snapshot.is_empty());
    }
}
