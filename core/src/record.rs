//! Extracted records and the keyed working set they are assembled into.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::{Name, Value};

/// One output slot of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Value(Value),
    Record(Record),
    List(Vec<Field>),
}

impl Field {
    pub const NULL: Field = Field::Value(Value::Null);

    pub const fn is_null(&self) -> bool {
        matches!(self, Field::Value(Value::Null))
    }

    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Field::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Field]> {
        match self {
            Field::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

macro_rules! impl_field_from_scalar {
    ($($ty:ty),*) => { $(
        impl From<$ty> for Field {
            fn from(value: $ty) -> Self {
                Field::Value(Value::from(value))
            }
        }
    )* }
}

impl_field_from_scalar!(i8, i16, i32, i64, u8, u16, u32, f32, f64, bool, &str, String, Vec<u8>);

impl<T: Into<Value>> From<Option<T>> for Field {
    fn from(value: Option<T>) -> Self {
        Field::Value(value.map_or(Value::Null, Into::into))
    }
}

impl From<Vec<Field>> for Field {
    fn from(items: Vec<Field>) -> Self {
        Field::List(items)
    }
}

impl From<Record> for Field {
    fn from(record: Record) -> Self {
        Field::Record(record)
    }
}

/// An ordered mapping from output name to field.
///
/// Iteration follows insertion order; equality ignores it, so two records
/// with the same fields compare equal regardless of which stage added what
/// first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<Name, Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// The scalar under `name`, or `Null` when absent or not a scalar.
    pub fn value(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        match self.fields.get(name) {
            Some(Field::Value(v)) => v,
            _ => &NULL,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Sets `name`, keeping its position if it was already present.
    pub fn insert(&mut self, name: impl Into<Name>, field: impl Into<Field>) -> Option<Field> {
        self.fields.insert(name.into(), field.into())
    }

    /// Sets `name` only if absent and returns the slot.
    pub fn entry_or(&mut self, name: &str, default: impl FnOnce() -> Field) -> &mut Field {
        match self.fields.entry(Name::from(name)) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(default()),
        }
    }

    /// Removes `name` without disturbing the order of the other fields.
    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.fields.shift_remove(name)
    }

    /// Moves the field under `from` to `to`, leaving records without `from`
    /// untouched.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        match self.fields.shift_remove(from) {
            Some(field) => {
                self.fields.insert(Name::from(to), field);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Field)> {
        self.fields.iter()
    }

    /// Converts the record into a JSON object, nested records and lists included.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl<K: Into<Name>, F: Into<Field>> FromIterator<(K, F)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, F)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, f)| (k.into(), f.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (Name, Field);
    type IntoIter = indexmap::map::IntoIter<Name, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Builds a [`Record`] from `name => value` pairs.
///
/// ```
/// use plucker_core::{record, Value};
///
/// let author = record! { "id" => 1, "name" => "Ada" };
/// assert_eq!(author.value("name"), &Value::from("Ada"));
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($name:expr => $field:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.insert($name, $field); )+
        record
    }};
}

/// The working collection of one extraction call, keyed by primary key.
///
/// Inserting a key that is already present replaces its record but keeps the
/// original position, so fan-out rows collapse onto the last tuple seen while
/// output order stays the order keys first appeared.
#[derive(Debug, Default)]
pub struct ResultSet {
    records: IndexMap<Value, Record>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: IndexMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: Value, record: Record) {
        self.records.insert(key, record);
    }

    pub fn get(&self, key: &Value) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.records.get_index_mut(index).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.records.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.records.values_mut()
    }

    /// Sets `name` to a fresh default on every record.
    pub fn init_field(&mut self, name: &str, default: impl Fn() -> Field) {
        for record in self.records.values_mut() {
            record.insert(name, default());
        }
    }

    /// Distinct, non-null values of `field` across all records, in first-seen order.
    pub fn distinct_values(&self, field: &str) -> Vec<Value> {
        let mut seen = indexmap::IndexSet::new();
        for record in self.records.values() {
            let value = record.value(field);
            if value.is_key() {
                seen.insert(value.clone());
            }
        }
        seen.into_iter().collect()
    }

    /// Consumes the set into records in key insertion order.
    pub fn into_records(self) -> Vec<Record> {
        self.records.into_values().collect()
    }
}

#[cfg(feature = "serde")]
mod serialize {
    use serde::ser::{SerializeMap, SerializeSeq, Serializer};
    use serde::Serialize;

    use super::{Field, Record};

    impl Serialize for Field {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Field::Value(v) => v.serialize(serializer),
                Field::Record(r) => r.serialize(serializer),
                Field::List(items) => {
                    let mut seq = serializer.serialize_seq(Some(items.len()))?;
                    for item in items {
                        seq.serialize_element(item)?;
                    }
                    seq.end()
                }
            }
        }
    }

    impl Serialize for Record {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (name, field) in self.iter() {
                map.serialize_entry(name.as_str(), field)?;
            }
            map.end()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_moves_value_and_ignores_absent_fields() {
        let mut record = record! { "id" => 1, "title" => "T1" };
        assert!(record.rename("title", "headline"));
        assert!(!record.contains("title"));
        assert_eq!(record.value("headline"), &Value::from("T1"));

        let before = record.clone();
        assert!(!record.rename("missing", "other"));
        assert_eq!(record, before);
    }

    #[test]
    fn equality_ignores_field_order() {
        let a = record! { "id" => 1, "name" => "A" };
        let b = record! { "name" => "A", "id" => 1 };
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_keys_keep_first_position_and_last_record() {
        let mut set = ResultSet::new();
        set.insert(Value::from(1), record! { "id" => 1, "v" => "first" });
        set.insert(Value::from(2), record! { "id" => 2, "v" => "other" });
        set.insert(Value::from(1), record! { "id" => 1, "v" => "last" });

        let records = set.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("v"), &Value::from("last"));
        assert_eq!(records[1].value("id"), &Value::from(2));
    }

    #[test]
    fn distinct_values_skip_nulls() {
        let mut set = ResultSet::new();
        set.insert(Value::from(1), record! { "author_id" => 7 });
        set.insert(Value::from(2), record! { "author_id" => Value::Null });
        set.insert(Value::from(3), record! { "author_id" => 7 });
        assert_eq!(set.distinct_values("author_id"), vec![Value::from(7)]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn records_serialize_as_json_objects() {
        let record = record! {
            "id" => 1,
            "email" => Value::Null,
            "blog_posts" => vec![Field::from(record! { "id" => 10, "title" => "Engines" })],
        };
        assert_eq!(
            record.to_json(),
            serde_json::json!({
                "id": 1,
                "email": null,
                "blog_posts": [{ "id": 10, "title": "Engines" }],
            })
        );
    }
}
