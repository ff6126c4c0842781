use crate::model::{Category, FieldMap, Record};
use serde::de::{MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Formatter;

/// The canonical in-memory dataset shared by the workbook and the dashboard page: an ordered
/// sequence of records per category. All six categories are always present; a category with
/// no records holds an empty sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    categories: BTreeMap<Category, Vec<Record>>,
}

impl Default for Dataset {
    fn default() -> Self {
        let categories = Category::ALL.into_iter().map(|c| (c, Vec::new())).collect();
        Self { categories }
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, category: Category) -> &[Record] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_records(&mut self, category: Category, records: Vec<Record>) {
        self.categories.insert(category, records);
    }

    pub fn push(&mut self, category: Category, record: Record) {
        self.categories.entry(category).or_default().push(record);
    }

    /// Record counts per category, in canonical order.
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        self.categories
            .iter()
            .map(|(category, records)| (*category, records.len()))
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }
}

/// Serializes categories in canonical order and, within each record, the mapped attributes
/// in field-map column order followed by any unmapped attributes alphabetically. The order
/// is deterministic so that rewriting an unchanged dataset reproduces identical bytes.
impl Serialize for Dataset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, records) in &self.categories {
            map.serialize_entry(category, &RecordsInOrder(*category, records))?;
        }
        map.end()
    }
}

struct RecordsInOrder<'a>(Category, &'a [Record]);

impl Serialize for RecordsInOrder<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.1.len()))?;
        for record in self.1 {
            seq.serialize_element(&RecordInOrder(self.0, record))?;
        }
        seq.end()
    }
}

struct RecordInOrder<'a>(Category, &'a Record);

impl Serialize for RecordInOrder<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let field_map = FieldMap::of(self.0);
        let mut map = serializer.serialize_map(Some(self.1.len()))?;
        for field in field_map.fields() {
            if let Some(value) = self.1.get(field.attr()) {
                map.serialize_entry(field.attr(), value)?;
            }
        }
        for (attr, value) in self.1.iter() {
            if field_map.by_attr(attr).is_none() {
                map.serialize_entry(attr, value)?;
            }
        }
        map.end()
    }
}

/// Accepts any subset of the six category keys and fills the rest with empty sequences.
/// Unknown top-level keys are an error.
impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DatasetVisitor;

        impl<'de> Visitor<'de> for DatasetVisitor {
            type Value = Dataset;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of category keys to record arrays")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Dataset, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut dataset = Dataset::new();
                while let Some((category, records)) =
                    access.next_entry::<Category, Vec<Record>>()?
                {
                    dataset.categories.insert(category, records);
                }
                Ok(dataset)
            }
        }

        deserializer.deserialize_map(DatasetVisitor)
    }
}
