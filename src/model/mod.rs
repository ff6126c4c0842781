//! Types that represent the core data model: categories, field maps, records and the dataset.
mod category;
mod dataset;
mod mapping;
mod record;
mod value;
mod warning;

pub use category::Category;
pub use dataset::Dataset;
pub use mapping::{FieldMap, FieldSpec, ValueClass};
pub use record::Record;
pub(crate) use value::coerce;
pub use value::Value;
pub use warning::Warning;
