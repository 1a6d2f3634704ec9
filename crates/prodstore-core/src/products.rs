use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::projection::{ColumnValue, FieldDescriptor, FieldKind, FieldValue, SparseRecord};

/// Per-store prices keyed by store name.
pub type Stores = BTreeMap<String, f64>;

/// A persisted product as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Assigned by the store on insert; never changes afterwards.
    pub id: i64,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub stores: Option<Stores>,
}

/// Full-entity request body used by create and replace.
///
/// Every mutable field is written: a key missing from the body clears the
/// column, unlike [`ProductPatch`] where a missing key leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub stores: Option<Stores>,
}

impl ProductBody {
    /// Attaches a store-assigned id to this body.
    #[must_use]
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            quantity: self.quantity,
            unit: self.unit,
            stores: self.stores,
        }
    }
}

/// Presence-tracking value for sparse request bodies.
///
/// Use with `#[serde(default)]`: a missing key decodes as [`Patch::Missing`],
/// an explicit `null` as [`Patch::Null`], anything else as [`Patch::Set`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Missing,
    Null,
    Set(T),
}

impl<T> Patch<T> {
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    /// Collapses to `None` when missing, `Some(None)` when null.
    #[allow(clippy::option_option)]
    fn as_supplied(&self) -> Option<Option<&T>> {
        match self {
            Patch::Missing => None,
            Patch::Null => Some(None),
            Patch::Set(value) => Some(Some(value)),
        }
    }

    fn to_field<F>(&self, convert: F) -> FieldValue
    where
        F: FnOnce(Option<&T>) -> ColumnValue,
    {
        match self.as_supplied() {
            None => FieldValue::Absent,
            Some(value) => FieldValue::Present(convert(value)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|opt| opt.map_or(Patch::Null, Patch::Set))
    }
}

/// Sparse body for `PATCH /products/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub quantity: Patch<f64>,
    #[serde(default)]
    pub unit: Patch<String>,
    #[serde(default)]
    pub stores: Patch<Stores>,
}

const PRODUCT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("name", FieldKind::Optional),
    FieldDescriptor::new("quantity", FieldKind::Optional),
    FieldDescriptor::new("unit", FieldKind::Optional),
    FieldDescriptor::new("stores", FieldKind::Optional),
];

impl SparseRecord for ProductPatch {
    const FIELDS: &'static [FieldDescriptor] = PRODUCT_FIELDS;

    fn field_values(&self) -> Vec<FieldValue> {
        vec![
            self.name.to_field(|v| ColumnValue::Text(v.cloned())),
            self.quantity.to_field(|v| ColumnValue::Float(v.copied())),
            self.unit.to_field(|v| ColumnValue::Text(v.cloned())),
            self.stores
                .to_field(|v| ColumnValue::Json(v.map(stores_to_json))),
        ]
    }
}

/// Converts a store map into a JSON object; non-finite prices become `null`.
#[must_use]
pub fn stores_to_json(stores: &Stores) -> Value {
    Value::Object(
        stores
            .iter()
            .map(|(store, price)| {
                let price = Number::from_f64(*price).map_or(Value::Null, Value::Number);
                (store.clone(), price)
            })
            .collect(),
    )
}
