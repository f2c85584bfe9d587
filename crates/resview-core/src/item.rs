use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

const FIELD_SHIFT: u32 = 56;
const PARENT_MASK: u64 = (1 << FIELD_SHIFT) - 1;

/// Opaque identifier of a result item.
///
/// Items loaded into a store get sequential ids. Field scalars (the
/// `count`, `mean`, ... of a vector, statistic or histogram shown as a
/// scalar row) carry the parent id in the low bits and the field index in
/// the top byte, so they stay stable across queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    pub(crate) fn new(raw: u64) -> Self {
        debug_assert!(raw & !PARENT_MASK == 0);
        Self(raw)
    }

    /// Id of the field scalar `field` derived from this item.
    pub fn field(self, field: Field) -> Self {
        Self((self.0 & PARENT_MASK) | ((field.index() as u64 + 1) << FIELD_SHIFT))
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// The item this id belongs to (itself for ordinary items).
    pub fn parent(self) -> Self {
        Self(self.0 & PARENT_MASK)
    }

    /// The field this id refers to, if it is a field scalar.
    pub fn field_kind(self) -> Option<Field> {
        match (self.0 >> FIELD_SHIFT) as usize {
            0 => None,
            n => Field::ALL.get(n - 1).copied(),
        }
    }

    pub fn is_field(self) -> bool {
        self.field_kind().is_some()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field_kind() {
            Some(field) => write!(f, "#{}:{}", self.parent().0, field),
            None => write!(f, "#{}", self.0),
        }
    }
}

/// Kind of a simulation result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Parameter,
    Scalar,
    Vector,
    Statistics,
    Histogram,
}

impl ItemKind {
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Parameter,
        ItemKind::Scalar,
        ItemKind::Vector,
        ItemKind::Statistics,
        ItemKind::Histogram,
    ];

    fn bit(self) -> u8 {
        match self {
            Self::Parameter => 1,
            Self::Scalar => 1 << 1,
            Self::Vector => 1 << 2,
            Self::Statistics => 1 << 3,
            Self::Histogram => 1 << 4,
        }
    }

    /// Whether items of this kind carry summary fields.
    pub fn has_fields(self) -> bool {
        matches!(self, Self::Vector | Self::Statistics | Self::Histogram)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter => write!(f, "parameter"),
            Self::Scalar => write!(f, "scalar"),
            Self::Vector => write!(f, "vector"),
            Self::Statistics => write!(f, "statistics"),
            Self::Histogram => write!(f, "histogram"),
        }
    }
}

/// Set of item kinds present in an id list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ItemKinds(u8);

impl ItemKinds {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, kind: ItemKind) {
        self.0 |= kind.bit();
    }

    pub fn contains(&self, kind: ItemKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemKind> + '_ {
        ItemKind::ALL.into_iter().filter(|k| self.contains(*k))
    }
}

impl FromIterator<ItemKind> for ItemKinds {
    fn from_iter<I: IntoIterator<Item = ItemKind>>(iter: I) -> Self {
        let mut kinds = Self::empty();
        for kind in iter {
            kinds.insert(kind);
        }
        kinds
    }
}

/// Summary field of a vector, statistic or histogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Count,
    Sum,
    Mean,
    Stddev,
    Min,
    Max,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Count,
        Field::Sum,
        Field::Mean,
        Field::Stddev,
        Field::Min,
        Field::Max,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or_default()
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "mean" => Some(Self::Mean),
            "stddev" => Some(Self::Stddev),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Stddev => "stddev",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One histogram bin: lower bound and count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bin {
    pub lower_bound: f64,
    pub count: f64,
}

/// A result item as loaded from a result file.
#[derive(Clone, Debug)]
pub struct ResultItem {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Label of the file this item was loaded from.
    pub file: String,
    pub run: String,
    pub module: String,
    pub name: String,
    /// Value of scalars and parameters.
    pub value: Option<f64>,
    /// Textual value of parameters that are not numeric.
    pub text: Option<String>,
    pub unit: Option<String>,
    pub vector_id: Option<u32>,
    pub fields: BTreeMap<Field, f64>,
    pub bins: Vec<Bin>,
}

/// Borrowed view of either a stored item or one of its field scalars.
#[derive(Clone, Copy, Debug)]
pub enum ItemRef<'a> {
    Item(&'a ResultItem),
    Field {
        parent: &'a ResultItem,
        field: Field,
        value: f64,
    },
}

impl<'a> ItemRef<'a> {
    pub fn id(&self) -> ItemId {
        match self {
            Self::Item(item) => item.id,
            Self::Field { parent, field, .. } => parent.id.field(*field),
        }
    }

    /// Field scalars always report as scalars.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Item(item) => item.kind,
            Self::Field { .. } => ItemKind::Scalar,
        }
    }

    pub fn item(&self) -> &'a ResultItem {
        match *self {
            Self::Item(item) => item,
            Self::Field { parent, .. } => parent,
        }
    }

    pub fn run(&self) -> &'a str {
        &self.item().run
    }

    pub fn module(&self) -> &'a str {
        &self.item().module
    }

    pub fn name(&self) -> String {
        match self {
            Self::Item(item) => item.name.clone(),
            Self::Field { parent, field, .. } => format!("{}:{}", parent.name, field),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Item(item) => item.value,
            Self::Field { value, .. } => Some(*value),
        }
    }

    /// Counts are dimensionless; every other field inherits the parent's unit.
    pub fn unit(&self) -> Option<&'a str> {
        match *self {
            Self::Item(item) => item.unit.as_deref(),
            Self::Field { field: Field::Count, .. } => None,
            Self::Field { parent, .. } => parent.unit.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_ids_round_trip_parent_and_field() {
        let id = ItemId::new(42);
        let mean = id.field(Field::Mean);
        assert_ne!(mean, id);
        assert_eq!(mean.parent(), id);
        assert_eq!(mean.field_kind(), Some(Field::Mean));
        assert!(!id.is_field());
        assert_eq!(mean.to_string(), "#42:mean");
    }

    #[test]
    fn distinct_fields_have_distinct_ids() {
        let id = ItemId::new(7);
        let ids: std::collections::HashSet<_> = Field::ALL.iter().map(|f| id.field(*f)).collect();
        assert_eq!(ids.len(), Field::ALL.len());
    }

    #[test]
    fn item_kinds_collects_and_iterates_in_order() {
        let kinds: ItemKinds = [ItemKind::Histogram, ItemKind::Scalar, ItemKind::Scalar]
            .into_iter()
            .collect();
        assert!(kinds.contains(ItemKind::Scalar));
        assert!(!kinds.contains(ItemKind::Vector));
        let listed: Vec<_> = kinds.iter().collect();
        assert_eq!(listed, vec![ItemKind::Scalar, ItemKind::Histogram]);
    }
}
