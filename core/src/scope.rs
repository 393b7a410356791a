//! Row set handles: an entity plus the conditions and ordering that select its rows.

use crate::{Name, Value};

/// A filter on one field of the scoped entity's own table.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { field: Name, value: Value },
    In { field: Name, values: Vec<Value> },
    IsNull(Name),
    NotNull(Name),
}

impl Condition {
    pub fn eq(field: impl Into<Name>, value: impl Into<Value>) -> Self {
        Condition::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<Name>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(field: impl Into<Name>) -> Self {
        Condition::IsNull(field.into())
    }

    pub fn not_null(field: impl Into<Name>) -> Self {
        Condition::NotNull(field.into())
    }

    pub fn field(&self) -> &Name {
        match self {
            Condition::Eq { field, .. } | Condition::In { field, .. } => field,
            Condition::IsNull(field) | Condition::NotNull(field) => field,
        }
    }

    /// A condition no row can satisfy, known without asking the row source.
    pub fn is_unsatisfiable(&self) -> bool {
        match self {
            Condition::In { values, .. } => values.iter().all(Value::is_null),
            Condition::Eq { value, .. } => value.is_null(),
            _ => false,
        }
    }

    /// Evaluates the condition against one field value.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Condition::Eq { value: wanted, .. } => value.is_key() && value == wanted,
            Condition::In { values, .. } => value.is_key() && values.contains(value),
            Condition::IsNull(_) => value.is_null(),
            Condition::NotNull(_) => !value.is_null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: Name,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<Name>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<Name>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Conditions and ordering without an entity, as attached to a relation branch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub conditions: Vec<Condition>,
    pub order: Vec<OrderBy>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn is_unsatisfiable(&self) -> bool {
        self.conditions.iter().any(Condition::is_unsatisfiable)
    }
}

/// The row set an extraction starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub entity: Name,
    pub filter: Filter,
    empty: bool,
}

impl Scope {
    /// Every row of `entity`.
    pub fn all(entity: impl Into<Name>) -> Self {
        Self {
            entity: entity.into(),
            filter: Filter::default(),
            empty: false,
        }
    }

    /// No rows at all.
    pub fn none(entity: impl Into<Name>) -> Self {
        Self {
            empty: true,
            ..Self::all(entity)
        }
    }

    pub fn with_filter(entity: impl Into<Name>, filter: Filter) -> Self {
        Self {
            filter,
            ..Self::all(entity)
        }
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.filter.order.push(order);
        self
    }

    /// Adds a branch filter's conditions and ordering to this scope.
    pub fn merge(mut self, other: &Filter) -> Self {
        self.filter
            .conditions
            .extend(other.conditions.iter().cloned());
        self.filter.order.extend(other.order.iter().cloned());
        self
    }

    /// Whether the scope provably selects no rows.
    pub fn is_empty(&self) -> bool {
        self.empty || self.filter.is_unsatisfiable()
    }
}
