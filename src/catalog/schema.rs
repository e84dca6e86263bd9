//! Table schemas: columns, nullability, defaults, and column constraints.

use std::fmt;

use crate::datum::{Type, Value};

/// The kind of a column constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Column must not be NULL.
    NotNull,
    /// Column participates in the table's primary key.
    PrimaryKey,
    /// Column participates in a unique constraint.
    Unique,
    /// Column is a source column of a foreign key; `fk_offset` is the
    /// position of the descriptor in the owning table's foreign-key list.
    Foreign {
        /// Offset into the table's foreign-key list.
        fk_offset: usize,
    },
}

/// A named constraint attached to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    name: String,
    kind: ConstraintKind,
}

impl Constraint {
    /// Creates a new constraint.
    pub fn new(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The constraint's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constraint's kind.
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }
}

/// A column definition: name, type, nullability, optional default, and any
/// attached constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    ty: Type,
    nullable: bool,
    default: Option<Value>,
    constraints: Vec<Constraint>,
}

impl Column {
    /// Creates a new column.
    pub fn new(name: impl Into<String>, ty: Type, nullable: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable,
            default: None,
            constraints: Vec::new(),
        }
    }

    /// Sets the column's default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// The column's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column's data type.
    pub fn data_type(&self) -> Type {
        self.ty
    }

    /// Whether the column allows NULL.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// The column's default value, if any.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Constraints attached to this column.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Attaches a constraint to this column.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty.display_name())?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}

/// An ordered sequence of columns.
///
/// Schemas are immutable after construction, with one exception: adding a
/// foreign key to a table attaches a [`ConstraintKind::Foreign`] constraint
/// to each named source column. That mutation happens under the owning
/// table's mutex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema from an ordered column list.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Returns the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn column(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }

    /// Returns all columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns whether the column at `idx` allows NULL.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn allows_null(&self, idx: usize) -> bool {
        self.columns[idx].nullable()
    }

    /// Returns the index of the column named `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Attaches `constraint` to the column named `name`.
    ///
    /// Returns false if no such column exists.
    pub fn add_constraint(&mut self, name: &str, constraint: Constraint) -> bool {
        match self.column_index(name) {
            Some(idx) => {
                self.columns[idx].add_constraint(constraint);
                true
            }
            None => false,
        }
    }
}
