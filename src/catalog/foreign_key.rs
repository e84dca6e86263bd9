//! Foreign-key descriptors.
//!
//! A [`ForeignKey`] names the source columns of the owning table and the
//! referenced table and columns. Descriptors are built with
//! [`ForeignKeyBuilder`] and deep-copied into the table on add; attaching
//! the matching [`Foreign`](crate::catalog::ConstraintKind::Foreign)
//! constraint to the source columns is done by the table itself.

use super::types::TableId;

/// A foreign-key descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    constraint_name: String,
    source_columns: Vec<String>,
    referenced_table: TableId,
    referenced_columns: Vec<String>,
}

impl ForeignKey {
    /// Starts building a foreign key with the given constraint name.
    pub fn builder(constraint_name: impl Into<String>) -> ForeignKeyBuilder {
        ForeignKeyBuilder {
            constraint_name: constraint_name.into(),
            source_columns: Vec::new(),
            referenced_table: TableId::INVALID,
            referenced_columns: Vec::new(),
        }
    }

    /// The constraint's name.
    pub fn constraint_name(&self) -> &str {
        &self.constraint_name
    }

    /// Names of the source columns in the owning table.
    pub fn source_columns(&self) -> &[String] {
        &self.source_columns
    }

    /// The referenced table.
    pub fn referenced_table(&self) -> TableId {
        self.referenced_table
    }

    /// Names of the referenced columns.
    pub fn referenced_columns(&self) -> &[String] {
        &self.referenced_columns
    }
}

/// Builder for [`ForeignKey`].
#[derive(Debug)]
pub struct ForeignKeyBuilder {
    constraint_name: String,
    source_columns: Vec<String>,
    referenced_table: TableId,
    referenced_columns: Vec<String>,
}

impl ForeignKeyBuilder {
    /// Adds a source column (in the owning table).
    pub fn source_column(mut self, name: impl Into<String>) -> Self {
        self.source_columns.push(name.into());
        self
    }

    /// Sets the referenced table and columns.
    pub fn references<I, S>(mut self, table: TableId, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.referenced_table = table;
        self.referenced_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> ForeignKey {
        ForeignKey {
            constraint_name: self.constraint_name,
            source_columns: self.source_columns,
            referenced_table: self.referenced_table,
            referenced_columns: self.referenced_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let fk = ForeignKey::builder("fk_orders_customer")
            .source_column("customer_id")
            .references(TableId::new(7), ["id"])
            .build();

        assert_eq!(fk.constraint_name(), "fk_orders_customer");
        assert_eq!(fk.source_columns(), &["customer_id".to_string()]);
        assert_eq!(fk.referenced_table(), TableId::new(7));
        assert_eq!(fk.referenced_columns(), &["id".to_string()]);
    }

    #[test]
    fn test_composite_key() {
        let fk = ForeignKey::builder("fk_pair")
            .source_column("a")
            .source_column("b")
            .references(TableId::new(2), ["x", "y"])
            .build();

        assert_eq!(fk.source_columns().len(), 2);
        assert_eq!(fk.referenced_columns().len(), 2);
    }
}
