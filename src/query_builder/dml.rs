use crate::error::Result;
use crate::executor::execute;
use crate::results::Shape;

use super::Sql;

impl Sql<'_> {
    /// Execute as an `INSERT` and return the affected-row count.
    ///
    /// # Errors
    /// Returns pool, binding, or execution errors from the executor.
    pub fn insert(&self) -> Result<usize> {
        self.affected()
    }

    /// # Errors
    /// Returns pool, binding, or execution errors from the executor.
    pub fn update(&self) -> Result<usize> {
        self.affected()
    }

    /// # Errors
    /// Returns pool, binding, or execution errors from the executor.
    pub fn delete(&self) -> Result<usize> {
        self.affected()
    }

    fn affected(&self) -> Result<usize> {
        execute(self.target, &self.query, Shape::AffectedRows, &self.params)?.into_affected()
    }
}
