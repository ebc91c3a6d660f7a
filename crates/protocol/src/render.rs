//! SQL rendering for envelopes
//!
//! One rendering path per operation kind, all validation up front:
//! rendering with no operation set, empty target tables, a joiner arity
//! mismatch, or an unguarded unconditional mutation fails with
//! `MalformedRequest` before any text is produced. This is the only place
//! in the system where statement text is built.

use crate::envelope::{ColumnSpec, Envelope, QueryOperation, WhereClause};
use parkwell_core::{Error, Result};

impl Envelope {
    /// Render this envelope into one terminated SQL statement.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRequest` if the envelope cannot be rendered; never
    /// silently returns an empty string.
    pub fn render(&self) -> Result<String> {
        let op = self
            .operation
            .ok_or_else(|| Error::MalformedRequest("no operation selected".into()))?;
        if self.tables.is_empty() {
            return Err(Error::MalformedRequest("no target table".into()));
        }
        match op {
            QueryOperation::Select => self.render_select(),
            QueryOperation::Insert => self.render_insert(),
            QueryOperation::Update => self.render_update(),
            QueryOperation::Delete => self.render_delete(),
        }
    }

    fn render_select(&self) -> Result<String> {
        let columns = match &self.select_columns {
            ColumnSpec::All => "*".to_string(),
            ColumnSpec::Columns(cols) if cols.is_empty() => {
                return Err(Error::MalformedRequest("SELECT with no columns".into()));
            }
            ColumnSpec::Columns(cols) => cols.join(", "),
        };
        let tables = self.tables.join(", ");
        Ok(format!(
            "SELECT {columns} FROM {tables}{};",
            render_where(&self.conditions)?
        ))
    }

    fn render_insert(&self) -> Result<String> {
        let table = self.single_table("INSERT")?;
        if self.assignments.is_empty() {
            return Err(Error::MalformedRequest("INSERT with no values".into()));
        }
        let columns: Vec<&str> = self.assignments.iter().map(|(c, _)| c.as_str()).collect();
        let values: Vec<String> = self
            .assignments
            .iter()
            .map(|(_, v)| v.render_sql())
            .collect();
        Ok(format!(
            "INSERT INTO {table} ({}) VALUES ({});",
            columns.join(", "),
            values.join(", ")
        ))
    }

    fn render_update(&self) -> Result<String> {
        let table = self.single_table("UPDATE")?;
        if self.assignments.is_empty() {
            return Err(Error::MalformedRequest("UPDATE with no assignments".into()));
        }
        self.guard_unconditional("UPDATE")?;
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|(c, v)| format!("{c} = {}", v.render_sql()))
            .collect();
        Ok(format!(
            "UPDATE {table} SET {}{};",
            sets.join(", "),
            render_where(&self.conditions)?
        ))
    }

    fn render_delete(&self) -> Result<String> {
        let table = self.single_table("DELETE")?;
        self.guard_unconditional("DELETE")?;
        Ok(format!(
            "DELETE FROM {table}{};",
            render_where(&self.conditions)?
        ))
    }

    fn single_table(&self, what: &str) -> Result<&str> {
        match self.tables.as_slice() {
            [table] => Ok(table),
            _ => Err(Error::MalformedRequest(format!(
                "{what} targets exactly one table, got {}",
                self.tables.len()
            ))),
        }
    }

    // A WHERE-less mutation touches every row; callers must say so explicitly.
    fn guard_unconditional(&self, what: &str) -> Result<()> {
        if self.conditions.is_empty() && !self.unconditional {
            return Err(Error::MalformedRequest(format!(
                "unconditional {what} requires explicit opt-in"
            )));
        }
        Ok(())
    }
}

/// Render a WHERE clause, leading space included, or an empty string for an
/// empty clause. Conditions are joined by their connectives in input order;
/// AND binds tighter than OR in SQL, which is relied on by callers building
/// date-or-date-and-time predicates.
fn render_where(clause: &WhereClause) -> Result<String> {
    if clause.is_empty() {
        if !clause.connectives.is_empty() {
            return Err(Error::MalformedRequest(
                "WHERE joiners present without conditions".into(),
            ));
        }
        return Ok(String::new());
    }
    if clause.connectives.len() != clause.conditions.len() - 1 {
        return Err(Error::MalformedRequest(format!(
            "WHERE arity mismatch: {} conditions, {} joiners",
            clause.conditions.len(),
            clause.connectives.len()
        )));
    }

    let mut out = String::from(" WHERE ");
    for (i, cond) in clause.conditions.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(clause.connectives[i - 1].keyword());
            out.push(' ');
        }
        out.push_str(&format!(
            "{} {} {}",
            cond.column,
            cond.op.symbol(),
            cond.value.render_sql()
        ));
    }
    Ok(out)
}
