//! The top-level facade: a named collection of [`Table`]s, a single
//! `execute` entry point that runs a query string end to end, and
//! whole-database persistence.

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::parse::{self, ColumnDef, IndexKind, InsertValues, Query};
use crate::resultset::ResultSet;
use crate::table::{Condition, Table};
use crate::util;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::io::{Read, Write};
use std::time::Instant;

/// An in-memory relational database: a name-keyed set of tables, each
/// independent (no foreign keys, no cross-table transactions).
#[derive(Debug, Default)]
pub struct Database {
    tables: FxHashMap<String, Table>,
}

impl Database {
    /// An empty database with no tables.
    pub fn new() -> Self {
        Database { tables: FxHashMap::default() }
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables.get(name).ok_or_else(|| Error::UnknownTable(name.into()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables.get_mut(name).ok_or_else(|| Error::UnknownTable(name.into()))
    }

    /// Parse and run one query string, end to end. CREATE TABLE, INSERT and
    /// CREATE ORDERED INDEX return [`ResultSet::empty`] on success; SELECT
    /// returns its projected rows. UPDATE, DELETE and CREATE UNORDERED INDEX
    /// parse but are not executed; they fail with [`Error::NotImplemented`].
    pub fn execute(&mut self, query: &str) -> Result<ResultSet> {
        let start = Instant::now();
        match parse::parse_query(query)? {
            Query::CreateTable { table, columns } => {
                self.create_table(&table, columns)?;
                Ok(ResultSet::empty(start.elapsed()))
            }
            Query::CreateIndex { kind: IndexKind::Ordered, table, columns } => {
                self.create_ordered_index(&table, &columns)?;
                Ok(ResultSet::empty(start.elapsed()))
            }
            Query::CreateIndex { kind: IndexKind::Unordered, .. } => {
                Err(Error::NotImplemented("UNORDERED INDEX"))
            }
            Query::Insert { table, values } => {
                self.insert(&table, values)?;
                Ok(ResultSet::empty(start.elapsed()))
            }
            Query::Select { table, columns, predicate } => {
                self.table(&table)?.select_ast(&columns, &predicate)
            }
            Query::Unsupported(what) => Err(Error::NotImplemented(what)),
        }
    }

    /// Create a new table. Fails if the name is already taken or any
    /// column definition is invalid (see [`Table::new`]).
    pub fn create_table(&mut self, name: &str, columns: Vec<ColumnDef>) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(Error::DuplicateTable(name.into()));
        }
        let columns = columns.into_iter().map(ColumnDef::into_column).collect();
        let table = Table::new(columns)?;
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    /// Insert one row, given either positional or named values, into the
    /// named table.
    pub fn insert(&mut self, table: &str, values: InsertValues) -> Result<()> {
        let t = self.table_mut(table)?;
        let resolved = match values {
            InsertValues::Positional(vals) => {
                vals.into_iter().map(|v| v.unwrap_or(Value::None)).collect()
            }
            InsertValues::Named(pairs) => {
                let mut out = vec![Value::None; t.columns().len()];
                for (name, value) in pairs {
                    let idx = t
                        .columns()
                        .iter()
                        .position(|c| c.name == name)
                        .ok_or_else(|| Error::UnknownColumn(name))?;
                    out[idx] = value;
                }
                out
            }
        };
        t.insert(resolved)
    }

    /// Create an ordered index on the named columns of the named table.
    pub fn create_ordered_index(&mut self, table: &str, columns: &[String]) -> Result<()> {
        self.table_mut(table)?.create_ordered_index(columns)
    }

    /// Run a WHERE predicate, given as an already-parsed expression tree,
    /// against the named table and project the requested columns. Bypasses
    /// the parser entirely.
    pub fn select(&self, table: &str, columns: &[String], predicate: &Expr) -> Result<ResultSet> {
        self.table(table)?.select_ast(columns, predicate)
    }

    /// Select `columns` from the named table, restricted to rows matching
    /// every `(Condition, column-index)` pair. Bypasses both the parser and
    /// the expression-tree evaluator, driving the range planner directly.
    pub fn select_conditions(
        &self,
        table: &str,
        columns: &[String],
        conditions: Vec<(Condition, usize)>,
    ) -> Result<ResultSet> {
        self.table(table)?.select(columns, conditions)
    }

    /// Serialize every table per the `database :=` layout: table count,
    /// then `(name, table)` pairs. Iteration order is whatever the
    /// internal map produces; [`Database::load_from_file`] reconstructs
    /// the same table set keyed by name regardless of order.
    pub fn save_to_file<W: Write>(&self, w: &mut W) -> Result<()> {
        util::write_u64(w, self.tables.len() as u64)?;
        for (name, table) in &self.tables {
            util::write_string(w, name)?;
            table.save_to_file(w)?;
        }
        Ok(())
    }

    /// Deserialize a database in the format written by [`Database::save_to_file`].
    pub fn load_from_file<R: Read>(r: &mut R) -> Result<Database> {
        let count = util::read_u64(r)? as usize;
        let mut tables = FxHashMap::default();
        for _ in 0..count {
            let name = util::read_string(r)?;
            let table = Table::load_from_file(r)?;
            tables.insert(name, table);
        }
        Ok(Database { tables })
    }

    /// Write one diagnostic line per table (name, column count, row count),
    /// in name order.
    pub fn info<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut names: Vec<&String> = self.tables.keys().collect();
        names.sort();
        for name in names {
            let t = &self.tables[name];
            writeln!(w, "{}: {} columns, {} rows", name, t.columns().len(), t.row_count())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Database {
        Database::new()
    }

    #[test]
    fn create_insert_select_round_trip() {
        let mut db = fresh();
        db.execute(r#"create table users ({key, autoincrement} id: int32, login: string[16])"#)
            .unwrap();
        db.execute(r#"insert (, "alice") to users"#).unwrap();
        db.execute(r#"insert (, "bob") to users"#).unwrap();
        let rs = db.execute("select id, login from users where id = 2").unwrap();
        assert_eq!(rs.row_count(), 1);
        assert_eq!(rs.row(0).get("login").unwrap(), crate::value::ValueRef::Str("bob"));
    }

    #[test]
    fn duplicate_table_name_rejected() {
        let mut db = fresh();
        db.execute("create table t (x: int32)").unwrap();
        assert!(matches!(
            db.execute("create table t (y: int32)"),
            Err(Error::DuplicateTable(_))
        ));
    }

    #[test]
    fn select_against_unknown_table_errors() {
        let mut db = fresh();
        assert!(matches!(
            db.execute("select x from nope where x = 1"),
            Err(Error::UnknownTable(_))
        ));
    }

    #[test]
    fn select_conditions_bypasses_the_parser() {
        use crate::table::RelOp;
        let mut db = fresh();
        db.execute("create table t (x: int32)").unwrap();
        db.execute("insert (1) to t").unwrap();
        db.execute("insert (2) to t").unwrap();
        db.execute("insert (3) to t").unwrap();

        let conditions = vec![(Condition { value: Value::Int(2), op: RelOp::Ge }, 0)];
        let rs = db.select_conditions("t", &["x".to_string()], conditions).unwrap();
        let got: Vec<i32> = rs.iter().map(|r| r.get("x").unwrap().as_int().unwrap()).collect();
        assert_eq!(got, vec![2, 3]);
    }

    #[test]
    fn unordered_index_and_update_are_not_implemented() {
        let mut db = fresh();
        db.execute("create table t (x: int32)").unwrap();
        assert!(matches!(
            db.execute("create unordered index on t by x"),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(db.execute("update t set x = 1"), Err(_)));
    }

    #[test]
    fn save_and_load_round_trips_whole_database() {
        let mut db = fresh();
        db.execute("create table t ({key} x: int32)").unwrap();
        db.execute("insert (1) to t").unwrap();
        db.execute("insert (2) to t").unwrap();
        db.execute("create ordered index on t by x").unwrap();

        let mut buf = Vec::new();
        db.save_to_file(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let loaded = Database::load_from_file(&mut cursor).unwrap();

        let rs = loaded.table("t").unwrap().select_all().unwrap();
        assert_eq!(rs.row_count(), 2);
    }

    #[test]
    fn info_lists_tables_with_column_and_row_counts() {
        let mut db = fresh();
        db.execute("create table a (x: int32)").unwrap();
        db.execute("create table b (x: int32, y: int32)").unwrap();
        db.execute("insert (1) to a").unwrap();
        let mut buf = Vec::new();
        db.info(&mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out, "a: 1 columns, 1 rows\nb: 2 columns, 0 rows\n");
    }
}
