//! A single table: its column layout, packed row storage, and ordered
//! indices. Owns insert validation, the range-planning Select path, and
//! the AST-walking Select path, plus whole-table persistence.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::expr::{Expr, Op};
use crate::resultset::ResultSet;
use crate::util;
use crate::value::{Value, ValueRef};
use rustc_hash::FxHashMap;
use std::io::{Read, Write};
use std::rc::Rc;
use std::time::Instant;

const INITIAL_CAPACITY: usize = 32;

/// Relational operator of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl RelOp {
    /// Convert a relational [`Op`], failing on any non-relational operator.
    pub fn from_op(op: Op) -> Result<RelOp> {
        Ok(match op {
            Op::Eq => RelOp::Eq,
            Op::Ne => RelOp::Ne,
            Op::Lt => RelOp::Lt,
            Op::Gt => RelOp::Gt,
            Op::Le => RelOp::Le,
            Op::Ge => RelOp::Ge,
            _ => return Err(Error::OperatorUnsupported),
        })
    }

    fn apply(self, lhs: &ValueRef, rhs: &ValueRef) -> Result<bool> {
        match self {
            RelOp::Eq => lhs.eq_op(rhs),
            RelOp::Ne => lhs.ne_op(rhs),
            RelOp::Lt => lhs.lt_op(rhs),
            RelOp::Gt => lhs.gt_op(rhs),
            RelOp::Le => lhs.le_op(rhs),
            RelOp::Ge => lhs.ge_op(rhs),
        }
    }
}

/// A single-column predicate: `column <op> value`, one conjunct of a
/// simple WHERE condition.
#[derive(Debug, Clone)]
pub struct Condition {
    pub value: Value,
    pub op: RelOp,
}

impl Condition {
    /// Does `lhs` (read from a row) satisfy this condition.
    pub fn matches(&self, lhs: &ValueRef) -> Result<bool> {
        self.op.apply(lhs, &self.value.as_ref())
    }
}

/// A column index paired with a permutation of row numbers, kept sorted by
/// that column's value.
#[derive(Debug, Clone)]
pub struct OrderedIndex {
    pub column: usize,
    pub permutation: Vec<usize>,
}

/// A half-open window `[begin, end)` into one ordered index's permutation.
#[derive(Debug, Clone, Copy)]
struct IndexRange {
    index: usize,
    begin: usize,
    end: usize,
}

impl IndexRange {
    fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }
}

/// A relational table: fixed column layout, packed row storage, ordered
/// indices.
#[derive(Debug)]
pub struct Table {
    columns: Vec<Column>,
    mapping: FxHashMap<String, usize>,
    row_size: u16,
    row_count: usize,
    capacity: usize,
    storage: Vec<u8>,
    ordered_indices: Vec<OrderedIndex>,
}

impl Table {
    /// Build a new, empty table from its column definitions. Offsets are
    /// assigned left to right; `key` columns receive an ordered index
    /// immediately. Fails on a duplicate column name or an invalid column
    /// (see [`Column::validate`]).
    pub fn new(mut columns: Vec<Column>) -> Result<Table> {
        let mut mapping = FxHashMap::default();
        let mut row_size: u16 = 0;
        for (i, col) in columns.iter_mut().enumerate() {
            col.validate()?;
            if mapping.insert(col.name.clone(), i).is_some() {
                return Err(Error::DuplicateColumnName(col.name.clone()));
            }
            col.offset = row_size;
            row_size += col.size;
        }
        let mut table = Table {
            columns,
            mapping,
            row_size,
            row_count: 0,
            capacity: INITIAL_CAPACITY,
            storage: vec![0u8; row_size as usize * INITIAL_CAPACITY],
            ordered_indices: Vec::new(),
        };
        let key_columns: Vec<usize> =
            table.columns.iter().enumerate().filter(|(_, c)| c.is_key).map(|(i, _)| i).collect();
        for col in key_columns {
            table.create_ordered_index_on(col)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.mapping.get(name).copied().ok_or_else(|| Error::UnknownColumn(name.into()))
    }

    /// Like [`Table::column_index`] but for an identifier referenced inside a
    /// WHERE predicate rather than a projection list — errors as
    /// `UnknownSymbol` per §7, distinct from a bad output column name.
    fn symbol_index(&self, name: &str) -> Result<usize> {
        self.mapping.get(name).copied().ok_or_else(|| Error::UnknownSymbol(name.into()))
    }

    fn row_slot(&self, row: usize, col: &Column) -> &[u8] {
        let start = row * self.row_size as usize + col.offset as usize;
        &self.storage[start..start + col.size as usize]
    }

    /// Borrow the value of `column` in `row`.
    pub fn value_at(&self, row: usize, column: usize) -> ValueRef<'_> {
        let col = &self.columns[column];
        col.decode(self.row_slot(row, col))
    }

    fn add_row(&mut self) {
        if self.row_count == self.capacity {
            self.capacity *= 2;
            self.storage.resize(self.row_size as usize * self.capacity, 0);
        }
        self.row_count += 1;
    }

    /// Validate and insert one row. On any error no mutation is observed:
    /// the row buffer is not grown, no autoincrement counter advances, and
    /// no index is touched.
    pub fn insert(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::ColumnsMismatch);
        }
        let resolved = self.check_inserted_values(values)?;

        let row = self.row_count;
        self.add_row();

        let mut row_buf = vec![0u8; self.row_size as usize];
        for (i, col) in self.columns.iter().enumerate() {
            let start = col.offset as usize;
            let end = start + col.size as usize;
            col.encode(&resolved[i], &mut row_buf[start..end])?;
        }
        let dst_start = row * self.row_size as usize;
        self.storage[dst_start..dst_start + self.row_size as usize].copy_from_slice(&row_buf);

        for index in &mut self.ordered_indices {
            let col = &self.columns[index.column];
            if col.is_autoincrement {
                index.permutation.push(row);
            } else {
                let value = resolved[index.column].as_ref();
                let pos = upper_bound(&self.storage, self.row_size, col, &index.permutation, &value);
                index.permutation.insert(pos, row);
            }
        }
        Ok(())
    }

    fn check_inserted_values(&mut self, values: Vec<Value>) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(values.len());
        for (i, value) in values.into_iter().enumerate() {
            let data_type = self.columns[i].data_type;
            let has_default = self.columns[i].default.is_some();
            let is_autoincrement = self.columns[i].is_autoincrement;
            let is_unique_or_key = self.columns[i].is_unique || self.columns[i].is_key;
            let size = self.columns[i].size;
            let is_none = value.is_none();

            if data_type != value.data_type() && !(has_default && is_none) && !(is_autoincrement && is_none) {
                return Err(Error::TypeMismatch);
            }
            match &value {
                Value::Str(s) if s.len() + 1 > size as usize => return Err(Error::SizeTooLarge),
                Value::Bytes(b) if b.len() != size as usize => return Err(Error::SizeTooLarge),
                _ => {}
            }

            let mut value = value;
            if is_autoincrement {
                value = Value::Int(self.columns[i].autoincrement_value);
            } else if value.is_none() {
                value = self.columns[i].default.clone().unwrap_or(Value::None);
            }

            if !is_autoincrement && is_unique_or_key && !self.check_unique_value(&value, i)? {
                return Err(Error::UniquenessViolated);
            }
            out.push(value);
        }
        for col in self.columns.iter_mut() {
            if col.is_autoincrement {
                col.autoincrement_value += 1;
            }
        }
        Ok(out)
    }

    fn check_unique_value(&self, value: &Value, col_idx: usize) -> Result<bool> {
        if let Some(index) = self.ordered_indices.iter().find(|idx| idx.column == col_idx) {
            let v = value.as_ref();
            let col = &self.columns[col_idx];
            let pos = lower_bound(&self.storage, self.row_size, col, &index.permutation, &v);
            let found = pos < index.permutation.len() && self.value_at(index.permutation[pos], col_idx) == v;
            Ok(!found)
        } else {
            let v = value.as_ref();
            for row in 0..self.row_count {
                if self.value_at(row, col_idx) == v {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }

    fn create_ordered_index_on(&mut self, col: usize) -> Result<()> {
        if self.ordered_indices.iter().any(|idx| idx.column == col) {
            return Err(Error::IndexAlreadyExists);
        }
        let mut permutation: Vec<usize> = (0..self.row_count).collect();
        let column = self.columns[col].clone();
        permutation.sort_by(|&a, &b| {
            let va = column.decode(self.row_slot(a, &column));
            let vb = column.decode(self.row_slot(b, &column));
            va.order_cmp(&vb)
        });
        self.ordered_indices.push(OrderedIndex { column: col, permutation });
        Ok(())
    }

    /// Create ordered indices on each of `cols` (by name). Errors, leaving
    /// every index untouched, if any column is unknown or already indexed.
    pub fn create_ordered_index(&mut self, cols: &[String]) -> Result<()> {
        let mut indices = Vec::with_capacity(cols.len());
        for name in cols {
            let col = self.column_index(name)?;
            if self.ordered_indices.iter().any(|idx| idx.column == col) {
                return Err(Error::IndexAlreadyExists);
            }
            indices.push(col);
        }
        for col in indices {
            self.create_ordered_index_on(col)?;
        }
        Ok(())
    }

    /// All rows, all columns, in declared order.
    pub fn select_all(&self) -> Result<ResultSet> {
        let cols: Vec<String> = self.columns.iter().map(|c| c.name.clone()).collect();
        self.select(&cols, Vec::new())
    }

    /// Select `cols` from rows matching every `(Condition, column-index)` pair.
    pub fn select(&self, cols: &[String], conditions: Vec<(Condition, usize)>) -> Result<ResultSet> {
        let start = Instant::now();
        let out_columns = self.project_columns(cols)?;

        let mut claimed = vec![false; conditions.len()];
        let mut ranges: Vec<IndexRange> = Vec::new();
        loop {
            let mut progressed = false;
            for (idx_pos, index) in self.ordered_indices.iter().enumerate() {
                for (j, (cond, col)) in conditions.iter().enumerate() {
                    if claimed[j] || *col != index.column || cond.op == RelOp::Ne {
                        continue;
                    }
                    let found = self.select_by_index(idx_pos, cond);
                    ranges.extend(found);
                    claimed[j] = true;
                    progressed = true;
                    break;
                }
            }
            if !progressed {
                break;
            }
        }

        let mut included_rows: Vec<usize> = Vec::new();
        if !ranges.is_empty() {
            ranges.sort_by_key(|r| (r.index, r.begin, r.end));
            let mut combined: Vec<IndexRange> = Vec::new();
            let mut current = ranges[0];
            for r in &ranges[1..] {
                if r.index != current.index {
                    combined.push(current);
                    current = *r;
                } else {
                    current.begin = current.begin.max(r.begin);
                    current.end = current.end.min(r.end);
                }
            }
            combined.push(current);
            for r in &mut combined {
                r.end = r.end.max(r.begin);
            }
            combined.sort_by_key(IndexRange::len);

            let chosen = combined[0];
            let index = &self.ordered_indices[chosen.index];
            for &row in &index.permutation[chosen.begin..chosen.end] {
                if self.row_matches(row, &conditions)? {
                    included_rows.push(row);
                }
            }
            included_rows.sort_unstable();
        } else {
            for row in 0..self.row_count {
                if self.row_matches(row, &conditions)? {
                    included_rows.push(row);
                }
            }
        }

        let elapsed = start.elapsed();
        self.make_resultset(&out_columns, &included_rows, elapsed)
    }

    fn row_matches(&self, row: usize, conditions: &[(Condition, usize)]) -> Result<bool> {
        for (cond, col) in conditions {
            if !cond.matches(&self.value_at(row, *col))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Select `cols` from rows where `ast` evaluates to true.
    pub fn select_ast(&self, cols: &[String], ast: &Expr) -> Result<ResultSet> {
        let start = Instant::now();
        for name in cols {
            self.column_index(name)?;
        }
        let (symbols, total_occurrences) = ast.collect_symbols();
        for name in symbols.keys() {
            self.symbol_index(name)?;
        }

        if ast.is_cond_index_friendly() {
            let terms = ast.clone().split_cond_by_and();
            if Expr::is_condition_simple(&terms) {
                let conditions = self.terms_to_conditions(&terms)?;
                return self.select(cols, conditions);
            }
        }

        let out_columns = self.project_columns(cols)?;
        let mut included_rows = Vec::new();
        let mut bindings = vec![Value::None; total_occurrences];
        for row in 0..self.row_count {
            for (name, occurrences) in &symbols {
                let col = self.symbol_index(name)?;
                let value: Value = self.value_at(row, col).into();
                for &pos in occurrences {
                    bindings[pos] = value.clone();
                }
            }
            let result = ast.eval(&bindings)?;
            if result.as_ref().as_bool()? {
                included_rows.push(row);
            }
        }

        let elapsed = start.elapsed();
        self.make_resultset(&out_columns, &included_rows, elapsed)
    }

    /// Convert the conjuncts of a simple, index-friendly condition into
    /// `(Condition, column-index)` pairs.
    fn terms_to_conditions(&self, terms: &[Expr]) -> Result<Vec<(Condition, usize)>> {
        let mut out = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Expr::Symbol(name) => {
                    let col = self.symbol_index(name)?;
                    out.push((Condition { value: Value::Bool(true), op: RelOp::Eq }, col));
                }
                Expr::Binary { op, left, right } => {
                    let (name, value) = match (left.as_ref(), right.as_ref()) {
                        (Expr::Symbol(name), Expr::Literal(v)) => (name, v.clone()),
                        (Expr::Literal(v), Expr::Symbol(name)) => (name, v.clone()),
                        _ => unreachable!("is_condition_simple guarantees id-and-literal shape"),
                    };
                    let col = self.symbol_index(name)?;
                    out.push((Condition { value, op: RelOp::from_op(*op)? }, col));
                }
                _ => unreachable!("is_condition_simple guarantees this shape"),
            }
        }
        Ok(out)
    }

    fn select_by_index(&self, idx_pos: usize, cond: &Condition) -> Vec<IndexRange> {
        let index = &self.ordered_indices[idx_pos];
        let column = &self.columns[index.column];
        let v = cond.value.as_ref();
        let lb = || lower_bound(&self.storage, self.row_size, column, &index.permutation, &v);
        let ub = || upper_bound(&self.storage, self.row_size, column, &index.permutation, &v);
        let range = |begin, end| IndexRange { index: idx_pos, begin, end };
        match cond.op {
            RelOp::Eq => vec![range(lb(), ub())],
            RelOp::Ne => unreachable!("NE is never claimed by the planner"),
            RelOp::Lt => vec![range(0, lb())],
            RelOp::Le => vec![range(0, ub())],
            RelOp::Gt => vec![range(ub(), self.row_count)],
            RelOp::Ge => vec![range(lb(), self.row_count)],
        }
    }

    fn project_columns(&self, cols: &[String]) -> Result<Vec<Column>> {
        let mut offset = 0u16;
        let mut out = Vec::with_capacity(cols.len());
        for name in cols {
            let idx = self.column_index(name)?;
            let mut col = self.columns[idx].clone();
            col.offset = offset;
            offset += col.size;
            out.push(col);
        }
        Ok(out)
    }

    fn is_same_order(&self, cols: &[Column]) -> bool {
        cols.len() == self.columns.len() && cols.iter().zip(&self.columns).all(|(a, b)| a.name == b.name)
    }

    fn make_resultset(
        &self,
        out_columns: &[Column],
        rows: &[usize],
        elapsed: std::time::Duration,
    ) -> Result<ResultSet> {
        let row_size: u16 = out_columns.iter().map(|c| c.size).sum();
        let mut storage = vec![0u8; row_size as usize * rows.len()];

        if self.is_same_order(out_columns) {
            for (out_row, &row) in rows.iter().enumerate() {
                let src_start = row * self.row_size as usize;
                let dst_start = out_row * row_size as usize;
                storage[dst_start..dst_start + row_size as usize]
                    .copy_from_slice(&self.storage[src_start..src_start + row_size as usize]);
            }
        } else {
            for (out_row, &row) in rows.iter().enumerate() {
                for out_col in out_columns {
                    let src_idx = self.column_index(&out_col.name)?;
                    let src_col = &self.columns[src_idx];
                    let src = self.row_slot(row, src_col);
                    let dst_start = out_row * row_size as usize + out_col.offset as usize;
                    storage[dst_start..dst_start + out_col.size as usize].copy_from_slice(src);
                }
            }
        }

        Ok(ResultSet::new(out_columns.to_vec(), row_size, Rc::from(storage), elapsed))
    }

    /// Serialize per the `table :=` layout: columns, row bytes, ordered indices.
    pub fn save_to_file<W: Write>(&self, w: &mut W) -> Result<()> {
        util::write_u64(w, self.columns.len() as u64)?;
        for col in &self.columns {
            col.save_to_file(w)?;
        }
        util::write_u64(w, self.row_count as u64)?;
        w.write_all(&self.storage[..self.row_size as usize * self.row_count])?;
        util::write_u64(w, self.ordered_indices.len() as u64)?;
        for index in &self.ordered_indices {
            util::write_u64(w, index.column as u64)?;
            for &row in &index.permutation {
                util::write_u64(w, row as u64)?;
            }
        }
        Ok(())
    }

    /// Deserialize a table in the format written by [`Table::save_to_file`].
    pub fn load_from_file<R: Read>(r: &mut R) -> Result<Table> {
        let num_cols = util::read_u64(r)? as usize;
        let mut columns = Vec::with_capacity(num_cols);
        for _ in 0..num_cols {
            columns.push(Column::load_from_file(r)?);
        }
        let mapping = columns.iter().enumerate().map(|(i, c)| (c.name.clone(), i)).collect();
        let row_size: u16 = columns.iter().map(|c| c.size).sum();

        let row_count = util::read_u64(r)? as usize;
        let capacity = row_count.max(INITIAL_CAPACITY);
        let mut storage = vec![0u8; row_size as usize * capacity];
        r.read_exact(&mut storage[..row_size as usize * row_count])?;

        let num_idx = util::read_u64(r)? as usize;
        let mut ordered_indices = Vec::with_capacity(num_idx);
        for _ in 0..num_idx {
            let column = util::read_u64(r)? as usize;
            if column >= num_cols {
                return Err(Error::Corrupt("ordered index refers to an unknown column"));
            }
            let mut permutation = Vec::with_capacity(row_count);
            for _ in 0..row_count {
                permutation.push(util::read_u64(r)? as usize);
            }
            ordered_indices.push(OrderedIndex { column, permutation });
        }

        Ok(Table { columns, mapping, row_size, row_count, capacity, storage, ordered_indices })
    }
}

fn lower_bound(
    storage: &[u8],
    row_size: u16,
    column: &Column,
    permutation: &[usize],
    value: &ValueRef,
) -> usize {
    let mut first = 0usize;
    let mut count = permutation.len();
    while count > 0 {
        let step = count / 2;
        let mid = first + step;
        let row = permutation[mid];
        let start = row * row_size as usize + column.offset as usize;
        let slot = &storage[start..start + column.size as usize];
        let candidate = column.decode(slot);
        if candidate.order_cmp(value) == std::cmp::Ordering::Less {
            first = mid + 1;
            count -= step + 1;
        } else {
            count = step;
        }
    }
    first
}

fn upper_bound(
    storage: &[u8],
    row_size: u16,
    column: &Column,
    permutation: &[usize],
    value: &ValueRef,
) -> usize {
    let mut first = 0usize;
    let mut count = permutation.len();
    while count > 0 {
        let step = count / 2;
        let mid = first + step;
        let row = permutation[mid];
        let start = row * row_size as usize + column.offset as usize;
        let slot = &storage[start..start + column.size as usize];
        let candidate = column.decode(slot);
        if candidate.order_cmp(value) != std::cmp::Ordering::Greater {
            first = mid + 1;
            count -= step + 1;
        } else {
            count = step;
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    fn int_col(name: &str) -> Column {
        Column::new(name, DataType::Int, 4)
    }

    fn str_col(name: &str, size: u16) -> Column {
        Column::new(name, DataType::Str, size)
    }

    #[test]
    fn insert_and_select_all_preserves_insertion_order() {
        let mut t = Table::new(vec![int_col("id"), str_col("login", 8)]).unwrap();
        t.insert(vec![Value::Int(1), Value::Str("alice".into())]).unwrap();
        t.insert(vec![Value::Int(2), Value::Str("bob".into())]).unwrap();
        let rs = t.select_all().unwrap();
        assert_eq!(rs.row_count(), 2);
        assert_eq!(rs.row(0).get("login").unwrap(), ValueRef::Str("alice"));
        assert_eq!(rs.row(1).get("login").unwrap(), ValueRef::Str("bob"));
    }

    #[test]
    fn autoincrement_assigns_sequential_ids_and_advances_once_per_success() {
        let mut id = int_col("id");
        id.is_autoincrement = true;
        id.is_key = true;
        let mut t = Table::new(vec![id, str_col("login", 8)]).unwrap();
        t.insert(vec![Value::None, Value::Str("alice".into())]).unwrap();
        t.insert(vec![Value::None, Value::Str("bob".into())]).unwrap();
        let rs = t.select_all().unwrap();
        assert_eq!(rs.row(0).get("id").unwrap(), ValueRef::Int(1));
        assert_eq!(rs.row(1).get("id").unwrap(), ValueRef::Int(2));
    }

    #[test]
    fn uniqueness_violation_leaves_table_untouched() {
        let mut login = str_col("login", 8);
        login.is_key = true;
        let mut t = Table::new(vec![login]).unwrap();
        t.insert(vec![Value::Str("alice".into())]).unwrap();
        let err = t.insert(vec![Value::Str("alice".into())]);
        assert!(matches!(err, Err(Error::UniquenessViolated)));
        assert_eq!(t.row_count(), 1);
    }

    #[test]
    fn string_too_long_rejected() {
        let mut t = Table::new(vec![str_col("login", 4)]).unwrap();
        assert!(matches!(t.insert(vec![Value::Str("toolong".into())]), Err(Error::SizeTooLarge)));
    }

    #[test]
    fn index_range_select_matches_full_scan() {
        let mut t = Table::new(vec![int_col("x")]).unwrap();
        for x in [5, 1, 3, 2, 4] {
            t.insert(vec![Value::Int(x)]).unwrap();
        }
        t.create_ordered_index(&["x".to_string()]).unwrap();

        let conditions = vec![
            (Condition { value: Value::Int(2), op: RelOp::Ge }, 0),
            (Condition { value: Value::Int(4), op: RelOp::Le }, 0),
        ];
        let rs = t.select(&["x".to_string()], conditions).unwrap();
        let got: Vec<i32> = rs.iter().map(|r| r.get("x").unwrap().as_int().unwrap()).collect();
        // original insertion order among the matching rows was 3, 2, 4
        assert_eq!(got, vec![3, 2, 4]);
    }

    #[test]
    fn create_ordered_index_twice_fails() {
        let mut t = Table::new(vec![int_col("x")]).unwrap();
        t.create_ordered_index(&["x".to_string()]).unwrap();
        assert!(matches!(
            t.create_ordered_index(&["x".to_string()]),
            Err(Error::IndexAlreadyExists)
        ));
    }

    #[test]
    fn select_ast_evaluates_constant_folded_predicate() {
        let mut t = Table::new(vec![int_col("id")]).unwrap();
        t.insert(vec![Value::Int(1)]).unwrap();
        t.insert(vec![Value::Int(2)]).unwrap();
        let ast = Expr::Literal(Value::Bool(true));
        let rs = t.select_ast(&["id".to_string()], &ast).unwrap();
        assert_eq!(rs.row_count(), 2);
    }

    #[test]
    fn select_ast_rejects_unknown_symbol() {
        let t = Table::new(vec![int_col("id")]).unwrap();
        let ast = Expr::Symbol("nope".into());
        assert!(matches!(t.select_ast(&["id".to_string()], &ast), Err(Error::UnknownSymbol(_))));
    }

    #[test]
    fn ordered_index_stays_a_valid_permutation_under_random_inserts() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut t = Table::new(vec![int_col("x")]).unwrap();
        t.create_ordered_index(&["x".to_string()]).unwrap();

        let mut inserted = Vec::new();
        for _ in 0..200 {
            let x: i32 = rng.gen_range(-1000..1000);
            t.insert(vec![Value::Int(x)]).unwrap();
            inserted.push(x);
        }

        let index = &t.ordered_indices[0];
        assert_eq!(index.permutation.len(), t.row_count());
        let mut seen = vec![false; t.row_count()];
        for &row in &index.permutation {
            assert!(!seen[row], "row {} appears twice in the permutation", row);
            seen[row] = true;
        }
        assert!(seen.iter().all(|&b| b), "permutation is missing a row");

        let ordered: Vec<i32> =
            index.permutation.iter().map(|&row| t.value_at(row, 0).as_int().unwrap()).collect();
        let mut sorted = ordered.clone();
        sorted.sort_unstable();
        assert_eq!(ordered, sorted, "permutation is not non-decreasing by column value");

        let mut expected = inserted.clone();
        expected.sort_unstable();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn save_and_load_round_trips_rows_and_indices() {
        let mut t = Table::new(vec![int_col("x")]).unwrap();
        for x in [5, 1, 3] {
            t.insert(vec![Value::Int(x)]).unwrap();
        }
        t.create_ordered_index(&["x".to_string()]).unwrap();

        let mut buf = Vec::new();
        t.save_to_file(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let loaded = Table::load_from_file(&mut cursor).unwrap();

        assert_eq!(loaded.row_count(), 3);
        let conditions = vec![(Condition { value: Value::Int(3), op: RelOp::Eq }, 0)];
        let rs = loaded.select(&["x".to_string()], conditions).unwrap();
        assert_eq!(rs.row_count(), 1);
    }
}
