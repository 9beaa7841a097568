//! An embeddable, single-process, in-memory relational data store with a
//! small query DSL.
//!
//! A [`Database`](database::Database) holds zero or more named [`Table`](table::Table)s.
//! Each table has a fixed column layout (INT32, BOOL, STRING\[N\], BYTES\[N\]),
//! packed row storage, and any number of ordered indices. Queries are plain
//! strings in the DSL described below, run one at a time through
//! [`Database::execute`](database::Database::execute):
//!
//! ```text
//! create table users ({key, autoincrement} id: int32, login: string[16])
//! create ordered index on users by login
//! insert (, "alice") to users
//! select id, login from users where login = "alice"
//! ```
//!
//! There is no SQL parser, no query planner beyond a single-table
//! range-vs-full-scan choice, no transactions, no concurrency, and no
//! on-disk storage engine — only an explicit, whole-database
//! [`Database::save_to_file`](database::Database::save_to_file) /
//! [`Database::load_from_file`](database::Database::load_from_file) pair.
//!
//! # Pipeline
//!
//! A query string passes through [`lexer`] (tokens), [`parse`] (a
//! [`parse::Query`]), and, for SELECT, [`expr`] (a tagged-sum
//! [`expr::Expr`] tree that is constant-folded and, where possible,
//! classified as index-friendly before [`table::Table::select_ast`] walks
//! it). [`column`] and [`value`] describe the scalar type system;
//! [`resultset`] is what a SELECT hands back.
//!
//! # Errors
//!
//! Every fallible operation returns [`error::Result`]; there is no panic
//! path for malformed queries or data, only for internal invariant
//! violations (`debug_assert!`).
mod column;
mod database;
mod error;
mod expr;
mod lexer;
mod parse;
mod resultset;
mod table;
mod util;
mod value;

pub use column::{Column, BOOL_SIZE, INT_SIZE};
pub use database::Database;
pub use error::{Error, Pos, Result};
pub use expr::{Expr, Op};
pub use lexer::{Lexer, Token, TokenKind};
pub use parse::{parse_query, ColumnDef, IndexKind, InsertValues, Query};
pub use resultset::{ResultRow, ResultSet, ResultSetIter};
pub use table::{Condition, OrderedIndex, RelOp, Table};
pub use value::{DataType, Value, ValueRef};
