//! Recursive-descent parser over the [`crate::lexer::Token`] stream.
//!
//! Dispatches on the first keyword to one of four statement parsers
//! (CREATE TABLE, CREATE [ORDERED|UNORDERED] INDEX, INSERT, SELECT); a
//! handful of other keywords (UPDATE, DELETE) are recognised and consumed
//! but produce [`Query::Unsupported`] since the grammar parses them without
//! giving them execution semantics (see [`crate::error::Error::NotImplemented`]).

use crate::column::Column;
use crate::error::{Error, Pos, Result};
use crate::expr::{Expr, Op};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::util;
use crate::value::{DataType, Value};

/// One column definition inside a CREATE TABLE statement.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    /// Declared width for STRING/BYTES; ignored for INT/BOOL.
    pub size: u16,
    pub is_unique: bool,
    pub is_autoincrement: bool,
    pub is_key: bool,
    pub default: Option<Value>,
}

impl ColumnDef {
    /// Turn this parsed definition into a storage [`Column`]. Offset is
    /// assigned later by [`crate::table::Table::new`].
    pub fn into_column(self) -> Column {
        let size = match self.data_type {
            DataType::Int => crate::column::INT_SIZE,
            DataType::Bool => crate::column::BOOL_SIZE,
            _ => self.size,
        };
        let mut col = Column::new(self.name, self.data_type, size);
        col.is_unique = self.is_unique;
        col.is_autoincrement = self.is_autoincrement;
        col.is_key = self.is_key;
        col.default = self.default;
        col
    }
}

/// Either form an INSERT statement's value list can take.
#[derive(Debug, Clone)]
pub enum InsertValues {
    /// Comma-separated literal-or-empty list, in declared-column order.
    /// `None` marks an empty slot (use default / autoincrement).
    Positional(Vec<Option<Value>>),
    /// `name = literal` pairs; columns not mentioned are filled with
    /// [`Value::None`] by the caller so table insertion rules apply defaults.
    Named(Vec<(String, Value)>),
}

/// ORDERED vs UNORDERED in a CREATE INDEX statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Ordered,
    Unordered,
}

/// A fully parsed statement.
#[derive(Debug, Clone)]
pub enum Query {
    CreateTable { table: String, columns: Vec<ColumnDef> },
    CreateIndex { kind: IndexKind, table: String, columns: Vec<String> },
    Insert { table: String, values: InsertValues },
    Select { table: String, columns: Vec<String>, predicate: Expr },
    /// Recognised by the grammar (UPDATE, DELETE) but never executed.
    Unsupported(&'static str),
}

/// Parse a complete query string into one [`Query`].
pub fn parse_query(source: &str) -> Result<Query> {
    let tokens = Lexer::new(source).tokenize()?;
    if tokens.len() == 1 {
        // Just the Eoq sentinel: nothing but whitespace.
        return Err(Error::EmptyQuery);
    }
    let mut p = Parser { tokens, pos: 0 };
    p.parse_query()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn pos_here(&self) -> Pos {
        self.peek().pos
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn accept(&mut self, kind: TokenKind) -> Result<Token> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(Error::SyntaxError(self.pos_here()))
        }
    }

    fn accept_id(&mut self) -> Result<String> {
        Ok(self.accept(TokenKind::Id)?.text)
    }

    fn parse_query(&mut self) -> Result<Query> {
        match self.peek_kind() {
            TokenKind::Create => self.parse_create(),
            TokenKind::Insert => self.parse_insert(),
            TokenKind::Select => self.parse_select(),
            TokenKind::Update => {
                self.skip_to_eoq();
                Ok(Query::Unsupported("UPDATE"))
            }
            TokenKind::Delete => {
                self.skip_to_eoq();
                Ok(Query::Unsupported("DELETE"))
            }
            _ => Err(Error::SyntaxError(self.pos_here())),
        }
    }

    fn skip_to_eoq(&mut self) {
        while self.peek_kind() != TokenKind::Eoq {
            self.advance();
        }
    }

    fn parse_create(&mut self) -> Result<Query> {
        self.accept(TokenKind::Create)?;
        match self.peek_kind() {
            TokenKind::Table => self.parse_create_table(),
            TokenKind::Ordered | TokenKind::Unordered => self.parse_create_index(),
            _ => Err(Error::SyntaxError(self.pos_here())),
        }
    }

    fn parse_create_table(&mut self) -> Result<Query> {
        self.accept(TokenKind::Table)?;
        let table = self.accept_id()?;
        self.accept(TokenKind::LParen)?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.accept(TokenKind::RParen)?;
        self.accept(TokenKind::Eoq)?;
        Ok(Query::CreateTable { table, columns })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let mut is_unique = false;
        let mut is_autoincrement = false;
        let mut is_key = false;
        if self.peek_kind() == TokenKind::LBrace {
            self.advance();
            loop {
                match self.peek_kind() {
                    TokenKind::Unique => {
                        self.advance();
                        is_unique = true;
                    }
                    TokenKind::Autoincrement => {
                        self.advance();
                        is_autoincrement = true;
                    }
                    TokenKind::Key => {
                        self.advance();
                        is_key = true;
                    }
                    _ => return Err(Error::SyntaxError(self.pos_here())),
                }
                if self.peek_kind() == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
            self.accept(TokenKind::RBrace)?;
        }
        let name = self.accept_id()?;
        self.accept(TokenKind::Colon)?;
        let (data_type, size) = self.parse_column_type()?;
        let default = self.parse_optional_default()?;
        Ok(ColumnDef { name, data_type, size, is_unique, is_autoincrement, is_key, default })
    }

    fn parse_column_type(&mut self) -> Result<(DataType, u16)> {
        match self.peek_kind() {
            TokenKind::Int32 => {
                self.advance();
                Ok((DataType::Int, crate::column::INT_SIZE))
            }
            TokenKind::Bool => {
                self.advance();
                Ok((DataType::Bool, crate::column::BOOL_SIZE))
            }
            TokenKind::Str => {
                self.advance();
                let size = self.parse_bracketed_size()?;
                Ok((DataType::Str, size))
            }
            TokenKind::Bytes => {
                self.advance();
                let size = self.parse_bracketed_size()?;
                Ok((DataType::Bytes, size))
            }
            _ => Err(Error::SyntaxError(self.pos_here())),
        }
    }

    fn parse_bracketed_size(&mut self) -> Result<u16> {
        self.accept(TokenKind::LBracket)?;
        let tok = self.accept(TokenKind::IntLit)?;
        let n: u16 = tok.text.parse().map_err(|_| Error::NoConversion)?;
        self.accept(TokenKind::RBracket)?;
        Ok(n)
    }

    fn parse_optional_default(&mut self) -> Result<Option<Value>> {
        if self.peek_kind() == TokenKind::Eq {
            self.advance();
            Ok(Some(self.parse_literal_value()?))
        } else {
            Ok(None)
        }
    }

    /// A literal value token, used by CREATE TABLE defaults and INSERT
    /// values — never a full expression (no identifiers, no operators).
    fn parse_literal_value(&mut self) -> Result<Value> {
        match self.peek_kind() {
            TokenKind::IntLit => {
                let tok = self.advance();
                let n: i32 = tok.text.parse().map_err(|_| Error::NoConversion)?;
                Ok(Value::Int(n))
            }
            TokenKind::BoolLit => {
                let tok = self.advance();
                Ok(Value::Bool(tok.text.eq_ignore_ascii_case("true")))
            }
            TokenKind::StrLit => {
                let tok = self.advance();
                Ok(Value::Str(tok.text.into()))
            }
            TokenKind::BytesLit => {
                let tok = self.advance();
                let bytes = util::parse_hex(&tok.text[2..])?;
                Ok(Value::Bytes(bytes.into()))
            }
            _ => Err(Error::SyntaxError(self.pos_here())),
        }
    }

    fn parse_create_index(&mut self) -> Result<Query> {
        let kind = match self.peek_kind() {
            TokenKind::Ordered => {
                self.advance();
                IndexKind::Ordered
            }
            TokenKind::Unordered => {
                self.advance();
                IndexKind::Unordered
            }
            _ => return Err(Error::SyntaxError(self.pos_here())),
        };
        self.accept(TokenKind::Index)?;
        self.accept(TokenKind::On)?;
        let table = self.accept_id()?;
        self.accept(TokenKind::By)?;
        let mut columns = vec![self.accept_id()?];
        while self.peek_kind() == TokenKind::Comma {
            self.advance();
            columns.push(self.accept_id()?);
        }
        self.accept(TokenKind::Eoq)?;
        Ok(Query::CreateIndex { kind, table, columns })
    }

    fn parse_insert(&mut self) -> Result<Query> {
        self.accept(TokenKind::Insert)?;
        self.accept(TokenKind::LParen)?;
        let values = self.parse_insert_values()?;
        self.accept(TokenKind::RParen)?;
        self.accept(TokenKind::To)?;
        let table = self.accept_id()?;
        self.accept(TokenKind::Eoq)?;
        Ok(Query::Insert { table, values })
    }

    /// Named form: the first element is an identifier immediately followed
    /// by `=`. Otherwise, positional form.
    fn parse_insert_values(&mut self) -> Result<InsertValues> {
        let is_named = self.peek_kind() == TokenKind::Id
            && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::Eq);
        if is_named {
            let mut pairs = Vec::new();
            loop {
                let name = self.accept_id()?;
                self.accept(TokenKind::Eq)?;
                let value = self.parse_literal_value()?;
                pairs.push((name, value));
                if self.peek_kind() == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
            Ok(InsertValues::Named(pairs))
        } else {
            let mut values = Vec::new();
            loop {
                if matches!(self.peek_kind(), TokenKind::Comma | TokenKind::RParen) {
                    values.push(None);
                } else {
                    values.push(Some(self.parse_literal_value()?));
                }
                if self.peek_kind() == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
            Ok(InsertValues::Positional(values))
        }
    }

    fn parse_select(&mut self) -> Result<Query> {
        self.accept(TokenKind::Select)?;
        let mut columns = vec![self.accept_id()?];
        while self.peek_kind() == TokenKind::Comma {
            self.advance();
            columns.push(self.accept_id()?);
        }
        self.accept(TokenKind::From)?;
        let table = self.accept_id()?;
        self.accept(TokenKind::Where)?;
        let predicate = self.parse_or()?.simplify()?;
        self.accept(TokenKind::Eoq)?;
        Ok(Query::Select { table, columns, predicate })
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut node = self.parse_xor()?;
        while self.peek_kind() == TokenKind::Or {
            self.advance();
            node = bin(Op::Or, node, self.parse_xor()?);
        }
        Ok(node)
    }

    fn parse_xor(&mut self) -> Result<Expr> {
        let mut node = self.parse_and()?;
        while self.peek_kind() == TokenKind::Xor {
            self.advance();
            node = bin(Op::Xor, node, self.parse_and()?);
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut node = self.parse_rel()?;
        while self.peek_kind() == TokenKind::And {
            self.advance();
            node = bin(Op::And, node, self.parse_rel()?);
        }
        Ok(node)
    }

    fn parse_rel(&mut self) -> Result<Expr> {
        let node = self.parse_sum()?;
        let op = match self.peek_kind() {
            TokenKind::Eq => Op::Eq,
            TokenKind::Ne => Op::Ne,
            TokenKind::Lt => Op::Lt,
            TokenKind::Gt => Op::Gt,
            TokenKind::Le => Op::Le,
            TokenKind::Ge => Op::Ge,
            _ => return Ok(node),
        };
        self.advance();
        Ok(bin(op, node, self.parse_sum()?))
    }

    fn parse_sum(&mut self) -> Result<Expr> {
        let mut node = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => Op::Add,
                TokenKind::Minus => Op::Sub,
                _ => break,
            };
            self.advance();
            node = bin(op, node, self.parse_term()?);
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut node = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => Op::Mul,
                TokenKind::Slash => Op::Div,
                TokenKind::Percent => Op::Mod,
                _ => break,
            };
            self.advance();
            node = bin(op, node, self.parse_unary()?);
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Plus => Some(Op::Add),
            TokenKind::Minus => Some(Op::Sub),
            TokenKind::Not => Some(Op::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op, operand: Box::new(operand) });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            TokenKind::Id => Ok(Expr::Symbol(self.advance().text)),
            TokenKind::IntLit | TokenKind::BoolLit | TokenKind::StrLit | TokenKind::BytesLit => {
                Ok(Expr::Literal(self.parse_literal_value()?))
            }
            TokenKind::LParen => {
                self.advance();
                let node = self.parse_or()?;
                self.accept(TokenKind::RParen)?;
                Ok(node)
            }
            _ => Err(Error::SyntaxError(self.pos_here())),
        }
    }
}

fn bin(op: Op, left: Expr, right: Expr) -> Expr {
    Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_parses_attrs_and_default() {
        let q = parse_query(
            r#"create table t ({key, autoincrement} id: int32, login: string[8] = "anon")"#,
        )
        .unwrap();
        match q {
            Query::CreateTable { table, columns } => {
                assert_eq!(table, "t");
                assert_eq!(columns.len(), 2);
                assert!(columns[0].is_key && columns[0].is_autoincrement);
                assert_eq!(columns[1].default, Some(Value::Str("anon".into())));
            }
            _ => panic!("expected CreateTable"),
        }
    }

    #[test]
    fn insert_positional_with_empty_slot() {
        let q = parse_query(r#"insert (, "alice") to t"#).unwrap();
        match q {
            Query::Insert { table, values: InsertValues::Positional(vals) } => {
                assert_eq!(table, "t");
                assert_eq!(vals.len(), 2);
                assert!(vals[0].is_none());
                assert_eq!(vals[1], Some(Value::Str("alice".into())));
            }
            _ => panic!("expected positional insert"),
        }
    }

    #[test]
    fn insert_named_form() {
        let q = parse_query(r#"insert (login="bob") to t"#).unwrap();
        match q {
            Query::Insert { values: InsertValues::Named(pairs), .. } => {
                assert_eq!(pairs, vec![("login".to_string(), Value::Str("bob".into()))]);
            }
            _ => panic!("expected named insert"),
        }
    }

    #[test]
    fn create_ordered_index_by_multiple_columns() {
        let q = parse_query("create ordered index on u by x, y").unwrap();
        match q {
            Query::CreateIndex { kind, table, columns } => {
                assert_eq!(kind, IndexKind::Ordered);
                assert_eq!(table, "u");
                assert_eq!(columns, vec!["x".to_string(), "y".to_string()]);
            }
            _ => panic!("expected create index"),
        }
    }

    #[test]
    fn select_predicate_is_constant_folded() {
        let q = parse_query("select id from t where 1 + 2 * 3 = 7").unwrap();
        match q {
            Query::Select { predicate, .. } => {
                assert!(matches!(predicate, Expr::Literal(Value::Bool(true))));
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn select_requires_where() {
        assert!(parse_query("select id from t").is_err());
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(matches!(parse_query("   "), Err(Error::EmptyQuery)));
    }

    #[test]
    fn unknown_leading_keyword_is_syntax_error() {
        assert!(parse_query("frobnicate t").is_err());
    }
}
