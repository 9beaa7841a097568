use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Line/column of a token or source position, used by lexical and syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} position {}", self.line, self.col)
    }
}

/// All error kinds raised by the lexer, parser, expression evaluator, table and
/// database layers. The [`Database`](crate::database::Database) facade translates
/// every one of these into a `!ok` [`ResultSet`](crate::resultset::ResultSet).
#[derive(Debug, Clone)]
pub enum Error {
    /// Lexer could not recognise the input at the given position.
    LexicalError(Pos),
    /// Parser encountered an unexpected token at the given position.
    SyntaxError(Pos),
    /// No table with the given name.
    UnknownTable(String),
    /// A table with the given name already exists.
    DuplicateTable(String),
    /// Column definition list contains a repeated name.
    DuplicateColumnName(String),
    /// No column with the given name.
    UnknownColumn(String),
    /// An identifier in an expression is not a column of the table being queried.
    UnknownSymbol(String),
    /// Operand types do not match, or do not match the column they are inserted into.
    TypeMismatch,
    /// A STRING or BYTES value is too large for its column.
    SizeTooLarge,
    /// Insert value count does not match the table's column count.
    ColumnsMismatch,
    /// A unique/key constraint would be violated.
    UniquenessViolated,
    /// An operator is not defined for the given value type.
    OperatorUnsupported,
    /// CREATE ORDERED INDEX on a column that already has one.
    IndexAlreadyExists,
    /// AUTOINCREMENT was requested on a non-INT column.
    AutoincrementOnNonInt,
    /// A column default value's type does not match the column's declared type.
    DefaultTypeMismatch,
    /// A literal token could not be converted to a Value.
    NoConversion,
    /// The query string contained no tokens.
    EmptyQuery,
    /// The requested operation is recognised by the grammar but not executed
    /// (UPDATE, DELETE, JOIN, UNORDERED INDEX).
    NotImplemented(&'static str),
    /// A save/load byte stream ended before the format said it would, or
    /// held a value the format does not define (e.g. an unknown type tag).
    Corrupt(&'static str),
    /// The underlying reader/writer failed. Carries the message rather than
    /// the source `std::io::Error` so `Error` can stay `Clone`.
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LexicalError(pos) => write!(f, "Lexical error at {}", pos),
            Error::SyntaxError(pos) => write!(f, "Syntax error at {}", pos),
            Error::UnknownTable(name) => write!(f, "No table named \"{}\" was found", name),
            Error::DuplicateTable(name) => {
                write!(f, "A table named \"{}\" already exists", name)
            }
            Error::DuplicateColumnName(name) => {
                write!(f, "The column definition contains a duplicate name \"{}\"", name)
            }
            Error::UnknownColumn(name) => write!(f, "Unknown column \"{}\"", name),
            Error::UnknownSymbol(name) => write!(f, "Unknown symbol \"{}\" in condition", name),
            Error::TypeMismatch => write!(f, "Type mismatch"),
            Error::SizeTooLarge => write!(f, "Size too large"),
            Error::ColumnsMismatch => write!(f, "Columns mismatch"),
            Error::UniquenessViolated => write!(f, "Value is not unique"),
            Error::OperatorUnsupported => write!(f, "Operator not supported for this type"),
            Error::IndexAlreadyExists => write!(f, "Ordered index already exists on this column"),
            Error::AutoincrementOnNonInt => {
                write!(f, "Autoincrement is only allowed on int32 columns")
            }
            Error::DefaultTypeMismatch => {
                write!(f, "The default value type does not match the column type")
            }
            Error::NoConversion => write!(f, "No conversion from literal to value"),
            Error::EmptyQuery => write!(f, "Empty query"),
            Error::NotImplemented(what) => write!(f, "Not implemented: {}", what),
            Error::Corrupt(what) => write!(f, "Corrupt data: {}", what),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
