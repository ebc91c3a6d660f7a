//! The query envelope: the single message type crossing the wire
//!
//! An `Envelope` describes one logical database operation (kind, target
//! tables, columns, WHERE clause) or one out-of-band notice. Clients send
//! `QueryRequest` envelopes and read back correlated `Response` envelopes;
//! the reconciliation engine builds `Internal` envelopes that never cross
//! the wire but render through the exact same path.
//!
//! Lifecycle: construct fresh per call, render once, never reuse across two
//! different operations. Request constructors always mint a fresh
//! correlation id; response constructors copy the request's id verbatim so
//! the initiator can match them.

use parkwell_core::{Row, SqlValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeKind {
    /// Client asks the server to run one operation
    QueryRequest,
    /// Server answer, correlated to a request
    Response,
    /// Server-internal operation (reconciliation); never framed
    Internal,
    /// Client-to-server out-of-band notice
    ClientNotice,
    /// Server-to-client out-of-band notice
    ServerNotice,
}

/// The four supported operations — the protocol's fixed shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOperation {
    /// SELECT columns FROM tables [WHERE ...]
    Select,
    /// INSERT INTO table (columns) VALUES (values)
    Insert,
    /// UPDATE table SET col = val [WHERE ...]
    Update,
    /// DELETE FROM table [WHERE ...]
    Delete,
}

/// Column selection for SELECT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSpec {
    /// The wildcard marker `*`
    All,
    /// Named columns, comma-joined in input order
    Columns(Vec<String>),
}

/// Comparison operator inside one WHERE condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `IN` — the value is a caller-preformatted parenthesized `Raw` list
    In,
}

impl Comparator {
    /// SQL symbol for this comparator
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::NotEq => "<>",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::In => "IN",
        }
    }
}

/// Boolean joiner between two consecutive conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connective {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Connective {
    /// SQL keyword for this joiner
    pub fn keyword(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// One `column <op> value` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Column name
    pub column: String,
    /// Comparison operator
    pub op: Comparator,
    /// Right-hand value
    pub value: SqlValue,
}

/// Ordered WHERE clause: n conditions joined by n-1 connectives.
///
/// This is the (columns, operators, values) triple of the protocol, with
/// the boolean joiners carried between consecutive comparisons. An empty
/// clause omits the WHERE entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WhereClause {
    /// Conditions in input order
    pub conditions: Vec<Condition>,
    /// Joiners between consecutive conditions; length must be
    /// `conditions.len() - 1` (or 0 when empty)
    pub connectives: Vec<Connective>,
}

impl WhereClause {
    /// An empty clause (no WHERE rendered)
    pub fn empty() -> Self {
        WhereClause::default()
    }

    /// A clause with a single condition
    pub fn single(column: impl Into<String>, op: Comparator, value: SqlValue) -> Self {
        WhereClause {
            conditions: vec![Condition {
                column: column.into(),
                op,
                value,
            }],
            connectives: Vec::new(),
        }
    }

    /// Append a condition joined with AND
    pub fn and(self, column: impl Into<String>, op: Comparator, value: SqlValue) -> Self {
        self.join(Connective::And, column, op, value)
    }

    /// Append a condition joined with OR
    pub fn or(self, column: impl Into<String>, op: Comparator, value: SqlValue) -> Self {
        self.join(Connective::Or, column, op, value)
    }

    fn join(
        mut self,
        conn: Connective,
        column: impl Into<String>,
        op: Comparator,
        value: SqlValue,
    ) -> Self {
        if !self.conditions.is_empty() {
            self.connectives.push(conn);
        }
        self.conditions.push(Condition {
            column: column.into(),
            op,
            value,
        });
        self
    }

    /// Whether the clause is empty
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Out-of-band notice payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// Server is running a reconciliation pass; clients may show a wait state
    MaintenanceInProgress,
    /// Client is going away; the server deregisters it, no response
    Disconnect,
}

/// The structured message describing one database operation or one notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message kind
    pub kind: EnvelopeKind,
    /// Operation — required for `QueryRequest` and `Internal`
    pub operation: Option<QueryOperation>,
    /// Target table names, in order (non-empty for query kinds)
    pub tables: Vec<String>,
    /// Column selection, SELECT only
    pub select_columns: ColumnSpec,
    /// Ordered column → value pairs, INSERT/UPDATE only
    pub assignments: Vec<(String, SqlValue)>,
    /// WHERE clause
    pub conditions: WhereClause,
    /// Explicit opt-in for an UPDATE/DELETE with an empty WHERE.
    /// An unguarded unconditional mutation fails rendering.
    pub unconditional: bool,
    /// Opaque id copied from a request into its response
    pub correlation_id: Uuid,
    /// Result rows, SELECT response only
    pub rows: Vec<Row>,
    /// Boolean outcome, response side
    pub success: Option<bool>,
    /// Notice payload, notice kinds only
    pub notice: Option<Notice>,
}

impl Envelope {
    fn blank(kind: EnvelopeKind) -> Self {
        Envelope {
            kind,
            operation: None,
            tables: Vec::new(),
            select_columns: ColumnSpec::All,
            assignments: Vec::new(),
            conditions: WhereClause::empty(),
            unconditional: false,
            correlation_id: Uuid::new_v4(),
            rows: Vec::new(),
            success: None,
            notice: None,
        }
    }

    /// Build a SELECT request
    pub fn select(tables: Vec<String>, columns: ColumnSpec, conditions: WhereClause) -> Self {
        Envelope {
            operation: Some(QueryOperation::Select),
            tables,
            select_columns: columns,
            conditions,
            ..Envelope::blank(EnvelopeKind::QueryRequest)
        }
    }

    /// Build an INSERT request (single target table)
    pub fn insert(table: impl Into<String>, assignments: Vec<(String, SqlValue)>) -> Self {
        Envelope {
            operation: Some(QueryOperation::Insert),
            tables: vec![table.into()],
            assignments,
            ..Envelope::blank(EnvelopeKind::QueryRequest)
        }
    }

    /// Build an UPDATE request (single target table)
    pub fn update(
        table: impl Into<String>,
        assignments: Vec<(String, SqlValue)>,
        conditions: WhereClause,
    ) -> Self {
        Envelope {
            operation: Some(QueryOperation::Update),
            tables: vec![table.into()],
            assignments,
            conditions,
            ..Envelope::blank(EnvelopeKind::QueryRequest)
        }
    }

    /// Build a DELETE request (single target table)
    pub fn delete(table: impl Into<String>, conditions: WhereClause) -> Self {
        Envelope {
            operation: Some(QueryOperation::Delete),
            tables: vec![table.into()],
            conditions,
            ..Envelope::blank(EnvelopeKind::QueryRequest)
        }
    }

    /// Re-kind a request as server-internal (never framed)
    pub fn into_internal(mut self) -> Self {
        self.kind = EnvelopeKind::Internal;
        self
    }

    /// Opt in to an unconditional (WHERE-less) mutation
    pub fn unconditional(mut self) -> Self {
        self.unconditional = true;
        self
    }

    /// Build a SELECT response carrying result rows
    pub fn response_rows(request: &Envelope, rows: Vec<Row>) -> Self {
        Envelope {
            correlation_id: request.correlation_id,
            rows,
            success: Some(true),
            ..Envelope::blank(EnvelopeKind::Response)
        }
    }

    /// Build a response carrying only a boolean outcome
    pub fn response_outcome(request: &Envelope, success: bool) -> Self {
        Envelope {
            correlation_id: request.correlation_id,
            success: Some(success),
            ..Envelope::blank(EnvelopeKind::Response)
        }
    }

    /// Build a server-to-client notice
    pub fn server_notice(notice: Notice) -> Self {
        Envelope {
            notice: Some(notice),
            ..Envelope::blank(EnvelopeKind::ServerNotice)
        }
    }

    /// Build the client-to-server disconnect notice
    pub fn disconnect() -> Self {
        Envelope {
            notice: Some(Notice::Disconnect),
            ..Envelope::blank(EnvelopeKind::ClientNotice)
        }
    }
}
