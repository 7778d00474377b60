// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by generators, the validation pipeline and the orchestrator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

/// Row cap applied when `bot.max_rows` is unset or non-positive.
pub const DEFAULT_MAX_ROWS: u64 = 1000;

/// Resolves a configured row cap, falling back to [`DEFAULT_MAX_ROWS`].
pub fn effective_max_rows(configured: i64) -> u64 {
    if configured <= 0 {
        DEFAULT_MAX_ROWS
    } else {
        configured as u64
    }
}

// --- Provider selection ---

/// The closed set of SQL generator backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Gemini,
    Ollama,
}

impl ProviderKind {
    /// Every provider, in display order.
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Gemini, Self::Ollama];
}

impl Serialize for ProviderKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ProviderKind::from_str(&raw).map_err(|_| {
            serde::de::Error::unknown_variant(&raw, &["openai", "gemini", "ollama"])
        })
    }
}

// --- Schema snapshot ---

/// A column of a table in the schema snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub identity: bool,
}

/// A table in the schema snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Schema or namespace the table lives in (`dbo`, `main`, ...).
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
}

impl Table {
    /// `schema.name`, or just `name` when the namespace is unknown.
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

/// A foreign-key relationship between two columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

/// Point-in-time catalog of the target database.
///
/// Snapshots are immutable: refresh produces a new snapshot that replaces the
/// old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Schema {
    /// An empty snapshot, used when no live schema or cache is available.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true when the snapshot has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Case-insensitive table lookup by unqualified name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        let wanted = name.to_lowercase();
        self.tables.iter().find(|t| t.name.to_lowercase() == wanted)
    }

    /// Case-insensitive table membership test.
    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }
}

// --- Parameters and result values ---

/// A scalar SQL value, used for bound parameters and result cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// Infers a typed value from a literal written by a model
    /// (`42`, `3.5`, `true`, `'Delhi'`, `Delhi`).
    pub fn parse_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            return Self::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Self::Real(f);
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Boolean(false);
        }
        let unquoted = trimmed
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
            .unwrap_or(trimmed);
        Self::Text(unquoted.to_string())
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Boolean(b) => write!(f, "{b}"),
            SqlValue::Integer(i) => write!(f, "{i}"),
            SqlValue::Real(r) => write!(f, "{r}"),
            SqlValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Named parameter bindings (`@city` -> `Delhi`).
pub type Parameters = BTreeMap<String, SqlValue>;

// --- Conversation context ---

/// Author of a conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
}

/// Language register of a question.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum Language {
    #[default]
    #[strum(serialize = "en")]
    #[serde(rename = "en")]
    English,
    /// Hindi/English code-mixed text in Latin script.
    #[strum(serialize = "hi-en")]
    #[serde(rename = "hi-en")]
    Hinglish,
}

/// A single turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A typed session variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for SessionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionValue::Boolean(b) => write!(f, "{b}"),
            SessionValue::Integer(i) => write!(f, "{i}"),
            SessionValue::Float(x) => write!(f, "{x}"),
            SessionValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for SessionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SessionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SessionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SessionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SessionValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Conversation state passed read-only into each generator call.
///
/// Owned by the caller; the orchestrator never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub messages: Vec<ConversationMessage>,
    pub session_variables: BTreeMap<String, SessionValue>,
    pub preferred_language: Language,
    pub session_start: DateTime<Utc>,
}

impl ConversationContext {
    /// Starts a fresh session at the current time.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            session_variables: BTreeMap::new(),
            preferred_language: Language::English,
            session_start: Utc::now(),
        }
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

// --- Generation ---

/// Output of a single SQL generator call.
///
/// When `requires_clarification` is set, `sql` is ignored downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    pub sql: String,
    pub parameters: Parameters,
    pub requires_clarification: bool,
    pub clarification_question: Option<String>,
    pub language: Language,
}

impl GenerationResult {
    /// A result carrying candidate SQL.
    pub fn with_sql(sql: impl Into<String>, parameters: Parameters, language: Language) -> Self {
        Self {
            sql: sql.into(),
            parameters,
            requires_clarification: false,
            clarification_question: None,
            language,
        }
    }

    /// A result asking the user a follow-up question instead of producing SQL.
    pub fn clarification(question: impl Into<String>, language: Language) -> Self {
        Self {
            sql: String::new(),
            parameters: Parameters::new(),
            requires_clarification: true,
            clarification_question: Some(question.into()),
            language,
        }
    }
}

// --- Validation ---

/// Fixed taxonomy of validation rejection codes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    SelectOnlyViolation,
    SemicolonViolation,
    CommentViolation,
    DangerousFunctionViolation,
    SchemaViolation,
    RowLimitViolation,
    RowLimitExceeded,
}

/// A rule rejection. Always carries a code and a non-empty message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub code: ViolationCode,
    pub message: String,
}

impl Violation {
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Verdict of the validation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Passed,
    Rejected(Violation),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Passed)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            ValidationOutcome::Passed => None,
            ValidationOutcome::Rejected(v) => Some(v),
        }
    }

    pub fn code(&self) -> Option<ViolationCode> {
        self.violation().map(|v| v.code)
    }
}

// --- Execution ---

/// Metadata for one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    /// Declared or observed type, when the backend reports one.
    pub data_type: Option<String>,
}

/// Rows plus column metadata returned by the executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularResult {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl TabularResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// States of the query orchestration state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum QueryStage {
    Start,
    SchemaLoaded,
    Generated,
    ClarificationNeeded,
    Validated,
    LimitEnforced,
    StructureChecked,
    Executed,
    Done,
}

/// Classification of a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Upstream generator unavailable or malformed response.
    Provider,
    /// Policy rejection by the validation pipeline.
    Validation,
    /// SQL inconsistent with the live database.
    Structural,
    /// Misconfiguration (missing credentials, unusable settings).
    Configuration,
    /// Catch-all.
    Unexpected,
}

/// Details of a failed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    pub kind: FailureKind,
    /// Stage the state machine was in when it failed.
    pub stage: QueryStage,
    pub message: String,
    /// Rule code, for validation failures.
    pub code: Option<ViolationCode>,
}

/// Terminal outcome of one orchestrated request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Success(TabularResult),
    /// The generator needs a new user turn before it can produce SQL.
    Clarification { question: String },
    Failure(QueryFailure),
}

/// The single value returned by the orchestrator for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub outcome: QueryOutcome,
    /// The SQL actually executed (after limit injection), or the last SQL
    /// handled before a failure. Empty when no SQL was produced.
    pub sql: String,
    pub parameters: Parameters,
    pub language: Language,
    /// Wall time from orchestrator entry to the returned result.
    pub elapsed: Duration,
    pub row_count: usize,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Success(_))
    }

    pub fn requires_clarification(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Clarification { .. })
    }

    pub fn results(&self) -> Option<&TabularResult> {
        match &self.outcome {
            QueryOutcome::Success(table) => Some(table),
            _ => None,
        }
    }

    pub fn clarification_question(&self) -> Option<&str> {
        match &self.outcome {
            QueryOutcome::Clarification { question } => Some(question),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&QueryFailure> {
        match &self.outcome {
            QueryOutcome::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.failure().map(|f| f.message.as_str())
    }
}
