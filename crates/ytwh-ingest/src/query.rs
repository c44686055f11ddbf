//! Operator read queries against the warehouse
//!
//! Free-text SQL is accepted, but only as a single read-only statement:
//! a `SELECT` (including `WITH … SELECT`, set operations and `VALUES`) or an
//! `EXPLAIN` of one. `sqlparser` screens the statement first. SQLite syntax
//! the parser does not know (`GLOB`, `MATCH`, …) falls back to a token check,
//! and every statement runs on a connection with `PRAGMA query_only` set, so
//! SQLite itself refuses writes that get past the screen.

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::QueryError;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Rows beyond this are dropped and the result is flagged as truncated
pub const MAX_RESULT_ROWS: usize = 10_000;

/// Tabular query result; every cell is a JSON scalar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub truncated: bool,
}

impl QueryResults {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Accept exactly one read-only statement
pub fn validate_read_only(sql: &str) -> Result<(), QueryError> {
    if sql.trim().trim_end_matches(';').trim().is_empty() {
        return Err(QueryError::Empty);
    }

    let dialect = SQLiteDialect {};
    let statements = match Parser::parse_sql(&dialect, sql) {
        Ok(statements) => statements,
        Err(e) => return check_unparsed(&dialect, sql, e.to_string()),
    };

    match statements.as_slice() {
        [] => Err(QueryError::Empty),
        [statement] => check_statement(statement),
        _ => Err(QueryError::Forbidden(
            "only a single statement is allowed".to_string(),
        )),
    }
}

fn check_statement(statement: &Statement) -> Result<(), QueryError> {
    match statement {
        Statement::Query(query) => match query.body.as_ref() {
            SetExpr::Insert(_) | SetExpr::Update(_) => Err(QueryError::Forbidden(
                "data-modifying statements are not allowed".to_string(),
            )),
            _ => Ok(()),
        },
        Statement::Explain { statement, .. } => check_statement(statement),
        Statement::Insert { .. } | Statement::Update { .. } | Statement::Delete { .. } => {
            Err(QueryError::Forbidden(
                "INSERT, UPDATE and DELETE are not allowed; the warehouse is written by ingestion only"
                    .to_string(),
            ))
        },
        Statement::Drop { .. }
        | Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::AlterTable { .. } => Err(QueryError::Forbidden(
            "DDL statements are not allowed".to_string(),
        )),
        other => Err(QueryError::Forbidden(format!(
            "statement is not a read query: {}",
            first_keyword(&other.to_string())
        ))),
    }
}

/// Token-level check for statements the parser cannot handle
///
/// Only a single statement opening with a read keyword gets through; SQLite
/// reports any real syntax error when it runs.
fn check_unparsed(dialect: &SQLiteDialect, sql: &str, parse_error: String) -> Result<(), QueryError> {
    let tokens = Tokenizer::new(dialect, sql)
        .tokenize()
        .map_err(|e| QueryError::Syntax(e.to_string()))?;
    let mut tokens: Vec<&Token> = tokens
        .iter()
        .filter(|token| !matches!(token, Token::Whitespace(_)))
        .collect();
    while matches!(tokens.last(), Some(Token::SemiColon)) {
        tokens.pop();
    }

    let opens_read = matches!(
        tokens.first(),
        Some(Token::Word(word)) if matches!(
            word.keyword,
            Keyword::SELECT | Keyword::WITH | Keyword::EXPLAIN | Keyword::VALUES
        )
    );
    if !opens_read {
        return Err(QueryError::Syntax(parse_error));
    }
    if tokens.iter().any(|token| matches!(token, Token::SemiColon)) {
        return Err(QueryError::Forbidden(
            "only a single statement is allowed".to_string(),
        ));
    }

    debug!(error = %parse_error, "SQL parser rejected a read query, leaving it to SQLite");
    Ok(())
}

fn first_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Validate, then execute on a `query_only` connection with a time limit
pub async fn run_read_query(
    pool: &SqlitePool,
    sql: &str,
    timeout: Duration,
) -> Result<QueryResults, QueryError> {
    validate_read_only(sql)?;

    let mut conn = pool.acquire().await?;
    sqlx::query("PRAGMA query_only = ON")
        .execute(&mut *conn)
        .await?;

    let outcome = tokio::time::timeout(timeout, execute_sql(&mut conn, sql)).await;

    // A connection is only returned to the pool writable again
    match &outcome {
        Ok(_) => {
            if let Err(e) = sqlx::query("PRAGMA query_only = OFF")
                .execute(&mut *conn)
                .await
            {
                warn!(error = %e, "Failed to clear query_only, closing the connection");
                drop(conn.detach());
            }
        },
        // the statement may still be running
        Err(_) => drop(conn.detach()),
    }

    let results = outcome.map_err(|_| QueryError::Timeout(timeout))??;

    debug!(
        rows = results.rows.len(),
        truncated = results.truncated,
        "Read query finished"
    );
    Ok(results)
}

async fn execute_sql(conn: &mut SqliteConnection, sql: &str) -> Result<QueryResults, QueryError> {
    let mut stream = sqlx::query(sql).fetch(conn);
    let mut results = QueryResults::default();

    while let Some(row) = stream.try_next().await? {
        if results.rows.len() == MAX_RESULT_ROWS {
            results.truncated = true;
            break;
        }

        if results.columns.is_empty() {
            results.columns = row
                .columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect();
        }

        let cells = (0..row.columns().len())
            .map(|idx| sqlite_value_to_json(&row, idx))
            .collect::<Result<Vec<_>, _>>()?;
        results.rows.push(cells);
    }

    Ok(results)
}

/// Convert one cell by its runtime storage class
fn sqlite_value_to_json(row: &SqliteRow, idx: usize) -> Result<Value, QueryError> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => {
            let v: i64 = row.try_get(idx)?;
            Value::Number(v.into())
        },
        "REAL" | "NUMERIC" => {
            let v: f64 = row.try_get(idx)?;
            serde_json::json!(v)
        },
        "BLOB" => {
            let v: Vec<u8> = row.try_get(idx)?;
            Value::String(hex::encode(v))
        },
        _ => {
            let v: String = row
                .try_get(idx)
                .unwrap_or_else(|_| format!("<{}>", type_name));
            Value::String(v)
        },
    };

    Ok(value)
}
