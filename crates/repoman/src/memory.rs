//! Scripted in-memory data source.
//!
//! [`MemorySource`] answers queries from a queue of canned responses and
//! records every statement it receives. It is meant for testing repositories
//! without a database.
//!
//! ```rust
//! use repoman::{MemorySource, Row, Value};
//!
//! let source = MemorySource::new();
//! source.push_rows(vec![Row::from_pairs([("id", Value::from(1))])]);
//! source.push_error("deadlock");
//! assert_eq!(source.pending(), 2);
//! ```

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::source::{DataSource, QueryOutput};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
enum Response {
    Output {
        output: QueryOutput,
        insert_id: Option<i64>,
    },
    Error(String),
}

#[derive(Debug, Default)]
struct State {
    responses: VecDeque<Response>,
    executed: Vec<String>,
    last_insert_id: Option<i64>,
}

/// A [`DataSource`] backed by a FIFO of scripted responses.
///
/// When the queue is empty every statement succeeds with an empty output.
#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<State>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a full output.
    pub fn push_output(&self, output: QueryOutput) -> &Self {
        self.state().responses.push_back(Response::Output {
            output,
            insert_id: None,
        });
        self
    }

    /// Queue a result set.
    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.push_output(QueryOutput::rows(rows))
    }

    /// Queue a mutation result affecting `n` rows.
    pub fn push_affected(&self, n: u64) -> &Self {
        self.push_output(QueryOutput::affected(n))
    }

    /// Queue a successful INSERT that generated `id`.
    pub fn push_insert(&self, id: i64) -> &Self {
        self.state().responses.push_back(Response::Output {
            output: QueryOutput::affected(1),
            insert_id: Some(id),
        });
        self
    }

    /// Queue a failure.
    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.state()
            .responses
            .push_back(Response::Error(message.into()));
        self
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    /// The most recently executed statement.
    pub fn last_executed(&self) -> Option<String> {
        self.state().executed.last().cloned()
    }

    /// Number of scripted responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.state().responses.len()
    }

    /// Drop queued responses and the execution log.
    pub fn reset(&self) {
        *self.state() = State::default();
    }
}

impl DataSource for MemorySource {
    async fn query(&self, sql: &str) -> OrmResult<QueryOutput> {
        let mut state = self.state();
        state.executed.push(sql.to_string());
        match state.responses.pop_front() {
            None => Ok(QueryOutput::empty()),
            Some(Response::Output { output, insert_id }) => {
                if insert_id.is_some() {
                    state.last_insert_id = insert_id;
                }
                Ok(output)
            }
            Some(Response::Error(message)) => Err(OrmError::source(message)),
        }
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.state().last_insert_id
    }
}
