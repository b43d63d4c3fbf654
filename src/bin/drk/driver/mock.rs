//! An in-memory `Database` adapter with no backing store, used by the
//! `mock` `--driver` selection and the integration test suite. Every
//! statement logs at debug level and returns immediately.

use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use drk::database::Database;
use drk::value::{Row, Value};
use tracing::debug;

pub struct MockDatabase;

impl MockDatabase {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for MockDatabase {
    async fn query(&self, statement: &str, args: &[Value]) -> anyhow::Result<(Vec<Row>, Duration)> {
        debug!(statement, ?args, "mock query");
        let start = Instant::now();
        Ok((Vec::new(), start.elapsed()))
    }

    async fn exec(&self, statement: &str, args: &[Value]) -> anyhow::Result<Duration> {
        debug!(statement, ?args, "mock exec");
        let start = Instant::now();
        Ok(start.elapsed())
    }
}
