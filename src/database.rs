//! The database collaborator contract: abstracted behind a two-method
//! interface whose implementation is an external collaborator. Duration
//! is measured by the implementation, not by the core.

use std::time::Duration;

use crate::value::{Row, Value};

#[async_trait]
pub trait Database: Send + Sync {
    async fn query(&self, statement: &str, args: &[Value]) -> anyhow::Result<(Vec<Row>, Duration)>;
    async fn exec(&self, statement: &str, args: &[Value]) -> anyhow::Result<Duration>;
}
