//! Query execution: generates arguments, dispatches on activity kind,
//! and returns the rows, measured duration, and any error verbatim from
//! the database layer.

use std::time::Duration;

use crate::configuration::{Activity, ActivityKind};
use crate::database::Database;
use crate::error::DrkError;
use crate::generators::GeneratorCatalogue;
use crate::value::Row;
use crate::vu::Vu;

pub async fn execute_activity(
    vu: &Vu,
    activity: &Activity,
    db: &dyn Database,
    catalogue: &GeneratorCatalogue,
) -> Result<(Vec<Row>, Duration), DrkError> {
    let args = vu.generate_args(&activity.args, catalogue)?;

    match &activity.kind {
        ActivityKind::Query => {
            let (rows, duration) = db
                .query(&activity.query, &args)
                .await
                .map_err(|source| DrkError::DatabaseError {
                    query: activity.query.clone(),
                    source,
                })?;
            Ok((rows, duration))
        }
        ActivityKind::Exec => {
            let duration = db
                .exec(&activity.query, &args)
                .await
                .map_err(|source| DrkError::DatabaseError {
                    query: activity.query.clone(),
                    source,
                })?;
            Ok((Vec::new(), duration))
        }
        ActivityKind::Other(kind) => Err(DrkError::UnsupportedQueryType { kind: kind.clone() }),
    }
}
