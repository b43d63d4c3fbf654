//! Top-level coordinator: runs the `init` workflow to completion first,
//! then fans out all remaining workflows in parallel until deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::info;

use crate::configuration::{Drk, INIT_WORKFLOW};
use crate::database::Database;
use crate::event::{self, EventReceiver, EventSender};
use crate::generators::GeneratorCatalogue;
use crate::workflow::run_workflow;

pub struct Runner {
    cfg: Drk,
    db: Arc<dyn Database>,
    catalogue: Arc<GeneratorCatalogue>,
    duration: Duration,
    events_tx: EventSender,
}

impl Runner {
    /// Builds a new `Runner`, returning it paired with a read-only view
    /// of its event stream.
    pub fn new(cfg: Drk, db: Arc<dyn Database>, duration: Duration) -> (Self, EventReceiver) {
        let (events_tx, events_rx) = event::channel();

        info!(duration = ?duration, "runner");

        (
            Self {
                cfg,
                db,
                catalogue: Arc::new(GeneratorCatalogue::builtin()),
                duration,
                events_tx,
            },
            events_rx,
        )
    }

    pub fn with_catalogue(mut self, catalogue: GeneratorCatalogue) -> Self {
        self.catalogue = Arc::new(catalogue);
        self
    }

    pub async fn run(self) -> Result<()> {
        let activities = Arc::new(self.cfg.activities.clone());

        if let Some(init) = self.cfg.workflows.get(INIT_WORKFLOW) {
            info!("running init workflow");
            tokio::time::sleep(Duration::from_secs(1)).await;

            let mut init = init.clone();
            init.vus = 1;

            run_workflow(
                INIT_WORKFLOW.to_string(),
                init,
                Arc::clone(&activities),
                Arc::clone(&self.db),
                Arc::clone(&self.catalogue),
                self.events_tx.clone(),
                None,
            )
            .await
            .context("running init workflow")?;
        }

        let mut workflow_tasks = JoinSet::new();

        for (name, workflow) in &self.cfg.workflows {
            if name == INIT_WORKFLOW {
                continue;
            }

            workflow_tasks.spawn(run_workflow(
                name.clone(),
                workflow.clone(),
                Arc::clone(&activities),
                Arc::clone(&self.db),
                Arc::clone(&self.catalogue),
                self.events_tx.clone(),
                Some(self.duration),
            ));
        }

        let mut first_error = None;
        while let Some(result) = workflow_tasks.join_next().await {
            match result.context("workflow task panicked") {
                Ok(Ok(())) => {}
                Ok(Err(err)) | Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[allow(dead_code)]
type Activities = HashMap<String, crate::configuration::Activity>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{Activity, ActivityKind, Workflow, WorkflowQuery};
    use crate::rate::Rate;
    use crate::value::{Row, Value};
    use parking_lot::Mutex;

    struct RecordingDb {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Database for RecordingDb {
        async fn query(
            &self,
            statement: &str,
            _args: &[Value],
        ) -> anyhow::Result<(Vec<Row>, std::time::Duration)> {
            self.calls.lock().push(statement.to_string());
            Ok((Vec::new(), std::time::Duration::from_millis(1)))
        }

        async fn exec(&self, statement: &str, _args: &[Value]) -> anyhow::Result<std::time::Duration> {
            self.calls.lock().push(statement.to_string());
            Ok(std::time::Duration::from_millis(1))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn init_runs_before_other_workflows() {
        let mut workflows = HashMap::new();
        workflows.insert(
            INIT_WORKFLOW.to_string(),
            Workflow {
                vus: 5,
                setup_queries: vec!["create".to_string()],
                queries: Vec::new(),
            },
        );
        workflows.insert(
            "w".to_string(),
            Workflow {
                vus: 1,
                setup_queries: Vec::new(),
                queries: vec![WorkflowQuery {
                    name: "create".to_string(),
                    rate: Rate::parse("1/1s").unwrap(),
                }],
            },
        );

        let mut activities = HashMap::new();
        activities.insert(
            "create".to_string(),
            Activity {
                kind: ActivityKind::Exec,
                query: "create table t (id text)".to_string(),
                args: Vec::new(),
            },
        );

        let cfg = Drk { workflows, activities };
        let db: Arc<dyn Database> = Arc::new(RecordingDb { calls: Mutex::new(Vec::new()) });

        // Force vus=1 for init regardless of config.
        let (runner, mut events_rx) = Runner::new(cfg, db, Duration::from_millis(50));

        let handle = tokio::spawn(runner.run());

        let mut saw_init_before_main = true;
        let mut seen_main = false;
        while let Some(event) = events_rx.recv().await {
            if event.is_setup() {
                if seen_main {
                    saw_init_before_main = false;
                }
            } else {
                seen_main = true;
            }
        }

        handle.await.unwrap().unwrap();
        assert!(saw_init_before_main);
    }
}
