//! Workflow runner: lifecycle of a single workflow — setup phase,
//! stagger, deadline, fan-out of one scheduler per (VU x activity).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::configuration::{Activity, Workflow};
use crate::database::Database;
use crate::error::DrkError;
use crate::event::EventSender;
use crate::execute::execute_activity;
use crate::generators::GeneratorCatalogue;
use crate::scheduler::run_activity_scheduler;
use crate::vu::Vu;

/// Runs workflow `name` to its deadline (or, if `deadline` is `None`, to
/// natural completion — used for the `init` workflow).
///
/// A setup failure aborts the *enclosing workflow*, not just the one VU
/// task, since setup activities typically establish shared state that
/// siblings depend on.
pub async fn run_workflow(
    name: String,
    workflow: Workflow,
    activities: Arc<HashMap<String, Activity>>,
    db: Arc<dyn Database>,
    catalogue: Arc<GeneratorCatalogue>,
    events: EventSender,
    deadline: Option<Duration>,
) -> Result<()> {
    let mut vu_tasks = JoinSet::new();

    for _ in 0..workflow.vus {
        let name = name.clone();
        let workflow = workflow.clone();
        let activities = Arc::clone(&activities);
        let db = Arc::clone(&db);
        let catalogue = Arc::clone(&catalogue);
        let events = events.clone();

        vu_tasks.spawn(run_vu(name, workflow, activities, db, catalogue, events, deadline));
    }

    let mut first_error = None;
    while let Some(result) = vu_tasks.join_next().await {
        match result.context("VU task panicked") {
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

async fn run_vu(
    workflow_name: String,
    workflow: Workflow,
    activities: Arc<HashMap<String, Activity>>,
    db: Arc<dyn Database>,
    catalogue: Arc<GeneratorCatalogue>,
    events: EventSender,
    deadline: Option<Duration>,
) -> Result<()> {
    let vu = Arc::new(Vu::new());

    for activity_name in &workflow.setup_queries {
        let activity = activities
            .get(activity_name)
            .ok_or_else(|| DrkError::MissingActivity {
                name: activity_name.clone(),
            })
            .with_context(|| format!("running query {activity_name:?}"))?;

        let (rows, duration) = execute_activity(&vu, activity, db.as_ref(), &catalogue)
            .await
            .with_context(|| format!("running query {activity_name:?}"))?;

        let _ = events
            .send(crate::event::Event::setup(&workflow_name, activity_name.clone(), duration))
            .await;

        vu.apply_data(activity_name, rows);
    }

    vu.stagger(&workflow.queries).await;

    let (deadline_tx, deadline_rx) = tokio::sync::watch::channel(false);
    let _deadline_guard = deadline.map(|d| spawn_deadline_timer(d, deadline_tx));

    let mut scheduler_tasks = JoinSet::new();

    for query in &workflow.queries {
        let activity = activities
            .get(&query.name)
            .ok_or_else(|| DrkError::MissingActivity {
                name: query.name.clone(),
            })?
            .clone();

        scheduler_tasks.spawn(run_activity_scheduler(
            Arc::clone(&vu),
            workflow_name.clone(),
            query.name.clone(),
            activity,
            query.rate,
            Arc::clone(&db),
            Arc::clone(&catalogue),
            events.clone(),
            deadline_rx.clone(),
        ));
    }

    while let Some(result) = scheduler_tasks.join_next().await {
        result.context("activity scheduler panicked")?;
    }

    Ok(())
}

/// Spawns a background task that flips the deadline watch after `d`
/// elapses. Returned handle is aborted when dropped if the VU task ends
/// early for some other reason (it never does in practice, since VU
/// tasks only return once every scheduler has observed the deadline).
fn spawn_deadline_timer(d: Duration, tx: watch::Sender<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(d).await;
        let _ = tx.send(true);
    })
}
