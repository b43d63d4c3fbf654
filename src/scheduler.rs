//! Activity scheduler: one instance per (VU, workflow-query) pair,
//! ticking at the activity's configured rate and gating firing on
//! dependency satisfaction.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::configuration::Activity;
use crate::database::Database;
use crate::error::DrkError;
use crate::event::EventSender;
use crate::execute::execute_activity;
use crate::generators::GeneratorCatalogue;
use crate::rate::Rate;
use crate::vu::Vu;

/// Runs the per-activity ticker loop until `deadline` fires.
///
/// `deadline` is a `watch` channel used as a one-shot broadcast: every
/// scheduler independently selects on ticker-or-deadline. A `watch`
/// channel models this more directly than a `oneshot::Receiver` would,
/// since the latter isn't `Clone` and can't be observed by many
/// independently-selecting tasks at once.
#[allow(clippy::too_many_arguments)]
pub async fn run_activity_scheduler(
    vu: Arc<Vu>,
    workflow_name: String,
    activity_name: String,
    activity: Activity,
    rate: Rate,
    db: Arc<dyn Database>,
    catalogue: Arc<GeneratorCatalogue>,
    events: EventSender,
    mut deadline: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(rate.ticker_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // `interval` fires its first tick immediately; discard it so firing
    // starts one `ticker_interval` after the scheduler is spawned.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let dependencies_met = activity.args.iter().all(|a| a.dependency_met(&vu));
                if !dependencies_met {
                    continue;
                }

                debug!(activity = %activity_name, "starting");

                match execute_activity(&vu, &activity, db.as_ref(), &catalogue).await {
                    Ok((rows, duration)) => {
                        debug!(activity = %activity_name, rows = rows.len(), "completed");

                        let event = crate::event::Event::new(&workflow_name, &activity_name, duration);
                        if events.send(event).await.is_err() {
                            // No consumer left; nothing more to report, but the
                            // workload itself continues until the deadline.
                        }

                        vu.apply_data(&activity_name, rows);
                    }
                    Err(err) => {
                        error!(activity = %activity_name, error = %DisplayChain(&err), "error");
                    }
                }
            }

            _ = deadline.changed() => {
                info!(activity = %activity_name, "received termination signal");
                return;
            }
        }
    }
}

/// Renders a `DrkError`'s source chain on one line, mirroring the
/// reference tool's wrapped-error log messages.
struct DisplayChain<'a>(&'a DrkError);

impl std::fmt::Display for DisplayChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = std::error::Error::source(self.0);
        while let Some(s) = source {
            write!(f, ": {s}")?;
            source = s.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ActivityKind;
    use crate::value::{Row, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingDb {
        query_calls: AtomicUsize,
        exec_calls: AtomicUsize,
    }

    #[async_trait]
    impl Database for CountingDb {
        async fn query(
            &self,
            _statement: &str,
            _args: &[Value],
        ) -> anyhow::Result<(Vec<Row>, Duration)> {
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            Ok((Vec::new(), Duration::from_millis(1)))
        }

        async fn exec(&self, _statement: &str, args: &[Value]) -> anyhow::Result<Duration> {
            self.exec_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(args, &[Value::Int(1), Value::Int(5)]);
            Ok(Duration::from_millis(1))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scalar_only_exec_fires_twice_in_250ms() {
        let db: Arc<dyn Database> = Arc::new(CountingDb {
            query_calls: AtomicUsize::new(0),
            exec_calls: AtomicUsize::new(0),
        });

        let activity = Activity {
            kind: ActivityKind::Exec,
            query: "update t set x=? where id=?".to_string(),
            args: vec![
                crate::argument::Argument::Int { min: 1, max: 1 },
                crate::argument::Argument::Int { min: 5, max: 5 },
            ],
        };

        let rate = Rate::parse("1/100ms").unwrap();
        let (events_tx, mut events_rx) = crate::event::channel();
        let (deadline_tx, deadline_rx) = watch::channel(false);

        let vu = Arc::new(Vu::new());
        let catalogue = Arc::new(GeneratorCatalogue::builtin());

        let handle = tokio::spawn(run_activity_scheduler(
            vu,
            "wf".to_string(),
            "a".to_string(),
            activity,
            rate,
            db.clone(),
            catalogue,
            events_tx,
            deadline_rx,
        ));

        tokio::time::advance(Duration::from_millis(250)).await;
        deadline_tx.send(true).unwrap();
        handle.await.unwrap();

        let mut count = 0;
        while events_rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ref_dependency_gating_never_fires() {
        let db: Arc<dyn Database> = Arc::new(CountingDb {
            query_calls: AtomicUsize::new(0),
            exec_calls: AtomicUsize::new(0),
        });

        let activity = Activity {
            kind: ActivityKind::Exec,
            query: "whatever".to_string(),
            args: vec![crate::argument::Argument::Ref {
                query: "seed".to_string(),
                column: "id".to_string(),
            }],
        };

        let rate = Rate::parse("10/1s").unwrap();
        let (events_tx, mut events_rx) = crate::event::channel();
        let (deadline_tx, deadline_rx) = watch::channel(false);

        let vu = Arc::new(Vu::new());
        vu.apply_data("seed", Vec::new());
        let catalogue = Arc::new(GeneratorCatalogue::builtin());

        let handle = tokio::spawn(run_activity_scheduler(
            vu,
            "wf".to_string(),
            "use".to_string(),
            activity,
            rate,
            db,
            catalogue,
            events_tx,
            deadline_rx,
        ));

        tokio::time::advance(Duration::from_secs(1)).await;
        deadline_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(events_rx.try_recv().is_err());
    }
}
