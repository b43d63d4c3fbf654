//! Live aggregation table: consumes the event stream and renders two
//! tables once per second — "Setup queries" (keys prefixed with `*`)
//! and "Queries" — showing request count and mean latency over a
//! trailing window of the last 1000 samples per key.
//!
//! Disabled by `--debug`, in which case `main` drains the event channel
//! itself instead of spawning this task.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use drk::event::EventReceiver;

const WINDOW: usize = 1000;

/// A fixed-capacity FIFO of the most recent `WINDOW` latencies for one key.
struct Ring {
    samples: VecDeque<Duration>,
}

impl Ring {
    fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(WINDOW),
        }
    }

    fn push(&mut self, d: Duration) {
        if self.samples.len() == WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(d);
    }

    fn mean(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }
}

pub async fn run(mut events: EventReceiver) {
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut latencies: HashMap<String, Ring> = HashMap::new();

    let mut print_tick = tokio::time::interval(Duration::from_secs(1));
    print_tick.tick().await;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    return;
                };
                let key = format!("{}.{}", event.workflow, event.activity);
                *counts.entry(key.clone()).or_insert(0) += 1;
                latencies.entry(key).or_insert_with(Ring::new).push(event.duration);
            }

            _ = print_tick.tick() => {
                print!("\x1B[H\x1B[2J");

                println!("Setup queries");
                println!("=============\n");
                write_table(&counts, &latencies, |key| key.starts_with('*'));

                println!("\nQueries");
                println!("=======\n");
                write_table(&counts, &latencies, |key| !key.starts_with('*'));
            }
        }
    }
}

fn write_table(
    counts: &HashMap<String, u64>,
    latencies: &HashMap<String, Ring>,
    filter: impl Fn(&str) -> bool,
) {
    let mut keys: Vec<&String> = counts.keys().filter(|k| filter(k)).collect();
    keys.sort();

    println!("Query\tRequests\tAverage Latency");
    println!("-----\t--------\t---------------");

    for key in keys {
        let mean = latencies.get(key).map(Ring::mean).unwrap_or(Duration::ZERO);
        println!(
            "{}\t{}\t{:?}",
            key.trim_start_matches('*'),
            counts[key],
            mean
        );
    }
}
