//! Counter application: root store, command mutations and a deferred action

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;
use weir::{Action, Command, DispatchContext, Mutation, Operations, Store, StoreConfig};

#[derive(Clone, Debug, Default)]
struct Feed {
    items: Vec<String>,
}

#[derive(Clone, Debug, Default)]
struct Search {
    items: Vec<String>,
}

#[derive(Clone, Debug, Default)]
struct AppState {
    count: i32,
    step: i32,
    history: Vec<i32>,
    feed: Feed,
    search: Search,
}

/// Every edit the counter screen can make.
#[derive(Debug, Clone, Copy)]
enum CounterMutation {
    Increment,
    Decrement,
    SetStep(i32),
    Reset,
}

impl Command<AppState> for CounterMutation {
    fn name(&self) -> &'static str {
        match self {
            CounterMutation::Increment => "increment",
            CounterMutation::Decrement => "decrement",
            CounterMutation::SetStep(_) => "set_step",
            CounterMutation::Reset => "reset",
        }
    }

    fn apply(self, state: &mut AppState) {
        match self {
            CounterMutation::Increment => state.count += state.step,
            CounterMutation::Decrement => state.count -= state.step,
            CounterMutation::SetStep(step) => state.step = step,
            CounterMutation::Reset => state.count = 0,
        }
        state.history.push(state.count);
    }
}

/// Stand-in for whatever the operations need to reach the outside world.
struct Dependency {
    latency: Duration,
}

struct AppOperations {
    dep: Arc<Dependency>,
}

impl Operations for AppOperations {
    type State = AppState;
}

impl AppOperations {
    fn new(dep: Arc<Dependency>) -> Self {
        Self { dep }
    }

    fn increment(&self) -> Mutation<AppState> {
        Mutation::command(CounterMutation::Increment)
    }

    fn decrement(&self) -> Mutation<AppState> {
        Mutation::command(CounterMutation::Decrement)
    }

    fn set_step(&self, step: i32) -> Mutation<AppState> {
        Mutation::command(CounterMutation::SetStep(step))
    }

    fn reset(&self) -> Mutation<AppState> {
        Mutation::command(CounterMutation::Reset)
    }

    /// Increment once the simulated request comes back.
    fn fetch(&self) -> Action<AppState, Self, thread::JoinHandle<()>> {
        let latency = self.dep.latency;
        Action::new("fetch", move |ctx: DispatchContext<AppState, Self>| {
            thread::spawn(move || {
                thread::sleep(latency);
                if let Err(error) = ctx.dispatch(|ops| ops.increment()) {
                    tracing::error!(%error, "fetch failed");
                }
            })
        })
    }
}

fn main() -> Result<(), weir::StoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,weir=debug".into()),
        )
        .init();

    info!("=== Complete Counter Application ===");

    let dep = Arc::new(Dependency {
        latency: Duration::from_millis(200),
    });
    let store = Store::with_config(
        AppState {
            step: 1,
            history: vec![0],
            ..Default::default()
        },
        AppOperations::new(dep),
        StoreConfig::default().with_name("counter"),
    );

    // Presentation layers re-render from here.
    let _render = store.watch(|state| {
        info!(count = state.count, step = state.step, "render");
    });

    info!("incrementing");
    for _ in 0..3 {
        store.dispatch(|ops| ops.increment())?;
    }

    info!("changing step size to 5");
    store.dispatch(|ops| ops.set_step(5))?;
    store.dispatch(|ops| ops.increment())?;

    info!("decrementing");
    for _ in 0..3 {
        store.dispatch(|ops| ops.decrement())?;
    }

    info!("fetching");
    let pending = store.dispatch(|ops| ops.fetch());
    info!(count = store.state().count, "fetch scheduled");
    if pending.join().is_err() {
        tracing::error!("fetch thread panicked");
    }

    store.with_state(|state| info!(history = ?state.history, "history"));

    info!("resetting");
    store.dispatch(|ops| ops.reset())?;
    store.with_state(|state| {
        info!(
            history = ?state.history,
            feed = state.feed.items.len(),
            search = state.search.items.len(),
            "final state"
        )
    });

    info!("counter application complete");
    Ok(())
}
