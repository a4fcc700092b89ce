//! Scoped stores: tabs that each own one slice of the app state

use tracing::info;
use weir::{lens, Action, DispatchContext, Mutation, Operations, ScopedStore, Store};

#[derive(Clone, Debug, Default)]
struct FeedItem {
    id: usize,
    title: String,
    read: bool,
}

#[derive(Clone, Debug, Default)]
struct Feed {
    items: Vec<FeedItem>,
}

#[derive(Clone, Debug, Default)]
struct Search {
    query: String,
    results: Vec<String>,
}

#[derive(Clone, Debug, Default)]
struct AppState {
    count: i32,
    feed: Feed,
    search: Search,
}

struct AppOperations;

impl Operations for AppOperations {
    type State = AppState;
}

impl AppOperations {
    fn increment(&self) -> Mutation<AppState> {
        Mutation::new("increment", |state: &mut AppState| state.count += 1)
    }
}

struct FeedOperations;

impl Operations for FeedOperations {
    type State = Feed;
}

impl FeedOperations {
    fn add(&self, title: &str) -> Mutation<Feed> {
        let title = title.to_string();
        Mutation::new("add", move |feed: &mut Feed| {
            let id = feed.items.len();
            feed.items.push(FeedItem {
                id,
                title,
                read: false,
            });
        })
    }

    fn mark_read(&self, id: usize) -> Mutation<Feed> {
        Mutation::try_new("mark_read", move |feed: &mut Feed| {
            let item = feed
                .items
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or_else(|| format!("no feed item {id}"))?;
            item.read = true;
            Ok::<(), String>(())
        })
    }

    /// Load a page of items and report how many arrived.
    fn load_page(&self, titles: &'static [&'static str]) -> Action<Feed, Self, usize> {
        Action::new("load_page", move |ctx: DispatchContext<Feed, Self>| {
            titles
                .iter()
                .filter(|title| ctx.commit(|ops| ops.add(title)).is_ok())
                .count()
        })
    }
}

struct SearchOperations;

impl Operations for SearchOperations {
    type State = Search;
}

impl SearchOperations {
    fn query(&self, query: &str) -> Mutation<Search> {
        let query = query.to_string();
        Mutation::new("query", move |search: &mut Search| {
            search.results = vec![format!("{query} (1)"), format!("{query} (2)")];
            search.query = query;
        })
    }
}

type FeedStore = ScopedStore<AppState, Feed, FeedOperations>;

fn main() -> Result<(), weir::StoreError> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("=== Scoped Store Example: Feed and Search tabs ===");

    let store = Store::new(AppState::default(), AppOperations);
    let feed = store.scope(lens!(AppState => feed), FeedOperations);
    let search = store.scope(lens!(AppState => search), SearchOperations);

    let _root_watch = store.watch(|state| {
        info!(
            count = state.count,
            feed = state.feed.items.len(),
            results = state.search.results.len(),
            "[root] updated"
        );
    });
    let _feed_watch = feed.watch(|feed| {
        let unread = feed.items.iter().filter(|item| !item.read).count();
        info!(unread, "[feed] updated");
    });

    // Tabs are registered so other screens can find them by type.
    let token = store.register_child(feed.clone(), Some("home"))?;
    info!(keys = ?store.children().keys(), "registered tabs");

    let loaded = feed.dispatch(|ops| {
        ops.load_page(&["Learn Rust", "Build a store", "Write documentation"])
    });
    info!(loaded, "feed page loaded");

    feed.dispatch(|ops| ops.mark_read(0))?;
    if let Err(error) = feed.dispatch(|ops| ops.mark_read(99)) {
        info!(%error, "rejected as expected");
    }

    search.dispatch(|ops| ops.query("weir"))?;
    store.dispatch(|ops| ops.increment())?;

    let home: FeedStore = store.child(Some("home"))?;
    home.with_state(|feed| {
        for item in &feed.items {
            let status = if item.read { "✓" } else { " " };
            info!("   [{}] {}", status, item.title);
        }
    });

    let state = store.state();
    info!(
        count = state.count,
        query = %state.search.query,
        results = ?state.search.results,
        "final state"
    );

    token.unregister();
    info!("✓ Example complete!");
    Ok(())
}
