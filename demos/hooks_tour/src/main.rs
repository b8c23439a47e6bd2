//! Scripted walk through the hooks on a simulated clock.
//!
//! Run with `RUST_LOG=debug` to see attach/detach and timer traffic.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tendril_core::*;
use tendril_platform::*;
use web_time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Settings {
    theme: String,
    visits: u32,
}

#[derive(Debug)]
enum Action {
    Add(String),
    Clear,
}

struct Env {
    storage: Storage,
    viewport: Viewport,
    keys: EventTarget<KeyEvent>,
    network: EventTarget<()>,
    geo: Rc<dyn PositionProvider>,
}

struct Frame {
    query: String,
    search: String,
    visits: u32,
    compact: bool,
    size: (u32, u32),
    saving: bool,
    online: bool,
    ticks: u64,
    todos: usize,
    located: bool,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "typed={:?} search={:?} visits={} compact={} size={}x{} ",
            self.query, self.search, self.visits, self.compact, self.size.0, self.size.1,
        )?;
        write!(
            f,
            "ctrl+s={} online={} ticks={} todos={} located={}",
            self.saving, self.online, self.ticks, self.todos, self.located,
        )
    }
}

fn app(cx: &Cx<'_>, env: &Env, query: &str) -> Frame {
    let settings = use_persisted(cx, &env.storage, "settings", Settings::default);
    cx.mount_effect(|| {
        if let Err(e) = settings.update(|s| Settings {
            visits: s.visits + 1,
            ..s.clone()
        }) {
            log::warn!("could not record visit: {e}");
        }
        Dispose::noop()
    });

    let search = use_debounce(cx, query.to_string(), Duration::from_millis(300));
    let compact = use_media_query(cx, Some(&env.viewport), "(max-width: 768px)");
    let size = use_window_size(cx, Some(&env.viewport));
    let saving = use_key_press(cx, &env.keys, Key::Character('s'), Modifiers::CTRL);
    let online = use_online(cx, &env.network, true);
    let ticks = use_interval(cx, Some(Duration::from_secs(1)));
    let geo = use_geolocation(cx, &env.geo, GeolocationOptions::default());

    let todos = use_reducer_with_middleware(cx, || {
        ReducerStore::builder(
            Vec::<String>::new(),
            |items: &Vec<String>, action: &Action| match action {
                Action::Add(item) => {
                    let mut next = items.clone();
                    next.push(item.clone());
                    next
                }
                Action::Clear => Vec::new(),
            },
        )
        .middleware(LoggingMiddleware::new("todos"))
        .build()
    });
    if todos.get().is_empty()
        && let Err(e) = todos.dispatch(Action::Add(format!("search for {query}")))
    {
        log::warn!("dispatch failed: {e}");
    }

    Frame {
        query: query.to_string(),
        search,
        visits: settings.get().visits,
        compact,
        size,
        saving,
        online,
        ticks,
        todos: todos.state().len(),
        located: geo.get().position.is_some(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let (rt, clock) = Runtime::with_test_clock();
    let path = std::env::temp_dir().join("tendril-hooks-tour.json");
    let sim = SimulatedProvider::new();
    let env = Env {
        storage: Storage::new(FileStore::open(&path)),
        viewport: Viewport::default(),
        keys: EventTarget::new(),
        network: EventTarget::new(),
        geo: Rc::new(sim.clone()),
    };
    let root = Instance::new(&rt);

    let frame = root.compose(|cx| app(cx, &env, "r"));
    println!("{frame}");

    for q in ["ru", "rus", "rust"] {
        rt.advance(&clock, Duration::from_millis(100));
        println!("{}", root.compose(|cx| app(cx, &env, q)));
    }

    rt.advance(&clock, Duration::from_millis(300));
    env.viewport.resize(600, 900);
    let ctrl_s = KeyEvent::new(Key::Character('s')).with_modifiers(Modifiers::CTRL);
    env.keys.dispatch(KEY_DOWN, &ctrl_s);
    env.network.dispatch(OFFLINE, &());
    sim.push(Position::new(52.52, 13.40).with_accuracy(25.0));
    rt.advance(&clock, Duration::from_secs(2));
    println!("{}", root.compose(|cx| app(cx, &env, "rust")));

    root.unmount();
    log::info!(
        "unmounted: {} timers, {} key listeners, {} watches left",
        rt.pending_timers(),
        env.keys.listener_count(),
        sim.active_watches()
    );
    println!("settings persisted to {}", path.display());
    Ok(())
}
