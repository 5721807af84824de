// Framework bootstrap for the operator console runtime.

use crate::frameworks::config;
use crate::interface_adapters::clients::config::{ConfigClient, tuning_task};
use crate::interface_adapters::console::{self, ConsoleView, ControlSettings};
use crate::interface_adapters::input::spawn_input_thread;
use crate::interface_adapters::net::{SessionConfig, SimSession};
use crate::use_cases::{
    BattleConfig, CommandDispatcher, EmissionTracker, EventVisual, MAX_FORCE_SIZE, MIN_FORCE_SIZE,
    SceneReconciler, SnapshotStore, event_visual,
};

use ratatui::crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::Result;
use std::time::Instant;
use tokio::sync::mpsc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr; the terminal UI owns stdout.
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();
    let base_url = config::server_base_url();
    run(&base_url).await
}

pub async fn run(base_url: &str) -> Result<()> {
    let endpoint = config::stream_endpoint(base_url)
        .ok_or_else(|| std::io::Error::other(format!("invalid server url: {base_url}")))?;
    let client = ConfigClient::new(base_url, config::http_timeout())
        .map_err(|e| std::io::Error::other(format!("failed to initialize config client: {e}")))?;
    tracing::debug!(base_url = %base_url, endpoint = %endpoint, "console configured");

    // init() chains a terminal-restoring panic hook in front of ours.
    let terminal = ratatui::try_init()?;
    let result = drive(terminal, client, base_url, endpoint).await;
    ratatui::restore();
    result
}

async fn drive(
    mut terminal: ratatui::DefaultTerminal,
    client: ConfigClient,
    base_url: &str,
    endpoint: String,
) -> Result<()> {
    let (input_tx, mut input_rx) = mpsc::channel(config::INPUT_CHANNEL_CAPACITY);
    let _ = spawn_input_thread(input_tx);

    // The display cannot map anything until the world extents are known.
    let attempts = config::world_fetch_attempts();
    terminal.draw(|f| console::draw_bootstrap(f, attempts))?;

    let world = {
        let fetch = client.fetch_world_with_retry(attempts, config::world_fetch_retry_delay());
        tokio::pin!(fetch);

        loop {
            tokio::select! {
                result = &mut fetch => break result,
                event = input_rx.recv() => match event {
                    Some(event) => {
                        if is_quit(&event) {
                            return Ok(());
                        }
                        if matches!(event, Event::Resize(..)) {
                            terminal.draw(|f| console::draw_bootstrap(f, attempts))?;
                        }
                    }
                    None => return Ok(()),
                }
            }
        }
    };

    let world = match world {
        Ok(world) => world,
        Err(_) => {
            terminal.draw(|f| console::draw_config_failed(f, base_url, attempts))?;
            loop {
                match input_rx.recv().await {
                    Some(event) if is_quit(&event) => return Ok(()),
                    Some(Event::Resize(..)) => {
                        terminal.draw(|f| console::draw_config_failed(f, base_url, attempts))?;
                    }
                    Some(_) => {}
                    None => return Ok(()),
                }
            }
        }
    };

    let store = SnapshotStore::new();
    let (events_tx, mut events_rx) = mpsc::channel(config::EVENT_CHANNEL_CAPACITY);
    let (control_tx, control_rx) = mpsc::channel(config::CONTROL_CHANNEL_CAPACITY);
    let (tuning_tx, tuning_rx) = mpsc::channel(config::TUNING_CHANNEL_CAPACITY);

    let session = SimSession::connect(
        SessionConfig {
            endpoint,
            reconnect_delay: config::reconnect_delay(),
        },
        events_tx,
        control_rx,
    );
    tokio::spawn(tuning_task(client, tuning_rx));

    let dispatcher = CommandDispatcher::new(store.clone(), control_tx, tuning_tx);

    let mut scene = SceneReconciler::new(world);
    let mut tracker = EmissionTracker::new();
    let mut settings = ControlSettings::default();

    tracing::info!(
        width = world.width(),
        height = world.height(),
        "console live"
    );

    let mut frames = tokio::time::interval(config::FRAME_INTERVAL);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(event) => store.apply_event(event),
                None => break,
            },

            input = input_rx.recv() => match input {
                Some(event) => {
                    if handle_input(event, &dispatcher, &mut settings) {
                        break;
                    }
                }
                None => break,
            },

            _ = frames.tick() => {
                let view = store.current();
                let now = Instant::now();

                let effects: Vec<EventVisual> = match &view.snapshot {
                    Some(snapshot) => {
                        scene.reconcile(snapshot);
                        tracker.observe(&snapshot.visual_events, now);
                        snapshot
                            .visual_events
                            .iter()
                            .filter_map(|event| {
                                tracker
                                    .progress(&event.id, now)
                                    .and_then(|progress| event_visual(event, progress))
                            })
                            .collect()
                    }
                    None => Vec::new(),
                };

                terminal.draw(|f| {
                    console::draw(
                        f,
                        &ConsoleView {
                            world,
                            session: &view,
                            scene: &scene,
                            effects: &effects,
                            settings: &settings,
                        },
                    )
                })?;
            }
        }
    }

    session.shutdown();
    Ok(())
}

fn is_quit(event: &Event) -> bool {
    let Event::Key(key) = event else {
        return false;
    };
    key.kind == KeyEventKind::Press
        && (key.code == KeyCode::Char('q')
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)))
}

// Returns true when the operator asked to quit.
fn handle_input(
    event: Event,
    dispatcher: &CommandDispatcher,
    settings: &mut ControlSettings,
) -> bool {
    if is_quit(&event) {
        return true;
    }
    let Event::Key(key) = event else {
        return false;
    };
    if key.kind != KeyEventKind::Press {
        return false;
    }

    match key.code {
        KeyCode::Char('s') => dispatcher.start(BattleConfig::custom(
            settings.num_friendly,
            settings.num_enemy,
        )),
        KeyCode::Char('p') => dispatcher.pause(),
        KeyCode::Char('r') => dispatcher.resume(),
        KeyCode::Char('x') => dispatcher.reset(),

        KeyCode::Left => {
            settings.num_friendly = settings.num_friendly.saturating_sub(1).max(MIN_FORCE_SIZE);
        }
        KeyCode::Right => {
            settings.num_friendly = (settings.num_friendly + 1).min(MAX_FORCE_SIZE);
        }
        KeyCode::Down => {
            settings.num_enemy = settings.num_enemy.saturating_sub(1).max(MIN_FORCE_SIZE);
        }
        KeyCode::Up => {
            settings.num_enemy = (settings.num_enemy + 1).min(MAX_FORCE_SIZE);
        }

        KeyCode::Char('1') => {
            settings.speed = 0.5;
            dispatcher.set_speed(0.5);
        }
        KeyCode::Char('2') => {
            settings.speed = 1.0;
            dispatcher.set_speed(1.0);
        }
        KeyCode::Char('3') => {
            settings.speed = 2.0;
            dispatcher.set_speed(2.0);
        }
        KeyCode::Char('a') => {
            settings.ai_level = settings.ai_level.cycled();
            dispatcher.set_ai_level(settings.ai_level);
        }
        _ => {}
    }
    false
}
