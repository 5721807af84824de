// Terminal presentation. Everything here draws from borrowed state and owns
// nothing; the runtime loop decides when a frame happens.

use crate::domain::{DroneRole, Position, SimStatus, Team, WorldDimensions, to_screen};
use crate::use_cases::{
    AiLevel, ConnectionState, EntityKind, EntityVisual, EventVisual, SceneReconciler, SessionView,
};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph,
        canvas::{Canvas, Context, Line as CanvasLine},
    },
};

// Team palette lifted from the simulation server's own asset colors.
const FRIENDLY_GREEN: Color = Color::Rgb(34, 197, 94);
const ENEMY_ORANGE: Color = Color::Rgb(249, 115, 22);
const ASSET_BLUE: Color = Color::Rgb(147, 197, 253);
const TITLE_AMBER: Color = Color::Rgb(251, 191, 36);
const PANEL_GRAY: Color = Color::Rgb(75, 85, 99);
const VALUE_CYAN: Color = Color::Rgb(34, 211, 238);

const FRIENDLY_RGB: (u8, u8, u8) = (34, 197, 94);
const ENEMY_RGB: (u8, u8, u8) = (249, 115, 22);
const NEUTRAL_RGB: (u8, u8, u8) = (156, 163, 175);
const COMM_RGB: (u8, u8, u8) = (0, 255, 255);
const COMM_DIM_RGB: (u8, u8, u8) = (8, 51, 68);
const FLASH_RGB: (u8, u8, u8) = (253, 224, 71);
const BACKGROUND_RGB: (u8, u8, u8) = (17, 24, 39);

// Canvas units; the map plots on a fixed [0,100] square.
const HEALTH_BAR_SPAN: f64 = 4.0;

/// Operator-adjustable settings staged locally. Force sizes ride on the next
/// start command; speed and AI level post immediately when changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    pub num_friendly: u32,
    pub num_enemy: u32,
    pub ai_level: AiLevel,
    pub speed: f64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            num_friendly: 8,
            num_enemy: 12,
            ai_level: AiLevel::default(),
            speed: 1.0,
        }
    }
}

/// Everything one live frame draws from.
pub struct ConsoleView<'a> {
    pub world: WorldDimensions,
    pub session: &'a SessionView,
    pub scene: &'a SceneReconciler,
    pub effects: &'a [EventVisual],
    pub settings: &'a ControlSettings,
}

/// Interpolate between two RGB colors based on a ratio (0.0 ~ 1.0).
fn interpolate_color(color1: (u8, u8, u8), color2: (u8, u8, u8), ratio: f32) -> Color {
    let ratio = ratio.clamp(0.0, 1.0);
    let r = (color1.0 as f32 + (color2.0 as f32 - color1.0 as f32) * ratio) as u8;
    let g = (color1.1 as f32 + (color2.1 as f32 - color1.1 as f32) * ratio) as u8;
    let b = (color1.2 as f32 + (color2.2 as f32 - color1.2 as f32) * ratio) as u8;
    Color::Rgb(r, g, b)
}

/// Full-screen notice while the world config fetch is still in flight.
pub fn draw_bootstrap(f: &mut Frame, attempts: u32) {
    let lines = vec![
        Line::from(Span::styled(
            format!("Fetching world configuration... (up to {attempts} attempts)"),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(Span::styled(
            "q to quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    draw_notice(f, lines, PANEL_GRAY);
}

/// Persistent failure screen once the bootstrap retries are exhausted.
pub fn draw_config_failed(f: &mut Frame, base_url: &str, attempts: u32) {
    let lines = vec![
        Line::from(Span::styled(
            "World configuration unavailable",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::raw(format!(
            "{base_url}/config/world did not answer after {attempts} attempts."
        ))),
        Line::from(Span::styled(
            "Restart the console once the simulation server is reachable. q to quit.",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    draw_notice(f, lines, Color::Red);
}

fn draw_notice(f: &mut Frame, lines: Vec<Line>, border: Color) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(lines.len() as u16 + 2),
            Constraint::Min(0),
        ])
        .split(f.area());

    let notice = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    f.render_widget(notice, rows[1]);
}

/// The live console: header, three-column body, key footer.
pub fn draw(f: &mut Frame, view: &ConsoleView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(f.area());

    render_header(f, chunks[0], view);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(24),
            Constraint::Percentage(52),
            Constraint::Percentage(24),
        ])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);
    render_coordination(f, left[0], view);
    render_comms(f, left[1], view);

    render_map(f, columns[1], view);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[2]);
    render_events(f, right[0], view);
    render_metrics(f, right[1], view);

    render_footer(f, chunks[2], view);
}

fn render_header(f: &mut Frame, area: Rect, view: &ConsoleView) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(18)])
        .split(area);

    let (status, time) = match &view.session.snapshot {
        Some(snapshot) => (
            snapshot.simulation_state.status,
            snapshot.simulation_state.time,
        ),
        None => (SimStatus::Idle, 0.0),
    };

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            " SWARM CONSOLE ",
            Style::default()
                .fg(TITLE_AMBER)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(PANEL_GRAY)),
        status_span(status),
        Span::styled(format!("  t={time:.1}s"), Style::default().fg(Color::Gray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PANEL_GRAY)),
    );
    f.render_widget(title, halves[0]);

    let link = Paragraph::new(Line::from(connection_span(view.session.connection)))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(PANEL_GRAY)),
        );
    f.render_widget(link, halves[1]);
}

fn status_span(status: SimStatus) -> Span<'static> {
    let (label, color) = match status {
        SimStatus::Idle => ("idle", Color::DarkGray),
        SimStatus::Running => ("running", FRIENDLY_GREEN),
        SimStatus::Paused => ("paused", Color::Yellow),
        SimStatus::Finished => ("finished", VALUE_CYAN),
    };
    Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn connection_span(connection: ConnectionState) -> Span<'static> {
    let (label, color) = match connection {
        ConnectionState::Connected => ("Connected", FRIENDLY_GREEN),
        ConnectionState::Connecting => ("Connecting...", Color::Yellow),
        ConnectionState::Disconnected => ("Disconnected", Color::Red),
    };
    Span::styled(label, Style::default().fg(color))
}

fn render_map(f: &mut Frame, area: Rect, view: &ConsoleView) {
    let world = view.world;
    let scene = view.scene;
    let effects = view.effects;
    let session = view.session;

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(PANEL_GRAY))
                .title(Span::styled(
                    "Battlespace",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, 100.0])
        .y_bounds([0.0, 100.0])
        .paint(move |ctx| {
            if session.snapshot.is_none() {
                let message = match session.connection {
                    ConnectionState::Connected => "Awaiting simulation data...",
                    _ => "Connecting to server...",
                };
                ctx.print(
                    34.0,
                    50.0,
                    Span::styled(message, Style::default().fg(Color::DarkGray)),
                );
                return;
            }

            // Comm pulses sit under everything else, like the upstream layer order.
            for effect in effects {
                if let EventVisual::Pulse {
                    origin,
                    target,
                    progress,
                } = effect
                {
                    let brightness = (std::f64::consts::PI * progress).sin();
                    let (x1, y1) = canvas_point(*origin, world);
                    let (x2, y2) = canvas_point(*target, world);
                    ctx.draw(&CanvasLine {
                        x1,
                        y1,
                        x2,
                        y2,
                        color: interpolate_color(COMM_DIM_RGB, COMM_RGB, brightness as f32),
                    });
                }
            }

            for effect in effects {
                if let EventVisual::Tracer {
                    origin,
                    bearing,
                    length,
                    team,
                    progress,
                } = effect
                {
                    let tip = Position {
                        x: origin.x + bearing.cos() * length,
                        y: origin.y + bearing.sin() * length,
                    };
                    let base = match team {
                        Some(Team::Friendly) => FRIENDLY_RGB,
                        Some(Team::Enemy) => ENEMY_RGB,
                        None => NEUTRAL_RGB,
                    };
                    let (x1, y1) = canvas_point(*origin, world);
                    let (x2, y2) = canvas_point(tip, world);
                    ctx.draw(&CanvasLine {
                        x1,
                        y1,
                        x2,
                        y2,
                        color: interpolate_color(base, BACKGROUND_RGB, *progress as f32),
                    });
                }
            }

            for (_, entity) in scene.entities() {
                draw_entity(ctx, entity);
            }

            for effect in effects {
                if let EventVisual::Flash { origin, progress } = effect {
                    let (x, y) = canvas_point(*origin, world);
                    ctx.print(
                        x,
                        y,
                        Span::styled(
                            "✸",
                            Style::default().fg(interpolate_color(
                                FLASH_RGB,
                                BACKGROUND_RGB,
                                *progress as f32,
                            )),
                        ),
                    );
                }
            }
        });

    f.render_widget(canvas, area);
}

fn draw_entity(ctx: &mut Context, entity: &EntityVisual) {
    let x = entity.screen.x * 100.0;
    let y = (1.0 - entity.screen.y) * 100.0;

    let (symbol, color) = match entity.kind {
        EntityKind::Drone { team, role } => {
            let symbol = match role {
                DroneRole::Interceptor => "▲",
                DroneRole::GroundAttack => "◼",
                DroneRole::AirToAir => "◆",
            };
            let color = match team {
                Team::Friendly => FRIENDLY_GREEN,
                Team::Enemy => ENEMY_ORANGE,
            };
            (symbol, color)
        }
        EntityKind::Asset => {
            if entity.destroyed {
                ("✖", Color::DarkGray)
            } else {
                ("⌂", ASSET_BLUE)
            }
        }
    };

    ctx.print(x, y, Span::styled(symbol, Style::default().fg(color)));

    if !entity.destroyed {
        let span = HEALTH_BAR_SPAN * entity.health;
        if span > 0.0 {
            ctx.draw(&CanvasLine {
                x1: x - HEALTH_BAR_SPAN / 2.0,
                y1: y - 2.5,
                x2: x - HEALTH_BAR_SPAN / 2.0 + span,
                y2: y - 2.5,
                color,
            });
        }
    }
}

fn canvas_point(position: Position, world: WorldDimensions) -> (f64, f64) {
    // Canvas y grows upward; world y grows downward.
    let sp = to_screen(position, world);
    (sp.x * 100.0, (1.0 - sp.y) * 100.0)
}

fn render_coordination(f: &mut Frame, area: Rect, view: &ConsoleView) {
    let mut lines = Vec::new();

    if let Some(snapshot) = &view.session.snapshot {
        for target in &snapshot.analysis.coordination_targets {
            lines.push(Line::from(vec![
                Span::raw("F:["),
                Span::styled(
                    short_id(&target.source_id).to_string(),
                    Style::default().fg(VALUE_CYAN),
                ),
                Span::raw("] → E:["),
                Span::styled(
                    short_id(&target.target_id).to_string(),
                    Style::default().fg(Color::Red),
                ),
                Span::raw(format!("] @ {}m", target.distance)),
            ]));
        }

        if !snapshot.analysis.swarm_state.is_empty() {
            let summary = snapshot
                .analysis
                .swarm_state
                .iter()
                .map(|s| format!("{}:{}", s.status, s.count))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(Line::from(Span::styled(
                format!("swarm {summary}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No active engagements...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    render_panel(f, area, "Coordination Targets", lines);
}

fn render_comms(f: &mut Frame, area: Rect, view: &ConsoleView) {
    let capacity = tail_capacity(area);
    let mut lines = Vec::new();

    if let Some(snapshot) = &view.session.snapshot {
        let shared: Vec<_> = snapshot
            .event_log
            .iter()
            .filter(|entry| entry.message.contains("shared"))
            .collect();
        for entry in tail(&shared, capacity) {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:.1}s: ", entry.time),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.message.clone(), Style::default().fg(VALUE_CYAN)),
            ]));
        }
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Awaiting transmissions...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    render_panel(f, area, "Communication Log", lines);
}

fn render_events(f: &mut Frame, area: Rect, view: &ConsoleView) {
    let capacity = tail_capacity(area);
    let mut lines = Vec::new();

    if let Some(snapshot) = &view.session.snapshot {
        let entries: Vec<_> = snapshot.event_log.iter().collect();
        for entry in tail(&entries, capacity) {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:.2}s: ", entry.time),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(entry.message.clone()),
            ]));
        }
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No events yet...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    render_panel(f, area, "Event Log", lines);
}

fn render_metrics(f: &mut Frame, area: Rect, view: &ConsoleView) {
    let metrics = view
        .session
        .snapshot
        .as_ref()
        .map(|snapshot| snapshot.metrics)
        .unwrap_or_default();

    let lines = vec![
        metric_line("Assets Saved", format!("{}", metrics.assets_saved)),
        metric_line("Neutralizations", format!("{}", metrics.neutralizations)),
        metric_line("Friendly Losses", format!("{}", metrics.friendly_losses)),
        metric_line(
            "Avg Intercept Time",
            format!("{:.2}s", metrics.avg_interception_time),
        ),
        metric_line(
            "% Unattended Hostiles",
            format!("{}%", metrics.percent_unattended_hostiles),
        ),
    ];

    render_panel(f, area, "Live Metrics", lines);
}

fn metric_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<22}"), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(VALUE_CYAN)),
    ])
}

fn render_footer(f: &mut Frame, area: Rect, view: &ConsoleView) {
    let settings = view.settings;
    let lines = vec![
        Line::from(vec![
            key_span("s"),
            Span::raw(" start  "),
            key_span("p"),
            Span::raw(" pause  "),
            key_span("r"),
            Span::raw(" resume  "),
            key_span("x"),
            Span::raw(" reset  "),
            key_span("←/→"),
            Span::raw(" friendlies  "),
            key_span("↓/↑"),
            Span::raw(" enemies  "),
            key_span("1/2/3"),
            Span::raw(" speed  "),
            key_span("a"),
            Span::raw(" ai  "),
            key_span("q"),
            Span::raw(" quit"),
        ]),
        Line::from(vec![
            Span::styled("Friendlies: ", Style::default().fg(VALUE_CYAN)),
            Span::raw(format!("{}  ", settings.num_friendly)),
            Span::styled("Enemies: ", Style::default().fg(Color::Red)),
            Span::raw(format!("{}  ", settings.num_enemy)),
            Span::styled("Speed: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{:.1}x  ", settings.speed)),
            Span::styled("AI: ", Style::default().fg(Color::Gray)),
            Span::raw(settings.ai_level.label()),
        ]),
    ];

    let footer = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PANEL_GRAY)),
    );
    f.render_widget(footer, area);
}

fn key_span(key: &str) -> Span<'_> {
    Span::styled(key, Style::default().fg(Color::Yellow))
}

fn render_panel(f: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PANEL_GRAY))
            .title(Span::styled(
                title.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(panel, area);
}

// Content rows inside a bordered panel.
fn tail_capacity(area: Rect) -> usize {
    area.height.saturating_sub(2) as usize
}

fn tail<'a, T>(items: &'a [&'a T], capacity: usize) -> impl Iterator<Item = &'a T> {
    let start = items.len().saturating_sub(capacity);
    items[start..].iter().copied()
}

/// Last four characters of an entity id, the way operators read them off
/// the coordination panel.
fn short_id(id: &str) -> &str {
    let cut = id.len().saturating_sub(4);
    id.get(cut..).unwrap_or(id)
}
