use crate::catalog::{derive_metrics, ModuleDescriptor};
use crate::menu::MenuCustomizer;
use crate::playback::PlaybackState;
use crate::ui::app::{ActivePanel, App, FocusPane, SidebarItem};
use crate::ui::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App) {
    let theme = &app.theme;

    // Main layout: Header + Body + Footer
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

    render_header(frame, app, main_chunks[0]);

    // Split body into sidebar and content pane
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_chunks[1]);

    render_sidebar(frame, app, body_chunks[0]);

    match (&app.active, app.active_module()) {
        (Some(panel), Some(module)) => render_panel(frame, app, panel, module, body_chunks[1]),
        _ => render_welcome(frame, app, body_chunks[1]),
    }

    render_footer(frame, app, main_chunks[2]);

    if let Some(customizer) = &app.customizer {
        render_customizer(frame, app, customizer);
    } else if app.show_info {
        render_info(frame, app);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut spans = vec![Span::styled(
        "  LLMVIZ - How Large Language Models Actually Run  ",
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    )];
    spans.push(Span::styled(
        format!(" {}x ", app.speed()),
        Style::default().fg(theme.fg_dim),
    ));
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!(" {status}"),
            Style::default().fg(theme.secondary),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .style(Style::default().bg(theme.bg));

    frame.render_widget(header, area);
}

fn border_style(theme: &Theme, focused: bool) -> Style {
    if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.fg_dim)
    }
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let active_id = app.active.as_ref().map(|panel| panel.module_id.as_str());

    let items: Vec<ListItem> = app
        .sidebar_items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let is_selected = i == app.selected_index;
            let style = if is_selected {
                Style::default()
                    .fg(theme.bg)
                    .bg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.fg)
            };

            match item {
                SidebarItem::Category(category) => ListItem::new(category.clone()).style(
                    style
                        .fg(if is_selected { theme.bg } else { theme.secondary })
                        .add_modifier(Modifier::BOLD),
                ),
                SidebarItem::Module(id) => {
                    let Some(module) = app.registry.get(id) else {
                        return ListItem::new(id.clone()).style(style);
                    };
                    let indent = if app.menu.group_by_category { "  " } else { "" };
                    let marker = if active_id == Some(id.as_str()) { "▶" } else { " " };
                    let icon = if module.icon.is_empty() { "•" } else { module.icon.as_str() };
                    ListItem::new(format!("{indent}{marker} {icon} {}", module.title)).style(style)
                }
            }
        })
        .collect();

    let title = if app.search_mode {
        format!("🔍 /{}", app.search_query)
    } else {
        format!("📚 Modules ({})", app.menu.modules.len())
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style(theme, app.focus == FocusPane::Sidebar)),
        )
        .style(Style::default().fg(theme.fg).bg(theme.bg));

    frame.render_widget(list, area);
}

fn render_welcome(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let text = match app.selected_module() {
        Some(module) => vec![
            Line::from(Span::styled(
                format!("{} {}", module.icon, module.title),
                Style::default()
                    .fg(theme.secondary)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Category: ", Style::default().fg(theme.fg_dim)),
                Span::raw(module.category.clone()),
            ]),
            Line::from(vec![
                Span::styled("Steps: ", Style::default().fg(theme.fg_dim)),
                Span::raw(module.content.script.len().to_string()),
            ]),
            Line::from(""),
            Line::from(module.description.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "Press Enter to open this module",
                Style::default().fg(theme.fg_dim),
            )),
        ],
        None if app.menu.modules.is_empty() => vec![
            Line::from("The menu is empty."),
            Line::from(""),
            Line::from("Press c to choose which modules to show."),
        ],
        None => vec![
            Line::from("No module selected"),
            Line::from(""),
            Line::from("Use ↑↓ or j/k to navigate"),
        ],
    };

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("🖥️  Overview")
                .border_style(border_style(theme, false)),
        )
        .style(Style::default().fg(theme.fg).bg(theme.bg))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_panel(
    frame: &mut Frame,
    app: &App,
    panel: &ActivePanel,
    module: &ModuleDescriptor,
    area: Rect,
) {
    let theme = &app.theme;
    let playback = &panel.playback;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} {}", module.icon, module.title))
        .border_style(border_style(theme, app.focus == FocusPane::Panel))
        .style(Style::default().fg(theme.fg).bg(theme.bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Description
            Constraint::Length(1), // Progress
            Constraint::Min(0),    // Event log
            Constraint::Length(1), // Metrics
        ])
        .split(inner);

    let description = Paragraph::new(module.description.clone())
        .style(Style::default().fg(theme.fg_dim))
        .wrap(Wrap { trim: true });
    frame.render_widget(description, chunks[0]);

    let state_color = match playback.state() {
        PlaybackState::Running => theme.accent,
        PlaybackState::Paused => theme.secondary,
        PlaybackState::Finished => theme.success,
        PlaybackState::Idle => theme.fg_dim,
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(state_color).bg(theme.selection_bg))
        .ratio(playback.progress().clamp(0.0, 1.0))
        .label(format!(
            "{}  {}/{}",
            playback.state().label(),
            playback.cursor(),
            playback.len()
        ));
    frame.render_widget(gauge, chunks[1]);

    let mut lines: Vec<Line> = playback
        .emitted()
        .iter()
        .enumerate()
        .map(|(i, event)| {
            Line::from(vec![
                Span::styled(format!("{:>3} ", i + 1), Style::default().fg(theme.fg_dim)),
                Span::styled(
                    format!("{:<10} ", event.actor),
                    Style::default().fg(theme.fg_dim),
                ),
                Span::styled(
                    event.payload.clone(),
                    Style::default().fg(theme.event_color(event.kind)),
                ),
            ])
        })
        .collect();

    if let Some((i, event)) = playback.pending() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:>3} ", i + 1), Style::default().fg(theme.fg_dim)),
            Span::styled(
                format!("{:<10} ", event.actor),
                Style::default().fg(theme.fg_dim),
            ),
            Span::styled(
                format!("{} …", event.payload),
                Style::default()
                    .fg(theme.pending)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    if lines.is_empty() {
        let hint = match playback.state() {
            PlaybackState::Finished => "Nothing to show.",
            _ => "Press Space to start, n to step.",
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(theme.fg_dim))));
    } else {
        // Keep the newest line on screen unless scrolled back
        let visible = usize::from(chunks[2].height.saturating_sub(1));
        let skip = lines.len().saturating_sub(visible + app.log_scroll);
        lines.drain(..skip);
    }

    let log = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .title("💬 Events")
                .border_style(Style::default().fg(theme.fg_dim)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(log, chunks[2]);

    let metrics = derive_metrics(module.content.metric, playback.emitted(), playback.len());
    let mut spans = Vec::new();
    for metric in metrics {
        if !spans.is_empty() {
            spans.push(Span::styled("  │  ", Style::default().fg(theme.fg_dim)));
        }
        spans.push(Span::styled(
            format!("{}: ", metric.label),
            Style::default().fg(theme.fg_dim),
        ));
        spans.push(Span::styled(metric.value, Style::default().fg(theme.secondary)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[3]);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.customizer.is_some() {
        "[↑↓/jk] Move  [Space] Toggle  [m] Grab  [a/n] All/None  [g] Group  [r] Reset  [Enter] Save  [Esc] Cancel"
    } else if app.search_mode {
        "Type to filter  [Enter] Open  [Esc] Cancel"
    } else {
        match app.focus {
            FocusPane::Sidebar => {
                "[↑↓/jk] Navigate  [Enter] Open  [/] Search  [c] Customize  [t] Theme  [i] Info  [Tab] Switch  [Q] Quit"
            }
            FocusPane::Panel => {
                "[Space] Play/Pause  [n] Step  [r] Reset  [+/-] Speed  [↑↓] Scroll  [Esc] Close  [Tab] Switch  [Q] Quit"
            }
        }
    };

    let footer = Paragraph::new(help_text)
        .style(Style::default().fg(app.theme.fg_dim).bg(app.theme.bg))
        .block(Block::default());

    frame.render_widget(footer, area);
}

fn render_info(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let popup = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, popup);

    let mut text = vec![
        Line::from(Span::styled(
            "LLMVIZ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(
            "Step-by-step animated explainers of how LLM inference, caching and tooling work.",
        ),
        Line::from(""),
        Line::from(vec![
            Span::styled("Modules: ", Style::default().fg(theme.fg_dim)),
            Span::raw(app.registry.len().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Theme: ", Style::default().fg(theme.fg_dim)),
            Span::raw(theme.name),
        ]),
        Line::from(""),
    ];
    for category in app.registry.categories() {
        let count = app.registry.iter().filter(|m| m.category == category).count();
        text.push(Line::from(vec![
            Span::styled(format!("  {category}: "), Style::default().fg(theme.secondary)),
            Span::raw(count.to_string()),
        ]));
    }
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press i or Esc to close",
        Style::default().fg(theme.fg_dim),
    )));

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("ℹ️  About")
                .border_style(Style::default().fg(theme.accent)),
        )
        .style(Style::default().fg(theme.fg).bg(theme.bg))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, popup);
}

fn render_customizer(frame: &mut Frame, app: &App, customizer: &MenuCustomizer) {
    let theme = &app.theme;
    let popup = centered_rect(60, 80, frame.area());
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = customizer
        .order()
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let check = if customizer.is_selected(id) { "[x]" } else { "[ ]" };
            let title = app
                .registry
                .get(id)
                .map_or(id.as_str(), |module| module.title.as_str());

            let mut style = Style::default().fg(theme.fg);
            if i == customizer.cursor() {
                style = if customizer.is_grabbed() {
                    style.bg(theme.selection_bg).add_modifier(Modifier::BOLD)
                } else {
                    style.fg(theme.bg).bg(theme.accent)
                };
            }
            ListItem::new(format!("{check} {title}")).style(style)
        })
        .collect();

    let grouping = if customizer.group_by_category() {
        "grouped"
    } else {
        "flat"
    };
    let title = format!(
        "☰ Customize menu ({} of {}, {grouping})",
        customizer.selected_count(),
        customizer.order().len()
    );

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(theme.accent)),
        )
        .style(Style::default().bg(theme.bg));

    frame.render_widget(list, popup);
}

/// A rectangle of `percent_x` by `percent_y` centered in `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn test_app() -> App {
        let registry = builtin::registry().expect("builtin registry");
        App::new(registry, None, Theme::default_theme().clone(), 1.0)
    }

    fn draw(app: &App) -> String {
        draw_sized(app, 120, 40)
    }

    fn draw_sized(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_centered_rect_within_bounds() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 15);
    }

    #[test]
    fn test_render_sidebar_lists_modules() {
        let app = test_app();
        let screen = draw(&app);
        assert!(screen.contains("LLMVIZ"));
        assert!(screen.contains("KV Cache"));
    }

    #[test]
    fn test_render_panel_shows_progress() {
        let mut app = test_app();
        app.open_module("kv-cache");
        if let Some(panel) = app.active.as_mut() {
            panel.playback.step();
        }
        let screen = draw(&app);
        assert!(screen.contains("paused"));
        assert!(screen.contains("Events"));
    }

    #[test]
    fn test_render_customizer_modal() {
        let mut app = test_app();
        app.open_customizer();
        let screen = draw(&app);
        assert!(screen.contains("Customize menu"));
        assert!(screen.contains("[x]"));
    }

    #[test]
    fn test_event_log_follows_newest_step() {
        use crate::catalog::{EventKind, MetricKind, PanelContent, Registry, ScriptEvent};
        use crate::playback::{Cadence, StepMode};

        let script = (0..30)
            .map(|i| ScriptEvent::new("worker", EventKind::Info, &format!("event-{i:02}")))
            .collect();
        let registry = Registry::new(vec![ModuleDescriptor {
            id: "long".to_string(),
            title: "Long".to_string(),
            category: "Test".to_string(),
            icon: String::new(),
            description: String::new(),
            content: PanelContent {
                script,
                cadence: Cadence::default(),
                mode: StepMode::Single,
                metric: MetricKind::None,
            },
        }])
        .expect("valid registry");
        let mut app = App::new(registry, None, Theme::default_theme().clone(), 1.0);
        app.open_module("long");
        if let Some(panel) = app.active.as_mut() {
            for _ in 0..30 {
                panel.playback.step();
            }
        }

        let screen = draw_sized(&app, 120, 24);
        assert!(screen.contains("event-29"));
        assert!(!screen.contains("event-00"));

        for _ in 0..30 {
            app.scroll_log_up();
        }
        let screen = draw_sized(&app, 120, 24);
        assert!(screen.contains("event-00"));
        assert!(!screen.contains("event-29"));
    }
}
