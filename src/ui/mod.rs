use std::sync::OnceLock;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, Field, NoticeKind, Popup, View};
use crate::theme::Theme;

// Load theme colors from the system once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

fn accent() -> Color { theme().accent }
fn danger() -> Color { theme().danger }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn inactive() -> Color { theme().inactive }
fn bg_selected() -> Color { theme().bg_selected }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(10),   // Main panel
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);

    // Exactly one of the two panels is visible
    match app.view {
        View::LoginForm => draw_login_card(f, app, chunks[1]),
        View::SuccessPanel => draw_success_panel(f, app, chunks[1]),
    }

    draw_footer(f, app, chunks[2]);

    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f),
        Popup::ConfirmLogout => draw_confirm_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(notice) = &app.notice {
        let color = match notice.kind {
            NoticeKind::Info => warning(),
            NoticeKind::Success => success(),
            NoticeKind::Error => danger(),
        };
        Line::from(Span::styled(notice.text.clone(), Style::default().fg(color)))
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(text_dim())))
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

/// Center a fixed-size card inside the main area
fn card_rect(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn draw_login_card(f: &mut Frame, app: &App, area: Rect) {
    let card = card_rect(area, 50, 12);

    let block = Block::default()
        .title(Span::styled(
            " Sign in ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    f.render_widget(block, card);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Submit row
        ])
        .split(card);

    draw_input(
        f,
        inner[0],
        " Username ",
        &app.username,
        app.field == Field::Username && !app.login_pending,
        false,
    );

    draw_input(
        f,
        inner[1],
        " Password ",
        &app.password,
        app.field == Field::Password && !app.login_pending,
        true,
    );

    // Submit row doubles as the loading indicator
    let submit = if app.login_pending {
        Line::from(Span::styled(
            "  Signing in...  ",
            Style::default().fg(warning()),
        ))
    } else {
        Line::from(vec![
            Span::styled("[ ", Style::default().fg(text_dim())),
            Span::styled("Enter", Style::default().fg(accent()).add_modifier(Modifier::BOLD)),
            Span::styled(" = Sign in ]", Style::default().fg(text_dim())),
        ])
    };
    f.render_widget(Paragraph::new(submit).alignment(Alignment::Center), inner[3]);
}

fn draw_input(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool, masked: bool) {
    let border = if focused { accent() } else { inactive() };
    let title_color = if focused { accent() } else { text_dim() };

    let shown = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let cursor = if focused { "_" } else { "" };

    let input = Paragraph::new(format!("{}{}", shown, cursor))
        .style(Style::default().fg(text()))
        .block(
            Block::default()
                .title(Span::styled(title, Style::default().fg(title_color)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    f.render_widget(input, area);
}

fn draw_success_panel(f: &mut Frame, app: &App, area: Rect) {
    let card = card_rect(area, 56, 10);

    let block = Block::default()
        .title(Span::styled(
            " Logged in ",
            Style::default().fg(success()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(success()));

    let rows: Vec<Row> = match &app.session {
        Some(session) => {
            let login_time = session
                .login_time
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
            vec![
                info_row("Username", session.username.clone()),
                info_row("Role", session.role.clone()),
                info_row("Token", session.token_preview()),
                info_row("Login time", login_time),
            ]
        }
        // Shouldn't happen (panel implies a session), keep the UI honest
        None => vec![Row::new(vec![Span::styled(
            "  No session",
            Style::default().fg(text_dim()),
        )])],
    };

    let widths = [Constraint::Length(14), Constraint::Percentage(80)];
    let table = Table::new(rows, widths).block(block);
    f.render_widget(table, card);
}

fn info_row(label: &str, value: String) -> Row<'_> {
    Row::new(vec![
        Span::styled(format!("  {}", label), Style::default().fg(text_dim())),
        Span::styled(value, Style::default().fg(text())),
    ])
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.view {
        View::LoginForm => vec![
            ("Tab", "Field"),
            ("Enter", "Sign in"),
            ("Esc", "Clear notice"),
            ("F1", "Help"),
            ("Ctrl+C", "Quit"),
        ],
        View::SuccessPanel => vec![
            ("l", "Logout"),
            ("F1", "Help"),
            ("q", "Quit"),
        ],
    };

    let hint_spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "═══ Login form ═══",
            Style::default().fg(text()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Tab/↑↓    ", Style::default().fg(accent())),
            Span::raw("Switch between username and password"),
        ]),
        Line::from(vec![
            Span::styled("  Enter     ", Style::default().fg(accent())),
            Span::raw("Next field / submit"),
        ]),
        Line::from(vec![
            Span::styled("  Esc       ", Style::default().fg(accent())),
            Span::raw("Dismiss the status notice"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Logged in ═══",
            Style::default().fg(text()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  l / Esc   ", Style::default().fg(accent())),
            Span::raw("Log out (asks for confirmation)"),
        ]),
        Line::from(vec![
            Span::styled("  q         ", Style::default().fg(accent())),
            Span::raw("Quit"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Scripting ═══",
            Style::default().fg(text()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  torii --status   ", Style::default().fg(accent())),
            Span::raw("Print session as JSON"),
        ]),
        Line::from(vec![
            Span::styled("  torii --logout   ", Style::default().fg(accent())),
            Span::raw("Clear the stored session"),
        ]),
        Line::from(vec![
            Span::styled("  torii --health   ", Style::default().fg(accent())),
            Span::raw("Query the backend health endpoint"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text).block(
        Block::default()
            .title(Span::styled(" torii Help ", Style::default().fg(accent())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );
    f.render_widget(help, popup_area);
}

fn draw_confirm_popup(f: &mut Frame) {
    let popup_area = centered_rect(40, 20, f.area());
    f.render_widget(Clear, popup_area);

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("Log out?", Style::default().fg(warning()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
            Span::raw(" Yes   "),
            Span::styled("n", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
            Span::raw(" No"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(warning())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(warning())),
    )
    .alignment(Alignment::Center)
    .style(Style::default().bg(bg_selected()));

    f.render_widget(confirm, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
