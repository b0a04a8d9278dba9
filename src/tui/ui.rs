use crate::tui::app::{App, OUTLINE_WIDTH};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    let [title_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let (outline_area, content_area) = if app.show_outline {
        let [outline, content] = Layout::horizontal([
            Constraint::Percentage(OUTLINE_WIDTH),
            Constraint::Percentage(100 - OUTLINE_WIDTH),
        ])
        .areas(main_area);
        (Some(outline), content)
    } else {
        (None, main_area)
    };

    let content_inner = Block::bordered().inner(content_area);
    let outline_inner_width = outline_area.map_or(0, |area| Block::bordered().inner(area).width);
    app.layout(content_inner.width, outline_inner_width, content_inner.height);

    render_title_bar(frame, app, title_area);
    if let Some(area) = outline_area {
        render_outline(frame, app, area);
    }
    render_content(frame, app, content_area);
    render_status_bar(frame, app, status_area);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = Paragraph::new(app.title())
        .style(
            Style::default()
                .fg(Color::Rgb(100, 200, 255))
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(title, area);
}

fn render_outline(frame: &mut Frame, app: &App, area: Rect) {
    let outline = Paragraph::new(app.outline_lines().to_vec()).block(
        Block::bordered()
            .title(" Outline ")
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(outline, area);
}

fn render_content(frame: &mut Frame, app: &App, area: Rect) {
    let content = Paragraph::new(app.lines().to_vec())
        .block(Block::bordered().border_style(Style::default().fg(Color::Gray)))
        .scroll((app.scroll, 0));
    frame.render_widget(content, area);

    let max_scroll = app.max_scroll();
    if max_scroll > 0 {
        let mut state = ScrollbarState::new(max_scroll as usize).position(app.scroll as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut state,
        );
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.lines().len();
    let percentage = if app.max_scroll() == 0 {
        100
    } else {
        usize::from(app.scroll) * 100 / usize::from(app.max_scroll())
    };
    let text = match &app.status_message {
        Some(message) => format!(" {message} "),
        None => format!(
            " {}/{} ({percentage}%) • j/k:Scroll • Space/PgDn:Page • g/G:Top/Bottom • o:Outline • r:Reload • q:Quit ",
            usize::from(app.scroll) + 1,
            total,
        ),
    };
    let status = Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Gray));
    frame.render_widget(status, area);
}
