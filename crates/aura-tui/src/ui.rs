use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use unicode_width::UnicodeWidthStr;

use aura_core::{ActionKind, ActionResult, Author, Category, OverlayState, PlanItem, Screen};

use crate::app::{App, InputMode, FREE_TEXT_SECTION};

/// Terminal columns a string occupies
fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Rows a paragraph of `lines` takes when wrapped to `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| {
            let w: usize = line.spans.iter().map(|s| display_width(&s.content)).sum();
            (w.max(1) + width - 1) / width
        })
        .sum::<usize>() as u16
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

fn thinking_dots(app: &App) -> String {
    ".".repeat(app.animation_frame as usize + 1)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen() {
        Screen::Initial => render_form_screen(app, frame, body_area),
        Screen::Chatting => render_chat_screen(app, frame, body_area),
        Screen::Processing => render_processing_screen(app, frame, body_area),
        Screen::Results => render_results_screen(app, frame, body_area),
        Screen::Error => render_error_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.overlay.is_some() {
        render_overlay(app, frame, body_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Aura ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("社会貢献ナビゲーター ", Style::default().fg(Color::White)),
        Span::styled(format!("[{}] ", app.chat_model), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen() {
        Screen::Initial => " FORM ",
        Screen::Chatting => " CHAT ",
        Screen::Processing => " WORKING ",
        Screen::Results => " PLAN ",
        Screen::Error => " ERROR ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let hints: Vec<Span> = if app.overlay.is_some() {
        [hint(" j/k ", " scroll "), hint(" Esc ", " close ")].concat()
    } else {
        match (app.screen(), app.input_mode) {
            (Screen::Initial, InputMode::Normal) => [
                hint(" Tab ", " section "),
                hint(" j/k ", " nav "),
                hint(" Space ", " toggle "),
                hint(" i ", " free text "),
                hint(" s ", " start "),
                hint(" q ", " quit "),
            ]
            .concat(),
            (Screen::Chatting, InputMode::Normal) => [
                hint(" j/k ", " nav "),
                hint(" Enter ", " answer "),
                hint(" i ", " type "),
                hint(" b ", " back "),
                hint(" q ", " quit "),
            ]
            .concat(),
            (_, InputMode::Editing) => [hint(" Enter ", " done "), hint(" Esc ", " stop typing ")].concat(),
            (Screen::Processing, _) => hint(" q ", " quit ").to_vec(),
            (Screen::Results, _) => [
                hint(" j/k ", " nav "),
                hint(" Enter ", " action "),
                hint(" m ", " save mood board "),
                hint(" r ", " start over "),
                hint(" q ", " quit "),
            ]
            .concat(),
            (Screen::Error, _) => [hint(" r ", " retry "), hint(" q ", " quit ")].concat(),
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)];
    spans.extend(hints);
    if let Some(status) = &app.status {
        spans.push(Span::styled(format!("  {}", status), Style::default().fg(Color::Yellow)));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn section_block(title: &str, focused: bool) -> Block<'static> {
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title))
}

fn render_form_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [intro_area, lists_area, free_text_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let intro = Paragraph::new(vec![
        Line::from(Span::styled(
            " あなたのことを教えてください。",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            " 当てはまるものを選ぶと、Aura があなたにできる社会貢献を一緒に考えます。",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(intro, intro_area);

    let columns = Layout::horizontal([
        Constraint::Percentage(34),
        Constraint::Percentage(33),
        Constraint::Percentage(33),
    ])
    .split(lists_area);

    for (index, category) in Category::all().into_iter().enumerate() {
        let focused = app.form_section == index && app.input_mode == InputMode::Normal;
        let items: Vec<ListItem> = category
            .options()
            .iter()
            .map(|option| {
                let checked = app.form.is_selected(category, option);
                let mark = if checked { "[x] " } else { "[ ] " };
                let style = if checked {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{}{}", mark, option)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(section_block(category.title(), focused))
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

        if focused {
            frame.render_stateful_widget(list, columns[index], &mut app.form_state);
        } else {
            frame.render_widget(list, columns[index]);
        }
    }

    let editing = app.input_mode == InputMode::Editing;
    let focused = app.form_section == FREE_TEXT_SECTION || editing;
    let text = if app.form.free_text.is_empty() && !editing {
        Span::styled("その他、伝えたいこと（任意）", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.form.free_text.as_str())
    };
    let free_text = Paragraph::new(Line::from(text)).block(section_block("自由記述", focused));
    frame.render_widget(free_text, free_text_area);

    if editing {
        let before: String = app.form.free_text.chars().take(app.free_text_cursor).collect();
        let x = free_text_area.x + 1 + display_width(&before) as u16;
        frame.set_cursor_position((x.min(free_text_area.right().saturating_sub(2)), free_text_area.y + 1));
    }
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let bottom_height = if app.input_mode == InputMode::Editing {
        3
    } else if app.can_reply() {
        app.chat_choice_count() as u16 + 2
    } else {
        3
    };

    let [chat_area, bottom_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(bottom_height),
    ])
    .areas(area);

    let mut lines: Vec<Line> = Vec::new();
    // The opening message is the synthesized profile, not something the user typed
    for message in app.session.transcript().iter().skip(1) {
        match message.author {
            Author::User => {
                lines.push(Line::from(Span::styled(
                    "あなた:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            Author::Agent => {
                lines.push(Line::from(Span::styled(
                    "Aura:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
            }
        }
        for line in message.text.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.session.is_thinking() {
        lines.push(Line::from(Span::styled(
            "Aura:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("考えています{}", thinking_dots(app)),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the newest message in view
    let inner_height = chat_area.height.saturating_sub(2);
    let content_height = wrapped_height(&lines, chat_area.width.saturating_sub(2));
    let scroll = content_height.saturating_sub(inner_height);

    let chat = Paragraph::new(Text::from(lines))
        .block(section_block("Aura との対話", false))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(chat, chat_area);

    if app.input_mode == InputMode::Editing {
        let input = Paragraph::new(app.chat_input.as_str()).block(section_block("メッセージを入力...", true));
        frame.render_widget(input, bottom_area);

        let before: String = app.chat_input.chars().take(app.chat_cursor).collect();
        let x = bottom_area.x + 1 + display_width(&before) as u16;
        frame.set_cursor_position((x.min(bottom_area.right().saturating_sub(2)), bottom_area.y + 1));
    } else if let Some(step) = app.session.current_step().filter(|_| app.can_reply()) {
        let title = if app.session.finalize_ready() {
            "選ぶとプランを作成します"
        } else {
            "回答を選んでください"
        };
        let mut items: Vec<ListItem> = step
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| ListItem::new(format!("{}. {}", i + 1, option)))
            .collect();
        items.push(ListItem::new("   その他（自由入力）").style(Style::default().fg(Color::DarkGray)));

        let list = List::new(items)
            .block(section_block(title, true))
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, bottom_area, &mut app.option_state);
    } else {
        let waiting = Paragraph::new(Span::styled("少々お待ちください", Style::default().fg(Color::DarkGray)))
            .block(section_block("", false));
        frame.render_widget(waiting, bottom_area);
    }
}

fn render_processing_screen(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 60, 5);
    let text = vec![
        Line::from(Span::styled("✦", Style::default().fg(Color::Magenta).bold())).centered(),
        Line::default(),
        Line::from(format!("{}{}", app.processing_message(), thinking_dots(app))).centered(),
    ];
    frame.render_widget(Paragraph::new(text), popup);
}

fn render_results_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(plan) = app.session.plan() else {
        return;
    };

    let [title_area, main_area] = Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            plan.plan_title.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from(plan.summary.clone()).centered(),
        Line::from(Span::styled(
            format!("ムードボード: {}枚の画像（m で HTML に保存）", plan.images.len()),
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
    ])
    .wrap(Wrap { trim: true });
    frame.render_widget(title, title_area);

    let [list_area, detail_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(main_area);

    let opportunity_count = plan.suggested_opportunities.len();
    let items: Vec<ListItem> = plan
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let label = if i < opportunity_count {
                format!("◆ {}", item.title())
            } else {
                format!("{}. {}", i - opportunity_count + 1, item.title())
            };
            let style = if item.has_action() {
                Style::default()
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(label).style(style)
        })
        .collect();

    let selected = app.item_state.selected().unwrap_or(0);
    let detail = item_detail(app, selected);

    let list = List::new(items)
        .block(section_block("貢献の機会と最初のステップ", true))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut app.item_state);

    let detail = Paragraph::new(Text::from(detail))
        .block(section_block("詳細", false))
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, detail_area);
}

fn item_detail(app: &App, index: usize) -> Vec<Line<'static>> {
    let Some(plan) = app.session.plan() else {
        return Vec::new();
    };
    let mut lines = Vec::new();

    if let Some(opportunity) = plan.suggested_opportunities.get(index) {
        lines.push(Line::from(Span::styled(opportunity.title.clone(), Style::default().bold())));
        lines.push(Line::from(opportunity.description.clone()));
        if !opportunity.required_skills.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("マッチするスキル", Style::default().fg(Color::Cyan))));
            lines.push(Line::from(opportunity.required_skills.join(" / ")));
        }
        if let Some(impact) = &opportunity.impact_statement {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("期待されるインパクト", Style::default().fg(Color::Green))));
            lines.push(Line::from(impact.clone()));
        }
    } else if let Some(step) = index
        .checked_sub(plan.suggested_opportunities.len())
        .and_then(|i| plan.first_steps.get(i))
    {
        lines.push(Line::from(Span::styled(step.title.clone(), Style::default().bold())));
        lines.push(Line::from(step.description.clone()));
    }

    let items = plan.items();
    if let Some(item) = items.get(index) {
        lines.push(Line::default());
        if item.has_action() {
            let label = item
                .action_type()
                .and_then(|t| t.parse::<ActionKind>().ok())
                .map_or("アクション", |kind| kind.label());
            lines.push(Line::from(vec![
                Span::styled(" Enter ", Style::default().bg(Color::DarkGray).fg(Color::White)),
                Span::raw(format!(" {}", label)),
            ]));
        }
    }
    lines
}

fn render_error_screen(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 60, 7);
    let message = app.session.error_message().unwrap_or_default().to_string();
    let text = vec![
        Line::from(Span::styled("エラーが発生しました", Style::default().fg(Color::Red).bold())).centered(),
        Line::default(),
        Line::from(message).centered(),
        Line::default(),
        Line::from(Span::styled("r でもう一度試す", Style::default().fg(Color::DarkGray))).centered(),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), popup);
}

fn overlay_lines(app: &App, state: &OverlayState) -> Vec<Line<'static>> {
    let heading = |text: &str| Line::from(Span::styled(text.to_string(), Style::default().fg(Color::Cyan).bold()));
    let muted = |text: String| Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)));

    match state {
        OverlayState::Loading => vec![Line::from(format!("読み込んでいます{}", thinking_dots(app)))],
        OverlayState::Failed(message) => vec![Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red)))],
        OverlayState::Ready(ActionResult::Organizations(orgs)) => {
            if orgs.is_empty() {
                return vec![Line::from("関連する団体が見つかりませんでした。")];
            }
            orgs.iter()
                .flat_map(|org| {
                    vec![heading(&org.name), Line::from(org.description.clone()), muted(org.url.clone()), Line::default()]
                })
                .collect()
        }
        OverlayState::Ready(ActionResult::Events(events)) => {
            if events.is_empty() {
                return vec![Line::from("関連するイベントは見つかりませんでした。")];
            }
            events
                .iter()
                .flat_map(|event| {
                    vec![heading(&event.name), Line::from(event.date.clone()), muted(event.url.clone()), Line::default()]
                })
                .collect()
        }
        OverlayState::Ready(ActionResult::Email(draft)) => {
            let mut lines = vec![
                heading("件名"),
                Line::from(draft.subject.clone().unwrap_or_default()),
                Line::default(),
                heading("本文"),
            ];
            lines.extend(draft.body.lines().map(|l| Line::from(l.to_string())));
            lines
        }
        OverlayState::Ready(ActionResult::Topic(topic)) => {
            let mut lines: Vec<Line> = topic.summary.lines().map(|l| Line::from(l.to_string())).collect();
            lines.push(Line::default());
            lines.push(heading("関連キーワード"));
            lines.push(Line::from(
                topic.keywords.iter().map(|k| format!("#{}", k)).collect::<Vec<_>>().join("  "),
            ));
            lines
        }
        OverlayState::Ready(ActionResult::ProjectPlan(plan)) => {
            let mut lines = vec![heading(&plan.title), Line::default()];
            lines.extend(
                plan.steps
                    .iter()
                    .enumerate()
                    .map(|(i, step)| Line::from(format!("{}. {}", i + 1, step))),
            );
            lines
        }
    }
}

fn render_overlay(app: &App, frame: &mut Frame, area: Rect) {
    let Some(overlay) = &app.overlay else {
        return;
    };

    let popup_area = centered_rect(area, area.width * 7 / 10, area.height * 7 / 10);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", overlay.title))
        .title_bottom(Line::from(" Esc で閉じる ").right_aligned());

    let content = Paragraph::new(Text::from(overlay_lines(app, &overlay.state)))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.overlay_scroll, 0));
    frame.render_widget(content, popup_area);
}
