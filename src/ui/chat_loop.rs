//! Interactive chat loop
//!
//! Owns the terminal for the duration of a session: draws the transcript and
//! input box, translates key and mouse events into session operations, and
//! drains stream events between frames so assistant output grows
//! token-by-token without a redraw per token.

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::api::models::discover_models;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::session::ChatSession;
use crate::utils::logging::LoggingState;

/// Height of the bordered input box at the bottom of the screen.
const INPUT_AREA_HEIGHT: u16 = 3;

pub async fn run_chat(
    base_url: String,
    model: Option<String>,
    log_file: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let logging = LoggingState::new(log_file)?;
    let client = reqwest::Client::new();

    let mut session = ChatSession::new();
    session.set_models(discover_models(&client, &base_url).await);
    if let Some(model) = model {
        session.select_model(&model);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(
        &mut terminal,
        &mut session,
        &client,
        &base_url,
        &logging,
    )
    .await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut ChatSession,
    client: &reqwest::Client,
    base_url: &str,
    logging: &LoggingState,
) -> Result<(), Box<dyn Error>> {
    let (service, mut rx) = ChatStreamService::new();
    // Transcript index where the in-flight exchange started; flushed to the
    // log file once the exchange finishes.
    let mut exchange_log_start: Option<usize> = None;

    loop {
        terminal.draw(|f| ui(f, session))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        session.cancel_active_exchange();
                        return Ok(());
                    }
                    KeyCode::Enter => {
                        if let Some(ticket) = session.begin_exchange() {
                            exchange_log_start = Some(session.messages.len() - 2);
                            service.spawn_stream(StreamParams {
                                client: client.clone(),
                                base_url: base_url.to_string(),
                                model: ticket.model,
                                prompt: ticket.prompt,
                                cancel_token: ticket.cancel_token,
                                stream_id: ticket.stream_id,
                            });
                        }
                    }
                    KeyCode::Esc => {
                        let was_streaming = session.is_streaming;
                        session.cancel_active_exchange();
                        if was_streaming && !session.is_streaming {
                            flush_exchange_log(session, logging, exchange_log_start.take());
                        }
                    }
                    KeyCode::Tab => {
                        session.cycle_model();
                    }
                    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        session.input.push(c);
                    }
                    KeyCode::Backspace => {
                        session.input.pop();
                    }
                    KeyCode::Up => {
                        scroll_up(session, terminal, 1);
                    }
                    KeyCode::Down => {
                        scroll_down(session, terminal, 1);
                    }
                    _ => {}
                },
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => {
                        scroll_up(session, terminal, 3);
                    }
                    MouseEventKind::ScrollDown => {
                        scroll_down(session, terminal, 3);
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Drain every pending stream event before the next frame.
        let mut received_any = false;
        while let Ok((message, stream_id)) = rx.try_recv() {
            let was_streaming = session.is_streaming;
            session.apply_stream_message(message, stream_id);
            if was_streaming && !session.is_streaming {
                flush_exchange_log(session, logging, exchange_log_start.take());
            }
            received_any = true;
        }
        if received_any {
            continue;
        }
    }
}

fn ui(f: &mut Frame, session: &ChatSession) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(INPUT_AREA_HEIGHT)])
        .split(f.area());

    let lines = build_display_lines(session);

    let available_height = chunks[0].height.saturating_sub(1);
    let total_lines = lines.len() as u16;
    let max_offset = total_lines.saturating_sub(available_height);
    let scroll_offset = if session.auto_scroll {
        max_offset
    } else {
        session.scroll_offset.min(max_offset)
    };

    let title = match &session.selected_model {
        Some(model) => format!("Chat - ollaterm [{model}]"),
        None => "Chat - ollaterm".to_string(),
    };

    let messages_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));
    f.render_widget(messages_paragraph, chunks[0]);

    let (input_title, input_style) = if session.is_streaming {
        (
            "Streaming... (Esc to stop, Ctrl+C to quit)",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (
            "Type your message (Enter to send, Tab to switch model, Ctrl+C to quit)",
            Style::default().fg(Color::Yellow),
        )
    };

    let input = Paragraph::new(session.input.as_str())
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(input_title))
        .wrap(Wrap { trim: true });
    f.render_widget(input, chunks[1]);

    if !session.is_streaming {
        f.set_cursor_position((
            chunks[1].x + session.input.len() as u16 + 1,
            chunks[1].y + 1,
        ));
    }
}

fn build_display_lines(session: &ChatSession) -> Vec<Line<'_>> {
    let mut lines = Vec::new();

    for msg in &session.messages {
        if msg.is_user() {
            lines.push(Line::from(vec![
                Span::styled(
                    "You: ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(&msg.content, Style::default().fg(Color::Cyan)),
            ]));
            lines.push(Line::from(""));
        } else if !msg.content.is_empty() {
            for content_line in msg.content.lines() {
                if content_line.trim().is_empty() {
                    lines.push(Line::from(""));
                } else {
                    lines.push(Line::from(Span::styled(
                        content_line,
                        Style::default().fg(Color::White),
                    )));
                }
            }
            lines.push(Line::from(""));
        }
    }

    lines
}

fn chat_viewport_height(terminal_height: u16) -> u16 {
    terminal_height
        .saturating_sub(INPUT_AREA_HEIGHT)
        .saturating_sub(1)
}

fn max_scroll_offset(session: &ChatSession, available_height: u16) -> u16 {
    let total_lines = build_display_lines(session).len() as u16;
    total_lines.saturating_sub(available_height)
}

fn scroll_up(
    session: &mut ChatSession,
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
    step: u16,
) {
    let height = chat_viewport_height(terminal.size().unwrap_or_default().height);
    let max_offset = max_scroll_offset(session, height);
    if session.auto_scroll {
        session.scroll_offset = max_offset;
    }
    session.auto_scroll = false;
    session.scroll_offset = session.scroll_offset.saturating_sub(step);
}

fn scroll_down(
    session: &mut ChatSession,
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
    step: u16,
) {
    let height = chat_viewport_height(terminal.size().unwrap_or_default().height);
    let max_offset = max_scroll_offset(session, height);
    session.scroll_offset = session.scroll_offset.saturating_add(step).min(max_offset);
    if session.scroll_offset >= max_offset {
        session.auto_scroll = true;
    }
}

fn flush_exchange_log(session: &ChatSession, logging: &LoggingState, start: Option<usize>) {
    let Some(start) = start else {
        return;
    };
    if !logging.is_active() {
        return;
    }
    for message in session.messages.iter().skip(start) {
        let rendered = if message.is_user() {
            format!("You: {}", message.content)
        } else {
            message.content.clone()
        };
        if let Err(err) = logging.log_message(&rendered) {
            debug!(error = %err, "failed to write transcript log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;

    #[test]
    fn display_lines_skip_empty_assistant_placeholder() {
        let mut session = ChatSession::new();
        session.messages.push(Message::user("hi"));
        session.messages.push(Message::assistant(""));

        let lines = build_display_lines(&session);
        // User line plus its spacing line; the empty placeholder renders nothing.
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn display_lines_split_multiline_assistant_content() {
        let mut session = ChatSession::new();
        session.messages.push(Message::assistant("one\n\ntwo"));

        let lines = build_display_lines(&session);
        // Three content rows plus the trailing spacing line.
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn viewport_height_accounts_for_input_and_title() {
        assert_eq!(chat_viewport_height(24), 20);
        assert_eq!(chat_viewport_height(3), 0);
    }
}
