//! Operator console: drive the beacon from single keystrokes in the terminal.

use std::io;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures_util::{Stream, StreamExt};

use shared::{ColorState, HOST_SOURCE};

use crate::relay::Hub;

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Push(ColorState),
    /// Any other key while in any-key mode.
    AnyKey,
    Quit,
    Ignore,
}

/// `any_key_red` switches from g/r/b colour keys to "any key means RED".
pub fn parse_key(key: &str, any_key_red: bool) -> KeyAction {
    let key = key.trim().to_ascii_lowercase();
    if key == "q" {
        return KeyAction::Quit;
    }
    if any_key_red {
        return KeyAction::AnyKey;
    }
    match key.as_str() {
        "g" => KeyAction::Push(ColorState::Green),
        "r" => KeyAction::Push(ColorState::Red),
        "b" => KeyAction::Push(ColorState::Blue),
        _ => KeyAction::Ignore,
    }
}

/// Map a terminal event. Raw mode swallows SIGINT, so Ctrl+C arrives here and quits.
pub fn key_action(event: &Event, any_key_red: bool) -> KeyAction {
    let Event::Key(key) = event else {
        return KeyAction::Ignore;
    };
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char(c) => parse_key(c.encode_utf8(&mut [0; 4]), any_key_red),
        _ if any_key_red => KeyAction::AnyKey,
        _ => KeyAction::Ignore,
    }
}

/// Restores cooked mode on drop, including when the console future is cancelled.
struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Read keys from the terminal until `q`, Ctrl+C or end of input.
pub async fn run_console(hub: &Hub, any_key_red: bool) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let _guard = RawModeGuard;
    run_keys(hub, EventStream::new(), any_key_red).await
}

pub async fn run_keys<S>(hub: &Hub, mut events: S, any_key_red: bool) -> anyhow::Result<()>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    while let Some(event) = events.next().await {
        match key_action(&event?, any_key_red) {
            KeyAction::Quit => {
                tracing::info!("console quit");
                break;
            }
            KeyAction::Push(state) => {
                tracing::info!(state = %state, "console push");
                hub.send_state(state, HOST_SOURCE);
            }
            // The dashboard decides, through the interactive mode, whether keys count.
            KeyAction::AnyKey => {
                if hub.on_interactive_key() {
                    tracing::info!("console key -> RED");
                }
            }
            KeyAction::Ignore => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState};
    use futures_util::stream;
    use shared::InteractiveMode;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn keys(events: Vec<Event>) -> impl Stream<Item = io::Result<Event>> + Unpin {
        stream::iter(events.into_iter().map(Ok))
    }

    #[test]
    fn parse_direct_keys() {
        assert_eq!(parse_key("g", false), KeyAction::Push(ColorState::Green));
        assert_eq!(parse_key("R", false), KeyAction::Push(ColorState::Red));
        assert_eq!(parse_key("b", false), KeyAction::Push(ColorState::Blue));
        assert_eq!(parse_key("x", false), KeyAction::Ignore);
        assert_eq!(parse_key("q", false), KeyAction::Quit);
    }

    #[test]
    fn parse_any_key_mode() {
        assert_eq!(parse_key("g", true), KeyAction::AnyKey);
        assert_eq!(parse_key("", true), KeyAction::AnyKey);
        assert_eq!(parse_key("Q", true), KeyAction::Quit);
    }

    #[test]
    fn ctrl_c_quits_and_releases_are_ignored() {
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(key_action(&ctrl_c, false), KeyAction::Quit);
        assert_eq!(key_action(&ctrl_c, true), KeyAction::Quit);

        let release = Event::Key(KeyEvent::new_with_kind_and_state(
            KeyCode::Char('g'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        ));
        assert_eq!(key_action(&release, false), KeyAction::Ignore);
        assert_eq!(key_action(&Event::FocusGained, true), KeyAction::Ignore);
    }

    #[test]
    fn non_character_keys_count_only_in_any_key_mode() {
        assert_eq!(key_action(&press(KeyCode::Enter), false), KeyAction::Ignore);
        assert_eq!(key_action(&press(KeyCode::Enter), true), KeyAction::AnyKey);
        assert_eq!(key_action(&press(KeyCode::Char('G')), false), KeyAction::Push(ColorState::Green));
    }

    #[tokio::test]
    async fn console_pushes_colours_until_quit() {
        let hub = Hub::new();
        let events = vec![
            press(KeyCode::Char('b')),
            press(KeyCode::Char('x')),
            press(KeyCode::Char('q')),
            press(KeyCode::Char('r')),
        ];
        run_keys(&hub, keys(events), false).await.unwrap();
        assert_eq!(hub.current_state(), ColorState::Blue);
    }

    #[tokio::test]
    async fn any_key_console_follows_interactive_mode() {
        let hub = Hub::new();
        hub.send_state(ColorState::Green, "host");

        run_keys(&hub, keys(vec![press(KeyCode::Char('a'))]), true).await.unwrap();
        assert_eq!(hub.current_state(), ColorState::Green);

        hub.set_mode(InteractiveMode::AnyKeyRed);
        run_keys(&hub, keys(vec![press(KeyCode::Char('a'))]), true).await.unwrap();
        assert_eq!(hub.current_state(), ColorState::Red);
    }

    #[tokio::test]
    async fn read_error_stops_the_console() {
        let hub = Hub::new();
        let events = stream::iter(vec![
            Err(io::Error::other("tty gone")),
            Ok(press(KeyCode::Char('b'))),
        ]);
        assert!(run_keys(&hub, events, false).await.is_err());
        assert_eq!(hub.current_state(), ColorState::Red);
    }
}
