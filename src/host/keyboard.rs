use std::io::stdout;
use std::{process, time::Duration};

use crossterm::{
    cursor::{Hide, MoveToColumn, Show},
    event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
    Result,
};
use log::debug;

/// Keys the simulator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Space bar: press or release the button.
    ToggleButton,
    /// Esc: leave the simulator.
    Quit,
}

/// Put the terminal in raw mode so single key presses are seen right away.
pub fn enter_raw_mode() -> Result<()> {
    enable_raw_mode()?;
    execute!(stdout(), Hide)
}

/// Undo [`enter_raw_mode`].
pub fn leave_raw_mode() -> Result<()> {
    execute!(stdout(), MoveToColumn(0), Show)?;
    disable_raw_mode()
}

/// Drain the pending key events without blocking and return the ones the
/// simulator knows about.
pub fn poll_keys() -> Result<Vec<KeyAction>> {
    let mut actions = Vec::new();

    while poll(Duration::from_millis(0))? {
        // It's guaranteed that read() wont block if `poll` returns `Ok(true)`
        let event = read()?;

        if event == Event::Key(KeyCode::Char(' ').into()) {
            actions.push(KeyAction::ToggleButton);
        } else if event == Event::Key(KeyCode::Esc.into()) {
            actions.push(KeyAction::Quit);
        } else if event
            == Event::Key(KeyEvent {
                modifiers: KeyModifiers::CONTROL,
                code: KeyCode::Char('c'),
            })
        {
            // As we are in raw mode, Ctrl+C will be captured here as a key
            // event. Catch it and exit the process if that happens
            leave_raw_mode()?;
            process::exit(0);
        } else {
            debug!("ignored {:?}", event);
        }
    }

    Ok(actions)
}
