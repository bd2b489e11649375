use std::io::{self, Write};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use dialoguer::{Confirm, Input};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{Output, OutputError, Result, Spinner};

/// Spaces added per nested section.
const INDENT: usize = 2;

/// Whether a key press aborts a menu: Esc, Ctrl+C or Ctrl+D.
fn is_cancel_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Esc => true,
        KeyCode::Char(ch) => {
            (modifiers.contains(KeyModifiers::CONTROL) && matches!(ch.to_ascii_lowercase(), 'c' | 'd'))
                || matches!(ch, '\u{3}' | '\u{4}')
        }
        _ => false,
    }
}

/// Pick one key per option: the first unused letter or digit of its label,
/// falling back to the lowest unused digit.
fn shortcut_keys(options: &[String]) -> Vec<char> {
    let mut taken: Vec<char> = Vec::with_capacity(options.len());
    for option in options {
        let from_label = option
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|ch| ch.to_ascii_lowercase())
            .find(|ch| !taken.contains(ch));
        let key = from_label
            .or_else(|| ('1'..='9').find(|ch| !taken.contains(ch)))
            .unwrap_or('?');
        taken.push(key);
    }
    taken
}

/// Raw mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    /// Switch the terminal into raw mode.
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().map_err(|e| OutputError::Terminal(e.to_string()))?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        terminal::disable_raw_mode().ok();
    }
}

/// Block until one of `keys` is pressed, returning its index.
fn read_shortcut(keys: &[char]) -> Result<usize> {
    let _raw = RawMode::enable()?;
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read().map_err(|e| OutputError::Terminal(e.to_string()))?
        else {
            continue;
        };
        if is_cancel_key(code, modifiers) {
            return Err(OutputError::Cancelled);
        }
        if let KeyCode::Char(ch) = code
            && let Some(index) = keys.iter().position(|key| *key == ch.to_ascii_lowercase())
        {
            return Ok(index);
        }
    }
}

/// Renders to the attached terminal with optional color.
pub struct Terminal {
    /// Color mode for stdout and stderr.
    color_choice: ColorChoice,
    /// Leading spaces on every line.
    indent: usize,
}

impl Terminal {
    /// Create a terminal backend, with ANSI colors when `color` is set.
    pub fn new(color: bool) -> Self {
        Self {
            color_choice: if color {
                ColorChoice::Always
            } else {
                ColorChoice::Never
            },
            indent: 0,
        }
    }

    /// Indentation prefix for the current nesting depth.
    fn pad(&self) -> String {
        " ".repeat(self.indent)
    }

    /// Write one styled line to `stream`.
    fn write_line(&self, mut stream: StandardStream, msg: &str, spec: &ColorSpec) -> Result<()> {
        let pad = self.pad();
        for line in msg.split('\n') {
            stream.set_color(spec)?;
            write!(stream, "{pad}{line}")?;
            stream.reset()?;
            writeln!(stream)?;
        }
        stream.flush()?;
        Ok(())
    }

    /// Write a line to stdout in `color`.
    fn stdout_colored(&self, msg: &str, color: Option<Color>) -> Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(color);
        self.write_line(StandardStream::stdout(self.color_choice), msg, &spec)
    }
}

impl Output for Terminal {
    fn message(&self, msg: &str) -> Result<()> {
        self.stdout_colored(msg, None)
    }

    fn heading(&self, msg: &str) -> Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_bold(true);
        self.write_line(StandardStream::stdout(self.color_choice), msg, &spec)
    }

    fn success(&self, msg: &str) -> Result<()> {
        self.stdout_colored(msg, Some(Color::Green))
    }

    fn warn(&self, msg: &str) -> Result<()> {
        self.stdout_colored(msg, Some(Color::Yellow))
    }

    fn fail(&self, msg: &str) -> Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Red));
        self.write_line(StandardStream::stderr(self.color_choice), msg, &spec)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(format!("{}{prompt}", self.pad()))
            .default(false)
            .interact()?)
    }

    fn select(&self, prompt: &str, options: &[String]) -> Result<usize> {
        if options.is_empty() {
            return Err(OutputError::InvalidInput("Nothing to choose from"));
        }
        let keys = shortcut_keys(options);
        let pad = self.pad();

        let mut stdout = StandardStream::stdout(self.color_choice);
        writeln!(stdout, "{pad}{prompt}")?;
        for (option, key) in options.iter().zip(&keys) {
            write!(stdout, "{pad}  [")?;
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
            write!(stdout, "{key}")?;
            stdout.reset()?;
            writeln!(stdout, "] {option}")?;
        }
        write!(stdout, "{pad}> ")?;
        stdout.flush()?;

        let chosen = read_shortcut(&keys);
        match &chosen {
            Ok(index) => writeln!(stdout, "{}", keys[*index])?,
            Err(_) => writeln!(stdout)?,
        }
        chosen
    }

    fn input(&self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::new()
            .with_prompt(format!("{}{prompt}", self.pad()))
            .allow_empty(true)
            .interact_text()?)
    }

    fn spinner(&self, msg: &str) -> Spinner {
        Spinner::start(msg, self.indent)
    }

    fn section(&self, header: &str) -> Result<Box<dyn Output>> {
        self.heading(header)?;
        Ok(Box::new(Self {
            color_choice: self.color_choice,
            indent: self.indent + INDENT,
        }))
    }

    fn finish(&self) -> Result<()> {
        io::stdout().flush()?;
        io::stderr().flush()?;
        Ok(())
    }
}
