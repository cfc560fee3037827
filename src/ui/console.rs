//! Console Front-End
//!
//! Presents the connection dialog on a terminal. Typing `:show` at the key
//! prompt toggles key visibility, `:q` closes the dialog. While the key is
//! masked it is read in raw mode and echoed as dots.

use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, IsTerminal, Write};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::api::ChartEndpoint;
use crate::ui::connection_dialog::{ConnectionDialog, DialogError, SubmitOutcome};

const SHOW_COMMAND: &str = ":show";
const QUIT_COMMAND: &str = ":q";
const MASK: char = '•';

/// Line source for the console dialog
#[async_trait]
pub trait ConsoleInput: Send {
    /// Next line with the terminal echoing it, `None` at end of input
    async fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Next line without echoing the typed characters
    async fn read_hidden(&mut self) -> io::Result<Option<String>>;
}

/// Process standard input. Hidden reads use raw mode when stdin is a terminal.
pub struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
    interactive: bool,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            interactive: io::stdin().is_terminal(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsoleInput for StdinInput {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }

    async fn read_hidden(&mut self) -> io::Result<Option<String>> {
        if !self.interactive {
            // Piped input is never echoed
            return self.lines.next_line().await;
        }
        tokio::task::spawn_blocking(read_masked_line)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

fn read_masked_line() -> io::Result<Option<String>> {
    terminal::enable_raw_mode()?;
    let result = masked_line(event::read, &mut io::stdout());
    terminal::disable_raw_mode()?;
    result
}

/// Collect key presses into a line, echoing a mask character per input
/// character. Ctrl+C and Ctrl+D end the input.
fn masked_line<F, W>(mut next_event: F, out: &mut W) -> io::Result<Option<String>>
where
    F: FnMut() -> io::Result<Event>,
    W: Write,
{
    let mut line = String::new();
    loop {
        match next_event()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Enter => {
                    write!(out, "\r\n")?;
                    out.flush()?;
                    return Ok(Some(line));
                }
                KeyCode::Char('c') | KeyCode::Char('d')
                    if key.modifiers.contains(KeyModifiers::CONTROL) =>
                {
                    write!(out, "\r\n")?;
                    out.flush()?;
                    return Ok(None);
                }
                KeyCode::Backspace => {
                    if line.pop().is_some() {
                        write!(out, "\u{8} \u{8}")?;
                    }
                }
                KeyCode::Char(c) => {
                    line.push(c);
                    write!(out, "{}", MASK)?;
                }
                _ => {}
            },
            Event::Paste(text) => {
                for c in text.chars().filter(|c| !c.is_control()) {
                    line.push(c);
                    write!(out, "{}", MASK)?;
                }
            }
            _ => {}
        }
        out.flush()?;
    }
}

/// Prompt until the dialog connects or is closed
pub async fn run_connection_dialog<E, I, W>(
    dialog: &mut ConnectionDialog,
    endpoint: &E,
    input: &mut I,
    out: &mut W,
) -> Result<()>
where
    E: ChartEndpoint + ?Sized,
    I: ConsoleInput + ?Sized,
    W: Write,
{
    writeln!(out, "Connect to OpenAlgo")?;
    writeln!(out, "Configure your OpenAlgo server connection.")?;

    loop {
        write!(out, "Host URL [{}]: ", dialog.host_url())?;
        out.flush()?;
        let Some(host) = input.read_line().await? else {
            dialog.close();
            return Ok(());
        };
        let host = host.trim();
        if !host.is_empty() {
            dialog.set_host_url(host);
        }
        if !dialog.host_url_is_well_formed() {
            writeln!(out, "Warning: {} is not an http(s) URL", dialog.host_url())?;
        }

        let key = loop {
            write!(out, "API key: ")?;
            out.flush()?;
            let line = if dialog.api_key_input_masked() {
                input.read_hidden().await?
            } else {
                input.read_line().await?
            };
            let Some(line) = line else {
                dialog.close();
                return Ok(());
            };
            match line.trim() {
                QUIT_COMMAND => {
                    dialog.close();
                    return Ok(());
                }
                SHOW_COMMAND => {
                    dialog.toggle_api_key_visibility();
                    let state = if dialog.api_key_input_masked() { "hidden" } else { "shown" };
                    writeln!(out, "API key will be {}", state)?;
                }
                _ => break line,
            }
        };
        dialog.set_api_key(key);
        writeln!(out, "Using key {}", displayed_key(dialog))?;

        if !dialog.submit_enabled() {
            writeln!(out, "A validation is already running")?;
            continue;
        }
        writeln!(out, "{}", dialog.submit_label())?;
        match dialog.submit(endpoint).await {
            SubmitOutcome::Connected(_) => {
                writeln!(out, "Connected.")?;
                return Ok(());
            }
            SubmitOutcome::Failed(error) => {
                if let Some(shown) = dialog.error() {
                    writeln!(out, "{}", shown)?;
                }
                match error {
                    DialogError::InvalidApiKey | DialogError::EmptyApiKey => writeln!(
                        out,
                        "Find your API key in the OpenAlgo Dashboard: {}",
                        dialog.api_key_page_url()
                    )?,
                    _ => writeln!(out, "Login to OpenAlgo: {}", dialog.login_url())?,
                }
            }
            SubmitOutcome::Busy => {}
            SubmitOutcome::Cancelled => return Ok(()),
        }
    }
}

fn displayed_key(dialog: &ConnectionDialog) -> String {
    let key = dialog.api_key().trim();
    if dialog.api_key_input_masked() {
        MASK.to_string().repeat(key.chars().count())
    } else {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ChartResponse};
    use crate::data::{keys, CredentialStore, KeyValueStore, MemoryStore};
    use crate::ui::connection_dialog::DialogEvent;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use crossterm::event::KeyEvent;
    use std::collections::VecDeque;
    use std::sync::mpsc::channel;
    use std::sync::Arc;

    /// Scripted input remembering which lines were read without echo
    struct ScriptedInput {
        lines: VecDeque<String>,
        hidden: Vec<String>,
    }

    impl ScriptedInput {
        fn new(script: &str) -> Self {
            Self {
                lines: script.lines().map(str::to_string).collect(),
                hidden: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ConsoleInput for ScriptedInput {
        async fn read_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.lines.pop_front())
        }

        async fn read_hidden(&mut self) -> io::Result<Option<String>> {
            let line = self.lines.pop_front();
            if let Some(ref line) = line {
                self.hidden.push(line.clone());
            }
            Ok(line)
        }
    }

    /// Accepts only the key "good"
    struct KeyCheck;

    #[async_trait]
    impl ChartEndpoint for KeyCheck {
        async fn fetch_chart(&self, _host_url: &str, api_key: &str) -> Result<ChartResponse, ApiError> {
            let status = if api_key == "good" {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            };
            Ok(ChartResponse {
                status,
                body: Some("{}".to_string()),
            })
        }
    }

    async fn drive(script: &str, store: Arc<MemoryStore>) -> (String, Vec<DialogEvent>, Vec<String>) {
        let (tx, rx) = channel();
        let mut dialog = ConnectionDialog::new(CredentialStore::new(store, "http://127.0.0.1:5000"), tx);
        let mut input = ScriptedInput::new(script);
        let mut out = Vec::new();

        run_connection_dialog(&mut dialog, &KeyCheck, &mut input, &mut out)
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), rx.try_iter().collect(), input.hidden)
    }

    #[tokio::test]
    async fn retries_until_the_key_is_accepted() {
        let store = Arc::new(MemoryStore::new());
        let (out, events, hidden) =
            drive("\nbad\nhttp://10.1.1.1:5000\n:show\ngood\n", store.clone()).await;

        // The key is read without echo until `:show` is typed
        assert_eq!(hidden, vec!["bad".to_string(), ":show".to_string()]);

        assert!(out.contains("Invalid API key. Please check your credentials and try again."));
        assert!(out.contains("http://127.0.0.1:5000/apikey"));
        assert!(out.contains("Using key •••"));
        assert!(out.contains("Using key good"));
        assert!(out.contains("Connected."));
        assert_eq!(events, vec![DialogEvent::Saved { api_key: "good".to_string() }]);
        assert_eq!(store.get(keys::HOST_URL).as_deref(), Some("http://10.1.1.1:5000"));
    }

    #[tokio::test]
    async fn quit_closes_the_dialog() {
        let store = Arc::new(MemoryStore::new());
        let (_out, events, _) = drive("\n:q\n", store.clone()).await;
        assert_eq!(events, vec![DialogEvent::Closed]);
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn end_of_input_closes_the_dialog() {
        let (out, events, _) = drive("ftp://files\n", Arc::new(MemoryStore::new())).await;
        assert!(out.contains("Warning: ftp://files is not an http(s) URL"));
        assert_eq!(events, vec![DialogEvent::Closed]);
    }

    fn press(code: KeyCode) -> io::Result<Event> {
        Ok(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn masked_input_echoes_only_mask_characters() {
        let mut events = vec![
            press(KeyCode::Char('s')),
            press(KeyCode::Char('k')),
            press(KeyCode::Char('x')),
            press(KeyCode::Backspace),
            press(KeyCode::Char('-')),
            press(KeyCode::Char('1')),
            press(KeyCode::Enter),
        ]
        .into_iter();
        let mut out = Vec::new();

        let line = masked_line(|| events.next().unwrap(), &mut out).unwrap();
        assert_eq!(line.as_deref(), Some("sk-1"));

        let echoed = String::from_utf8(out).unwrap();
        assert_eq!(echoed.matches(MASK).count(), 5);
        assert!(!echoed.contains('s') && !echoed.contains('k') && !echoed.contains('1'));
    }

    #[test]
    fn ctrl_c_abandons_masked_input() {
        let mut events = vec![
            press(KeyCode::Char('a')),
            Ok(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))),
        ]
        .into_iter();
        let mut out = Vec::new();
        assert_eq!(masked_line(|| events.next().unwrap(), &mut out).unwrap(), None);
    }
}
