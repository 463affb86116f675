use std::collections::VecDeque;

use rustyline::{
    Cmd, DefaultEditor, EventHandler, KeyCode, KeyEvent, Modifiers, error::ReadlineError,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputToken {
    Char(char),
    Up,
    Down,
    Enter,
    Interrupt,
    Eof,
}

pub trait KeySource {
    fn next_token(&mut self) -> InputToken;
}

/// Splits a typed line into tokens. `ESC [ A` / `ESC [ B` are the arrow
/// keys; an empty line is a bare Enter.
pub fn decode_line(line: &str) -> Vec<InputToken> {
    if line.is_empty() {
        return vec![InputToken::Enter];
    }
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    match chars.next() {
                        Some('A') => tokens.push(InputToken::Up),
                        Some('B') => tokens.push(InputToken::Down),
                        _ => {}
                    }
                }
            }
            '\r' | '\n' => tokens.push(InputToken::Enter),
            c if c.is_whitespace() => {}
            c => tokens.push(InputToken::Char(c)),
        }
    }
    tokens
}

pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> rustyline::Result<String>;
}

impl LineReader for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> rustyline::Result<String> {
        self.readline(prompt)
    }
}

impl<R: LineReader + ?Sized> LineReader for &mut R {
    fn read_line(&mut self, prompt: &str) -> rustyline::Result<String> {
        (**self).read_line(prompt)
    }
}

// The editor would otherwise treat the arrows as history keys and hand back
// an empty line, which reads as a confirm.
pub fn review_key_bindings() -> [(KeyEvent, Cmd); 2] {
    [
        (
            KeyEvent(KeyCode::Up, Modifiers::NONE),
            Cmd::Insert(1, "k".to_string()),
        ),
        (
            KeyEvent(KeyCode::Down, Modifiers::NONE),
            Cmd::Insert(1, "j".to_string()),
        ),
    ]
}

pub fn bind_review_keys(editor: &mut DefaultEditor) {
    for (key, cmd) in review_key_bindings() {
        editor.bind_sequence(key, EventHandler::Simple(cmd));
    }
}

pub fn unbind_review_keys(editor: &mut DefaultEditor) {
    for (key, _) in review_key_bindings() {
        editor.unbind_sequence(key);
    }
}

pub struct ReadlineKeySource<R: LineReader> {
    reader: R,
    prompt: String,
    pending: VecDeque<InputToken>,
}

impl<R: LineReader> ReadlineKeySource<R> {
    pub fn new(reader: R, prompt: &str) -> Self {
        Self {
            reader,
            prompt: prompt.to_string(),
            pending: VecDeque::new(),
        }
    }
}

impl<R: LineReader> KeySource for ReadlineKeySource<R> {
    fn next_token(&mut self) -> InputToken {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }
            match self.reader.read_line(&self.prompt) {
                Ok(line) => self.pending.extend(decode_line(line.trim_end())),
                Err(ReadlineError::Interrupted) => return InputToken::Interrupt,
                Err(ReadlineError::Eof) => return InputToken::Eof,
                Err(err) => {
                    warn!("could not read reviewer input: {:?}", err);
                    return InputToken::Eof;
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ScriptedKeySource {
    tokens: VecDeque<InputToken>,
}

impl ScriptedKeySource {
    pub fn new<I: IntoIterator<Item = InputToken>>(tokens: I) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }
}

impl KeySource for ScriptedKeySource {
    fn next_token(&mut self) -> InputToken {
        self.tokens.pop_front().unwrap_or(InputToken::Eof)
    }
}
