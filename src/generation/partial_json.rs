//! Repair parsing of truncated JSON text.
//!
//! A structured-generation backend emits the JSON text of its object a few
//! characters at a time. [`parse_partial_json`] turns any prefix of that text
//! into the most complete valid value it can:
//!
//! - an open string value is closed (a half-written escape is dropped)
//! - open arrays and objects are closed
//! - a dangling key, trailing comma or incomplete literal is cut back to the
//!   last point where a value was complete

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object(ObjectState),
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    Key,
    Colon,
    Value,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    /// Backslash seen at the given byte offset.
    Start(usize),
    /// Inside `\uXXXX`, with this many hex digits still missing.
    Unicode(usize, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Between,
    String { is_key: bool, escape: Option<Escape> },
    Number,
    Literal { start: usize, word: &'static str },
}

/// Prefix end plus the brackets needed to close everything open at that end.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Checkpoint {
    end: usize,
    closers: String,
}

struct Scanner<'a> {
    text: &'a str,
    stack: Vec<Container>,
    state: Scan,
    checkpoint: Option<Checkpoint>,
    complete: bool,
}

/// Parse a possibly truncated JSON document.
///
/// Returns `None` when no prefix of `text` forms a value yet.
pub fn parse_partial_json(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    repair_candidates(text)
        .into_iter()
        .find_map(|candidate| serde_json::from_str(&candidate).ok())
}

/// Repaired texts to try, most complete first.
fn repair_candidates(text: &str) -> Vec<String> {
    let mut scanner = Scanner::new(text);
    scanner.run();
    scanner.candidates()
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            stack: Vec::new(),
            state: Scan::Between,
            checkpoint: None,
            complete: false,
        }
    }

    fn run(&mut self) {
        let text = self.text;
        let mut chars = text.char_indices().peekable();
        while let Some(&(i, c)) = chars.peek() {
            if self.complete {
                return;
            }
            let consumed = match self.state {
                Scan::Between => match self.between(i, c) {
                    Some(consumed) => consumed,
                    None => return,
                },
                Scan::String { is_key, escape } => {
                    self.in_string(i, c, is_key, escape);
                    true
                }
                Scan::Number => {
                    if matches!(c, '0'..='9' | '-' | '+' | '.' | 'e' | 'E') {
                        true
                    } else {
                        self.value_complete(i);
                        self.state = Scan::Between;
                        false
                    }
                }
                Scan::Literal { start, word } => {
                    let end = i + c.len_utf8();
                    let so_far = &text[start..end];
                    if !word.starts_with(so_far) {
                        return;
                    }
                    if so_far == word {
                        self.state = Scan::Between;
                        self.value_complete(end);
                    }
                    true
                }
            };
            if consumed {
                chars.next();
            }
        }
    }

    /// Returns `Some(true)` if `c` was consumed, `Some(false)` to rescan it,
    /// and `None` when the text stops being JSON.
    fn between(&mut self, i: usize, c: char) -> Option<bool> {
        match c {
            ' ' | '\t' | '\n' | '\r' => {}
            '{' => {
                self.stack.push(Container::Object(ObjectState::Key));
                self.save(i + 1);
            }
            '[' => {
                self.stack.push(Container::Array);
                self.save(i + 1);
            }
            '}' | ']' => {
                self.stack.pop()?;
                self.value_complete(i + 1);
            }
            '"' => {
                let is_key = matches!(self.stack.last(), Some(Container::Object(ObjectState::Key)));
                self.state = Scan::String {
                    is_key,
                    escape: None,
                };
            }
            ':' => self.set_object_state(ObjectState::Value),
            ',' => {
                if let Some(Container::Object(_)) = self.stack.last() {
                    self.set_object_state(ObjectState::Key);
                }
            }
            '-' | '0'..='9' => self.state = Scan::Number,
            't' => self.state = literal(i, "true"),
            'f' => self.state = literal(i, "false"),
            'n' => self.state = literal(i, "null"),
            _ => return None,
        }
        Some(true)
    }

    fn in_string(&mut self, i: usize, c: char, is_key: bool, escape: Option<Escape>) {
        let escape = match escape {
            None if c == '\\' => Some(Escape::Start(i)),
            None if c == '"' => {
                self.state = Scan::Between;
                if is_key {
                    self.set_object_state(ObjectState::Colon);
                } else {
                    self.value_complete(i + 1);
                }
                return;
            }
            None => None,
            Some(Escape::Start(at)) if c == 'u' => Some(Escape::Unicode(at, 4)),
            Some(Escape::Start(_)) => None,
            Some(Escape::Unicode(_, 1)) => None,
            Some(Escape::Unicode(at, left)) => Some(Escape::Unicode(at, left - 1)),
        };
        self.state = Scan::String { is_key, escape };
    }

    fn set_object_state(&mut self, state: ObjectState) {
        if let Some(Container::Object(current)) = self.stack.last_mut() {
            *current = state;
        }
    }

    fn value_complete(&mut self, end: usize) {
        match self.stack.last_mut() {
            Some(Container::Object(state)) => *state = ObjectState::Next,
            Some(Container::Array) => {}
            None => self.complete = true,
        }
        self.save(end);
    }

    fn save(&mut self, end: usize) {
        self.checkpoint = Some(Checkpoint {
            end,
            closers: self.closers(),
        });
    }

    fn closers(&self) -> String {
        self.stack
            .iter()
            .rev()
            .map(|container| match container {
                Container::Object(_) => '}',
                Container::Array => ']',
            })
            .collect()
    }

    fn candidates(&self) -> Vec<String> {
        let mut candidates = Vec::with_capacity(2);
        if !self.complete {
            match self.state {
                Scan::String {
                    is_key: false,
                    escape,
                } => {
                    let end = match escape {
                        Some(Escape::Start(at)) | Some(Escape::Unicode(at, _)) => at,
                        None => self.text.len(),
                    };
                    candidates.push(format!("{}\"{}", &self.text[..end], self.closers()));
                }
                Scan::Number => {
                    candidates.push(format!("{}{}", self.text, self.closers()));
                }
                _ => {}
            }
        }
        if let Some(checkpoint) = &self.checkpoint {
            candidates.push(format!(
                "{}{}",
                &self.text[..checkpoint.end],
                checkpoint.closers
            ));
        }
        candidates
    }
}

fn literal(start: usize, word: &'static str) -> Scan {
    Scan::Literal { start, word }
}
