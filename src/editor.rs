//! Keystroke-level line editor.
//!
//! The editor consumes one byte at a time from any reader, so the same code runs
//! against a raw terminal and against a byte slice in tests. Every mutation of
//! the buffer is reflected on the output immediately: plain insertions echo the
//! character, everything else redraws `\r` + prompt + buffer and clears to the
//! end of the line so nothing from the previous render survives.

use crate::history::History;
use std::io::{self, Read, Write};

const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;
const BACKSPACE: u8 = 0x08;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const BELL: &[u8] = b"\x07";
const CLEAR_TO_EOL: &str = "\x1b[K";

/// Position inside an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Normal,
    SawEscape,
    SawBracket,
}

/// What the caller should do after a byte has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Submit,
    EndOfInput,
}

pub struct LineEditor {
    buffer: String,
    state: KeyState,
    /// Bytes of a multi-byte character that has not been completed yet.
    pending: Vec<u8>,
    /// Size of the line buffer; content is capped one byte below it.
    capacity: usize,
}

impl LineEditor {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: String::new(),
            state: KeyState::Normal,
            pending: Vec::with_capacity(4),
            capacity,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> KeyState {
        self.state
    }

    /// Read one line.
    ///
    /// Returns `None` when input ends before anything was typed. The line is not
    /// added to `history`; that is up to the caller.
    pub fn read_line<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
        history: &mut History,
        prompt: &str,
    ) -> io::Result<Option<String>> {
        self.buffer.clear();
        self.pending.clear();
        self.state = KeyState::Normal;

        for byte in input.bytes() {
            match self.feed(byte?, output, history, prompt)? {
                Step::Continue => {}
                Step::Submit => return Ok(Some(std::mem::take(&mut self.buffer))),
                Step::EndOfInput => return Ok(None),
            }
        }

        if self.buffer.is_empty() {
            Ok(None)
        } else {
            output.write_all(b"\n")?;
            output.flush()?;
            Ok(Some(std::mem::take(&mut self.buffer)))
        }
    }

    /// Consume a single byte.
    pub fn feed<W: Write>(
        &mut self,
        byte: u8,
        output: &mut W,
        history: &mut History,
        prompt: &str,
    ) -> io::Result<Step> {
        match self.state {
            KeyState::Normal => self.feed_normal(byte, output, prompt),
            KeyState::SawEscape => {
                self.state = match byte {
                    b'[' | b'O' => KeyState::SawBracket,
                    _ => KeyState::Normal,
                };
                Ok(Step::Continue)
            }
            KeyState::SawBracket => {
                match byte {
                    // parameter bytes of a longer CSI sequence such as `ESC [ 3 ~`
                    0x30..=0x3f => return Ok(Step::Continue),
                    b'A' => {
                        if let Some(entry) = history.navigate_back() {
                            self.buffer = entry.to_string();
                            self.redraw(output, prompt)?;
                        }
                    }
                    b'B' => {
                        if let Some(entry) = history.navigate_forward() {
                            self.buffer = entry.to_string();
                            self.redraw(output, prompt)?;
                        }
                    }
                    _ => {}
                }
                self.state = KeyState::Normal;
                Ok(Step::Continue)
            }
        }
    }

    fn feed_normal<W: Write>(&mut self, byte: u8, output: &mut W, prompt: &str) -> io::Result<Step> {
        match byte {
            ESC => {
                self.pending.clear();
                self.state = KeyState::SawEscape;
            }
            b'\n' | b'\r' => {
                output.write_all(b"\n")?;
                output.flush()?;
                return Ok(Step::Submit);
            }
            DEL | BACKSPACE => {
                if self.buffer.pop().is_some() {
                    self.redraw(output, prompt)?;
                }
            }
            CTRL_C => {
                self.buffer.clear();
                output.write_all(b"^C\n")?;
                output.flush()?;
                return Ok(Step::Submit);
            }
            CTRL_D if self.buffer.is_empty() => return Ok(Step::EndOfInput),
            0x20..=0x7e => self.insert(char::from(byte), output)?,
            0x80..=0xff => {
                self.pending.push(byte);
                match std::str::from_utf8(&self.pending) {
                    Ok(s) => {
                        let ch = s.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                        self.pending.clear();
                        self.insert(ch, output)?;
                    }
                    Err(e) if e.error_len().is_none() && self.pending.len() < 4 => {}
                    Err(_) => self.pending.clear(),
                }
            }
            _ => {}
        }
        Ok(Step::Continue)
    }

    fn insert<W: Write>(&mut self, ch: char, output: &mut W) -> io::Result<()> {
        if self.buffer.len() + ch.len_utf8() >= self.capacity {
            output.write_all(BELL)?;
        } else {
            self.buffer.push(ch);
            let mut encoded = [0u8; 4];
            output.write_all(ch.encode_utf8(&mut encoded).as_bytes())?;
        }
        output.flush()
    }

    fn redraw<W: Write>(&self, output: &mut W, prompt: &str) -> io::Result<()> {
        write!(output, "\r{}{}{}", prompt, self.buffer, CLEAR_TO_EOL)?;
        output.flush()
    }
}
