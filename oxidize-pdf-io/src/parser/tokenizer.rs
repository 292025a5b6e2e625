//! PDF Tokenizer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2. The tokenizer
//! keeps only the current token: [`Tokenizer::next_token`] overwrites it in
//! place and the accessors read it back.

use super::strings::decode_string_content;
use super::{ParseError, ParseResult};
use crate::bytes::{iso, ByteAccumulator};
use crate::error::Result;
use crate::reader::RandomAccessReader;
use crate::source::{ArraySource, RandomAccessSource};

pub(crate) const OBJ: &[u8] = b"obj";
pub(crate) const R: &[u8] = b"R";
pub(crate) const END_OBJ: &[u8] = b"endobj";

/// Delimiter-or-whitespace table indexed by byte value + 1; slot 0 is EOF.
const DELIMS: [bool; 257] = build_delims();

const fn build_delims() -> [bool; 257] {
    let mut table = [false; 257];
    table[0] = true;
    let bytes = b"\x00\t\n\x0c\r ()<>[]{}/%";
    let mut i = 0;
    while i < bytes.len() {
        table[bytes[i] as usize + 1] = true;
        i += 1;
    }
    table
}

/// PDF whitespace. NUL counts as whitespace.
pub fn is_whitespace(ch: u8) -> bool {
    is_whitespace_with(ch, true)
}

pub fn is_whitespace_with(ch: u8, null_is_whitespace: bool) -> bool {
    matches!(ch, b'\t' | b'\n' | 0x0c | b'\r' | b' ') || (null_is_whitespace && ch == 0)
}

/// PDF delimiter characters.
pub fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Whether `ch` ends a name or keyword; the end of data does too.
pub fn is_delimiter_whitespace(ch: Option<u8>) -> bool {
    DELIMS[ch.map_or(0, |b| usize::from(b) + 1)]
}

/// PDF token types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Number,
    /// Literal or hex string
    String,
    /// Name object (e.g., /Type), without the slash
    Name,
    Comment,
    /// Left square bracket [
    StartArray,
    /// Right square bracket ]
    EndArray,
    /// Dictionary start <<
    StartDict,
    /// Dictionary end >>
    EndDict,
    /// Indirect reference `N G R`
    Ref,
    /// Object header `N G obj`
    Obj,
    /// `endobj` keyword
    EndObj,
    /// Any other keyword
    Other,
    EndOfFile,
}

/// PDF tokenizer over a [`RandomAccessReader`]
pub struct Tokenizer {
    file: RandomAccessReader,
    out_buf: ByteAccumulator,
    token_type: TokenType,
    reference: i32,
    generation: i32,
    hex_string: bool,
}

impl Tokenizer {
    pub fn new(file: RandomAccessReader) -> Self {
        Self {
            file,
            out_buf: ByteAccumulator::new(),
            token_type: TokenType::EndOfFile,
            reference: 0,
            generation: 0,
            hex_string: false,
        }
    }

    pub fn from_source<S: RandomAccessSource + 'static>(source: S) -> Self {
        Self::new(RandomAccessReader::new(source))
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::from_source(ArraySource::new(data.into()))
    }

    /// A tokenizer over an independent view of the same bytes. Closing it
    /// leaves this tokenizer's source open.
    pub fn safe_view(&mut self) -> Tokenizer {
        Tokenizer::new(self.file.create_view())
    }

    pub fn reader(&mut self) -> &mut RandomAccessReader {
        &mut self.file
    }

    pub fn seek(&mut self, position: u64) {
        self.file.seek(position);
    }

    pub fn position(&self) -> u64 {
        self.file.position()
    }

    pub fn length(&self) -> u64 {
        self.file.length()
    }

    pub fn read(&mut self) -> Result<Option<u8>> {
        self.file.read()
    }

    pub fn peek(&mut self) -> Result<Option<u8>> {
        self.file.peek()
    }

    pub fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        self.file.read_fully(buf)
    }

    pub fn close(&mut self) -> Result<()> {
        self.file.close()
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Raw bytes of the current token
    pub fn byte_content(&self) -> &[u8] {
        self.out_buf.as_bytes()
    }

    /// Raw bytes of the current token as ISO-8859-1 text
    pub fn string_value(&self) -> String {
        iso::decode(self.out_buf.as_bytes())
    }

    /// Value of the current string token with escapes resolved
    pub fn decoded_string_content(&self) -> Vec<u8> {
        decode_string_content(self.out_buf.as_bytes(), self.hex_string)
    }

    pub fn token_value_equals(&self, value: &[u8]) -> bool {
        self.out_buf.as_bytes() == value
    }

    pub fn is_hex_string(&self) -> bool {
        self.hex_string
    }

    /// Object number of the current `Ref` or `Obj` token
    pub fn object_number(&self) -> i32 {
        self.reference
    }

    /// Generation number of the current `Ref` or `Obj` token
    pub fn generation_number(&self) -> i32 {
        self.generation
    }

    fn parse_value<T: std::str::FromStr>(&self) -> ParseResult<T> {
        let value = self.string_value();
        value.parse().map_err(|_| ParseError::InvalidNumber {
            position: self.file.position(),
            value,
        })
    }

    pub fn int_value(&self) -> ParseResult<i32> {
        self.parse_value()
    }

    pub fn long_value(&self) -> ParseResult<i64> {
        self.parse_value()
    }

    pub fn double_value(&self) -> ParseResult<f64> {
        self.parse_value()
    }

    pub(crate) fn syntax_error(&self, message: &str) -> ParseError {
        ParseError::SyntaxError {
            position: self.file.position(),
            message: message.to_string(),
        }
    }

    fn back_one_position(&mut self, ch: Option<u8>) {
        if let Some(byte) = ch {
            self.file.push_back(byte);
        }
    }

    /// Reads the next token.
    ///
    /// Returns `false` once the end of the data is reached, leaving
    /// [`TokenType::EndOfFile`] as the current type.
    pub fn next_token(&mut self) -> ParseResult<bool> {
        self.out_buf.reset();
        let ch = loop {
            match self.file.read()? {
                Some(byte) if is_whitespace(byte) => continue,
                other => break other,
            }
        };
        let Some(ch) = ch else {
            self.token_type = TokenType::EndOfFile;
            return Ok(false);
        };

        match ch {
            b'[' => self.token_type = TokenType::StartArray,
            b']' => self.token_type = TokenType::EndArray,
            b'/' => self.read_name()?,
            b'>' => {
                if self.file.read()? != Some(b'>') {
                    return Err(self.syntax_error("'>' not expected"));
                }
                self.token_type = TokenType::EndDict;
            }
            b'<' => {
                let next = self.file.read()?;
                if next == Some(b'<') {
                    self.token_type = TokenType::StartDict;
                } else {
                    self.read_hex_string(next)?;
                }
            }
            b'%' => {
                self.token_type = TokenType::Comment;
                while let Some(byte) = self.file.read()? {
                    if byte == b'\r' || byte == b'\n' {
                        break;
                    }
                }
            }
            b'(' => self.read_literal_string()?,
            b'-' | b'+' | b'.' | b'0'..=b'9' => {
                let end = self.read_number(ch)?;
                self.back_one_position(end);
            }
            _ => {
                let end = self.read_other(ch)?;
                self.back_one_position(end);
            }
        }
        Ok(true)
    }

    fn read_name(&mut self) -> ParseResult<()> {
        self.token_type = TokenType::Name;
        loop {
            let ch = self.file.read()?;
            match ch {
                Some(byte) if !is_delimiter_whitespace(ch) => {
                    self.out_buf.append_byte(byte);
                }
                _ => {
                    self.back_one_position(ch);
                    return Ok(());
                }
            }
        }
    }

    /// Reads a hex digit or the closing `>`, skipping whitespace.
    fn hex_step(&mut self, mut ch: Option<u8>) -> ParseResult<Option<u8>> {
        while ch.is_some_and(is_whitespace) {
            ch = self.file.read()?;
        }
        match ch {
            Some(b'>') => Ok(None),
            Some(byte) => {
                self.out_buf.append_byte(byte);
                if ByteAccumulator::hex_value(byte).is_none() {
                    return Err(self.syntax_error("Error reading string"));
                }
                Ok(Some(byte))
            }
            None => Err(self.syntax_error("Error reading string")),
        }
    }

    fn read_hex_string(&mut self, first: Option<u8>) -> ParseResult<()> {
        self.token_type = TokenType::String;
        self.hex_string = true;
        let mut ch = first;
        loop {
            if self.hex_step(ch)?.is_none() {
                return Ok(());
            }
            let second = self.file.read()?;
            if self.hex_step(second)?.is_none() {
                return Ok(());
            }
            ch = self.file.read()?;
        }
    }

    fn read_literal_string(&mut self) -> ParseResult<()> {
        self.token_type = TokenType::String;
        self.hex_string = false;
        let mut nesting = 0i32;
        loop {
            let Some(mut ch) = self.file.read()? else {
                return Err(self.syntax_error("Error reading string"));
            };
            match ch {
                b'(' => nesting += 1,
                b')' => nesting -= 1,
                b'\\' => {
                    self.out_buf.append_byte(b'\\');
                    ch = match self.file.read()? {
                        Some(escaped) => escaped,
                        None => return Err(self.syntax_error("Error reading string")),
                    };
                }
                _ => {}
            }
            if nesting == -1 {
                return Ok(());
            }
            self.out_buf.append_byte(ch);
        }
    }

    /// Reads a number starting with `first` and returns the byte after it.
    fn read_number(&mut self, first: u8) -> ParseResult<Option<u8>> {
        self.token_type = TokenType::Number;
        let mut is_real = false;
        let mut minuses = 0;
        let mut ch = Some(first);

        if first == b'-' {
            // Producers emit numbers like "--234"
            while ch == Some(b'-') {
                minuses += 1;
                ch = self.file.read()?;
            }
            self.out_buf.append_byte(b'-');
        } else {
            self.out_buf.append_byte(first);
            ch = self.file.read()?;
        }

        while let Some(digit @ b'0'..=b'9') = ch {
            self.out_buf.append_byte(digit);
            ch = self.file.read()?;
        }

        if ch == Some(b'.') {
            is_real = true;
            self.out_buf.append_byte(b'.');
            ch = self.file.read()?;
            // A minus after the dot drops everything up to the next non-digit
            let dropped = ch == Some(b'-');
            if dropped {
                ch = self.file.read()?;
            }
            while let Some(digit @ b'0'..=b'9') = ch {
                if !dropped {
                    self.out_buf.append_byte(digit);
                }
                ch = self.file.read()?;
            }
        }

        // Integers with more than one leading minus read as zero
        if minuses > 1 && !is_real {
            self.out_buf.reset().append_byte(b'0');
        }
        Ok(ch)
    }

    fn read_other(&mut self, first: u8) -> ParseResult<Option<u8>> {
        self.token_type = TokenType::Other;
        let mut ch = Some(first);
        while let Some(byte) = ch {
            self.out_buf.append_byte(byte);
            ch = self.file.read()?;
            if is_delimiter_whitespace(ch) {
                break;
            }
        }
        if self.token_value_equals(END_OBJ) {
            self.token_type = TokenType::EndObj;
        }
        Ok(ch)
    }

    /// Rewinds to `position` and restores `number` as the current token.
    fn restore_number(&mut self, position: u64, number: &[u8]) {
        self.file.seek(position);
        self.token_type = TokenType::Number;
        self.out_buf.reset().append(number);
    }

    /// Reads the next token that is not a comment, joining `N G R` into a
    /// [`TokenType::Ref`] and `N G obj` into a [`TokenType::Obj`].
    ///
    /// When a number is not followed by that shape the tokenizer is rewound
    /// to just after it and the number is reported alone.
    pub fn next_valid_token(&mut self) -> ParseResult<()> {
        let mut level = 0;
        let mut n1 = Vec::new();
        let mut n2 = Vec::new();
        let mut after_first = 0;

        while self.next_token()? {
            if self.token_type == TokenType::Comment {
                continue;
            }
            match level {
                0 => {
                    if self.token_type != TokenType::Number {
                        return Ok(());
                    }
                    after_first = self.file.position();
                    n1 = self.byte_content().to_vec();
                    level = 1;
                }
                1 => {
                    if self.token_type != TokenType::Number {
                        self.restore_number(after_first, &n1);
                        return Ok(());
                    }
                    n2 = self.byte_content().to_vec();
                    level = 2;
                }
                _ => {
                    if self.token_type == TokenType::Other {
                        if self.token_value_equals(R) {
                            self.token_type = TokenType::Ref;
                            match (parse_i32(&n1), parse_i32(&n2)) {
                                (Some(reference), Some(generation)) => {
                                    self.reference = reference;
                                    self.generation = generation;
                                }
                                _ => {
                                    tracing::warn!(
                                        position = self.file.position(),
                                        "Invalid indirect reference {} {} R",
                                        iso::decode(&n1),
                                        iso::decode(&n2)
                                    );
                                    self.reference = -1;
                                    self.generation = 0;
                                }
                            }
                            return Ok(());
                        }
                        if self.token_value_equals(OBJ) {
                            self.token_type = TokenType::Obj;
                            self.reference = self.number_or_error(&n1)?;
                            self.generation = self.number_or_error(&n2)?;
                            return Ok(());
                        }
                    }
                    self.restore_number(after_first, &n1);
                    return Ok(());
                }
            }
        }

        if level > 0 {
            // The data ended inside the lookahead
            self.restore_number(after_first, &n1);
        }
        Ok(())
    }

    fn number_or_error(&self, digits: &[u8]) -> ParseResult<i32> {
        parse_i32(digits).ok_or_else(|| ParseError::InvalidNumber {
            position: self.file.position(),
            value: iso::decode(digits),
        })
    }
}

fn parse_i32(digits: &[u8]) -> Option<i32> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}
