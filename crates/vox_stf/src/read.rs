//! Parsing STF text into tag trees.
//!

use vox_tbf::{CompoundTag, Document, ListTag, Tag, TagId};

use crate::error::{Error, Result};

/// Parse a complete STF string into a document with an empty outer name.
pub fn from_stf(src: &str) -> Result<Document> {
    parse(src).map(|root| Document::new("", root))
}

/// Parse a complete STF string; trailing non-whitespace is an error.
pub fn parse(src: &str) -> Result<Tag> {
    let mut parser = Parser::new(src);
    parser.skip_ws();
    let tag = parser.parse_value()?;
    parser.skip_ws();
    if parser.pos < parser.src.len() {
        return Err(Error::parse(parser.pos, "trailing characters after value"));
    }
    Ok(tag)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<u8> {
        let byte = self
            .peek()
            .ok_or_else(|| Error::parse(self.pos, "unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        let at = self.pos;
        let found = self.bump()?;
        if found != expected {
            return Err(Error::parse(
                at,
                format!("expected `{}`, found `{}`", expected as char, found as char),
            ));
        }
        Ok(())
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Result<Tag> {
        match self.peek() {
            Some(b'{') => self.parse_compound().map(Tag::Compound),
            Some(b'[') => self.parse_list_or_array(),
            Some(b'"') | Some(b'\'') => self.parse_quoted().map(Tag::String),
            Some(_) => self.parse_bare(),
            None => Err(Error::parse(self.pos, "unexpected end of input")),
        }
    }

    fn parse_compound(&mut self) -> Result<CompoundTag> {
        self.expect(b'{')?;
        let mut entries = CompoundTag::default();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(entries);
        }
        loop {
            self.skip_ws();
            let key = self.parse_key()?;
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let value = self.parse_value()?;
            entries.insert(key, value);
            self.skip_ws();
            match self.bump()? {
                b',' => continue,
                b'}' => return Ok(entries),
                other => {
                    return Err(Error::parse(
                        self.pos - 1,
                        format!("expected `,` or `}}`, found `{}`", other as char),
                    ))
                }
            }
        }
    }

    fn parse_key(&mut self) -> Result<String> {
        match self.peek() {
            Some(b'"') | Some(b'\'') => self.parse_quoted(),
            _ => {
                let start = self.pos;
                while matches!(
                    self.peek(),
                    Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'+')
                ) {
                    self.pos += 1;
                }
                if start == self.pos {
                    return Err(Error::parse(start, "expected a key"));
                }
                // Safe: only ASCII bytes were consumed.
                Ok(std::str::from_utf8(&self.src[start..self.pos])
                    .expect("bare keys are ASCII")
                    .to_owned())
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            let at = self.pos;
            match self.bump()? {
                b'\\' => match self.bump()? {
                    b'\\' => out.push('\\'),
                    b'"' => out.push('"'),
                    b'\'' => out.push('\''),
                    b'n' => out.push('\n'),
                    b't' => out.push('\t'),
                    b'r' => out.push('\r'),
                    other => {
                        return Err(Error::parse(
                            at,
                            format!("unknown escape `\\{}`", other as char),
                        ))
                    }
                },
                b if b == quote => {
                    return Ok(out);
                }
                byte => {
                    // Re-assemble multi-byte UTF-8 sequences.
                    let width = utf8_width(byte);
                    if width == 1 {
                        out.push(byte as char);
                    } else {
                        let end = at + width;
                        let slice = self
                            .src
                            .get(at..end)
                            .ok_or_else(|| Error::parse(at, "unexpected end of input"))?;
                        let s = std::str::from_utf8(slice)
                            .map_err(|_| Error::parse(at, "invalid UTF-8 in string"))?;
                        out.push_str(s);
                        self.pos = end;
                    }
                }
            }
        }
    }

    fn parse_list_or_array(&mut self) -> Result<Tag> {
        let start = self.pos;
        self.expect(b'[')?;

        // `[B;`, `[I;` and `[L;` open typed arrays; anything else is a list.
        let mark = self.pos;
        if let Some(kind @ (b'B' | b'I' | b'L')) = self.peek() {
            self.pos += 1;
            self.skip_ws();
            if self.peek() == Some(b';') {
                self.pos += 1;
                return self.parse_typed_array(kind);
            }
            self.pos = mark;
        }

        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Tag::List(ListTag::new(TagId::Byte)));
        }
        loop {
            self.skip_ws();
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.bump()? {
                b',' => continue,
                b']' => break,
                other => {
                    return Err(Error::parse(
                        self.pos - 1,
                        format!("expected `,` or `]`, found `{}`", other as char),
                    ))
                }
            }
        }
        ListTag::from_items(items, None)
            .map(Tag::List)
            .map_err(|e| Error::parse(start, e.to_string()))
    }

    fn parse_typed_array(&mut self, kind: u8) -> Result<Tag> {
        let mut bytes = Vec::new();
        let mut ints = Vec::new();
        let mut longs = Vec::new();

        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
        } else {
            loop {
                self.skip_ws();
                let at = self.pos;
                let value = self.parse_integer_literal(kind)?;
                match kind {
                    b'B' => {
                        // Accept both the signed and unsigned byte ranges;
                        // store the two's-complement octet.
                        if !(-128..=255).contains(&value) {
                            return Err(Error::parse(
                                at,
                                format!("value {value} does not fit a byte"),
                            ));
                        }
                        bytes.push(value as u8);
                    }
                    b'I' => {
                        let v = i32::try_from(value).map_err(|_| {
                            Error::parse(at, format!("value {value} does not fit an int"))
                        })?;
                        ints.push(v);
                    }
                    _ => longs.push(value),
                }
                self.skip_ws();
                match self.bump()? {
                    b',' => continue,
                    b']' => break,
                    other => {
                        return Err(Error::parse(
                            self.pos - 1,
                            format!("expected `,` or `]`, found `{}`", other as char),
                        ))
                    }
                }
            }
        }

        Ok(match kind {
            b'B' => Tag::ByteArray(bytes),
            b'I' => Tag::IntArray(ints),
            _ => Tag::LongArray(longs),
        })
    }

    /// A signed decimal integer with the optional suffix its array kind
    /// allows (`b` for `[B;`, `L` for `[L;`).
    fn parse_integer_literal(&mut self, kind: u8) -> Result<i64> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        let body = std::str::from_utf8(&self.src[start..self.pos]).expect("digits are ASCII");
        let value: i64 = body
            .parse()
            .map_err(|_| Error::parse(start, "expected an integer"))?;
        match (kind, self.peek()) {
            (b'B', Some(b'b' | b'B')) | (b'L', Some(b'l' | b'L')) => self.pos += 1,
            _ => {}
        }
        Ok(value)
    }

    /// An unquoted token: a boolean, a suffixed or bare number, or a bare
    /// string.
    fn parse_bare(&mut self) -> Result<Tag> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'+')
        ) {
            self.pos += 1;
        }
        if start == self.pos {
            let found = self.peek().map(|b| b as char).unwrap_or('?');
            return Err(Error::parse(start, format!("unexpected `{found}`")));
        }
        let token = std::str::from_utf8(&self.src[start..self.pos]).expect("bare tokens are ASCII");

        match token {
            "true" => return Ok(Tag::Byte(1)),
            "false" => return Ok(Tag::Byte(0)),
            _ => {}
        }

        if token.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
            self.classify_number(token, start)
        } else {
            // Tolerated extension: a bare token that is not numeric parses
            // as a string, the way hand-written files often come.
            Ok(Tag::String(token.to_owned()))
        }
    }

    fn classify_number(&self, token: &str, at: usize) -> Result<Tag> {
        let (body, suffix) = match token.chars().last() {
            Some(c @ ('b' | 'B' | 's' | 'S' | 'l' | 'L' | 'f' | 'F' | 'd' | 'D')) => {
                (&token[..token.len() - 1], Some(c.to_ascii_lowercase()))
            }
            _ => (token, None),
        };

        match suffix {
            Some('b') => {
                let value = parse_int(body, at)?;
                let v = i8::try_from(value)
                    .map_err(|_| Error::parse(at, format!("value {value} does not fit a byte")))?;
                Ok(Tag::Byte(v))
            }
            Some('s') => {
                let value = parse_int(body, at)?;
                let v = i16::try_from(value)
                    .map_err(|_| Error::parse(at, format!("value {value} does not fit a short")))?;
                Ok(Tag::Short(v))
            }
            Some('l') => Ok(Tag::Long(parse_int(body, at)?)),
            Some('f') => {
                let value: f32 = body
                    .parse()
                    .map_err(|_| Error::parse(at, format!("`{body}` is not a number")))?;
                Ok(Tag::Float(value))
            }
            Some('d') => {
                let value: f64 = body
                    .parse()
                    .map_err(|_| Error::parse(at, format!("`{body}` is not a number")))?;
                Ok(Tag::Double(value))
            }
            None => {
                if token.contains(['.', 'e', 'E']) {
                    let value: f64 = token
                        .parse()
                        .map_err(|_| Error::parse(at, format!("`{token}` is not a number")))?;
                    Ok(Tag::Double(value))
                } else {
                    let value = parse_int(token, at)?;
                    let v = i32::try_from(value).map_err(|_| {
                        Error::parse(at, format!("value {value} does not fit an int"))
                    })?;
                    Ok(Tag::Int(v))
                }
            }
            Some(_) => unreachable!("suffix is restricted to b/s/l/f/d by the match above"),
        }
    }
}

fn parse_int(body: &str, at: usize) -> Result<i64> {
    body.parse()
        .map_err(|_| Error::parse(at, format!("`{body}` is not an integer")))
}

const fn utf8_width(byte: u8) -> usize {
    match byte {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}
