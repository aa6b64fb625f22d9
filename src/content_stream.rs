/// A single lexical unit of a decoded content stream.
///
/// The tokenizer only distinguishes what the color rewriting pass needs to
/// reason about: numeric operands, operators, and everything else. Strings,
/// hex strings, names, comments, delimiters and inline-image payloads are all
/// `Other`, carried verbatim so that re-emitting the tokens reproduces them
/// byte-exact.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// A numeric operand together with the exact source bytes it was lexed from.
    Number { value: f64, raw: &'a [u8] },
    /// A content-stream operator such as `rg`, `Tj` or `ID`.
    Operator { raw: &'a [u8] },
    /// Any other construct, preserved verbatim.
    Other { raw: &'a [u8] },
}

impl<'a> Token<'a> {
    /// The exact source bytes this token was lexed from.
    pub fn raw(&self) -> &'a [u8] {
        match self {
            Token::Number { raw, .. } => raw,
            Token::Operator { raw } => raw,
            Token::Other { raw } => raw,
        }
    }
}

/// The scanning mode of the tokenizer. Inline images need their own modes
/// because their binary payload must be skipped over as one opaque unit
/// instead of being lexed byte by byte.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanMode {
    /// Regular token-by-token scanning.
    Operators,
    /// The `ID` operator was just emitted, the next token is the binary payload.
    ImagePayload,
    /// The payload was just emitted, the next token is the `EI` operator.
    ImageEnd,
}

/// A single-pass lexer over a decoded content stream.
///
/// The tokenizer walks the input once and lazily yields `Token`s through the
/// `Iterator` implementation. It is permissive on purpose: unterminated
/// strings, hex strings or image payloads consume the rest of the input
/// instead of failing, because a degraded-but-valid output beats a crash in
/// print production. Calling `ContentTokenizer::new` again on the same input
/// restarts the scan from the beginning.
pub struct ContentTokenizer<'a> {
    input: &'a [u8],
    position: usize,
    mode: ScanMode,
}

impl<'a> ContentTokenizer<'a> {
    /// Creates a tokenizer over the given decoded content-stream bytes.
    pub fn new(input: &'a [u8]) -> Self {
        ContentTokenizer {
            input,
            position: 0,
            mode: ScanMode::Operators,
        }
    }

    /// Scans the binary payload of an inline image, from the current position
    /// up to and including the whitespace byte that precedes the `EI`
    /// operator. A stray `EI` byte pair inside the payload does not terminate
    /// it: the operator must be framed by whitespace before it and whitespace
    /// or end-of-input after it.
    fn scan_image_payload(&mut self) -> Token<'a> {
        let start = self.position;
        let mut index = self.position;
        while index < self.input.len() {
            if is_whitespace(self.input[index])
                && index + 2 < self.input.len()
                && self.input[index + 1] == b'E'
                && self.input[index + 2] == b'I'
                && (index + 3 == self.input.len() || is_whitespace(self.input[index + 3]))
            {
                // The boundary whitespace belongs to the payload, the `EI`
                // right after it is emitted as its own operator token
                self.position = index + 1;
                self.mode = ScanMode::ImageEnd;
                return Token::Other {
                    raw: &self.input[start..=index],
                };
            }
            index += 1;
        }

        // No properly framed `EI` was found: the rest of the input is the
        // payload and no end operator is fabricated
        self.position = self.input.len();
        self.mode = ScanMode::Operators;
        Token::Other {
            raw: &self.input[start..],
        }
    }

    /// Scans a comment from `%` through the end of the line, line terminator
    /// included so that re-joining the tokens cannot glue the next token onto
    /// the comment.
    fn scan_comment(&mut self) -> Token<'a> {
        let start = self.position;
        let mut index = self.position + 1;
        while index < self.input.len() && self.input[index] != b'\r' && self.input[index] != b'\n' {
            index += 1;
        }
        if index < self.input.len() {
            // Consume the terminator, treating a CRLF pair as one boundary
            if self.input[index] == b'\r'
                && index + 1 < self.input.len()
                && self.input[index + 1] == b'\n'
            {
                index += 1;
            }
            index += 1;
        }
        self.position = index;
        Token::Other {
            raw: &self.input[start..index],
        }
    }

    /// Scans a string literal, tracking the nesting depth of unescaped
    /// parentheses. A backslash escapes the byte that follows it.
    fn scan_string_literal(&mut self) -> Token<'a> {
        let start = self.position;
        let mut index = self.position + 1;
        let mut depth = 1usize;
        while index < self.input.len() && depth > 0 {
            match self.input[index] {
                b'\\' => index += 2,
                b'(' => {
                    depth += 1;
                    index += 1;
                }
                b')' => {
                    depth -= 1;
                    index += 1;
                }
                _ => index += 1,
            }
        }
        let end = index.min(self.input.len());
        self.position = end;
        Token::Other {
            raw: &self.input[start..end],
        }
    }

    /// Scans a hex string from `<` through the matching `>`, inclusive.
    fn scan_hex_string(&mut self) -> Token<'a> {
        let start = self.position;
        let mut index = self.position + 1;
        while index < self.input.len() && self.input[index] != b'>' {
            index += 1;
        }
        let end = (index + 1).min(self.input.len());
        self.position = end;
        Token::Other {
            raw: &self.input[start..end],
        }
    }

    /// Scans a name from `/` up to the next delimiter or whitespace.
    fn scan_name(&mut self) -> Token<'a> {
        let start = self.position;
        let mut index = self.position + 1;
        while index < self.input.len()
            && !is_whitespace(self.input[index])
            && !is_delimiter(self.input[index])
        {
            index += 1;
        }
        self.position = index;
        Token::Other {
            raw: &self.input[start..index],
        }
    }

    /// Scans a bare run of regular bytes and classifies it as a number, the
    /// `ID` inline-image operator, or a plain operator.
    fn scan_bare_run(&mut self) -> Token<'a> {
        let start = self.position;
        let mut index = self.position;
        while index < self.input.len()
            && !is_whitespace(self.input[index])
            && !is_delimiter(self.input[index])
        {
            index += 1;
        }
        self.position = index;
        let run = &self.input[start..index];

        if let Some(value) = parse_number(run) {
            return Token::Number { value, raw: run };
        }
        if run == b"ID" {
            self.mode = ScanMode::ImagePayload;
        }
        Token::Operator { raw: run }
    }
}

impl<'a> Iterator for ContentTokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.mode {
            ScanMode::ImagePayload => {
                return Some(self.scan_image_payload());
            }
            ScanMode::ImageEnd => {
                // The scan of the payload stopped right before the `EI` bytes
                let raw = &self.input[self.position..self.position + 2];
                self.position += 2;
                self.mode = ScanMode::Operators;
                return Some(Token::Operator { raw });
            }
            ScanMode::Operators => {}
        }

        // Skip inter-token whitespace
        while self.position < self.input.len() && is_whitespace(self.input[self.position]) {
            self.position += 1;
        }
        if self.position >= self.input.len() {
            return None;
        }

        let token = match self.input[self.position] {
            b'%' => self.scan_comment(),
            b'(' => self.scan_string_literal(),
            b'<' => {
                if self.input.get(self.position + 1) == Some(&b'<') {
                    let raw = &self.input[self.position..self.position + 2];
                    self.position += 2;
                    Token::Other { raw }
                } else {
                    self.scan_hex_string()
                }
            }
            b'>' => {
                // A lone `>` only appears in malformed input, but `>>` closes
                // a dictionary and must stay one token
                if self.input.get(self.position + 1) == Some(&b'>') {
                    let raw = &self.input[self.position..self.position + 2];
                    self.position += 2;
                    Token::Other { raw }
                } else {
                    let raw = &self.input[self.position..self.position + 1];
                    self.position += 1;
                    Token::Other { raw }
                }
            }
            b'[' | b']' | b'{' | b'}' | b')' => {
                let raw = &self.input[self.position..self.position + 1];
                self.position += 1;
                Token::Other { raw }
            }
            b'/' => self.scan_name(),
            _ => self.scan_bare_run(),
        };

        Some(token)
    }
}

/// The whitespace bytes of the content-stream grammar.
fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// The delimiter bytes of the content-stream grammar.
fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Matches a bare run against the signed decimal number grammar
/// `[+-]?(digits[.digits?] | .digits)` and parses it on success. Anything
/// else, including the empty run and exponent notation, is not a number.
fn parse_number(run: &[u8]) -> Option<f64> {
    let digits = match run.first() {
        Some(b'+') | Some(b'-') => &run[1..],
        _ => run,
    };
    if digits.is_empty() {
        return None;
    }

    let mut seen_dot = false;
    let mut seen_digit = false;
    for byte in digits {
        match byte {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }

    std::str::from_utf8(run).ok()?.parse::<f64>().ok()
}
