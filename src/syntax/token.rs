use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    Identifier,
    StringLiteral,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Semicolon,
    Backslash,
    RightArrow,
    LeftRightArrow,
    Def,
    DefComposite,
    Lets,
    Let,
    Know,
    If,
    Iff,
    When,
    Not,
    Or,
    Is,
    Prove,
    ProveByContradiction,
    Contradiction,
    By,

    // Something the scanner couldn't make sense of, like an unterminated string.
    Invalid,
}

impl TokenType {
    fn keyword(text: &str) -> Option<TokenType> {
        let token_type = match text {
            "=>" => TokenType::RightArrow,
            "<=>" => TokenType::LeftRightArrow,
            "def" => TokenType::Def,
            "def_composite" => TokenType::DefComposite,
            "lets" => TokenType::Lets,
            "let" => TokenType::Let,
            "know" => TokenType::Know,
            "if" => TokenType::If,
            "iff" => TokenType::Iff,
            "when" => TokenType::When,
            "not" => TokenType::Not,
            "or" => TokenType::Or,
            "is" => TokenType::Is,
            "prove" => TokenType::Prove,
            "prove_by_contradiction" => TokenType::ProveByContradiction,
            "contradiction" => TokenType::Contradiction,
            "by" => TokenType::By,
            _ => return None,
        };
        Some(token_type)
    }

    fn punctuation(c: char) -> Option<TokenType> {
        let token_type = match c {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            ':' => TokenType::Colon,
            ',' => TokenType::Comma,
            ';' => TokenType::Semicolon,
            '\\' => TokenType::Backslash,
            _ => return None,
        };
        Some(token_type)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub text: String,

    // Lines are 1-based.
    pub line: u32,
}

/// A problem with the source text itself, found before anything gets executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

impl Token {
    pub fn error(&self, message: &str) -> ParseError {
        ParseError {
            line: self.line,
            message: format!("{} (at '{}')", message, self.text),
        }
    }

    /// Splits source text into tokens.
    /// Punctuation and whitespace separate tokens, `//` starts a comment that runs to the
    /// end of the line, and strings are double-quoted with `\"` as the only escape.
    pub fn scan(input: &str) -> Vec<Token> {
        let mut tokens = vec![];
        let mut line = 1;
        let mut chars = input.chars().peekable();

        while let Some(&c) = chars.peek() {
            if c == '\n' {
                line += 1;
                chars.next();
                continue;
            }
            if c.is_whitespace() {
                chars.next();
                continue;
            }

            if let Some(token_type) = TokenType::punctuation(c) {
                chars.next();
                tokens.push(Token {
                    token_type,
                    text: c.to_string(),
                    line,
                });
                continue;
            }

            if c == '"' {
                chars.next();
                let mut text = String::new();
                let mut terminated = false;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            terminated = true;
                            break;
                        }
                        '\\' if chars.peek() == Some(&'"') => {
                            chars.next();
                            text.push('"');
                        }
                        '\n' => {
                            line += 1;
                            text.push(c);
                        }
                        _ => text.push(c),
                    }
                }
                let token_type = if terminated {
                    TokenType::StringLiteral
                } else {
                    TokenType::Invalid
                };
                tokens.push(Token {
                    token_type,
                    text,
                    line,
                });
                continue;
            }

            // Anything else runs until whitespace, punctuation or a quote.
            let mut text = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '"' || TokenType::punctuation(c).is_some() {
                    break;
                }
                if c == '/' && text.ends_with('/') {
                    text.pop();
                    break;
                }
                text.push(c);
                chars.next();
            }
            let comment = text.is_empty() || chars.peek() == Some(&'/');
            if !text.is_empty() {
                let token_type = TokenType::keyword(&text).unwrap_or(TokenType::Identifier);
                tokens.push(Token {
                    token_type,
                    text,
                    line,
                });
            }
            if comment {
                // Skip the rest of the line, leaving the newline to be counted.
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
        }
        tokens
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A cursor over the tokens of one source.
/// Saving and restoring the position lets the parser back up after a failed attempt.
pub struct TokenIter {
    tokens: Vec<Token>,
    position: usize,
    last_line: u32,
}

impl TokenIter {
    pub fn new(tokens: Vec<Token>) -> TokenIter {
        let last_line = tokens.last().map_or(1, |t| t.line);
        TokenIter {
            tokens,
            position: 0,
            last_line,
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub fn peek_type(&self) -> Option<TokenType> {
        self.peek().map(|t| t.token_type)
    }

    /// The type of the token after the next one.
    pub fn peek_second_type(&self) -> Option<TokenType> {
        self.tokens.get(self.position + 1).map(|t| t.token_type)
    }

    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn restore(&mut self, position: usize) {
        self.position = position;
    }

    /// The line of the most recently consumed token.
    pub fn last_line(&self) -> u32 {
        match self.position.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.line,
            None => 1,
        }
    }

    pub fn is_done(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// An error at the current position, or at the end of the input.
    pub fn error(&self, message: &str) -> ParseError {
        match self.peek() {
            Some(token) => token.error(message),
            None => ParseError {
                line: self.last_line,
                message: format!("{} (at end of input)", message),
            },
        }
    }

    pub fn expect_token(&mut self) -> ParseResult<Token> {
        match self.next() {
            Some(token) => Ok(token),
            None => Err(self.error("unexpected end of input")),
        }
    }

    pub fn expect_type(&mut self, expected: TokenType) -> ParseResult<Token> {
        match self.peek() {
            Some(token) if token.token_type == expected => self.expect_token(),
            _ => Err(self.error(&format!("expected {:?}", expected))),
        }
    }

    /// Consumes the next token if it has the given type.
    pub fn skip(&mut self, token_type: TokenType) -> bool {
        if self.peek_type() == Some(token_type) {
            self.position += 1;
            true
        } else {
            false
        }
    }
}
