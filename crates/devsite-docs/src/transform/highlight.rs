//! C syntax highlighting for Doxygen code listings
//!
//! A small byte-offset tokenizer; tokens are rendered as `<span>`s carrying
//! the short class names the site stylesheet already knows (`k`, `kt`, `s`,
//! `c1`, `cm`, `cp`, `mi`, `o`, `p`, `n`).

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Keyword,
    KeywordType,
    Identifier,
    Number,
    StringLiteral,
    LineComment,
    BlockComment,
    Preprocessor,
    Operator,
    Punctuation,
}

impl TokenKind {
    fn css_class(&self) -> Option<&'static str> {
        match self {
            TokenKind::Whitespace => None,
            TokenKind::Keyword => Some("k"),
            TokenKind::KeywordType => Some("kt"),
            TokenKind::Identifier => Some("n"),
            TokenKind::Number => Some("mi"),
            TokenKind::StringLiteral => Some("s"),
            TokenKind::LineComment => Some("c1"),
            TokenKind::BlockComment => Some("cm"),
            TokenKind::Preprocessor => Some("cp"),
            TokenKind::Operator => Some("o"),
            TokenKind::Punctuation => Some("p"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

const KEYWORDS: &[&str] = &[
    "break", "case", "const", "continue", "default", "do", "else", "enum", "extern", "for", "goto",
    "if", "inline", "register", "return", "sizeof", "static", "struct", "switch", "typedef",
    "union", "volatile", "while", "NULL", "true", "false",
];

const TYPES: &[&str] = &[
    "bool", "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
    "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "size_t", "time_t",
];

const OPERATOR_CHARS: &str = "+-*/%=<>!&|^~?:";
const PUNCTUATION_CHARS: &str = "()[]{};,.";

/// Split C source into tokens covering every byte of the input
pub fn tokenize_c(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line_start = true;

    while pos < bytes.len() {
        let start = pos;
        let ch = bytes[pos];
        let kind = if ch.is_ascii_whitespace() {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                if bytes[pos] == b'\n' {
                    line_start = true;
                }
                pos += 1;
            }
            TokenKind::Whitespace
        } else if ch == b'#' && line_start {
            pos = end_of_line(bytes, pos);
            TokenKind::Preprocessor
        } else if source[pos..].starts_with("//") {
            pos = end_of_line(bytes, pos);
            TokenKind::LineComment
        } else if source[pos..].starts_with("/*") {
            pos = match source[pos + 2..].find("*/") {
                Some(i) => pos + 2 + i + 2,
                None => bytes.len(),
            };
            TokenKind::BlockComment
        } else if ch == b'"' || ch == b'\'' {
            pos += 1;
            while pos < bytes.len() && bytes[pos] != ch && bytes[pos] != b'\n' {
                if bytes[pos] == b'\\' {
                    pos += 1;
                }
                pos += 1;
            }
            pos = (pos + 1).min(bytes.len());
            TokenKind::StringLiteral
        } else if ch.is_ascii_digit() {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'.') {
                pos += 1;
            }
            TokenKind::Number
        } else if ch.is_ascii_alphabetic() || ch == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            let word = &source[start..pos];
            if KEYWORDS.contains(&word) {
                TokenKind::Keyword
            } else if TYPES.contains(&word) {
                TokenKind::KeywordType
            } else {
                TokenKind::Identifier
            }
        } else if OPERATOR_CHARS.contains(ch as char) {
            pos += 1;
            TokenKind::Operator
        } else if PUNCTUATION_CHARS.contains(ch as char) {
            pos += 1;
            TokenKind::Punctuation
        } else {
            // Any other character, including multi-byte UTF-8 sequences.
            pos += source[pos..].chars().next().map_or(1, char::len_utf8);
            TokenKind::Identifier
        };

        if kind != TokenKind::Whitespace {
            line_start = false;
        }
        tokens.push(Token {
            start,
            end: pos,
            kind,
        });
    }
    tokens
}

fn end_of_line(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos] != b'\n' {
        pos += 1;
    }
    pos
}

/// Render C source as a highlighted `div.highlight > pre` block
pub fn highlight_c(source: &str) -> String {
    let mut out = String::from("<div class=\"highlight\"><pre><code class=\"language-c\">");
    for token in tokenize_c(source) {
        let text = html_escape::encode_text(&source[token.start..token.end]);
        match token.kind.css_class() {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(class);
                out.push_str("\">");
                out.push_str(&text);
                out.push_str("</span>");
            }
            None => out.push_str(&text),
        }
    }
    out.push_str("</code></pre></div>");
    out
}
