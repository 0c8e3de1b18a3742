//! Tokenizer for the FEEL subset

use super::FeelError;

/// FEEL token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    String(String),
    /// Single word of a name; consecutive words form one name
    Word(String),
    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Range,
}

/// Token with its byte offset in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Split source text into tokens
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, FeelError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '=' => Some(Token::Eq),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push(Spanned { token, position });
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).map(|(_, n)| *n);
        match c {
            '!' if next == Some('=') => {
                tokens.push(Spanned { token: Token::NotEq, position });
                i += 2;
            }
            '<' | '>' => {
                let token = match (c, next) {
                    ('<', Some('=')) => Token::Le,
                    ('>', Some('=')) => Token::Ge,
                    ('<', _) => Token::Lt,
                    _ => Token::Gt,
                };
                i += if matches!(token, Token::Le | Token::Ge) { 2 } else { 1 };
                tokens.push(Spanned { token, position });
            }
            '.' if next == Some('.') => {
                tokens.push(Spanned { token: Token::Range, position });
                i += 2;
            }
            '.' if !next.map(|n| n.is_ascii_digit()).unwrap_or(false) => {
                tokens.push(Spanned { token: Token::Dot, position });
                i += 1;
            }
            '"' => {
                let (text, consumed) = read_string(source, &chars[i..])?;
                tokens.push(Spanned { token: Token::String(text), position });
                i += consumed;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() {
                    let d = chars[i].1;
                    // stop before a range operator such as `1..5`
                    let is_range = d == '.' && chars.get(i + 1).map(|(_, n)| *n) == Some('.');
                    if d.is_ascii_digit() || (d == '.' && !is_range) {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let end = chars.get(i).map(|(p, _)| *p).unwrap_or(source.len());
                let text = &source[position..end];
                let number = text.parse::<f64>().map_err(|_| FeelError::syntax(
                    format!("invalid number '{}'", text),
                    chars[start].0,
                    source,
                ))?;
                tokens.push(Spanned { token: Token::Number(number), position });
            }
            c if is_name_start(c) => {
                while i < chars.len() && is_name_part(chars[i].1) {
                    i += 1;
                }
                let end = chars.get(i).map(|(p, _)| *p).unwrap_or(source.len());
                tokens.push(Spanned {
                    token: Token::Word(source[position..end].to_string()),
                    position,
                });
            }
            other => {
                return Err(FeelError::syntax(
                    format!("unexpected character '{}'", other),
                    position,
                    source,
                ))
            }
        }
    }

    Ok(tokens)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '?'
}

fn is_name_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '?' || c == '\''
}

/// Read a double-quoted string starting at `chars[0]`; returns the text and
/// the number of characters consumed
fn read_string(source: &str, chars: &[(usize, char)]) -> Result<(String, usize), FeelError> {
    let mut text = String::new();
    let mut i = 1;
    while i < chars.len() {
        match chars[i].1 {
            '"' => return Ok((text, i + 1)),
            '\\' => {
                let escaped = chars.get(i + 1).map(|(_, c)| *c);
                match escaped {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => break,
                }
                i += 2;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    Err(FeelError::syntax("unterminated string literal", chars[0].0, source))
}
