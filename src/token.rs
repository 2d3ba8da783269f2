use crate::error::TokenizeError;
use core::str::Chars;

/// A lexical unit of a template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Literal text, with escapes already resolved.
    Literal(String),

    /// The raw contents of a `{...}` reference, e.g. `major` or `release:02d`.
    Variable(String),

    /// Scanning failed. Always the last token produced.
    Error(TokenizeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    TextEscape,
    NameFirst,
    NameRest,
    SpecStart,
    SpecWidth,
    SpecType,
    SpecClose,
    Done,
}

/// A pull-based scanner over a template string, yielding one [`Token`] per lexical unit.
///
/// The scanner is a single left-to-right pass. It stops after the first [`Token::Error`].
pub(crate) struct Tokenizer<'t> {
    chars: Chars<'t>,
    state: State,
    pending: String,
}

impl<'t> Tokenizer<'t> {
    pub(crate) fn new(template: &'t str) -> Self {
        Self {
            chars: template.chars(),
            state: State::Text,
            pending: String::new(),
        }
    }

    fn fail(&mut self, err: TokenizeError) -> Option<Token> {
        self.state = State::Done;
        Some(Token::Error(err))
    }

    fn take_pending(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }
}

impl<'t> Iterator for Tokenizer<'t> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        use State::*;

        loop {
            if self.state == Done {
                return None;
            }

            let Some(c) = self.chars.next() else {
                return match self.state {
                    Text => {
                        self.state = Done;
                        if self.pending.is_empty() {
                            None
                        } else {
                            Some(Token::Literal(self.take_pending()))
                        }
                    }
                    _ => self.fail(TokenizeError::MalformedEnd),
                };
            };

            match self.state {
                Text => match c {
                    '{' => {
                        self.state = NameFirst;
                        if !self.pending.is_empty() {
                            return Some(Token::Literal(self.take_pending()));
                        }
                    }
                    '\\' => self.state = TextEscape,
                    _ => self.pending.push(c),
                },
                TextEscape => match c {
                    '{' | '\\' => {
                        self.pending.push(c);
                        self.state = Text;
                    }
                    _ => return self.fail(TokenizeError::UnknownEscape),
                },
                NameFirst => match c {
                    '}' => return self.fail(TokenizeError::EmptyVariable),
                    c if c.is_alphabetic() => {
                        self.pending.push(c);
                        self.state = NameRest;
                    }
                    _ => return self.fail(TokenizeError::InvalidNameStart),
                },
                NameRest => match c {
                    '}' => {
                        self.state = Text;
                        return Some(Token::Variable(self.take_pending()));
                    }
                    ':' => {
                        self.pending.push(c);
                        self.state = SpecStart;
                    }
                    c if c.is_alphanumeric() || c == '-' => self.pending.push(c),
                    _ => return self.fail(TokenizeError::InvalidNameChar),
                },
                SpecStart => match c {
                    '0' => {
                        self.pending.push(c);
                        self.state = SpecWidth;
                    }
                    _ => return self.fail(TokenizeError::ZeroFillExpected),
                },
                SpecWidth => match c {
                    c if c.is_ascii_digit() => {
                        self.pending.push(c);
                        self.state = SpecType;
                    }
                    _ => return self.fail(TokenizeError::WidthDigitExpected),
                },
                SpecType => match c {
                    'd' => {
                        self.pending.push(c);
                        self.state = SpecClose;
                    }
                    _ => return self.fail(TokenizeError::DecimalTypeExpected),
                },
                SpecClose => match c {
                    '}' => {
                        self.state = Text;
                        return Some(Token::Variable(self.take_pending()));
                    }
                    _ => return self.fail(TokenizeError::SpecifierCloseExpected),
                },
                Done => unreachable!("checked at the top of the loop"),
            }
        }
    }
}

pub(crate) fn tokenize(template: &str) -> Tokenizer<'_> {
    Tokenizer::new(template)
}
