//! Tokenizer for the TypeScript eraser
//!
//! Produces only the tokens the eraser needs to recognise type syntax.
//! Comments and whitespace are trivia: they stay in the source text and are
//! copied through untouched. Multi-character operators are kept as single
//! characters except where the eraser must tell them apart (`=>`, `...`,
//! `?.`, `??`, `++`, `--` and the equality operators), so `>>` in nested
//! type arguments is two `>` tokens.

use super::TranspileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// Identifiers, keywords and `#private` names
    Ident,
    Number,
    String,
    Regex,
    /// Template literal without substitutions
    Template,
    /// `` `...${ ``
    TemplateHead,
    /// `` }...${ ``
    TemplateMiddle,
    /// `` }...` ``
    TemplateTail,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
}

/// Keywords after which an expression (not an operator) is expected.
pub(crate) const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await", "extends", "let", "const", "var", "export", "import", "default",
    "if", "while", "for", "switch", "catch", "with", "function", "class",
];

const PUNCTUATORS: &[&str] = &[
    "...", "===", "!==", "=>", "==", "!=", "?.", "??", "++", "--",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Brace {
    Block,
    Substitution,
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    braces: Vec<Brace>,
    newline: bool,
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, TranspileError> {
    let mut lexer = Lexer {
        src,
        bytes: src.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
        braces: Vec::new(),
        newline: false,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), TranspileError> {
        loop {
            self.skip_trivia()?;
            let Some(c) = self.peek_char() else {
                return Ok(());
            };
            let start = self.pos;

            if c == '#' && self.char_at(start + 1).is_some_and(is_ident_start) {
                self.pos += 1;
                self.eat_ident();
                self.push(TokenKind::Ident, start);
            } else if is_ident_start(c) {
                self.eat_ident();
                self.push(TokenKind::Ident, start);
            } else if c.is_ascii_digit()
                || (c == '.' && self.byte_at(start + 1).is_some_and(|b| b.is_ascii_digit()))
            {
                self.eat_number();
                self.push(TokenKind::Number, start);
            } else if c == '"' || c == '\'' {
                self.eat_string(c)?;
                self.push(TokenKind::String, start);
            } else if c == '`' {
                self.pos += 1;
                let kind = self.eat_template(start, TokenKind::Template, TokenKind::TemplateHead)?;
                self.push(kind, start);
            } else if c == '}' && self.braces.last() == Some(&Brace::Substitution) {
                self.braces.pop();
                self.pos += 1;
                let kind =
                    self.eat_template(start, TokenKind::TemplateTail, TokenKind::TemplateMiddle)?;
                self.push(kind, start);
            } else if c == '/' && self.regex_allowed() {
                self.eat_regex()?;
                self.push(TokenKind::Regex, start);
            } else {
                self.eat_punct(c);
                self.push(TokenKind::Punct, start);
            }
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
            newline_before: self.newline,
        });
        self.newline = false;
    }

    fn peek_char(&self) -> Option<char> {
        self.char_at(self.pos)
    }

    fn char_at(&self, at: usize) -> Option<char> {
        self.src.get(at..)?.chars().next()
    }

    fn byte_at(&self, at: usize) -> Option<u8> {
        self.bytes.get(at).copied()
    }

    fn error(&self, at: usize, message: &str) -> TranspileError {
        TranspileError::at(self.src, at, message)
    }

    fn skip_trivia(&mut self) -> Result<(), TranspileError> {
        while let Some(c) = self.peek_char() {
            match c {
                '\n' | '\r' | '\u{2028}' | '\u{2029}' => {
                    self.newline = true;
                    self.pos += c.len_utf8();
                }
                c if c.is_whitespace() || c == '\u{feff}' => self.pos += c.len_utf8(),
                '/' if self.byte_at(self.pos + 1) == Some(b'/') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.pos += c.len_utf8();
                    }
                }
                '/' if self.byte_at(self.pos + 1) == Some(b'*') => {
                    let start = self.pos;
                    let Some(close) = self.src[start + 2..].find("*/") else {
                        return Err(self.error(start, "unterminated comment"));
                    };
                    let end = start + 2 + close + 2;
                    if self.src[start..end].contains('\n') {
                        self.newline = true;
                    }
                    self.pos = end;
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn eat_ident(&mut self) {
        while let Some(c) = self.peek_char() {
            if !is_ident_continue(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat_number(&mut self) {
        let hex = matches!(self.src.get(self.pos..self.pos + 2), Some("0x" | "0X"));
        let mut previous = '\0';
        while let Some(c) = self.peek_char() {
            let exponent_sign =
                (c == '+' || c == '-') && (previous == 'e' || previous == 'E') && !hex;
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign) {
                break;
            }
            previous = c;
            self.pos += 1;
        }
    }

    fn eat_string(&mut self, quote: char) -> Result<(), TranspileError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek_char() {
            match c {
                '\\' => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek_char() {
                        self.pos += escaped.len_utf8();
                    }
                }
                '\n' | '\r' => break,
                c if c == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                c => self.pos += c.len_utf8(),
            }
        }
        Err(self.error(start, "unterminated string literal"))
    }

    /// Scan template text after a `` ` `` or substitution-closing `}`.
    fn eat_template(
        &mut self,
        start: usize,
        closed: TokenKind,
        open: TokenKind,
    ) -> Result<TokenKind, TranspileError> {
        while let Some(c) = self.peek_char() {
            match c {
                '\\' => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek_char() {
                        self.pos += escaped.len_utf8();
                    }
                }
                '`' => {
                    self.pos += 1;
                    return Ok(closed);
                }
                '$' if self.byte_at(self.pos + 1) == Some(b'{') => {
                    self.pos += 2;
                    self.braces.push(Brace::Substitution);
                    return Ok(open);
                }
                c => self.pos += c.len_utf8(),
            }
        }
        Err(self.error(start, "unterminated template literal"))
    }

    fn eat_regex(&mut self) -> Result<(), TranspileError> {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        loop {
            let Some(c) = self.peek_char() else {
                return Err(self.error(start, "unterminated regular expression"));
            };
            match c {
                '\n' | '\r' => return Err(self.error(start, "unterminated regular expression")),
                '\\' => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek_char() {
                        if escaped == '\n' || escaped == '\r' {
                            return Err(self.error(start, "unterminated regular expression"));
                        }
                        self.pos += escaped.len_utf8();
                    }
                    continue;
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    self.pos += 1;
                    self.eat_ident();
                    return Ok(());
                }
                _ => {}
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat_punct(&mut self, c: char) {
        let rest = &self.src[self.pos..];
        for punct in PUNCTUATORS {
            if rest.starts_with(punct) {
                // `a?.5:b` is a conditional, not optional chaining
                if *punct == "?." && rest[2..].starts_with(|d: char| d.is_ascii_digit()) {
                    continue;
                }
                self.pos += punct.len();
                return;
            }
        }
        match c {
            '{' => self.braces.push(Brace::Block),
            '}' => {
                self.braces.pop();
            }
            _ => {}
        }
        self.pos += c.len_utf8();
    }

    /// Whether a `/` here starts a regular expression rather than division.
    fn regex_allowed(&self) -> bool {
        let Some(previous) = self.tokens.last() else {
            return true;
        };
        let text = &self.src[previous.start..previous.end];
        match previous.kind {
            TokenKind::Ident => EXPRESSION_KEYWORDS.contains(&text),
            TokenKind::Punct => !matches!(text, ")" | "]" | "}" | "++" | "--"),
            TokenKind::TemplateHead | TokenKind::TemplateMiddle => true,
            TokenKind::Number
            | TokenKind::String
            | TokenKind::Regex
            | TokenKind::Template
            | TokenKind::TemplateTail => false,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_alphanumeric() || c == '\u{200c}' || c == '\u{200d}'
}

/// Pair every bracket with its partner.
///
/// `partner[i]` is the index of the matching bracket for an opening or
/// closing bracket token, and `usize::MAX` for every other token. Template
/// substitutions must be balanced internally.
pub(crate) fn match_brackets(src: &str, tokens: &[Token]) -> Result<Vec<usize>, TranspileError> {
    let mut partner = vec![usize::MAX; tokens.len()];
    let mut open: Vec<usize> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        let text = &src[token.start..token.end];
        match token.kind {
            TokenKind::Punct if matches!(text, "(" | "[" | "{") => open.push(index),
            TokenKind::Punct if matches!(text, ")" | "]" | "}") => {
                let Some(opener) = open.pop() else {
                    return Err(TranspileError::at(
                        src,
                        token.start,
                        &format!("unexpected `{text}`"),
                    ));
                };
                let expected = closer_for(&src[tokens[opener].start..tokens[opener].end]);
                if expected != Some(text) {
                    let message = match expected {
                        Some(expected) => format!("unexpected `{text}`; expected `{expected}`"),
                        None => format!("unexpected `{text}` inside template substitution"),
                    };
                    return Err(TranspileError::at(src, token.start, &message));
                }
                partner[opener] = index;
                partner[index] = opener;
            }
            TokenKind::TemplateHead => open.push(index),
            TokenKind::TemplateMiddle | TokenKind::TemplateTail => {
                match open.pop() {
                    Some(opener)
                        if matches!(
                            tokens[opener].kind,
                            TokenKind::TemplateHead | TokenKind::TemplateMiddle
                        ) => {}
                    Some(opener) => {
                        let text = &src[tokens[opener].start..tokens[opener].end];
                        return Err(TranspileError::at(
                            src,
                            tokens[opener].start,
                            &format!("`{text}` is never closed"),
                        ));
                    }
                    None => {
                        return Err(TranspileError::at(src, token.start, "unexpected `}`"));
                    }
                }
                if token.kind == TokenKind::TemplateMiddle {
                    open.push(index);
                }
            }
            _ => {}
        }
    }

    if let Some(&opener) = open.last() {
        let token = tokens[opener];
        let message = match token.kind {
            TokenKind::Punct => format!("`{}` is never closed", &src[token.start..token.end]),
            _ => "template substitution is never closed".to_string(),
        };
        return Err(TranspileError::at(src, token.start, &message));
    }

    Ok(partner)
}

fn closer_for(opener: &str) -> Option<&'static str> {
    match opener {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|token| (token.kind, &src[token.start..token.end]))
            .collect()
    }

    #[test]
    fn test_nested_generics_split_angle_brackets() {
        let tokens = kinds("Map<string, Array<number>>");
        let texts: Vec<&str> = tokens.iter().map(|(_, text)| *text).collect();
        assert_eq!(
            texts,
            vec!["Map", "<", "string", ",", "Array", "<", "number", ">", ">"]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        let tokens = kinds("a / b; x = /re[/]x/g;");
        assert_eq!(tokens[1], (TokenKind::Punct, "/"));
        assert!(tokens.contains(&(TokenKind::Regex, "/re[/]x/g")));
    }

    #[test]
    fn test_template_substitutions() {
        let tokens = kinds("`a ${b({})} c ${d} e`");
        assert_eq!(tokens[0], (TokenKind::TemplateHead, "`a ${"));
        assert!(tokens.contains(&(TokenKind::TemplateMiddle, "} c ${")));
        assert_eq!(tokens.last(), Some(&(TokenKind::TemplateTail, "} e`")));
    }

    #[test]
    fn test_comments_are_trivia() {
        let tokens = tokenize("a // note\n/* block */ b").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].newline_before);
    }

    #[test]
    fn test_unterminated_literals() {
        assert!(tokenize("const s = \"open").is_err());
        assert!(tokenize("const t = `open").is_err());
        assert!(tokenize("/* open").is_err());
        assert!(tokenize("x = /open\n").is_err());
    }

    #[test]
    fn test_bracket_partners() {
        let src = "f(a[0], { b: 1 })";
        let tokens = tokenize(src).unwrap();
        let partner = match_brackets(src, &tokens).unwrap();
        assert_eq!(partner[1], tokens.len() - 1);
        assert_eq!(partner[tokens.len() - 1], 1);
    }

    #[test]
    fn test_mismatched_brackets() {
        let src = "f(a]";
        let err = match_brackets(src, &tokenize(src).unwrap()).unwrap_err();
        assert!(err.message.contains("expected `)`"));

        let src = "function f() {";
        let err = match_brackets(src, &tokenize(src).unwrap()).unwrap_err();
        assert_eq!(err.message, "`{` is never closed");
        assert_eq!((err.line, err.column), (1, 14));
    }
}
