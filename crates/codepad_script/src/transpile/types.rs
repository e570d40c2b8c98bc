//! Type-syntax recognition
//!
//! Pure lookahead over the token stream. Every parser here returns the index
//! just past the type it recognised, or `None` when the tokens at that point
//! do not form a type. Nothing is rewritten.

use super::lexer::{Token, TokenKind};

/// Identifiers that can never begin a type.
const NOT_A_TYPE: &[&str] = &[
    "as", "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "export", "extends", "finally", "for", "function", "if", "implements",
    "import", "in", "instanceof", "is", "let", "return", "satisfies", "super", "switch", "throw",
    "try", "var", "while", "with", "yield",
];

pub(crate) struct Tokens<'a> {
    pub src: &'a str,
    list: Vec<Token>,
    partner: Vec<usize>,
}

impl<'a> Tokens<'a> {
    pub fn new(src: &'a str, list: Vec<Token>, partner: Vec<usize>) -> Self {
        Self { src, list, partner }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn get(&self, i: usize) -> Option<Token> {
        self.list.get(i).copied()
    }

    pub fn kind(&self, i: usize) -> Option<TokenKind> {
        self.list.get(i).map(|token| token.kind)
    }

    /// Source text of token `i`; empty past the end.
    pub fn text(&self, i: usize) -> &'a str {
        self.list
            .get(i)
            .map_or("", |token| &self.src[token.start..token.end])
    }

    /// Token `i` is the punctuator or word `text`.
    pub fn is(&self, i: usize, text: &str) -> bool {
        matches!(self.kind(i), Some(TokenKind::Punct | TokenKind::Ident)) && self.text(i) == text
    }

    /// Token `i` is a plain identifier (not a `#private` name).
    pub fn is_ident(&self, i: usize) -> bool {
        self.kind(i) == Some(TokenKind::Ident) && !self.text(i).starts_with('#')
    }

    pub fn newline_before(&self, i: usize) -> bool {
        self.list.get(i).is_some_and(|token| token.newline_before)
    }

    /// Matching bracket for a bracket token.
    pub fn partner(&self, i: usize) -> Option<usize> {
        self.partner.get(i).copied().filter(|&p| p != usize::MAX)
    }

    /// Byte offset where token `i` starts; the end of source past the last token.
    pub fn start_of(&self, i: usize) -> usize {
        self.list.get(i).map_or(self.src.len(), |token| token.start)
    }

    pub fn end_of(&self, i: usize) -> usize {
        self.list.get(i).map_or(self.src.len(), |token| token.end)
    }

    /// Index of the template tail closing the template opened at `head`.
    pub fn template_tail(&self, head: usize) -> usize {
        let mut depth = 0usize;
        for i in head + 1..self.list.len() {
            match self.list[i].kind {
                TokenKind::TemplateHead => depth += 1,
                TokenKind::TemplateTail if depth == 0 => return i,
                TokenKind::TemplateTail => depth -= 1,
                _ => {}
            }
        }
        self.list.len()
    }

    pub fn parse_type(&self, i: usize) -> Option<usize> {
        let end = self.union(i)?;
        if self.is(end, "extends") && !self.newline_before(end) {
            if let Some(check) = self.union(end + 1) {
                if self.is(check, "?") {
                    let when_true = self.parse_type(check + 1)?;
                    if !self.is(when_true, ":") {
                        return None;
                    }
                    return self.parse_type(when_true + 1);
                }
            }
        }
        Some(end)
    }

    fn union(&self, i: usize) -> Option<usize> {
        let mut i = i;
        if self.is(i, "|") || self.is(i, "&") {
            i += 1;
        }
        let mut end = self.operand(i)?;
        while self.is(end, "|") || self.is(end, "&") {
            // `||`, `&&`, `|=` and `&=` belong to the surrounding expression
            if self.adjacent_operator(end) {
                break;
            }
            end = self.operand(end + 1)?;
        }
        Some(end)
    }

    fn adjacent_operator(&self, i: usize) -> bool {
        let next = i + 1;
        self.end_of(i) == self.start_of(next)
            && matches!(self.text(next), "|" | "&" | "=")
            && self.kind(next) == Some(TokenKind::Punct)
    }

    fn operand(&self, i: usize) -> Option<usize> {
        let mut end = match self.text(i) {
            "keyof" | "readonly" | "unique" if self.kind(i) == Some(TokenKind::Ident) => {
                return self.operand(i + 1);
            }
            "infer" if self.is_ident(i + 1) => i + 2,
            "asserts" if self.is_ident(i + 1) && !self.newline_before(i + 1) => {
                if self.is(i + 2, "is") {
                    return self.parse_type(i + 3);
                }
                return Some(i + 2);
            }
            "typeof" if self.kind(i) == Some(TokenKind::Ident) => {
                let end = self.qualified_name(i + 1)?;
                if self.is(end, "<") && !self.newline_before(end) {
                    self.type_args(end)?
                } else {
                    end
                }
            }
            _ => self.primary(i)?,
        };

        while self.is(end, "[") && !self.newline_before(end) {
            end = self.partner(end)? + 1;
        }
        if self.is(end, "is") && !self.newline_before(end) && self.kind(end - 1) == Some(TokenKind::Ident) {
            return self.parse_type(end + 1);
        }
        Some(end)
    }

    fn primary(&self, i: usize) -> Option<usize> {
        let token = self.get(i)?;
        match token.kind {
            TokenKind::String | TokenKind::Number | TokenKind::Template => Some(i + 1),
            TokenKind::TemplateHead => {
                let tail = self.template_tail(i);
                (tail < self.len()).then_some(tail + 1)
            }
            TokenKind::Regex | TokenKind::TemplateMiddle | TokenKind::TemplateTail => None,
            TokenKind::Punct => match self.text(i) {
                "(" => {
                    let close = self.partner(i)?;
                    if self.is(close + 1, "=>") {
                        self.parse_type(close + 2)
                    } else if close == i + 1 {
                        None
                    } else {
                        Some(close + 1)
                    }
                }
                "<" => self.function_type(i),
                "{" | "[" => Some(self.partner(i)? + 1),
                "-" if self.kind(i + 1) == Some(TokenKind::Number) => Some(i + 2),
                _ => None,
            },
            TokenKind::Ident => match self.text(i) {
                "new" => self.function_type(i + 1),
                "abstract" if self.is(i + 1, "new") => self.function_type(i + 2),
                text if NOT_A_TYPE.contains(&text) => None,
                _ => {
                    let end = self.qualified_name(i)?;
                    if self.is(end, "<") && !self.newline_before(end) {
                        return self.type_args(end);
                    }
                    Some(end)
                }
            },
        }
    }

    /// `<T>(params) => R` or `(params) => R`
    fn function_type(&self, i: usize) -> Option<usize> {
        let open = if self.is(i, "<") { self.type_params(i)? } else { i };
        if !self.is(open, "(") {
            return None;
        }
        let close = self.partner(open)?;
        if !self.is(close + 1, "=>") {
            return None;
        }
        self.parse_type(close + 2)
    }

    fn qualified_name(&self, i: usize) -> Option<usize> {
        if !self.is_ident(i) {
            return None;
        }
        let mut end = i + 1;
        while self.is(end, ".") && self.is_ident(end + 1) {
            end += 2;
        }
        Some(end)
    }

    /// `<A, B<C>>` as used after a type name or a generic call.
    pub fn type_args(&self, i: usize) -> Option<usize> {
        if !self.is(i, "<") {
            return None;
        }
        let mut j = i + 1;
        loop {
            j = self.parse_type(j)?;
            if self.is(j, ">") {
                return Some(j + 1);
            }
            if !self.is(j, ",") {
                return None;
            }
            j += 1;
        }
    }

    /// `<T, const U extends V = W>` as declared on functions, classes and aliases.
    pub fn type_params(&self, i: usize) -> Option<usize> {
        if !self.is(i, "<") {
            return None;
        }
        let mut j = i + 1;
        loop {
            while matches!(self.text(j), "in" | "out" | "const") && self.is_ident(j + 1) {
                j += 1;
            }
            if !self.is_ident(j) || NOT_A_TYPE.contains(&self.text(j)) {
                return None;
            }
            j += 1;
            if self.is(j, "extends") {
                j = self.parse_type(j + 1)?;
            }
            if self.is(j, "=") {
                j = self.parse_type(j + 1)?;
            }
            if self.is(j, ",") {
                j += 1;
                if self.is(j, ">") {
                    return Some(j + 1);
                }
                continue;
            }
            return self.is(j, ">").then_some(j + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpile::lexer::{match_brackets, tokenize};

    fn tokens(src: &str) -> Tokens<'_> {
        let list = tokenize(src).unwrap();
        let partner = match_brackets(src, &list).unwrap();
        Tokens::new(src, list, partner)
    }

    /// Text of the type recognised at the start of `src`.
    fn parsed(src: &str) -> Option<&str> {
        let tokens = tokens(src);
        let end = tokens.parse_type(0)?;
        Some(&src[..tokens.end_of(end - 1)])
    }

    #[test]
    fn test_simple_and_generic_types() {
        assert_eq!(parsed("number = 5"), Some("number"));
        assert_eq!(parsed("Map<string, Array<number>> = x"), Some("Map<string, Array<number>>"));
        assert_eq!(parsed("string[][] ;"), Some("string[][]"));
        assert_eq!(parsed("ns.Inner<T> ;"), Some("ns.Inner<T>"));
    }

    #[test]
    fn test_composite_types() {
        assert_eq!(parsed("'a' | 'b' | null;"), Some("'a' | 'b' | null"));
        assert_eq!(parsed("A & { b: number } ="), Some("A & { b: number }"));
        assert_eq!(parsed("(a: string, b?: number) => void;"), Some("(a: string, b?: number) => void"));
        assert_eq!(parsed("[string, number] ="), Some("[string, number]"));
        assert_eq!(parsed("keyof typeof config;"), Some("keyof typeof config"));
        assert_eq!(
            parsed("T extends string ? 'str' : never;"),
            Some("T extends string ? 'str' : never")
        );
        assert_eq!(parsed("value is string;"), Some("value is string"));
    }

    #[test]
    fn test_logical_operators_end_a_type() {
        assert_eq!(parsed("Foo || fallback"), Some("Foo"));
        assert_eq!(parsed("Foo && other"), Some("Foo"));
    }

    #[test]
    fn test_not_a_type() {
        assert_eq!(parsed("= 5"), None);
        assert_eq!(parsed("return x"), None);
        assert_eq!(parsed("()"), None);
    }

    #[test]
    fn test_type_args_reject_comparisons() {
        let src = "i < items.length; i++";
        assert_eq!(tokens(src).type_args(1), None);

        let src = "f<string, number>(x)";
        let tokens = tokens(src);
        let end = tokens.type_args(1).unwrap();
        assert!(tokens.is(end, "("));
    }

    #[test]
    fn test_type_params() {
        let src = "<T extends object = {}, const U>(x)";
        let tokens = tokens(src);
        let end = tokens.type_params(0).unwrap();
        assert!(tokens.is(end, "("));
        assert_eq!(tokens.type_params(1), None);
    }
}
