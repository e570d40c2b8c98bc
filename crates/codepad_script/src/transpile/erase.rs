//! Type erasure
//!
//! Walks the token stream once, copying source text through and dropping
//! type-only syntax. Every erased span is replaced by the line breaks it
//! contained, so line numbers in the output match the input. Enums and
//! constructor parameter properties are the only constructs that emit new
//! code.

use super::lexer::{TokenKind, EXPRESSION_KEYWORDS};
use super::types::Tokens;
use super::TranspileError;

const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "readonly", "override", "declare", "abstract", "static",
    "async", "get", "set", "accessor",
];

const PARAMETER_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

/// Where a newline may end the construct being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Asi {
    Never,
    Statement,
    Member,
}

/// Value the next enum member without an initializer receives.
enum EnumCursor {
    Next(f64),
    /// One more than the named member, computed at run time.
    After(String),
    Unknown,
}

pub(crate) struct Eraser<'a> {
    tokens: Tokens<'a>,
    out: String,
    /// Source bytes before this offset have been written to `out`.
    copied: usize,
}

impl<'a> Eraser<'a> {
    pub fn new(tokens: Tokens<'a>) -> Self {
        let capacity = tokens.src.len();
        Self {
            tokens,
            out: String::with_capacity(capacity),
            copied: 0,
        }
    }

    pub fn run(mut self) -> Result<String, TranspileError> {
        let len = self.tokens.len();
        self.walk_until(0, len, &[], Asi::Never)?;
        self.copy_to(self.tokens.src.len());
        Ok(self.out)
    }

    // Output

    fn copy_to(&mut self, offset: usize) {
        if offset > self.copied {
            self.out.push_str(&self.tokens.src[self.copied..offset]);
            self.copied = offset;
        }
    }

    fn erase_span(&mut self, from: usize, to: usize) {
        let from = from.max(self.copied);
        if to <= from {
            return;
        }
        self.copy_to(from);
        let src = self.tokens.src;
        let newlines = src[from..to].matches('\n').count();
        if newlines == 0 {
            let joins_words = self.out.ends_with(is_word_char)
                && src[to..].starts_with(is_word_char);
            if joins_words {
                self.out.push(' ');
            }
        }
        self.out.extend(std::iter::repeat('\n').take(newlines));
        self.copied = to;
    }

    /// Erase tokens `first..end` together with the whitespace before them.
    fn erase_attached(&mut self, first: usize, end: usize) {
        let from = if first == 0 {
            self.tokens.start_of(first)
        } else {
            self.tokens.end_of(first - 1)
        };
        self.erase_span(from, self.tokens.end_of(end - 1));
    }

    /// Erase token `i` and the whitespace after it.
    fn erase_leading(&mut self, i: usize) {
        self.erase_span(self.tokens.start_of(i), self.tokens.start_of(i + 1));
    }

    fn erase_token(&mut self, i: usize) {
        self.erase_span(self.tokens.start_of(i), self.tokens.end_of(i));
    }

    fn replace(&mut self, from: usize, to: usize, text: &str) {
        let from = from.max(self.copied);
        self.copy_to(from);
        self.out.push_str(text);
        let newlines = self.tokens.src[from..to].matches('\n').count();
        self.out.extend(std::iter::repeat('\n').take(newlines));
        self.copied = to;
    }

    fn insert(&mut self, offset: usize, text: &str) {
        self.copy_to(offset);
        self.out.push_str(text);
    }

    fn error(&self, i: usize, message: &str) -> TranspileError {
        TranspileError::at(self.tokens.src, self.tokens.start_of(i), message)
    }

    fn close_of(&self, i: usize) -> Result<usize, TranspileError> {
        self.tokens
            .partner(i)
            .ok_or_else(|| self.error(i, "unbalanced bracket"))
    }

    fn expect_type(&self, i: usize) -> Result<usize, TranspileError> {
        self.tokens
            .parse_type(i)
            .ok_or_else(|| self.error(i, "expected a type"))
    }

    // Walking

    /// Process tokens from `from` until `limit`, a stop punctuator at this
    /// nesting level, or (per `asi`) a line break that ends the construct.
    /// Returns the index where walking stopped.
    fn walk_until(
        &mut self,
        from: usize,
        limit: usize,
        stops: &[&str],
        asi: Asi,
    ) -> Result<usize, TranspileError> {
        let mut i = from;
        while i < limit {
            if self.tokens.kind(i) == Some(TokenKind::Punct) && stops.contains(&self.tokens.text(i)) {
                return Ok(i);
            }
            if i > from && self.asi_break(i, asi) {
                return Ok(i);
            }
            i = self.step(i)?;
        }
        Ok(i)
    }

    fn asi_break(&self, i: usize, asi: Asi) -> bool {
        if asi == Asi::Never || !self.tokens.newline_before(i) || !self.ends_expression(i - 1) {
            return false;
        }
        let text = self.tokens.text(i);
        match self.tokens.kind(i) {
            Some(TokenKind::Ident) => {
                !matches!(text, "in" | "instanceof" | "as" | "satisfies" | "of")
            }
            Some(TokenKind::Number | TokenKind::String | TokenKind::Template | TokenKind::TemplateHead) => true,
            Some(TokenKind::Punct) => asi == Asi::Member && matches!(text, "[" | "*" | "@"),
            _ => false,
        }
    }

    fn step(&mut self, i: usize) -> Result<usize, TranspileError> {
        match self.tokens.kind(i) {
            Some(TokenKind::Ident) => self.ident(i),
            Some(TokenKind::Punct) => self.punct(i),
            Some(TokenKind::TemplateHead) => {
                let tail = self.tokens.template_tail(i);
                self.walk_until(i + 1, tail, &[], Asi::Never)?;
                Ok(tail + 1)
            }
            _ => Ok(i + 1),
        }
    }

    fn ident(&mut self, i: usize) -> Result<usize, TranspileError> {
        if i > 0 && (self.tokens.is(i - 1, ".") || self.tokens.is(i - 1, "?.")) {
            return Ok(i + 1);
        }
        let statement = self.at_statement_start(i);
        let t = &self.tokens;
        match t.text(i) {
            "interface" if statement && t.is_ident(i + 1) => self.interface(i),
            "type" if statement && t.is_ident(i + 1) && (t.is(i + 2, "=") || t.is(i + 2, "<")) => {
                self.type_alias(i)
            }
            "declare" if statement && t.is_ident(i + 1) && !t.newline_before(i + 1) => self.declare(i),
            "namespace" | "module"
                if statement && t.is_ident(i + 1) && (t.is(i + 2, "{") || t.is(i + 2, ".")) =>
            {
                Err(self.error(i, "namespace declarations are not supported"))
            }
            "abstract" if t.is(i + 1, "class") => {
                self.erase_leading(i);
                Ok(i + 1)
            }
            "enum" if t.is_ident(i + 1) => self.enumeration(i, i),
            "const" if t.is(i + 1, "enum") => self.enumeration(i, i + 1),
            "let" | "const" | "var" if t.is_ident(i + 1) || t.is(i + 1, "{") || t.is(i + 1, "[") => {
                self.declaration(i)
            }
            "function" => self.function(i),
            "class" => self.class(i),
            "as" | "satisfies" if i > 0 && self.ends_expression(i - 1) => self.type_assertion(i),
            "import" => self.import(i),
            "export" => self.export(i),
            "catch" if t.is(i + 1, "(") => self.catch_clause(i),
            "if" | "while" | "for" | "switch" | "with" => self.control(i),
            _ => Ok(i + 1),
        }
    }

    fn punct(&mut self, i: usize) -> Result<usize, TranspileError> {
        match self.tokens.text(i) {
            "(" => self.paren(i),
            "{" | "[" => {
                let close = self.close_of(i)?;
                self.walk_until(i + 1, close, &[], Asi::Never)?;
                Ok(close + 1)
            }
            "<" => self.angle(i),
            "!" => self.non_null(i),
            _ => Ok(i + 1),
        }
    }

    fn at_statement_start(&self, i: usize) -> bool {
        i == 0
            || self.tokens.newline_before(i)
            || matches!(
                self.tokens.text(i - 1),
                ";" | "{" | "}" | "export" | "default" | "declare"
            )
    }

    /// Byte offset where the declaration whose keyword is at `i` begins,
    /// including any `export`, `default`, `declare` or `async` before it.
    fn decl_start(&self, i: usize) -> usize {
        let mut start = i;
        while start > 0
            && self.tokens.kind(start - 1) == Some(TokenKind::Ident)
            && matches!(self.tokens.text(start - 1), "export" | "default" | "declare" | "async")
        {
            start -= 1;
        }
        self.tokens.start_of(start)
    }

    fn ends_expression(&self, i: usize) -> bool {
        let text = self.tokens.text(i);
        match self.tokens.kind(i) {
            Some(TokenKind::Ident) => !EXPRESSION_KEYWORDS.contains(&text),
            Some(TokenKind::Punct) => matches!(text, ")" | "]" | "}" | "++" | "--"),
            Some(TokenKind::TemplateHead | TokenKind::TemplateMiddle) | None => false,
            Some(_) => true,
        }
    }

    /// Index just past a declaration with no body of its own: through its `;`,
    /// or up to the first line break that cannot continue it.
    fn statement_end(&self, from: usize, limit: usize) -> usize {
        let mut t = from;
        while t < limit {
            if t > from && self.tokens.newline_before(t) && !self.continues(t - 1) && !self.continues_at(t) {
                return t;
            }
            if self.tokens.is(t, ";") {
                return t + 1;
            }
            t = match self.tokens.partner(t) {
                Some(close) if close > t => close + 1,
                _ => t + 1,
            };
        }
        limit
    }

    fn continues(&self, i: usize) -> bool {
        matches!(
            self.tokens.text(i),
            "|" | "&" | "," | ":" | "=" | "=>" | "<" | "." | "?" | "extends" | "implements" | "keyof"
                | "typeof" | "is" | "readonly" | "unique" | "infer" | "new" | "declare" | "abstract"
                | "export"
        )
    }

    fn continues_at(&self, i: usize) -> bool {
        matches!(
            self.tokens.text(i),
            "|" | "&" | "." | "=>" | "?" | ":" | "{" | "extends" | "implements"
        )
    }

    // Expressions

    fn paren(&mut self, i: usize) -> Result<usize, TranspileError> {
        let close = self.close_of(i)?;
        let after = close + 1;
        let mut return_type = None;
        let mut callable = self.tokens.is(after, "=>");

        if !callable && self.tokens.is(after, ":") {
            if let Some(end) = self.tokens.parse_type(after + 1) {
                if self.tokens.is(end, "=>") || (self.tokens.is(end, "{") && self.method_head(i)) {
                    callable = true;
                    return_type = Some(end);
                }
            }
        } else if !callable
            && self.tokens.is(after, "{")
            && !self.tokens.newline_before(after)
            && self.method_head(i)
        {
            callable = true;
        }

        if !callable {
            self.walk_until(i + 1, close, &[], Asi::Never)?;
            return Ok(after);
        }

        self.params(i, close)?;
        match return_type {
            Some(end) => {
                self.erase_attached(after, end);
                Ok(end)
            }
            None => Ok(after),
        }
    }

    /// The parenthesis at `open` follows a method name in an object literal.
    fn method_head(&self, open: usize) -> bool {
        if open == 0 {
            return false;
        }
        let previous = open - 1;
        match self.tokens.kind(previous) {
            Some(TokenKind::Ident) => !EXPRESSION_KEYWORDS.contains(&self.tokens.text(previous)),
            Some(TokenKind::String | TokenKind::Number) => true,
            Some(TokenKind::Punct) => matches!(self.tokens.text(previous), "]" | ">"),
            _ => false,
        }
    }

    fn control(&mut self, i: usize) -> Result<usize, TranspileError> {
        let mut open = i + 1;
        if self.tokens.text(i) == "for" && self.tokens.is(open, "await") {
            open += 1;
        }
        if !self.tokens.is(open, "(") {
            return Ok(i + 1);
        }
        let close = self.close_of(open)?;
        self.walk_until(open + 1, close, &[], Asi::Never)?;
        Ok(close + 1)
    }

    fn catch_clause(&mut self, i: usize) -> Result<usize, TranspileError> {
        let open = i + 1;
        let close = self.close_of(open)?;
        let mut j = open + 1;
        j = if self.tokens.is(j, "{") || self.tokens.is(j, "[") {
            self.close_of(j)? + 1
        } else {
            j + 1
        };
        if self.tokens.is(j, ":") {
            let end = self.expect_type(j + 1)?;
            self.erase_attached(j, end);
        }
        Ok(close + 1)
    }

    /// `f<T>(x)`, `` tag<T>`...` `` and `<T>(x: T) => x`
    fn angle(&mut self, i: usize) -> Result<usize, TranspileError> {
        if i > 0 && self.tokens.kind(i - 1) == Some(TokenKind::Ident) && self.ends_expression(i - 1) {
            if let Some(end) = self.tokens.type_args(i) {
                let called = self.tokens.is(end, "(")
                    || matches!(
                        self.tokens.kind(end),
                        Some(TokenKind::Template | TokenKind::TemplateHead)
                    );
                if called {
                    self.erase_attached(i, end);
                    return Ok(end);
                }
            }
            return Ok(i + 1);
        }

        if i > 0 && self.ends_expression(i - 1) {
            return Ok(i + 1);
        }
        if let Some(end) = self.tokens.type_params(i) {
            if self.tokens.is(end, "(") {
                if let Some(close) = self.tokens.partner(end) {
                    if self.tokens.is(close + 1, "=>") || self.tokens.is(close + 1, ":") {
                        self.erase_span(self.tokens.start_of(i), self.tokens.start_of(end));
                        return Ok(end);
                    }
                }
            }
        }
        Ok(i + 1)
    }

    /// Postfix `!` asserting a value is not null.
    fn non_null(&mut self, i: usize) -> Result<usize, TranspileError> {
        if i == 0 || self.tokens.newline_before(i) {
            return Ok(i + 1);
        }
        let operand = match self.tokens.kind(i - 1) {
            Some(TokenKind::Ident) => !EXPRESSION_KEYWORDS.contains(&self.tokens.text(i - 1)),
            Some(TokenKind::Punct) => matches!(self.tokens.text(i - 1), ")" | "]"),
            _ => false,
        };
        let next = i + 1;
        let follows = next >= self.tokens.len()
            || self.tokens.newline_before(next)
            || matches!(
                self.tokens.text(next),
                "." | "?." | ")" | "]" | "," | ";" | "[" | "}" | ":" | "(" | "=" | "==" | "==="
                    | "!=" | "!==" | "??" | "?"
            );
        if operand && follows {
            self.erase_token(i);
        }
        Ok(i + 1)
    }

    fn type_assertion(&mut self, i: usize) -> Result<usize, TranspileError> {
        let end = if self.tokens.is(i + 1, "const") {
            i + 2
        } else {
            match self.tokens.parse_type(i + 1) {
                Some(end) => end,
                None => return Ok(i + 1),
            }
        };
        self.erase_attached(i, end);
        Ok(end)
    }

    // Bindings

    /// Parameter list between `open` and `close`. Returns the names declared
    /// with an access modifier.
    fn params(&mut self, open: usize, close: usize) -> Result<Vec<&'a str>, TranspileError> {
        let mut properties = Vec::new();
        let mut j = open + 1;
        while j < close {
            if self.tokens.is(j, "this")
                && (self.tokens.is(j + 1, ":") || self.tokens.is(j + 1, ",") || j + 1 == close)
            {
                let mut end = if self.tokens.is(j + 1, ":") {
                    self.expect_type(j + 2)?
                } else {
                    j + 1
                };
                if self.tokens.is(end, ",") {
                    end += 1;
                }
                self.erase_span(self.tokens.start_of(j), self.tokens.start_of(end));
                j = end;
                continue;
            }

            let mut property = false;
            while PARAMETER_MODIFIERS.contains(&self.tokens.text(j))
                && (self.tokens.is_ident(j + 1) || self.tokens.is(j + 1, "{") || self.tokens.is(j + 1, "["))
            {
                self.erase_leading(j);
                property = true;
                j += 1;
            }
            if self.tokens.is(j, "...") {
                j += 1;
            }

            if self.tokens.is(j, "{") || self.tokens.is(j, "[") {
                let pattern_close = self.close_of(j)?;
                self.walk_until(j + 1, pattern_close, &[], Asi::Never)?;
                j = pattern_close + 1;
            } else if self.tokens.is_ident(j) {
                if property {
                    properties.push(self.tokens.text(j));
                }
                j += 1;
            } else {
                j = self.walk_until(j, close, &[","], Asi::Never)?;
            }

            if self.tokens.is(j, "?") {
                self.erase_token(j);
                j += 1;
            }
            if self.tokens.is(j, ":") {
                let end = self.expect_type(j + 1)?;
                self.erase_attached(j, end);
                j = end;
            }
            if self.tokens.is(j, "=") {
                j = self.walk_until(j + 1, close, &[","], Asi::Never)?;
            }
            if self.tokens.is(j, ",") {
                j += 1;
            } else if j < close {
                return Err(self.error(j, "expected `,` or `)` in parameter list"));
            }
        }
        Ok(properties)
    }

    /// `let`, `const` and `var` declarations.
    fn declaration(&mut self, keyword: usize) -> Result<usize, TranspileError> {
        let mut j = keyword + 1;
        loop {
            if self.tokens.is(j, "{") || self.tokens.is(j, "[") {
                let close = self.close_of(j)?;
                self.walk_until(j + 1, close, &[], Asi::Never)?;
                j = close + 1;
            } else if self.tokens.is_ident(j) {
                j += 1;
            } else {
                return Ok(j);
            }

            if self.tokens.is(j, "!") && self.tokens.is(j + 1, ":") {
                self.erase_token(j);
                j += 1;
            }
            if self.tokens.is(j, ":") {
                let end = self.expect_type(j + 1)?;
                self.erase_attached(j, end);
                j = end;
            }
            if self.tokens.is(j, "=") {
                let len = self.tokens.len();
                j = self.walk_until(j + 1, len, &[",", ";", ")", "]", "}"], Asi::Statement)?;
            }
            if !self.tokens.is(j, ",") {
                return Ok(j);
            }
            j += 1;
        }
    }

    // Declarations

    fn function(&mut self, keyword: usize) -> Result<usize, TranspileError> {
        let mut j = keyword + 1;
        if self.tokens.is(j, "*") {
            j += 1;
        }
        if self.tokens.is_ident(j) {
            j += 1;
        }
        let generics = if self.tokens.is(j, "<") {
            let end = self
                .tokens
                .type_params(j)
                .ok_or_else(|| self.error(j, "malformed type parameter list"))?;
            let span = (j, end);
            j = end;
            Some(span)
        } else {
            None
        };
        if !self.tokens.is(j, "(") {
            return Ok(j);
        }

        let open = j;
        let close = self.close_of(open)?;
        let mut body = close + 1;
        let returns = self.tokens.is(body, ":");
        if returns {
            body = self.expect_type(body + 1)?;
        }

        if !self.tokens.is(body, "{") {
            // Overload signature or ambient declaration
            let mut end = body;
            if self.tokens.is(end, ";") {
                end += 1;
            }
            self.erase_span(self.decl_start(keyword), self.tokens.end_of(end - 1));
            return Ok(end);
        }

        if let Some((start, end)) = generics {
            self.erase_attached(start, end);
        }
        self.params(open, close)?;
        if returns {
            self.erase_attached(close + 1, body);
        }
        let body_close = self.close_of(body)?;
        self.walk_until(body + 1, body_close, &[], Asi::Never)?;
        Ok(body_close + 1)
    }

    fn class(&mut self, keyword: usize) -> Result<usize, TranspileError> {
        let mut j = keyword + 1;
        if self.tokens.is_ident(j) && !matches!(self.tokens.text(j), "extends" | "implements") {
            j += 1;
        }
        if self.tokens.is(j, "<") {
            let end = self
                .tokens
                .type_params(j)
                .ok_or_else(|| self.error(j, "malformed type parameter list"))?;
            self.erase_attached(j, end);
            j = end;
        }

        let derived = self.tokens.is(j, "extends");
        if derived {
            j += 1;
            while j < self.tokens.len() && !self.tokens.is(j, "{") && !self.tokens.is(j, "implements") {
                if self.tokens.is(j, "<") {
                    if let Some(end) = self.tokens.type_args(j) {
                        if self.tokens.is(end, "{") || self.tokens.is(end, "implements") {
                            self.erase_attached(j, end);
                            j = end;
                            continue;
                        }
                    }
                }
                j = match self.tokens.text(j) {
                    "(" | "[" => {
                        let close = self.close_of(j)?;
                        self.walk_until(j + 1, close, &[], Asi::Never)?;
                        close + 1
                    }
                    _ => j + 1,
                };
            }
        }

        if self.tokens.is(j, "implements") {
            let mut end = self.expect_type(j + 1)?;
            while self.tokens.is(end, ",") {
                end = self.expect_type(end + 1)?;
            }
            self.erase_attached(j, end);
            j = end;
        }

        if !self.tokens.is(j, "{") {
            return Ok(keyword + 1);
        }
        let close = self.close_of(j)?;
        let mut member = j + 1;
        while member < close {
            member = self.class_member(member, close, derived)?;
        }
        Ok(close + 1)
    }

    fn class_member(&mut self, start: usize, close: usize, derived: bool) -> Result<usize, TranspileError> {
        if self.tokens.is(start, ";") {
            return Ok(start + 1);
        }
        if self.tokens.is(start, "@") {
            return Err(self.error(start, "decorators are not supported"));
        }

        let mut k = start;
        let mut ts_modifiers = Vec::new();
        let mut ambient = false;
        while k < close
            && MEMBER_MODIFIERS.contains(&self.tokens.text(k))
            && self.modifies_member(k)
        {
            match self.tokens.text(k) {
                "declare" | "abstract" => ambient = true,
                "static" | "async" | "get" | "set" | "accessor" => {}
                _ => ts_modifiers.push(k),
            }
            k += 1;
        }

        if k > start && self.tokens.is(k, "{") && self.tokens.is(k - 1, "static") {
            let block_close = self.close_of(k)?;
            self.walk_until(k + 1, block_close, &[], Asi::Never)?;
            return Ok(block_close + 1);
        }

        let index_signature = self.tokens.is(k, "[")
            && self.tokens.is_ident(k + 1)
            && self.tokens.is(k + 2, ":");
        if ambient || index_signature {
            let end = self.statement_end(k, close);
            self.erase_span(self.tokens.start_of(start), self.tokens.end_of(end - 1));
            return Ok(end);
        }

        let mut name = k;
        if self.tokens.is(name, "*") {
            name += 1;
        }
        let mut m = name;
        if self.tokens.is(m, "[") {
            m = self.close_of(m)? + 1;
        } else if matches!(
            self.tokens.kind(m),
            Some(TokenKind::Ident | TokenKind::String | TokenKind::Number)
        ) {
            m += 1;
        } else {
            return Err(self.error(m, "expected a class member"));
        }

        let marker = (self.tokens.is(m, "?") || self.tokens.is(m, "!")).then_some(m);
        if marker.is_some() {
            m += 1;
        }
        let generics = if self.tokens.is(m, "<") {
            let end = self
                .tokens
                .type_params(m)
                .ok_or_else(|| self.error(m, "malformed type parameter list"))?;
            let span = (m, end);
            m = end;
            Some(span)
        } else {
            None
        };

        if self.tokens.is(m, "(") {
            let open = m;
            let params_close = self.close_of(open)?;
            let mut body = params_close + 1;
            let returns = self.tokens.is(body, ":");
            if returns {
                body = self.expect_type(body + 1)?;
            }
            if !self.tokens.is(body, "{") {
                // Overload signature
                let mut end = body;
                if self.tokens.is(end, ";") {
                    end += 1;
                }
                self.erase_span(self.tokens.start_of(start), self.tokens.end_of(end - 1));
                return Ok(end);
            }

            self.member_head(&ts_modifiers, name, marker)?;
            if let Some((from, end)) = generics {
                self.erase_attached(from, end);
            }
            let properties = self.params(open, params_close)?;
            if returns {
                self.erase_attached(params_close + 1, body);
            }
            let body_close = self.close_of(body)?;
            if self.tokens.text(name) == "constructor" && !properties.is_empty() {
                self.constructor_body(body, body_close, derived, &properties)?;
            } else {
                self.walk_until(body + 1, body_close, &[], Asi::Never)?;
            }
            return Ok(body_close + 1);
        }

        if generics.is_some() {
            return Err(self.error(m, "expected `(` after type parameters"));
        }
        self.member_head(&ts_modifiers, name, marker)?;
        let mut f = m;
        if self.tokens.is(f, ":") {
            let end = self.expect_type(f + 1)?;
            self.erase_attached(f, end);
            f = end;
        }
        if self.tokens.is(f, "=") {
            f = self.walk_until(f + 1, close, &[";"], Asi::Member)?;
        }
        if self.tokens.is(f, ";") {
            f += 1;
        }
        Ok(f)
    }

    /// Token `k` is a modifier rather than the name of the member.
    fn modifies_member(&self, k: usize) -> bool {
        let next = k + 1;
        !matches!(
            self.tokens.text(next),
            "(" | "=" | ";" | ":" | "?" | "!" | "<" | "}" | "," | "."
        ) && !self.tokens.newline_before(next)
    }

    fn member_head(
        &mut self,
        ts_modifiers: &[usize],
        name: usize,
        marker: Option<usize>,
    ) -> Result<(), TranspileError> {
        for &modifier in ts_modifiers {
            self.erase_leading(modifier);
        }
        if self.tokens.is(name, "[") {
            let close = self.close_of(name)?;
            self.walk_until(name + 1, close, &[], Asi::Never)?;
        }
        if let Some(marker) = marker {
            self.erase_token(marker);
        }
        Ok(())
    }

    /// Walk a constructor body, assigning parameter properties after the
    /// `super(...)` call in derived classes and at the top otherwise.
    fn constructor_body(
        &mut self,
        open: usize,
        close: usize,
        derived: bool,
        properties: &[&str],
    ) -> Result<(), TranspileError> {
        let assignments: String = properties
            .iter()
            .map(|name| format!(" this.{name} = {name};"))
            .collect();

        let mut anchor = open;
        if derived {
            let mut t = open + 1;
            while t < close {
                if self.tokens.is(t, "super") && self.tokens.is(t + 1, "(") {
                    let mut end = self.close_of(t + 1)?;
                    if self.tokens.is(end + 1, ";") {
                        end += 1;
                    }
                    anchor = end;
                    break;
                }
                t = match self.tokens.partner(t) {
                    Some(partner) if partner > t => partner + 1,
                    _ => t + 1,
                };
            }
        }

        self.walk_until(open + 1, anchor + 1, &[], Asi::Never)?;
        self.insert(self.tokens.end_of(anchor), &assignments);
        self.walk_until(anchor + 1, close, &[], Asi::Never)?;
        Ok(())
    }

    fn interface(&mut self, keyword: usize) -> Result<usize, TranspileError> {
        let mut j = keyword + 2;
        if self.tokens.is(j, "<") {
            j = self
                .tokens
                .type_params(j)
                .ok_or_else(|| self.error(j, "malformed type parameter list"))?;
        }
        if self.tokens.is(j, "extends") {
            j = self.expect_type(j + 1)?;
            while self.tokens.is(j, ",") {
                j = self.expect_type(j + 1)?;
            }
        }
        if !self.tokens.is(j, "{") {
            return Err(self.error(j, "expected `{` to open the interface body"));
        }
        let close = self.close_of(j)?;
        self.erase_span(self.decl_start(keyword), self.tokens.end_of(close));
        Ok(close + 1)
    }

    fn type_alias(&mut self, keyword: usize) -> Result<usize, TranspileError> {
        let mut j = keyword + 2;
        if self.tokens.is(j, "<") {
            j = self
                .tokens
                .type_params(j)
                .ok_or_else(|| self.error(j, "malformed type parameter list"))?;
        }
        if !self.tokens.is(j, "=") {
            return Ok(keyword + 1);
        }
        let mut end = self.expect_type(j + 1)?;
        if self.tokens.is(end, ";") {
            end += 1;
        }
        self.erase_span(self.decl_start(keyword), self.tokens.end_of(end - 1));
        Ok(end)
    }

    fn declare(&mut self, keyword: usize) -> Result<usize, TranspileError> {
        let end = self.statement_end(keyword + 1, self.tokens.len());
        self.erase_span(self.decl_start(keyword), self.tokens.end_of(end - 1));
        Ok(end)
    }

    /// `enum` and `const enum`, emitted as the object TypeScript builds:
    /// numeric members map both ways, string members one way.
    fn enumeration(&mut self, start: usize, keyword: usize) -> Result<usize, TranspileError> {
        let name_index = keyword + 1;
        let name = self.tokens.text(name_index);
        let open = name_index + 1;
        if !self.tokens.is(open, "{") {
            return Err(self.error(open, "expected `{` to open the enum body"));
        }
        let close = self.close_of(open)?;
        let src = self.tokens.src;

        let mut body = String::new();
        let mut cursor = EnumCursor::Next(0.0);
        let mut t = open + 1;
        while t < close {
            let member = t;
            let key = match self.tokens.kind(member) {
                Some(TokenKind::Ident) => format!("\"{}\"", self.tokens.text(member)),
                Some(TokenKind::String) => self.tokens.text(member).to_string(),
                _ => return Err(self.error(member, "expected an enum member name")),
            };
            t += 1;

            if self.tokens.is(t, "=") {
                let from = t + 1;
                let mut end = from;
                while end < close && !self.tokens.is(end, ",") {
                    end = match self.tokens.partner(end) {
                        Some(partner) if partner > end => partner + 1,
                        _ => end + 1,
                    };
                }
                if end == from {
                    return Err(self.error(end, "expected an enum member initializer"));
                }
                t = end;

                if end == from + 1 && self.tokens.kind(from) == Some(TokenKind::String) {
                    body.push_str(&format!("{name}[{key}] = {}; ", self.tokens.text(from)));
                    cursor = EnumCursor::Unknown;
                } else if let Some(value) = self.numeric_literal(from, end) {
                    body.push_str(&format!(
                        "{name}[{name}[{key}] = {}] = {key}; ",
                        format_number(value)
                    ));
                    cursor = EnumCursor::Next(value + 1.0);
                } else {
                    let expression = &src[self.tokens.start_of(from)..self.tokens.end_of(end - 1)];
                    body.push_str(&format!("{name}[{name}[{key}] = {expression}] = {key}; "));
                    cursor = EnumCursor::After(key);
                }
            } else {
                match cursor {
                    EnumCursor::Next(value) => {
                        body.push_str(&format!(
                            "{name}[{name}[{key}] = {}] = {key}; ",
                            format_number(value)
                        ));
                        cursor = EnumCursor::Next(value + 1.0);
                    }
                    EnumCursor::After(previous) => {
                        body.push_str(&format!(
                            "{name}[{name}[{key}] = {name}[{previous}] + 1] = {key}; "
                        ));
                        cursor = EnumCursor::After(key);
                    }
                    EnumCursor::Unknown => {
                        let message = format!(
                            "enum member `{}` must have an initializer",
                            self.tokens.text(member)
                        );
                        return Err(self.error(member, &message));
                    }
                }
            }

            if self.tokens.is(t, ",") {
                t += 1;
            } else if t < close {
                return Err(self.error(t, "expected `,` between enum members"));
            }
        }

        let emitted = format!("var {name}; (function ({name}) {{ {body}}})({name} || ({name} = {{}}));");
        self.replace(self.tokens.start_of(start), self.tokens.end_of(close), &emitted);
        Ok(close + 1)
    }

    fn numeric_literal(&self, from: usize, end: usize) -> Option<f64> {
        match end - from {
            1 if self.tokens.kind(from) == Some(TokenKind::Number) => parse_number(self.tokens.text(from)),
            2 if self.tokens.is(from, "-") && self.tokens.kind(from + 1) == Some(TokenKind::Number) => {
                parse_number(self.tokens.text(from + 1)).map(|value| -value)
            }
            _ => None,
        }
    }

    // Modules

    fn import(&mut self, keyword: usize) -> Result<usize, TranspileError> {
        let next = keyword + 1;
        let clause = self.tokens.is_ident(next)
            || self.tokens.is(next, "{")
            || self.tokens.is(next, "*")
            || self.tokens.kind(next) == Some(TokenKind::String);
        if !clause {
            return Ok(next);
        }
        let end = self.module_clause_end(next);
        let type_only = self.tokens.is(next, "type")
            && (self.tokens.is(next + 1, "{")
                || self.tokens.is(next + 1, "*")
                || (self.tokens.is_ident(next + 1) && !self.tokens.is(next + 1, "from")));
        if type_only {
            self.erase_span(self.tokens.start_of(keyword), self.tokens.end_of(end - 1));
        } else {
            self.erase_type_specifiers(next, end)?;
        }
        Ok(end)
    }

    fn export(&mut self, keyword: usize) -> Result<usize, TranspileError> {
        let next = keyword + 1;
        if self.tokens.is(next, "type") && (self.tokens.is(next + 1, "{") || self.tokens.is(next + 1, "*")) {
            let end = self.export_clause_end(next + 1)?;
            self.erase_span(self.tokens.start_of(keyword), self.tokens.end_of(end - 1));
            return Ok(end);
        }
        if self.tokens.is(next, "as") && self.tokens.is(next + 1, "namespace") {
            let end = self.statement_end(next, self.tokens.len());
            self.erase_span(self.tokens.start_of(keyword), self.tokens.end_of(end - 1));
            return Ok(end);
        }
        if self.tokens.is(next, "{") {
            let close = self.close_of(next)?;
            self.erase_type_specifiers(next, close + 1)?;
            return Ok(close + 1);
        }
        Ok(next)
    }

    /// Index just past the module specifier string and its `;`.
    fn module_clause_end(&self, from: usize) -> usize {
        let mut t = from;
        while t < self.tokens.len() {
            if self.tokens.kind(t) == Some(TokenKind::String) {
                return if self.tokens.is(t + 1, ";") { t + 2 } else { t + 1 };
            }
            t = match self.tokens.partner(t) {
                Some(close) if close > t => close + 1,
                _ => t + 1,
            };
        }
        t
    }

    fn export_clause_end(&self, from: usize) -> Result<usize, TranspileError> {
        let mut end = if self.tokens.is(from, "{") {
            self.close_of(from)? + 1
        } else {
            let mut end = from + 1;
            if self.tokens.is(end, "as") {
                end += 2;
            }
            end
        };
        if self.tokens.is(end, "from") {
            end += 2;
        }
        if self.tokens.is(end, ";") {
            end += 1;
        }
        Ok(end)
    }

    /// Drop `type X` entries from `{ ... }` specifier lists in `from..end`.
    fn erase_type_specifiers(&mut self, from: usize, end: usize) -> Result<(), TranspileError> {
        let Some(open) = (from..end).find(|&t| self.tokens.is(t, "{")) else {
            return Ok(());
        };
        let close = self.close_of(open)?;
        let mut t = open + 1;
        while t < close {
            let mut next = t;
            while next < close && !self.tokens.is(next, ",") {
                next += 1;
            }
            let type_only = self.tokens.is(t, "type")
                && self.tokens.is_ident(t + 1)
                && !self.tokens.is(t + 1, "as");
            if type_only {
                let to = if self.tokens.is(next, ",") { next + 1 } else { next };
                self.erase_span(self.tokens.start_of(t), self.tokens.start_of(to));
            }
            t = next + 1;
        }
        Ok(())
    }
}

fn is_word_char(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

fn parse_number(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let radix = match digits.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return digits.parse().ok(),
    };
    i64::from_str_radix(&digits[2..], radix).ok().map(|value| value as f64)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
