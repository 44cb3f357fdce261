//! Recursive-descent parser with statement-level error recovery.
//!
//! The parser never fails: it always produces a [`Module`] together with
//! the list of errors encountered. On a malformed statement it records
//! the error and resynchronizes at the next `;`, `}`, or statement
//! keyword, so later code in the buffer still gets analyzed while the
//! user is mid-edit.

use crate::ast::{BinaryOp, Block, Expr, FnDecl, Ident, Module, Stmt, UnaryOp};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::Token;
use kiln_core::Span;
use logos::Logos;

/// Result of parsing one source file.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed module. Present even for broken input.
    pub module: Module,
    /// Parse errors encountered.
    pub errors: Vec<ParseError>,
}

/// Parse kiln source code.
pub fn parse(source: &str) -> ParseResult {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for (result, range) in Token::lexer(source).spanned() {
        let span = Span::from(range);
        match result {
            Ok(tok) => tokens.push((tok, span)),
            Err(()) => errors.push(ParseError::new(ParseErrorKind::InvalidToken, span)),
        }
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        errors,
        eof: Span::new(source.len(), source.len()),
    };
    let module = parser.parse_module();
    ParseResult {
        module,
        errors: parser.errors,
    }
}

struct Parser<'src> {
    tokens: Vec<(Token<'src>, Span)>,
    pos: usize,
    errors: Vec<ParseError>,
    eof: Span,
}

impl<'src> Parser<'src> {
    // ===== Token plumbing =====

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn peek2(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos + 1).map(|(t, _)| *t)
    }

    fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map_or(self.eof, |(_, s)| *s)
    }

    fn bump(&mut self) -> Option<(Token<'src>, Span)> {
        let item = self.tokens.get(self.pos).copied();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn at(&self, tok: Token<'src>) -> bool {
        self.peek() == Some(tok)
    }

    fn eat(&mut self, tok: Token<'src>) -> Option<Span> {
        if self.at(tok) {
            self.bump().map(|(_, s)| s)
        } else {
            None
        }
    }

    fn error_expected(&mut self, expected: &str) {
        let kind = match self.peek() {
            Some(found) => ParseErrorKind::Expected {
                expected: expected.to_string(),
                found: found.to_string(),
            },
            None => ParseErrorKind::UnexpectedEof,
        };
        self.errors.push(ParseError::new(kind, self.peek_span()));
    }

    fn expect(&mut self, tok: Token<'src>, expected: &str) -> Result<Span, ()> {
        match self.eat(tok) {
            Some(span) => Ok(span),
            None => {
                self.error_expected(expected);
                Err(())
            }
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<Ident, ()> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let (_, span) = self.bump().expect("peeked");
                Ok(Ident::new(name, span))
            }
            _ => {
                self.error_expected(expected);
                Err(())
            }
        }
    }

    // ===== Recovery =====

    /// Skip to the next `fn` at the top level.
    fn sync_top_level(&mut self) {
        while let Some(tok) = self.peek() {
            if tok == Token::Fn {
                return;
            }
            self.bump();
        }
    }

    /// Skip past the current broken statement: consume through the next
    /// `;`, or stop before a `}` or a statement keyword. Nested braces
    /// are skipped as a unit.
    fn sync_stmt(&mut self) {
        let mut depth = 0usize;
        // Always make progress, even when standing on a sync point.
        let mut first = true;
        while let Some(tok) = self.peek() {
            if depth == 0 && !first {
                match tok {
                    Token::Semi => {
                        self.bump();
                        return;
                    }
                    Token::RBrace
                    | Token::Let
                    | Token::If
                    | Token::While
                    | Token::Return
                    | Token::Fn => return,
                    _ => {}
                }
            }
            match tok {
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                    depth -= 1;
                }
                Token::Semi if depth == 0 => {
                    self.bump();
                    return;
                }
                _ => {}
            }
            self.bump();
            first = false;
        }
    }

    // ===== Grammar =====

    fn parse_module(&mut self) -> Module {
        let mut module = Module::default();
        while self.peek().is_some() {
            if self.at(Token::Fn) {
                match self.parse_fn() {
                    Ok(decl) => module.functions.push(decl),
                    Err(()) => self.sync_top_level(),
                }
            } else {
                self.error_expected("`fn`");
                self.bump();
                self.sync_top_level();
            }
        }
        module
    }

    fn parse_fn(&mut self) -> Result<FnDecl, ()> {
        let (_, fn_span) = self.bump().expect("at `fn`");
        let name = self.expect_ident("function name")?;
        self.expect(Token::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(Token::RParen) {
            loop {
                params.push(self.expect_ident("parameter name")?);
                if self.eat(Token::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "`)`")?;
        let body = self.parse_block()?;
        let span = fn_span.merge(&body.span);
        Ok(FnDecl {
            name,
            params,
            body,
            span,
        })
    }

    fn parse_block(&mut self) -> Result<Block, ()> {
        let lbrace = self.expect(Token::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                None => {
                    self.errors
                        .push(ParseError::new(ParseErrorKind::UnexpectedEof, self.eof));
                    return Ok(Block {
                        stmts,
                        span: lbrace.merge(&self.eof),
                    });
                }
                Some(Token::RBrace) => {
                    let (_, rbrace) = self.bump().expect("peeked");
                    return Ok(Block {
                        stmts,
                        span: lbrace.merge(&rbrace),
                    });
                }
                Some(_) => match self.parse_stmt() {
                    Ok(stmt) => stmts.push(stmt),
                    Err(()) => self.sync_stmt(),
                },
            }
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ()> {
        match self.peek() {
            Some(Token::Let) => self.parse_let(),
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Return) => self.parse_return(),
            Some(Token::Ident(_)) if self.peek2() == Some(Token::Assign) => self.parse_assign(),
            _ => {
                let expr = self.parse_expr()?;
                self.expect(Token::Semi, "`;`")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, ()> {
        let (_, let_span) = self.bump().expect("at `let`");
        let name = self.expect_ident("binding name")?;
        self.expect(Token::Assign, "`=`")?;
        let value = self.parse_expr()?;
        let semi = self.expect(Token::Semi, "`;`")?;
        Ok(Stmt::Let {
            name,
            value,
            span: let_span.merge(&semi),
        })
    }

    fn parse_assign(&mut self) -> Result<Stmt, ()> {
        let name = self.expect_ident("assignment target")?;
        self.expect(Token::Assign, "`=`")?;
        let value = self.parse_expr()?;
        let semi = self.expect(Token::Semi, "`;`")?;
        let span = name.span.merge(&semi);
        Ok(Stmt::Assign { name, value, span })
    }

    fn parse_if(&mut self) -> Result<Stmt, ()> {
        let (_, if_span) = self.bump().expect("at `if`");
        let cond = self.parse_expr()?;
        let then_branch = self.parse_block()?;
        let mut span = if_span.merge(&then_branch.span);
        let else_branch = if self.eat(Token::Else).is_some() {
            if self.at(Token::If) {
                // `else if`: nest the chained if as a single-statement block.
                let nested = self.parse_if()?;
                let nested_span = match &nested {
                    Stmt::If { span, .. } => *span,
                    _ => unreachable!("parse_if returns Stmt::If"),
                };
                span = span.merge(&nested_span);
                Some(Block {
                    stmts: vec![nested],
                    span: nested_span,
                })
            } else {
                let block = self.parse_block()?;
                span = span.merge(&block.span);
                Some(block)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            span,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ()> {
        let (_, while_span) = self.bump().expect("at `while`");
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        let span = while_span.merge(&body.span);
        Ok(Stmt::While { cond, body, span })
    }

    fn parse_return(&mut self) -> Result<Stmt, ()> {
        let (_, ret_span) = self.bump().expect("at `return`");
        let value = if self.at(Token::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let semi = self.expect(Token::Semi, "`;`")?;
        Ok(Stmt::Return {
            value,
            span: ret_span.merge(&semi),
        })
    }

    // ===== Expressions, by ascending precedence =====

    fn parse_expr(&mut self) -> Result<Expr, ()> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ()> {
        let mut lhs = self.parse_and()?;
        while self.eat(Token::OrOr).is_some() {
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ()> {
        let mut lhs = self.parse_equality()?;
        while self.eat(Token::AndAnd).is_some() {
            let rhs = self.parse_equality()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ()> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_comparison()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ()> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_term()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ()> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_factor()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, ()> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ()> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let (_, op_span) = self.bump().expect("peeked");
            let operand = self.parse_unary()?;
            let span = op_span.merge(&operand.span());
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ()> {
        match self.peek() {
            Some(Token::Int(text)) => {
                let (_, span) = self.bump().expect("peeked");
                let value = match text.parse::<i64>() {
                    Ok(v) => v,
                    Err(_) => {
                        self.errors.push(ParseError::new(
                            ParseErrorKind::InvalidInt(text.to_string()),
                            span,
                        ));
                        0
                    }
                };
                Ok(Expr::Int { value, span })
            }
            Some(Token::Str(raw)) => {
                let (_, span) = self.bump().expect("peeked");
                let value = self.unescape(raw, span);
                Ok(Expr::Str { value, span })
            }
            Some(Token::True) => {
                let (_, span) = self.bump().expect("peeked");
                Ok(Expr::Bool { value: true, span })
            }
            Some(Token::False) => {
                let (_, span) = self.bump().expect("peeked");
                Ok(Expr::Bool { value: false, span })
            }
            Some(Token::Ident(name)) => {
                let (_, span) = self.bump().expect("peeked");
                let ident = Ident::new(name, span);
                if self.at(Token::LParen) {
                    self.parse_call(ident)
                } else {
                    Ok(Expr::Var { name: ident })
                }
            }
            Some(Token::LParen) => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(expr)
            }
            _ => {
                self.error_expected("expression");
                Err(())
            }
        }
    }

    fn parse_call(&mut self, callee: Ident) -> Result<Expr, ()> {
        self.expect(Token::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.at(Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(Token::Comma).is_none() {
                    break;
                }
            }
        }
        let rparen = self.expect(Token::RParen, "`)`")?;
        let span = callee.span.merge(&rparen);
        Ok(Expr::Call { callee, args, span })
    }

    /// Unescape a quoted string literal slice.
    fn unescape(&mut self, raw: &str, span: Span) -> String {
        let inner = &raw[1..raw.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    self.errors
                        .push(ParseError::new(ParseErrorKind::InvalidEscape(other), span));
                    out.push(other);
                }
                None => {}
            }
        }
        out
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span().merge(&rhs.span());
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_function() {
        let result = parse("fn main() { println(\"hi\"); }");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.module.functions.len(), 1);
        let main = &result.module.functions[0];
        assert_eq!(main.name.name, "main");
        assert!(main.params.is_empty());
        assert_eq!(main.body.stmts.len(), 1);
    }

    #[test]
    fn test_parse_precedence() {
        let result = parse("fn f() { let x = 1 + 2 * 3; }");
        assert!(result.errors.is_empty());
        let Stmt::Let { value, .. } = &result.module.functions[0].body.stmts[0] else {
            panic!("expected let");
        };
        let Expr::Binary { op, rhs, .. } = value else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            rhs.as_ref(),
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_else_if_chain() {
        let result = parse("fn f(x) { if x < 0 { return 1; } else if x == 0 { return 2; } else { return 3; } }");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let Stmt::If { else_branch, .. } = &result.module.functions[0].body.stmts[0] else {
            panic!("expected if");
        };
        let chained = else_branch.as_ref().expect("else branch");
        assert!(matches!(chained.stmts[0], Stmt::If { .. }));
    }

    #[test]
    fn test_error_recovery_keeps_later_statements() {
        let result = parse("fn f() { let = 1; let y = 2; }");
        assert!(!result.errors.is_empty());
        // The second statement survives recovery.
        let stmts = &result.module.functions[0].body.stmts;
        assert!(stmts
            .iter()
            .any(|s| matches!(s, Stmt::Let { name, .. } if name.name == "y")));
    }

    #[test]
    fn test_error_recovery_across_functions() {
        let result = parse("fn broken( { } fn ok() { return 1; }");
        assert!(!result.errors.is_empty());
        assert!(result
            .module
            .functions
            .iter()
            .any(|f| f.name.name == "ok"));
    }

    #[test]
    fn test_unexpected_top_level_token() {
        let result = parse("42 fn main() { }");
        assert!(!result.errors.is_empty());
        assert_eq!(result.module.functions.len(), 1);
    }

    #[test]
    fn test_assignment_vs_equality() {
        let result = parse("fn f(x) { x = 1; x == 1; }");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let stmts = &result.module.functions[0].body.stmts;
        assert!(matches!(stmts[0], Stmt::Assign { .. }));
        assert!(matches!(stmts[1], Stmt::Expr(_)));
    }

    #[test]
    fn test_string_escapes() {
        let result = parse(r#"fn f() { let s = "a\nb\"c"; }"#);
        assert!(result.errors.is_empty());
        let Stmt::Let { value, .. } = &result.module.functions[0].body.stmts[0] else {
            panic!("expected let");
        };
        assert!(matches!(value, Expr::Str { value, .. } if value == "a\nb\"c"));
    }

    #[test]
    fn test_int_out_of_range() {
        let result = parse("fn f() { let x = 99999999999999999999; }");
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::InvalidInt(_))));
    }

    #[test]
    fn test_empty_source_is_empty_module() {
        let result = parse("");
        assert!(result.errors.is_empty());
        assert!(result.module.functions.is_empty());
    }
}
