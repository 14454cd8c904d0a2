// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation using Pratt parsing for expressions.

use kiln_ast::expr::{BinOp, Block, Expr, ExprKind, UnaryOp, Value};
use kiln_ast::stmt::{Stmt, StmtKind};
use kiln_ast::symbol::{Binding, FnDecl, GlobalDecl, Symbol, SymbolKind};
use kiln_ast::token::{Token, TokenKind};
use kiln_ast::ty::Type;
use kiln_ast::{NodeId, Program, Span, Spanned};

/// The parser for Kiln source code.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Counter for generating unique NodeIds; one counter per compilation.
    next_node_id: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, next_node_id: 0 }
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, n: usize) -> &TokenKind {
        self.tokens.get(self.pos + n).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.at_end() {
            self.pos += 1;
        }
        self.tokens.get(self.pos - 1).unwrap()
    }

    /// Span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                kind.display_name(),
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, ParseError> {
        let span = self.current().span;
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Spanned::new(name, span))
            }
            _ => Err(ParseError::expected(
                "a name",
                self.current_kind(),
                self.current().span,
            )),
        }
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// Parse a whole program: `symbol*`.
    pub fn parse(mut self) -> Result<Program, ParseError> {
        let mut symbols = Vec::new();

        while !self.at_end() {
            symbols.push(self.parse_symbol()?);
        }

        Ok(Program { symbols })
    }

    fn parse_symbol(&mut self) -> Result<Symbol, ParseError> {
        match self.current_kind() {
            TokenKind::Fn => self.parse_function(),
            TokenKind::Static => self.parse_global(TokenKind::Static),
            TokenKind::Const => self.parse_global(TokenKind::Const),
            _ => Err(ParseError::expected(
                "'fn', 'static' or 'const'",
                self.current_kind(),
                self.current().span,
            )),
        }
    }

    /// `fn IDENT ( (binding ,)* binding? ) (-> type)? block`
    fn parse_function(&mut self) -> Result<Symbol, ParseError> {
        let lo = self.current().span;

        self.expect(&TokenKind::Fn)?;
        let name = self.expect_ident()?;

        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.parse_binding()?);

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;

        // The return type defaults to unit when omitted
        let ret = if self.match_token(&TokenKind::Arrow) {
            self.parse_type()?.value
        } else {
            Type::Unit
        };

        let body = self.parse_block()?;

        Ok(Symbol {
            id: self.next_id(),
            span: lo.to(self.prev_span()),
            kind: SymbolKind::Function(FnDecl { name, params, ret, body }),
        })
    }

    /// `static binding = literal ;` or `const binding = literal ;`
    ///
    /// Global initializers are restricted to literals, so they can be folded
    /// into fields and inlined constants without an evaluation order story.
    fn parse_global(&mut self, keyword: TokenKind) -> Result<Symbol, ParseError> {
        let lo = self.current().span;

        let is_static = matches!(keyword, TokenKind::Static);
        self.expect(&keyword)?;

        let binding = self.parse_binding()?;

        self.expect(&TokenKind::Eq)?;

        let init = self.parse_literal()?;

        self.expect(&TokenKind::Semi)?;

        let decl = GlobalDecl { binding, init };
        Ok(Symbol {
            id: self.next_id(),
            span: lo.to(self.prev_span()),
            kind: if is_static {
                SymbolKind::Static(decl)
            } else {
                SymbolKind::Const(decl)
            },
        })
    }

    /// `IDENT : type`
    fn parse_binding(&mut self) -> Result<Binding, ParseError> {
        let name = self.expect_ident()?;

        self.expect(&TokenKind::Colon)?;

        let ty = self.parse_type()?;

        let span = name.span.to(ty.span);
        Ok(Binding { name, ty, span })
    }

    fn parse_type(&mut self) -> Result<Spanned<Type>, ParseError> {
        let span = self.current().span;
        if let TokenKind::Ident(name) = self.current_kind() {
            if let Some(ty) = Type::from_keyword(name) {
                self.advance();
                return Ok(Spanned::new(ty, span));
            }
        }
        Err(ParseError::expected(
            "a type",
            self.current_kind(),
            self.current().span,
        ))
    }

    fn parse_literal(&mut self) -> Result<Expr, ParseError> {
        let span = self.current().span;
        let value = match self.current_kind().clone() {
            TokenKind::Int(n) => Value::Int(n),
            TokenKind::Char(c) => Value::Char(c),
            TokenKind::Str(s) => Value::Str(s),
            TokenKind::Bool(b) => Value::Bool(b),
            _ => {
                return Err(ParseError::expected(
                    "a literal",
                    self.current_kind(),
                    self.current().span,
                ))
            }
        };
        self.advance();

        Ok(Expr { id: self.next_id(), kind: ExprKind::Literal(value), span })
    }

    // =========================================================================
    // Blocks and Statements
    // =========================================================================

    /// `{ (stmt (;+)?)* tail_expr? }`
    ///
    /// A statement whose value is a block-like construct (block, `if`,
    /// `while`) needs no separator; any statement expression immediately
    /// followed by the closing brace becomes the block's tail expression.
    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let lo = self.current().span;

        self.expect(&TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        let tail;

        loop {
            let here = self.current().span;

            if self.match_token(&TokenKind::RBrace) {
                tail = Expr { id: self.next_id(), kind: ExprKind::Unit, span: here };
                break;
            }

            let stmt = self.parse_stmt()?;

            if matches!(stmt.kind, StmtKind::Let { .. }) {
                self.expect(&TokenKind::Semi)?;
            } else if stmt_needs_semi(&stmt) {
                if self.check(&TokenKind::RBrace) {
                    self.advance();
                    tail = into_tail(stmt);
                    break;
                }
                self.expect(&TokenKind::Semi)?;
            } else if self.match_token(&TokenKind::RBrace) {
                tail = into_tail(stmt);
                break;
            }

            // Eat any stray separators
            while self.match_token(&TokenKind::Semi) {}

            stmts.push(stmt);
        }

        Ok(Block {
            id: self.next_id(),
            stmts,
            tail,
            span: lo.to(self.prev_span()),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let lo = self.current().span;

        if self.check(&TokenKind::Let) {
            return self.parse_let();
        }

        let expr = self.parse_expr()?;

        Ok(Stmt {
            id: self.next_id(),
            span: lo.to(self.prev_span()),
            kind: StmtKind::Expr(expr),
        })
    }

    /// `let binding = expression`
    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let lo = self.current().span;

        self.expect(&TokenKind::Let)?;

        let binding = self.parse_binding()?;

        self.expect(&TokenKind::Eq)?;

        let init = self.parse_expr()?;

        Ok(Stmt {
            id: self.next_id(),
            span: lo.to(self.prev_span()),
            kind: StmtKind::Let { binding, init },
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        // Keyword-led and block forms sit outside the Pratt table; they are
        // returned directly and never feed the infix loop.
        match self.current_kind() {
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                return Ok(Expr {
                    id: self.next_id(),
                    span: block.span,
                    kind: ExprKind::Block(Box::new(block)),
                });
            }
            TokenKind::If => return self.parse_if(),
            TokenKind::While => return self.parse_while(),
            TokenKind::Return => return self.parse_return(),
            TokenKind::Break => {
                let span = self.current().span;
                self.advance();
                return Ok(Expr { id: self.next_id(), kind: ExprKind::Break, span });
            }
            _ => {}
        }

        let start = self.current().span.start;
        let mut lhs = self.parse_prefix()?;

        loop {
            // Calls bind tightest of all and are always taken.
            if self.check(&TokenKind::LParen) {
                lhs = self.parse_call(lhs, start)?;
                continue;
            }

            if self.check(&TokenKind::Eq) {
                let (l_bp, _) = Self::ASSIGN_BP;
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr_bp(Self::ASSIGN_BP.1)?;
                let span = Span::new(start, rhs.span.end);
                lhs = Expr {
                    id: self.next_id(),
                    kind: ExprKind::Assign { left: Box::new(lhs), right: Box::new(rhs) },
                    span,
                };
                continue;
            }

            if let Some((l_bp, r_bp)) = self.infix_bp() {
                if l_bp < min_bp {
                    break;
                }

                let op = self.parse_binop()?;

                // A binary operator directly followed by `=` is a compound
                // assignment (logical and/or excluded).
                if self.check(&TokenKind::Eq) && op.kind() != kiln_ast::expr::OpKind::Logic {
                    self.advance();
                    let rhs = self.parse_expr_bp(Self::ASSIGN_BP.1)?;
                    let span = Span::new(start, rhs.span.end);
                    lhs = Expr {
                        id: self.next_id(),
                        kind: ExprKind::AssignOp {
                            op,
                            left: Box::new(lhs),
                            right: Box::new(rhs),
                        },
                        span,
                    };
                    continue;
                }

                let rhs = self.parse_expr_bp(r_bp)?;
                let span = Span::new(start, rhs.span.end);
                lhs = Expr {
                    id: self.next_id(),
                    kind: ExprKind::Binary { op, left: Box::new(lhs), right: Box::new(rhs) },
                    span,
                };
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;

        match self.current_kind().clone() {
            TokenKind::Int(n) => {
                let span = self.current().span;
                self.advance();
                Ok(Expr { id: self.next_id(), kind: ExprKind::Literal(Value::Int(n)), span })
            }
            TokenKind::Char(c) => {
                let span = self.current().span;
                self.advance();
                Ok(Expr { id: self.next_id(), kind: ExprKind::Literal(Value::Char(c)), span })
            }
            TokenKind::Str(s) => {
                let span = self.current().span;
                self.advance();
                Ok(Expr { id: self.next_id(), kind: ExprKind::Literal(Value::Str(s)), span })
            }
            TokenKind::Bool(b) => {
                let span = self.current().span;
                self.advance();
                Ok(Expr { id: self.next_id(), kind: ExprKind::Literal(Value::Bool(b)), span })
            }
            TokenKind::Ident(name) => {
                let span = self.current().span;
                self.advance();
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::Var(Spanned::new(name, span)),
                    span,
                })
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr_bp(0)?;
                let span = Span::new(start, operand.span.end);
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::Unary { op: UnaryOp::Neg, operand: Box::new(operand) },
                    span,
                })
            }
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_expr_bp(0)?;
                let span = Span::new(start, operand.span.end);
                Ok(Expr {
                    id: self.next_id(),
                    kind: ExprKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) },
                    span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                let span = Span::new(start, self.prev_span().end);
                Ok(Expr { id: self.next_id(), kind: ExprKind::Group(Box::new(inner)), span })
            }
            _ => Err(ParseError::expected(
                "an expression",
                self.current_kind(),
                self.current().span,
            )),
        }
    }

    /// `callee ( (expr ,)* expr? )`
    fn parse_call(&mut self, callee: Expr, start: usize) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LParen)?;

        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_expr()?);

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;

        let span = Span::new(start, self.prev_span().end);
        Ok(Expr {
            id: self.next_id(),
            kind: ExprKind::Call { callee: Box::new(callee), args },
            span,
        })
    }

    /// `if expression block (else block)?`
    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        let lo = self.current().span;

        self.expect(&TokenKind::If)?;

        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_block = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };

        Ok(Expr {
            id: self.next_id(),
            span: lo.to(self.prev_span()),
            kind: ExprKind::If {
                cond: Box::new(cond),
                then_block: Box::new(then_block),
                else_block,
            },
        })
    }

    /// `while expression block`
    fn parse_while(&mut self) -> Result<Expr, ParseError> {
        let lo = self.current().span;

        self.expect(&TokenKind::While)?;

        let cond = self.parse_expr()?;
        let body = self.parse_block()?;

        Ok(Expr {
            id: self.next_id(),
            span: lo.to(self.prev_span()),
            kind: ExprKind::While { cond: Box::new(cond), body: Box::new(body) },
        })
    }

    /// `return expression?`
    fn parse_return(&mut self) -> Result<Expr, ParseError> {
        let lo = self.current().span;

        self.expect(&TokenKind::Return)?;

        let value = if self.check(&TokenKind::RBrace) || self.check(&TokenKind::Semi) {
            let at = self.current().span.start;
            Expr { id: self.next_id(), kind: ExprKind::Unit, span: Span::new(at, at) }
        } else {
            self.parse_expr()?
        };

        Ok(Expr {
            id: self.next_id(),
            span: lo.to(self.prev_span()),
            kind: ExprKind::Return(Box::new(value)),
        })
    }

    // =========================================================================
    // Operator Precedence
    // =========================================================================

    /// Assignment: lowest precedence, right-associative (equal pair).
    const ASSIGN_BP: (u8, u8) = (1, 1);

    fn infix_bp(&self) -> Option<(u8, u8)> {
        match self.current_kind() {
            TokenKind::PipePipe => Some((3, 4)),
            TokenKind::AmpAmp => Some((5, 6)),
            TokenKind::EqEq
            | TokenKind::BangEq
            | TokenKind::Lt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::Gt => Some((7, 8)),
            TokenKind::Pipe => Some((9, 10)),
            TokenKind::Caret => Some((11, 12)),
            TokenKind::Amp => Some((13, 14)),
            TokenKind::Shl | TokenKind::Shr => Some((15, 16)),
            TokenKind::Plus | TokenKind::Minus => Some((17, 18)),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((19, 20)),
            // Right-associative: equal pair keeps climbing on the right
            TokenKind::StarStar => Some((21, 21)),
            _ => None,
        }
    }

    fn parse_binop(&mut self) -> Result<BinOp, ParseError> {
        let op = match self.current_kind() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::StarStar => BinOp::Pow,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::GtEq => BinOp::Ge,
            TokenKind::AmpAmp => BinOp::And,
            TokenKind::PipePipe => BinOp::Or,
            TokenKind::Amp => BinOp::BitAnd,
            TokenKind::Pipe => BinOp::BitOr,
            TokenKind::Caret => BinOp::BitXor,
            TokenKind::Shl => BinOp::Shl,
            TokenKind::Shr => BinOp::Shr,
            _ => {
                return Err(ParseError::expected(
                    "an operator like '+' or '-'",
                    self.current_kind(),
                    self.current().span,
                ))
            }
        };
        self.advance();
        Ok(op)
    }
}

/// Does this statement require a `;` before the next one?
///
/// Block-like expression statements carry their own delimiters.
fn stmt_needs_semi(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Let { .. } => true,
        StmtKind::Expr(e) => !matches!(
            e.kind,
            ExprKind::Block(_) | ExprKind::If { .. } | ExprKind::While { .. }
        ),
    }
}

/// Promote a statement expression to a block tail.
fn into_tail(stmt: Stmt) -> Expr {
    match stmt.kind {
        StmtKind::Expr(e) => e,
        StmtKind::Let { .. } => unreachable!("let statements always require a separator"),
    }
}

/// A parser error with location and friendly message.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        Self {
            span,
            message: format!("expected {}, found {}", expected, found.display_name()),
            hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        let tokens = kiln_lexer::Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_err(src: &str) -> ParseError {
        let tokens = kiln_lexer::Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect_err("expected parse error")
    }

    /// Parse the tail expression of `main`'s body.
    fn tail_of_main(src: &str) -> Expr {
        let program = parse(src);
        for symbol in program.symbols {
            if let SymbolKind::Function(f) = symbol.kind {
                if f.name.value == "main" {
                    return f.body.tail;
                }
            }
        }
        panic!("no main in test source");
    }

    #[test]
    fn function_signature() {
        let program = parse("fn add(a: int, b: int) -> int { a + b }");
        assert_eq!(program.symbols.len(), 1);
        let SymbolKind::Function(f) = &program.symbols[0].kind else {
            panic!("expected a function");
        };
        assert_eq!(f.name.value, "add");
        assert_eq!(f.signature(), (vec![Type::Int, Type::Int], Type::Int));
    }

    #[test]
    fn omitted_return_type_is_unit() {
        let program = parse("fn main() { }");
        let SymbolKind::Function(f) = &program.symbols[0].kind else {
            panic!("expected a function");
        };
        assert_eq!(f.ret, Type::Unit);
        assert!(matches!(f.body.tail.kind, ExprKind::Unit));
    }

    #[test]
    fn globals_take_literals_only() {
        let program = parse("const N: int = 1;\nstatic S: int = 2;");
        assert!(matches!(program.symbols[0].kind, SymbolKind::Const(_)));
        assert!(matches!(program.symbols[1].kind, SymbolKind::Static(_)));

        let err = parse_err("const N: int = 1 + 2;");
        assert!(err.message.contains("expected ';'"));
    }

    #[test]
    fn product_binds_tighter_than_sum() {
        let expr = tail_of_main("fn main() -> int { 2 + 3 * 4 }");
        let ExprKind::Binary { op: BinOp::Add, right, .. } = expr.kind else {
            panic!("expected `+` at the top");
        };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn sum_is_left_associative() {
        let expr = tail_of_main("fn main() -> int { 1 - 2 - 3 }");
        let ExprKind::Binary { op: BinOp::Sub, left, right } = expr.kind else {
            panic!("expected `-` at the top");
        };
        assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Sub, .. }));
        assert!(matches!(right.kind, ExprKind::Literal(Value::Int(3))));
    }

    #[test]
    fn exponent_is_right_associative() {
        let expr = tail_of_main("fn main() -> int { 2 ** 3 ** 4 }");
        let ExprKind::Binary { op: BinOp::Pow, left, right } = expr.kind else {
            panic!("expected `**` at the top");
        };
        assert!(matches!(left.kind, ExprKind::Literal(Value::Int(2))));
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn comparison_below_bitwise() {
        let expr = tail_of_main("fn main() -> bool { 1 & 2 == 3 & 4 }");
        // compare(4) < bit-and(7): `==` at the top
        assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Eq, .. }));
    }

    #[test]
    fn compound_assignment() {
        let program = parse("fn main() { let a: int = 0; a += 1 + 2; }");
        let SymbolKind::Function(f) = &program.symbols[0].kind else {
            panic!("expected a function");
        };
        let StmtKind::Expr(e) = &f.body.stmts[1].kind else {
            panic!("expected an expression statement");
        };
        let ExprKind::AssignOp { op: BinOp::Add, right, .. } = &e.kind else {
            panic!("expected compound assignment");
        };
        // The whole right-hand side belongs to the assignment
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse("fn main() { let a: int = 0; let b: int = 0; a = b = 1; }");
        let SymbolKind::Function(f) = &program.symbols[0].kind else {
            panic!("expected a function");
        };
        let StmtKind::Expr(e) = &f.body.stmts[2].kind else {
            panic!("expected an expression statement");
        };
        let ExprKind::Assign { right, .. } = &e.kind else {
            panic!("expected assignment");
        };
        assert!(matches!(right.kind, ExprKind::Assign { .. }));
    }

    #[test]
    fn block_tail_promotion() {
        let expr = tail_of_main("fn main() -> int { 1; 2 }");
        assert!(matches!(expr.kind, ExprKind::Literal(Value::Int(2))));

        // A trailing semicolon leaves a unit tail
        let expr = tail_of_main("fn main() { 1; 2; }");
        assert!(matches!(expr.kind, ExprKind::Unit));
    }

    #[test]
    fn block_like_statement_needs_no_semicolon() {
        let program = parse("fn main() { if true { } 1; }");
        let SymbolKind::Function(f) = &program.symbols[0].kind else {
            panic!("expected a function");
        };
        assert_eq!(f.body.stmts.len(), 2);
    }

    #[test]
    fn trailing_if_becomes_tail() {
        let expr = tail_of_main("fn main() -> int { if true { 1 } else { 2 } }");
        assert!(matches!(expr.kind, ExprKind::If { .. }));
    }

    #[test]
    fn extra_semicolons_are_eaten() {
        let program = parse("fn main() { 1;;; 2; }");
        let SymbolKind::Function(f) = &program.symbols[0].kind else {
            panic!("expected a function");
        };
        assert_eq!(f.body.stmts.len(), 2);
    }

    #[test]
    fn let_before_closing_brace_is_an_error() {
        let err = parse_err("fn main() { let x: int = 1 }");
        assert!(err.message.contains("expected ';'"));
    }

    #[test]
    fn bare_return_defaults_to_unit() {
        let expr = tail_of_main("fn main() { return }");
        let ExprKind::Return(value) = expr.kind else {
            panic!("expected return");
        };
        assert!(matches!(value.kind, ExprKind::Unit));
    }

    #[test]
    fn call_arguments() {
        let expr = tail_of_main("fn main() { f(1, 2 + 3) }");
        let ExprKind::Call { callee, args } = expr.kind else {
            panic!("expected a call");
        };
        assert!(matches!(callee.kind, ExprKind::Var(_)));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn unary_operand_extends_to_the_right() {
        // The prefix forms parse their operand as a full expression.
        let expr = tail_of_main("fn main() -> int { -2 + 3 }");
        let ExprKind::Unary { op: UnaryOp::Neg, operand } = expr.kind else {
            panic!("expected negation at the top");
        };
        assert!(matches!(operand.kind, ExprKind::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn group_resets_precedence() {
        let expr = tail_of_main("fn main() -> int { 2 * (3 + 5) }");
        let ExprKind::Binary { op: BinOp::Mul, right, .. } = expr.kind else {
            panic!("expected `*` at the top");
        };
        assert!(matches!(right.kind, ExprKind::Group(_)));
    }

    #[test]
    fn node_ids_are_unique() {
        let program = parse("fn main() { let x: int = 1; x = x + 1; }");
        let mut seen = std::collections::HashSet::new();
        let SymbolKind::Function(f) = &program.symbols[0].kind else {
            panic!("expected a function");
        };
        let mut stack: Vec<&Expr> = vec![&f.body.tail];
        assert!(seen.insert(f.body.id));
        for stmt in &f.body.stmts {
            assert!(seen.insert(stmt.id));
            match &stmt.kind {
                StmtKind::Let { init, .. } => stack.push(init),
                StmtKind::Expr(e) => stack.push(e),
            }
        }
        while let Some(e) = stack.pop() {
            assert!(seen.insert(e.id), "duplicate node id {:?}", e.id);
            match &e.kind {
                ExprKind::Assign { left, right }
                | ExprKind::AssignOp { left, right, .. }
                | ExprKind::Binary { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                ExprKind::Unary { operand, .. } => stack.push(operand),
                _ => {}
            }
        }
    }

    #[test]
    fn parse_error_is_fatal_and_spanned() {
        let err = parse_err("fn main() { 1 + ; }");
        assert!(err.message.contains("expected an expression"));
        assert_eq!(err.span.start, 16);
    }
}
