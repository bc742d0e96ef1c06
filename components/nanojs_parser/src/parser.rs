//! Recursive descent parser producing the AST.
//!
//! The parser owns an immutable token vector and walks it through a cursor.
//! Statements dispatch predictively on the first token; expressions are
//! parsed in three layers (primary, suffix, precedence climbing) steered by
//! four context flags. Statement termination follows the expect-break
//! discipline: a semicolon is consumed when present, otherwise a closing
//! brace, end of input, or an observed line break between consecutive
//! tokens ends the statement.
//!
//! Source spans are attached through a node-start stack: a start position
//! is pushed when a node begins and popped when it finishes, pairing with
//! the previous token's span end. Leftover stack entries at the end of a
//! parse produce warnings, never errors.

use crate::ast::{
    AssignmentOperator, AssignmentTarget, BinaryOperator, CatchClause, Expression, ForInit,
    LogicalOperator, MethodKind, NodeMeta, ObjectMember, ObjectMethod, ObjectProperty, Pattern,
    Program, Statement, SwitchCase, UnaryOperator, UpdateOperator, VariableDeclarator,
    VariableKind,
};
use crate::error::{expected_kinds, syntax_error, unexpected_eof, unexpected_token};
use crate::lexer::Lexer;
use crate::pattern;
use crate::token::{Keyword, Punctuator, Token, TokenKind};
use nanojs_core::{ParseError, SourcePosition, SourceSpan};

/// Parser configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Emit human-readable progress lines through the `log` facade
    pub emit_logs: bool,
    /// Skip location records and node-start bookkeeping
    pub omit_locations: bool,
}

/// Context flags steering expression parsing.
///
/// Each flag forbids one construct in the current position: binary operator
/// chains, comma sequences, assignments/arrows, or call argument lists.
#[derive(Debug, Clone, Copy)]
struct ExprContext {
    can_be_grouped: bool,
    can_be_sequence: bool,
    can_be_assignment: bool,
    can_be_call: bool,
}

impl Default for ExprContext {
    fn default() -> Self {
        Self {
            can_be_grouped: true,
            can_be_sequence: true,
            can_be_assignment: true,
            can_be_call: true,
        }
    }
}

/// Parse a complete program
pub fn parse(source: &str, options: ParserOptions) -> Result<Program, ParseError> {
    Parser::new(source, options).parse()
}

/// Parse a single expression; the whole input must be consumed
pub fn parse_expression(source: &str, options: ParserOptions) -> Result<Expression, ParseError> {
    Parser::new(source, options).parse_expression()
}

/// Recursive descent parser over a token vector
pub struct Parser {
    source: String,
    chars: Vec<char>,
    tokens: Vec<Token>,
    cursor: usize,
    node_starts: Vec<SourcePosition>,
    warnings: Vec<String>,
    options: ParserOptions,
}

impl Parser {
    /// Create a new parser for the given source code
    pub fn new(source: &str, options: ParserOptions) -> Self {
        Self {
            source: source.to_string(),
            chars: source.chars().collect(),
            tokens: Vec::new(),
            cursor: 0,
            node_starts: Vec::new(),
            warnings: Vec::new(),
            options,
        }
    }

    /// Parse the source into a program
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        self.prime()?;
        if self.options.emit_logs {
            log::debug!("parsing program ({} tokens)", self.tokens.len());
        }

        self.start_node();
        let mut body = Vec::new();
        while !self.check(TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);

        self.check_leftover_starts();
        if self.options.emit_logs {
            log::debug!("parsed program with {} statement(s)", body.len());
        }
        Ok(Program { body, meta })
    }

    /// Parse the source as a single expression
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.prime()?;
        let expr = self.parse_expression_with(ExprContext::default())?;
        if !self.check(TokenKind::Eof) {
            let token = self.peek(0)?.clone();
            return Err(self.fail(unexpected_token(&token)));
        }
        self.check_leftover_starts();
        Ok(expr)
    }

    /// Warnings collected while parsing (leftover node starts and the like)
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn prime(&mut self) -> Result<(), ParseError> {
        if self.tokens.is_empty() {
            self.tokens = Lexer::new(&self.source).tokenize()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Token primitives
    // ------------------------------------------------------------------

    fn peek(&self, offset: usize) -> Result<&Token, ParseError> {
        self.tokens
            .get(self.cursor + offset)
            .ok_or_else(unexpected_eof)
    }

    fn peek_kind(&self, offset: usize) -> Result<TokenKind, ParseError> {
        Ok(self.peek(offset)?.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.check_at(kind, 0)
    }

    fn check_at(&self, kind: TokenKind, offset: usize) -> bool {
        self.tokens
            .get(self.cursor + offset)
            .map(|t| t.kind == kind)
            .unwrap_or(false)
    }

    fn check_punctuator(&self, p: Punctuator) -> bool {
        self.check(TokenKind::Punctuator(p))
    }

    fn check_keyword(&self, k: Keyword) -> bool {
        self.check(TokenKind::Keyword(k))
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let token = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or_else(unexpected_eof)?;
        self.cursor += 1;
        Ok(token)
    }

    fn expect_punctuator(&mut self, p: Punctuator) -> Result<Token, ParseError> {
        if self.check_punctuator(p) {
            self.advance()
        } else {
            let token = self.peek(0)?.clone();
            Err(self.fail(expected_kinds(p.name(), &token)))
        }
    }

    fn expect_keyword(&mut self, k: Keyword) -> Result<Token, ParseError> {
        if self.check_keyword(k) {
            self.advance()
        } else {
            let token = self.peek(0)?.clone();
            Err(self.fail(expected_kinds(k.name(), &token)))
        }
    }

    fn current_position(&self) -> Option<SourcePosition> {
        self.tokens
            .get(self.cursor)
            .and_then(|t| t.span.as_ref())
            .map(|s| s.start.clone())
    }

    /// Whether the source between the previous and the current token
    /// contains a line terminator
    fn line_break_before_current(&self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = self.tokens.get(self.cursor - 1).and_then(|t| t.span.as_ref());
        let current = self.tokens.get(self.cursor).and_then(|t| t.span.as_ref());
        let (Some(prev), Some(current)) = (prev, current) else {
            return false;
        };
        self.chars[prev.end.offset..current.start.offset]
            .iter()
            .any(|&c| c == '\n' || c == '\r')
    }

    /// Terminate a statement: consume `;` when present, otherwise accept a
    /// closing brace, end of input, or a line break before the next token
    fn expect_break(&mut self) -> Result<(), ParseError> {
        if self.check_punctuator(Punctuator::Semicolon) {
            self.advance()?;
            return Ok(());
        }
        if self.check_punctuator(Punctuator::RBrace) || self.check(TokenKind::Eof) {
            return Ok(());
        }
        if self.line_break_before_current() {
            return Ok(());
        }
        let token = self.peek(0)?.clone();
        Err(self.fail(unexpected_token(&token)))
    }

    fn statement_break_imminent(&self) -> bool {
        self.check_punctuator(Punctuator::Semicolon)
            || self.check_punctuator(Punctuator::RBrace)
            || self.check(TokenKind::Eof)
            || self.line_break_before_current()
    }

    // ------------------------------------------------------------------
    // Location tracking
    // ------------------------------------------------------------------

    fn start_node(&mut self) {
        if self.options.omit_locations {
            return;
        }
        let position = self
            .tokens
            .get(self.cursor)
            .and_then(|t| t.span.as_ref())
            .map(|s| s.start.clone())
            .unwrap_or_else(|| self.end_position());
        self.node_starts.push(position);
    }

    /// Reuse an existing node's start, for retroactive grouping when a
    /// finished expression becomes the left operand of a larger node
    fn start_node_at(&mut self, meta: &NodeMeta) {
        if self.options.omit_locations {
            return;
        }
        let position = meta
            .span
            .as_ref()
            .map(|s| s.start.clone())
            .unwrap_or_else(|| self.end_position());
        self.node_starts.push(position);
    }

    fn finish_node(&mut self, meta: &mut NodeMeta) {
        if self.options.omit_locations {
            return;
        }
        let Some(start) = self.node_starts.pop() else {
            self.warnings
                .push("node start stack underflow while finishing a node".to_string());
            return;
        };
        let end = if self.cursor > 0 {
            self.tokens[self.cursor - 1]
                .span
                .as_ref()
                .map(|s| s.end.clone())
                .unwrap_or_else(|| start.clone())
        } else {
            start.clone()
        };
        meta.span = Some(SourceSpan::new(start, end));
    }

    fn end_position(&self) -> SourcePosition {
        self.tokens
            .last()
            .and_then(|t| t.span.as_ref())
            .map(|s| s.end.clone())
            .unwrap_or_default()
    }

    fn check_leftover_starts(&mut self) {
        if self.node_starts.is_empty() {
            return;
        }
        let warning = format!(
            "{} node start position(s) left unconsumed after parsing",
            self.node_starts.len()
        );
        log::warn!("{}", warning);
        self.warnings.push(warning);
        self.node_starts.clear();
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Write the two-line source pointer for an error to the side-channel
    /// log, then hand the error back for raising
    fn fail(&self, error: ParseError) -> ParseError {
        if let Some(position) = &error.source_position {
            let line = self.source_line(position.line);
            log::debug!("{}", line);
            log::debug!("{}^", " ".repeat(position.column as usize));
        }
        error
    }

    fn source_line(&self, line: u32) -> String {
        self.chars
            .split(|&c| c == '\n')
            .nth(line as usize)
            .map(|cs| cs.iter().collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let kind = self.peek_kind(0)?;
        if self.options.emit_logs {
            log::debug!("statement dispatch on {}", self.peek(0)?.display_value());
        }

        match kind {
            TokenKind::Punctuator(Punctuator::LBrace) => self.parse_block_statement(),
            TokenKind::Keyword(Keyword::Var)
            | TokenKind::Keyword(Keyword::Let)
            | TokenKind::Keyword(Keyword::Const) => self.parse_variable_declaration(),
            TokenKind::Keyword(Keyword::Function) => self.parse_function_declaration(),
            TokenKind::Keyword(Keyword::Async)
                if self.check_at(TokenKind::Keyword(Keyword::Function), 1) =>
            {
                self.parse_function_declaration()
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            TokenKind::Keyword(Keyword::Try) => self.parse_try_statement(),
            TokenKind::Keyword(Keyword::With) => self.parse_with_statement(),
            TokenKind::Keyword(Keyword::Debugger) => self.parse_debugger_statement(),
            TokenKind::Keyword(Keyword::Break) => self.parse_break_statement(),
            TokenKind::Keyword(Keyword::Continue) => self.parse_continue_statement(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            TokenKind::Punctuator(Punctuator::Semicolon) => {
                self.start_node();
                self.advance()?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok(Statement::EmptyStatement { meta })
            }
            TokenKind::Identifier
                if self.check_at(TokenKind::Punctuator(Punctuator::Colon), 1) =>
            {
                self.parse_labeled_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut body = Vec::new();
        while !self.check_punctuator(Punctuator::RBrace) && !self.check(TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        self.expect_punctuator(Punctuator::RBrace)?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::BlockStatement { body, meta })
    }

    fn parse_variable_declaration(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        let kind = match self.advance()?.kind {
            TokenKind::Keyword(Keyword::Var) => VariableKind::Var,
            TokenKind::Keyword(Keyword::Let) => VariableKind::Let,
            TokenKind::Keyword(Keyword::Const) => VariableKind::Const,
            _ => unreachable!(),
        };

        let mut declarations = Vec::new();
        loop {
            declarations.push(self.parse_variable_declarator()?);
            if self.check_punctuator(Punctuator::Comma) {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect_break()?;

        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::VariableDeclaration {
            kind,
            declarations,
            meta,
        })
    }

    fn parse_variable_declarator(&mut self) -> Result<VariableDeclarator, ParseError> {
        self.start_node();
        // The binding side is parsed as an expression and reinterpreted
        let target = self.parse_expression_with(ExprContext {
            can_be_sequence: false,
            can_be_assignment: false,
            ..Default::default()
        })?;
        let id = pattern::expression_to_pattern(target)?;

        let init = if self.check_punctuator(Punctuator::Assign) {
            self.advance()?;
            Some(self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                ..Default::default()
            })?)
        } else {
            None
        };

        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(VariableDeclarator { id, init, meta })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        let is_async = if self.check_keyword(Keyword::Async) {
            self.advance()?;
            true
        } else {
            false
        };
        self.expect_keyword(Keyword::Function)?;
        let is_generator = if self.check_punctuator(Punctuator::Star) {
            self.advance()?;
            true
        } else {
            false
        };

        if !self.check(TokenKind::Identifier) {
            let position = self.current_position();
            return Err(self.fail(syntax_error(
                "Function statements require a function name",
                position,
            )));
        }
        let name = self.advance()?.value;

        let params = self.parse_parameter_list()?;
        let body = self.parse_block_statement()?;

        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::FunctionDeclaration {
            name,
            params,
            body: Box::new(body),
            is_generator,
            is_async,
            meta,
        })
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::If)?;
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression_with(ExprContext::default())?;
        self.expect_punctuator(Punctuator::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.check_keyword(Keyword::Else) {
            self.advance()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::IfStatement {
            test,
            consequent,
            alternate,
            meta,
        })
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Switch)?;
        self.expect_punctuator(Punctuator::LParen)?;
        let discriminant = self.parse_expression_with(ExprContext::default())?;
        self.expect_punctuator(Punctuator::RParen)?;
        self.expect_punctuator(Punctuator::LBrace)?;

        let mut cases = Vec::new();
        while !self.check_punctuator(Punctuator::RBrace) && !self.check(TokenKind::Eof) {
            cases.push(self.parse_switch_case()?);
        }
        self.expect_punctuator(Punctuator::RBrace)?;

        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::SwitchStatement {
            discriminant,
            cases,
            meta,
        })
    }

    fn parse_switch_case(&mut self) -> Result<SwitchCase, ParseError> {
        self.start_node();
        let test = if self.check_keyword(Keyword::Case) {
            self.advance()?;
            Some(self.parse_expression_with(ExprContext::default())?)
        } else if self.check_keyword(Keyword::Default) {
            self.advance()?;
            None
        } else {
            let token = self.peek(0)?.clone();
            return Err(self.fail(expected_kinds("case or default", &token)));
        };
        self.expect_punctuator(Punctuator::Colon)?;

        // Case bodies run until the next clause or the end of the switch
        let mut consequent = Vec::new();
        while !self.check_keyword(Keyword::Case)
            && !self.check_keyword(Keyword::Default)
            && !self.check_punctuator(Punctuator::RBrace)
            && !self.check(TokenKind::Eof)
        {
            consequent.push(self.parse_statement()?);
        }

        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(SwitchCase {
            test,
            consequent,
            meta,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::For)?;
        self.expect_punctuator(Punctuator::LParen)?;

        let init = if self.check_punctuator(Punctuator::Semicolon) {
            self.advance()?;
            None
        } else if matches!(
            self.peek_kind(0)?,
            TokenKind::Keyword(Keyword::Var | Keyword::Let | Keyword::Const)
        ) {
            // The declaration's own break handling consumes the first `;`
            match self.parse_variable_declaration()? {
                Statement::VariableDeclaration {
                    kind,
                    declarations,
                    meta,
                } => Some(ForInit::VariableDeclaration {
                    kind,
                    declarations,
                    meta,
                }),
                _ => unreachable!(),
            }
        } else {
            let expression = self.parse_expression_with(ExprContext::default())?;
            self.expect_punctuator(Punctuator::Semicolon)?;
            Some(ForInit::Expression(expression))
        };

        let test = if self.check_punctuator(Punctuator::Semicolon) {
            None
        } else {
            Some(self.parse_expression_with(ExprContext::default())?)
        };
        self.expect_punctuator(Punctuator::Semicolon)?;

        let update = if self.check_punctuator(Punctuator::RParen) {
            None
        } else {
            Some(self.parse_expression_with(ExprContext::default())?)
        };
        self.expect_punctuator(Punctuator::RParen)?;

        let body = Box::new(self.parse_statement()?);
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::ForStatement {
            init,
            test,
            update,
            body,
            meta,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::While)?;
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression_with(ExprContext::default())?;
        self.expect_punctuator(Punctuator::RParen)?;
        let body = Box::new(self.parse_statement()?);
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::WhileStatement { test, body, meta })
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Do)?;
        let body = Box::new(self.parse_statement()?);
        self.expect_keyword(Keyword::While)?;
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression_with(ExprContext::default())?;
        self.expect_punctuator(Punctuator::RParen)?;
        self.expect_break()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::DoWhileStatement { body, test, meta })
    }

    fn parse_try_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Try)?;
        let block = Box::new(self.parse_block_statement()?);

        let handler = if self.check_keyword(Keyword::Catch) {
            Some(self.parse_catch_clause()?)
        } else {
            None
        };
        let finalizer = if self.check_keyword(Keyword::Finally) {
            self.advance()?;
            Some(Box::new(self.parse_block_statement()?))
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            let position = self.current_position();
            return Err(self.fail(syntax_error("Missing catch or finally after try", position)));
        }

        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::TryStatement {
            block,
            handler,
            finalizer,
            meta,
        })
    }

    fn parse_catch_clause(&mut self) -> Result<CatchClause, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Catch)?;
        let param = if self.check_punctuator(Punctuator::LParen) {
            self.advance()?;
            let target = self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                can_be_assignment: false,
                ..Default::default()
            })?;
            let binding = pattern::expression_to_pattern(target)?;
            self.expect_punctuator(Punctuator::RParen)?;
            Some(binding)
        } else {
            None
        };
        let body = Box::new(self.parse_block_statement()?);
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(CatchClause { param, body, meta })
    }

    fn parse_with_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::With)?;
        self.expect_punctuator(Punctuator::LParen)?;
        let object = self.parse_expression_with(ExprContext::default())?;
        self.expect_punctuator(Punctuator::RParen)?;
        let body = Box::new(self.parse_statement()?);
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::WithStatement { object, body, meta })
    }

    fn parse_debugger_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Debugger)?;
        self.expect_break()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::DebuggerStatement { meta })
    }

    fn parse_break_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Break)?;
        let label = if self.check(TokenKind::Identifier) && !self.line_break_before_current() {
            Some(self.advance()?.value)
        } else {
            None
        };
        self.expect_break()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::BreakStatement { label, meta })
    }

    fn parse_continue_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Continue)?;
        let label = if self.check(TokenKind::Identifier) && !self.line_break_before_current() {
            Some(self.advance()?.value)
        } else {
            None
        };
        self.expect_break()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::ContinueStatement { label, meta })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Return)?;
        let argument = if self.statement_break_imminent() {
            None
        } else {
            Some(self.parse_expression_with(ExprContext::default())?)
        };
        self.expect_break()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::ReturnStatement { argument, meta })
    }

    fn parse_labeled_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        let label = self.advance()?.value;
        self.expect_punctuator(Punctuator::Colon)?;
        let body = Box::new(self.parse_statement()?);
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::LabeledStatement { label, body, meta })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        self.start_node();
        let expression = self.parse_expression_with(ExprContext::default())?;
        self.expect_break()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Statement::ExpressionStatement { expression, meta })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression_with(&mut self, ctx: ExprContext) -> Result<Expression, ParseError> {
        let first = self.parse_expression_inner(ctx)?;
        let expr = self.parse_expression_suffix(first, ctx)?;
        if ctx.can_be_sequence && self.check_punctuator(Punctuator::Comma) {
            return self.parse_sequence_tail(expr, ctx);
        }
        Ok(expr)
    }

    /// Parse `expr , expr , ...` after the first entry; inner entries may
    /// not themselves be sequences
    fn parse_sequence_tail(
        &mut self,
        first: Expression,
        ctx: ExprContext,
    ) -> Result<Expression, ParseError> {
        let mut expressions = vec![first];
        while self.check_punctuator(Punctuator::Comma) {
            self.advance()?;
            expressions.push(self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                ..ctx
            })?);
        }
        self.start_node_at(expressions[0].meta());
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::SequenceExpression { expressions, meta })
    }

    /// Primary-expression layer: literals, identifiers, prefix operators,
    /// bracketed constructs, and the keyword-introduced expressions
    fn parse_expression_inner(&mut self, ctx: ExprContext) -> Result<Expression, ParseError> {
        let token = self.peek(0)?.clone();
        match token.kind {
            TokenKind::Punctuator(Punctuator::Plus) => {
                self.parse_unary_expression(UnaryOperator::Plus, ctx)
            }
            TokenKind::Punctuator(Punctuator::Minus) => {
                self.parse_unary_expression(UnaryOperator::Minus, ctx)
            }
            TokenKind::Punctuator(Punctuator::Not) => {
                self.parse_unary_expression(UnaryOperator::Not, ctx)
            }
            TokenKind::Punctuator(Punctuator::Tilde) => {
                self.parse_unary_expression(UnaryOperator::BitwiseNot, ctx)
            }
            TokenKind::Keyword(Keyword::Typeof) => {
                self.parse_unary_expression(UnaryOperator::Typeof, ctx)
            }
            TokenKind::Keyword(Keyword::Void) => {
                self.parse_unary_expression(UnaryOperator::Void, ctx)
            }
            TokenKind::Keyword(Keyword::Delete) => {
                self.parse_unary_expression(UnaryOperator::Delete, ctx)
            }
            TokenKind::Keyword(Keyword::Throw) => {
                self.parse_unary_expression(UnaryOperator::Throw, ctx)
            }
            TokenKind::Punctuator(Punctuator::PlusPlus) => {
                self.parse_prefix_update(UpdateOperator::Increment, ctx)
            }
            TokenKind::Punctuator(Punctuator::MinusMinus) => {
                self.parse_prefix_update(UpdateOperator::Decrement, ctx)
            }

            TokenKind::Identifier => {
                self.start_node();
                let token = self.advance()?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok(Expression::Identifier {
                    name: token.value,
                    meta,
                })
            }
            TokenKind::Number => {
                self.start_node();
                let token = self.advance()?;
                let value = token.value.parse::<f64>().map_err(|_| {
                    syntax_error(
                        format!("Invalid number literal {}", token.value),
                        token.span.as_ref().map(|s| s.start.clone()),
                    )
                })?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok(Expression::NumericLiteral { value, meta })
            }
            TokenKind::String => {
                self.start_node();
                let token = self.advance()?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok(Expression::StringLiteral {
                    value: token.value,
                    meta,
                })
            }
            TokenKind::TemplateString => {
                self.start_node();
                let token = self.advance()?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok(Expression::TemplateLiteral {
                    value: token.value,
                    meta,
                })
            }
            TokenKind::Keyword(Keyword::True) => self.parse_literal_keyword(|meta| {
                Expression::BooleanLiteral { value: true, meta }
            }),
            TokenKind::Keyword(Keyword::False) => self.parse_literal_keyword(|meta| {
                Expression::BooleanLiteral { value: false, meta }
            }),
            TokenKind::Keyword(Keyword::Null) => {
                self.parse_literal_keyword(|meta| Expression::NullLiteral { meta })
            }
            TokenKind::Keyword(Keyword::This) => {
                self.parse_literal_keyword(|meta| Expression::ThisExpression { meta })
            }
            TokenKind::Keyword(Keyword::Super) => {
                self.parse_literal_keyword(|meta| Expression::SuperExpression { meta })
            }

            TokenKind::Keyword(Keyword::New) => self.parse_new_expression(ctx),
            TokenKind::Keyword(Keyword::Function) => {
                self.start_node();
                self.parse_function_expression_tail(false)
            }
            TokenKind::Keyword(Keyword::Async) => self.parse_async_expression(),
            TokenKind::Keyword(Keyword::Do) => {
                self.start_node();
                self.parse_do_expression_tail(false)
            }
            TokenKind::Keyword(Keyword::Yield) => self.parse_yield_expression(),
            TokenKind::Keyword(Keyword::Await) => self.parse_await_expression(ctx),

            TokenKind::Punctuator(Punctuator::LParen) => self.parse_parenthesized(),
            TokenKind::Punctuator(Punctuator::LBracket) => self.parse_array_expression(),
            TokenKind::Punctuator(Punctuator::LBrace) => self.parse_object_expression(),

            _ => Err(self.fail(unexpected_token(&token))),
        }
    }

    fn parse_literal_keyword(
        &mut self,
        build: impl FnOnce(NodeMeta) -> Expression,
    ) -> Result<Expression, ParseError> {
        self.start_node();
        self.advance()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(build(meta))
    }

    fn parse_unary_expression(
        &mut self,
        operator: UnaryOperator,
        ctx: ExprContext,
    ) -> Result<Expression, ParseError> {
        self.start_node();
        self.advance()?;
        let argument = self.parse_unary_operand(ctx)?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::UnaryExpression {
            operator,
            argument: Box::new(argument),
            meta,
        })
    }

    fn parse_prefix_update(
        &mut self,
        operator: UpdateOperator,
        ctx: ExprContext,
    ) -> Result<Expression, ParseError> {
        self.start_node();
        self.advance()?;
        let argument = self.parse_unary_operand(ctx)?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::UpdateExpression {
            operator,
            argument: Box::new(argument),
            prefix: true,
            meta,
        })
    }

    /// Operand of a prefix operator: member/call/update suffixes bind
    /// tighter than the prefix, operator chains do not
    fn parse_unary_operand(&mut self, ctx: ExprContext) -> Result<Expression, ParseError> {
        let operand_ctx = ExprContext {
            can_be_grouped: false,
            can_be_sequence: false,
            can_be_assignment: false,
            can_be_call: ctx.can_be_call,
        };
        let inner = self.parse_expression_inner(operand_ctx)?;
        self.parse_expression_suffix(inner, operand_ctx)
    }

    fn parse_new_expression(&mut self, _ctx: ExprContext) -> Result<Expression, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::New)?;
        // The callee may not itself be a call; `new a.b()` owns the parens
        let callee_ctx = ExprContext {
            can_be_grouped: false,
            can_be_sequence: false,
            can_be_assignment: false,
            can_be_call: false,
        };
        let inner = self.parse_expression_inner(callee_ctx)?;
        let callee = self.parse_expression_suffix(inner, callee_ctx)?;
        let arguments = if self.check_punctuator(Punctuator::LParen) {
            self.parse_argument_list()?
        } else {
            Vec::new()
        };
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::NewExpression {
            callee: Box::new(callee),
            arguments,
            meta,
        })
    }

    fn parse_function_expression_tail(&mut self, is_async: bool) -> Result<Expression, ParseError> {
        self.expect_keyword(Keyword::Function)?;
        let is_generator = if self.check_punctuator(Punctuator::Star) {
            self.advance()?;
            true
        } else {
            false
        };
        let name = if self.check(TokenKind::Identifier) {
            Some(self.advance()?.value)
        } else {
            None
        };
        let params = self.parse_parameter_list()?;
        let body = self.parse_block_statement()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::FunctionExpression {
            name,
            params,
            body: Box::new(body),
            is_generator,
            is_async,
            meta,
        })
    }

    fn parse_do_expression_tail(&mut self, is_async: bool) -> Result<Expression, ParseError> {
        self.expect_keyword(Keyword::Do)?;
        let body = self.parse_block_statement()?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::DoExpression {
            body: Box::new(body),
            is_async,
            meta,
        })
    }

    /// `async` in expression position: an async arrow parameter list, an
    /// async do expression, or an async function expression
    fn parse_async_expression(&mut self) -> Result<Expression, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Async)?;

        if self.check_punctuator(Punctuator::LParen) {
            let inner = self.parse_paren_items()?;
            self.expect_punctuator(Punctuator::Arrow)?;
            let params = match inner {
                None => Vec::new(),
                Some(expr) => pattern::expression_to_parameters(expr)?,
            };
            let body = self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                ..Default::default()
            })?;
            let mut meta = NodeMeta::default();
            self.finish_node(&mut meta);
            return Ok(Expression::ArrowFunctionExpression {
                params,
                body: Box::new(body),
                is_async: true,
                meta,
            });
        }

        if self.check_keyword(Keyword::Do) {
            return self.parse_do_expression_tail(true);
        }

        self.parse_function_expression_tail(true)
    }

    fn parse_yield_expression(&mut self) -> Result<Expression, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Yield)?;
        let delegate = if self.check_punctuator(Punctuator::Star) {
            self.advance()?;
            true
        } else {
            false
        };
        let argument = if self.yield_argument_follows() {
            Some(Box::new(self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                ..Default::default()
            })?))
        } else {
            None
        };
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::YieldExpression {
            argument,
            delegate,
            meta,
        })
    }

    fn yield_argument_follows(&self) -> bool {
        if self.line_break_before_current() {
            return false;
        }
        !matches!(
            self.tokens.get(self.cursor).map(|t| t.kind),
            Some(TokenKind::Eof)
                | Some(TokenKind::Punctuator(
                    Punctuator::Semicolon
                        | Punctuator::RParen
                        | Punctuator::RBracket
                        | Punctuator::RBrace
                        | Punctuator::Comma
                        | Punctuator::Colon
                ))
        )
    }

    fn parse_await_expression(&mut self, ctx: ExprContext) -> Result<Expression, ParseError> {
        self.start_node();
        self.expect_keyword(Keyword::Await)?;
        let argument = self.parse_unary_operand(ctx)?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::AwaitExpression {
            argument: Box::new(argument),
            meta,
        })
    }

    /// `(` in expression position: an empty arrow parameter list, or a
    /// parenthesised expression that may become an arrow parameter list
    fn parse_parenthesized(&mut self) -> Result<Expression, ParseError> {
        if self.check_at(TokenKind::Punctuator(Punctuator::RParen), 1) {
            if self.check_at(TokenKind::Punctuator(Punctuator::Arrow), 2) {
                self.start_node();
                self.advance()?;
                self.advance()?;
                self.expect_punctuator(Punctuator::Arrow)?;
                let body = self.parse_expression_with(ExprContext {
                    can_be_sequence: false,
                    ..Default::default()
                })?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                return Ok(Expression::ArrowFunctionExpression {
                    params: Vec::new(),
                    body: Box::new(body),
                    is_async: false,
                    meta,
                });
            }
            let token = self.peek(1)?.clone();
            return Err(self.fail(unexpected_token(&token)));
        }

        match self.parse_paren_items()? {
            Some(expr) => {
                // Spread entries are only valid as arrow parameters
                if !self.check_punctuator(Punctuator::Arrow) {
                    if let Some(spread) = find_spread(&expr) {
                        return Err(self.fail(syntax_error(
                            "Unexpected token ...",
                            spread.meta().span.as_ref().map(|s| s.start.clone()),
                        )));
                    }
                }
                Ok(expr)
            }
            None => {
                let token = self.peek(0)?.clone();
                Err(self.fail(unexpected_token(&token)))
            }
        }
    }

    /// Parse a parenthesised list, permitting spread entries for later
    /// arrow-parameter conversion. Returns `None` for an empty `()`.
    fn parse_paren_items(&mut self) -> Result<Option<Expression>, ParseError> {
        self.expect_punctuator(Punctuator::LParen)?;
        if self.check_punctuator(Punctuator::RParen) {
            self.advance()?;
            return Ok(None);
        }

        let item_ctx = ExprContext {
            can_be_sequence: false,
            ..Default::default()
        };
        let first = if self.check_punctuator(Punctuator::Spread) {
            self.parse_spread_element()?
        } else {
            self.parse_expression_with(item_ctx)?
        };

        let expr = if self.check_punctuator(Punctuator::Comma) {
            let mut expressions = vec![first];
            while self.check_punctuator(Punctuator::Comma) {
                self.advance()?;
                if self.check_punctuator(Punctuator::RParen) {
                    if let Some(last) = expressions.last_mut() {
                        last.meta_mut().trailing_comma = true;
                    }
                    break;
                }
                let item = if self.check_punctuator(Punctuator::Spread) {
                    self.parse_spread_element()?
                } else {
                    self.parse_expression_with(item_ctx)?
                };
                expressions.push(item);
            }
            if expressions.len() == 1 {
                expressions.swap_remove(0)
            } else {
                self.start_node_at(expressions[0].meta());
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Expression::SequenceExpression { expressions, meta }
            }
        } else {
            first
        };

        self.expect_punctuator(Punctuator::RParen)?;
        Ok(Some(expr))
    }

    fn parse_spread_element(&mut self) -> Result<Expression, ParseError> {
        self.start_node();
        self.expect_punctuator(Punctuator::Spread)?;
        let argument = self.parse_expression_with(ExprContext {
            can_be_sequence: false,
            ..Default::default()
        })?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::SpreadElement {
            argument: Box::new(argument),
            meta,
        })
    }

    fn parse_array_expression(&mut self) -> Result<Expression, ParseError> {
        self.start_node();
        self.expect_punctuator(Punctuator::LBracket)?;
        let mut elements: Vec<Option<Expression>> = Vec::new();
        loop {
            if self.check_punctuator(Punctuator::RBracket) {
                break;
            }
            if self.check_punctuator(Punctuator::Comma) {
                // elision hole
                self.advance()?;
                elements.push(None);
                continue;
            }
            let element = if self.check_punctuator(Punctuator::Spread) {
                self.parse_spread_element()?
            } else {
                self.parse_expression_with(ExprContext {
                    can_be_sequence: false,
                    ..Default::default()
                })?
            };
            elements.push(Some(element));
            if self.check_punctuator(Punctuator::Comma) {
                self.advance()?;
                if self.check_punctuator(Punctuator::RBracket) {
                    if let Some(Some(last)) = elements.last_mut() {
                        last.meta_mut().trailing_comma = true;
                    }
                }
            } else {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RBracket)?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::ArrayExpression { elements, meta })
    }

    fn parse_object_expression(&mut self) -> Result<Expression, ParseError> {
        self.start_node();
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut properties = Vec::new();
        loop {
            if self.check_punctuator(Punctuator::RBrace) {
                break;
            }
            properties.push(self.parse_object_member()?);
            if self.check_punctuator(Punctuator::Comma) {
                self.advance()?;
                if self.check_punctuator(Punctuator::RBrace) {
                    if let Some(last) = properties.last_mut() {
                        last.meta_mut().trailing_comma = true;
                    }
                }
            } else {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RBrace)?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::ObjectExpression { properties, meta })
    }

    fn parse_object_member(&mut self) -> Result<ObjectMember, ParseError> {
        self.start_node();

        if self.check_punctuator(Punctuator::Spread) {
            self.advance()?;
            let argument = self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                ..Default::default()
            })?;
            let mut meta = NodeMeta::default();
            self.finish_node(&mut meta);
            return Ok(ObjectMember::Spread {
                argument: Box::new(argument),
                meta,
            });
        }

        let (mut key, mut computed) = self.parse_member_key()?;

        // `get`/`set` followed by another key introduces an accessor
        let accessor = match &key {
            Expression::Identifier { name, .. }
                if !computed && (name == "get" || name == "set") && self.member_key_follows() =>
            {
                if name == "get" {
                    Some(MethodKind::Get)
                } else {
                    Some(MethodKind::Set)
                }
            }
            _ => None,
        };
        if let Some(kind) = accessor {
            let (actual_key, actual_computed) = self.parse_member_key()?;
            key = actual_key;
            computed = actual_computed;
            let params = self.parse_parameter_list()?;
            let body = self.parse_block_statement()?;
            let mut meta = NodeMeta::default();
            self.finish_node(&mut meta);
            return Ok(ObjectMember::Method(ObjectMethod {
                kind,
                key,
                params,
                body: Box::new(body),
                computed,
                is_generator: false,
                is_async: false,
                meta,
            }));
        }

        if self.check_punctuator(Punctuator::Colon) {
            self.advance()?;
            let value = self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                ..Default::default()
            })?;
            let mut meta = NodeMeta::default();
            self.finish_node(&mut meta);
            return Ok(ObjectMember::Property(ObjectProperty {
                key,
                value,
                computed,
                shorthand: false,
                meta,
            }));
        }

        if self.check_punctuator(Punctuator::Assign) {
            // Shorthand with default; only meaningful once the surrounding
            // object is rewritten into a pattern
            self.advance()?;
            self.start_node_at(key.meta());
            let right = self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                ..Default::default()
            })?;
            let mut assign_meta = NodeMeta::default();
            self.finish_node(&mut assign_meta);
            let value = Expression::AssignmentExpression {
                operator: AssignmentOperator::Assign,
                left: AssignmentTarget::Expression(Box::new(key.clone())),
                right: Box::new(right),
                meta: assign_meta,
            };
            let mut meta = NodeMeta::default();
            self.finish_node(&mut meta);
            return Ok(ObjectMember::Property(ObjectProperty {
                key,
                value,
                computed,
                shorthand: true,
                meta,
            }));
        }

        if self.check_punctuator(Punctuator::LParen) {
            let params = self.parse_parameter_list()?;
            let body = self.parse_block_statement()?;
            let mut meta = NodeMeta::default();
            self.finish_node(&mut meta);
            return Ok(ObjectMember::Method(ObjectMethod {
                kind: MethodKind::Method,
                key,
                params,
                body: Box::new(body),
                computed,
                is_generator: false,
                is_async: false,
                meta,
            }));
        }

        if self.check_punctuator(Punctuator::Comma) || self.check_punctuator(Punctuator::RBrace) {
            // shorthand member: `{ a }`
            if let Expression::Identifier { .. } = &key {
                let value = key.clone();
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                return Ok(ObjectMember::Property(ObjectProperty {
                    key,
                    value,
                    computed: false,
                    shorthand: true,
                    meta,
                }));
            }
        }

        let token = self.peek(0)?.clone();
        Err(self.fail(expected_kinds(":", &token)))
    }

    /// Parse an object member key: computed `[expr]`, identifier, keyword
    /// used as a name, string, or number
    fn parse_member_key(&mut self) -> Result<(Expression, bool), ParseError> {
        if self.check_punctuator(Punctuator::LBracket) {
            self.advance()?;
            let key = self.parse_expression_with(ExprContext {
                can_be_sequence: false,
                ..Default::default()
            })?;
            self.expect_punctuator(Punctuator::RBracket)?;
            return Ok((key, true));
        }

        let token = self.peek(0)?.clone();
        match token.kind {
            TokenKind::Identifier => {
                self.start_node();
                self.advance()?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok((
                    Expression::Identifier {
                        name: token.value,
                        meta,
                    },
                    false,
                ))
            }
            TokenKind::Keyword(_) => Ok((self.keyword_as_name()?, false)),
            TokenKind::String => {
                self.start_node();
                self.advance()?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok((
                    Expression::StringLiteral {
                        value: token.value,
                        meta,
                    },
                    false,
                ))
            }
            TokenKind::Number => {
                self.start_node();
                self.advance()?;
                let value = token.value.parse::<f64>().map_err(|_| {
                    syntax_error(
                        format!("Invalid number literal {}", token.value),
                        token.span.as_ref().map(|s| s.start.clone()),
                    )
                })?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok((Expression::NumericLiteral { value, meta }, false))
            }
            _ => Err(self.fail(unexpected_token(&token))),
        }
    }

    /// Consume a keyword token and produce an identifier node from its word
    fn keyword_as_name(&mut self) -> Result<Expression, ParseError> {
        self.start_node();
        let token = self.advance()?;
        match token.kind {
            TokenKind::Keyword(keyword) => {
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Ok(Expression::Identifier {
                    name: keyword.name().to_string(),
                    meta,
                })
            }
            _ => Err(self.fail(syntax_error(
                format!("Token {} is not a keyword", token.display_value()),
                token.span.as_ref().map(|s| s.start.clone()),
            ))),
        }
    }

    fn member_key_follows(&self) -> bool {
        matches!(
            self.tokens.get(self.cursor).map(|t| t.kind),
            Some(TokenKind::Identifier) | Some(TokenKind::Keyword(_))
        )
    }

    /// Suffix layer: assignments, postfix updates, member access, calls,
    /// conditionals, arrows, and entry into precedence climbing
    fn parse_expression_suffix(
        &mut self,
        mut expr: Expression,
        ctx: ExprContext,
    ) -> Result<Expression, ParseError> {
        loop {
            let kind = self.peek_kind(0)?;
            match kind {
                TokenKind::Punctuator(p) if p.is_assignment() && ctx.can_be_assignment => {
                    expr = self.parse_assignment_expression(expr)?;
                }
                TokenKind::Punctuator(Punctuator::PlusPlus)
                | TokenKind::Punctuator(Punctuator::MinusMinus) => {
                    let operator = if kind == TokenKind::Punctuator(Punctuator::PlusPlus) {
                        UpdateOperator::Increment
                    } else {
                        UpdateOperator::Decrement
                    };
                    self.start_node_at(expr.meta());
                    self.advance()?;
                    let mut meta = NodeMeta::default();
                    self.finish_node(&mut meta);
                    expr = Expression::UpdateExpression {
                        operator,
                        argument: Box::new(expr),
                        prefix: false,
                        meta,
                    };
                }
                TokenKind::Punctuator(Punctuator::LBracket) => {
                    self.start_node_at(expr.meta());
                    self.advance()?;
                    let property = self.parse_expression_with(ExprContext::default())?;
                    self.expect_punctuator(Punctuator::RBracket)?;
                    let mut meta = NodeMeta::default();
                    self.finish_node(&mut meta);
                    expr = Expression::MemberExpression {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: true,
                        meta,
                    };
                }
                TokenKind::Punctuator(Punctuator::Dot) => {
                    self.start_node_at(expr.meta());
                    self.advance()?;
                    let property = self.parse_expression_inner(ExprContext {
                        can_be_grouped: false,
                        can_be_sequence: false,
                        can_be_assignment: false,
                        can_be_call: false,
                    })?;
                    let mut meta = NodeMeta::default();
                    self.finish_node(&mut meta);
                    expr = Expression::MemberExpression {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: false,
                        meta,
                    };
                }
                TokenKind::Punctuator(Punctuator::LParen) if ctx.can_be_call => {
                    self.start_node_at(expr.meta());
                    let arguments = self.parse_argument_list()?;
                    let mut meta = NodeMeta::default();
                    self.finish_node(&mut meta);
                    expr = Expression::CallExpression {
                        callee: Box::new(expr),
                        arguments,
                        meta,
                    };
                }
                TokenKind::Punctuator(Punctuator::Question) if ctx.can_be_grouped => {
                    self.start_node_at(expr.meta());
                    self.advance()?;
                    let consequent = self.parse_expression_with(ExprContext {
                        can_be_sequence: false,
                        ..Default::default()
                    })?;
                    self.expect_punctuator(Punctuator::Colon)?;
                    let alternate = self.parse_expression_with(ExprContext {
                        can_be_sequence: false,
                        ..Default::default()
                    })?;
                    let mut meta = NodeMeta::default();
                    self.finish_node(&mut meta);
                    expr = Expression::ConditionalExpression {
                        test: Box::new(expr),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                        meta,
                    };
                }
                TokenKind::Punctuator(Punctuator::Arrow) if ctx.can_be_assignment => {
                    self.start_node_at(expr.meta());
                    self.advance()?;
                    let params = pattern::expression_to_parameters(expr)?;
                    let body = self.parse_expression_with(ExprContext {
                        can_be_sequence: false,
                        ..Default::default()
                    })?;
                    let mut meta = NodeMeta::default();
                    self.finish_node(&mut meta);
                    expr = Expression::ArrowFunctionExpression {
                        params,
                        body: Box::new(body),
                        is_async: false,
                        meta,
                    };
                }
                kind if kind.is_binary_operator() && ctx.can_be_grouped => {
                    expr = self.parse_binary_expression(expr, 1, ctx)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_assignment_expression(&mut self, lhs: Expression) -> Result<Expression, ParseError> {
        let op_token = self.advance()?;
        let operator = match op_token.kind {
            TokenKind::Punctuator(p) => assignment_operator_for(p),
            _ => None,
        };
        let Some(operator) = operator else {
            return Err(self.fail(unexpected_token(&op_token)));
        };

        self.start_node_at(lhs.meta());
        // With `=`, destructuring shapes and identifiers become patterns;
        // every other target keeps its expression form unvalidated
        let left = if operator == AssignmentOperator::Assign
            && matches!(
                lhs,
                Expression::ArrayExpression { .. }
                    | Expression::ObjectExpression { .. }
                    | Expression::Identifier { .. }
            ) {
            AssignmentTarget::Pattern(pattern::expression_to_pattern(lhs)?)
        } else {
            AssignmentTarget::Expression(Box::new(lhs))
        };

        let right = self.parse_expression_with(ExprContext {
            can_be_sequence: false,
            ..Default::default()
        })?;
        let mut meta = NodeMeta::default();
        self.finish_node(&mut meta);
        Ok(Expression::AssignmentExpression {
            operator,
            left,
            right: Box::new(right),
            meta,
        })
    }

    /// Precedence climbing over binary and logical operator chains.
    ///
    /// The right-hand operand is parsed plain (no operator chains, no
    /// sequences); the inner loop climbs while the next operator binds
    /// tighter, or equally tight when it is right-associative.
    fn parse_binary_expression(
        &mut self,
        mut left: Expression,
        min_precedence: u8,
        ctx: ExprContext,
    ) -> Result<Expression, ParseError> {
        loop {
            let kind = self.peek_kind(0)?;
            if !kind.is_binary_operator() || kind.precedence() < min_precedence {
                break;
            }
            let op_token = self.advance()?;
            let precedence = op_token.kind.precedence();

            let operand_ctx = ExprContext {
                can_be_grouped: false,
                can_be_sequence: false,
                can_be_assignment: ctx.can_be_assignment,
                can_be_call: ctx.can_be_call,
            };
            let inner = self.parse_expression_inner(operand_ctx)?;
            let mut right = self.parse_expression_suffix(inner, operand_ctx)?;

            loop {
                let next = self.peek_kind(0)?;
                if !next.is_binary_operator() {
                    break;
                }
                let next_precedence = next.precedence();
                let climbs = next_precedence > precedence
                    || (next_precedence == precedence && next.is_right_associative());
                if !climbs {
                    break;
                }
                let next_min = if next_precedence > precedence {
                    precedence + 1
                } else {
                    precedence
                };
                right = self.parse_binary_expression(right, next_min, ctx)?;
            }

            self.start_node_at(left.meta());
            let mut meta = NodeMeta::default();
            self.finish_node(&mut meta);
            left = if let Some(operator) = logical_operator_for(op_token.kind) {
                Expression::LogicalExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    meta,
                }
            } else if let Some(operator) = binary_operator_for(op_token.kind) {
                Expression::BinaryExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    meta,
                }
            } else {
                return Err(self.fail(unexpected_token(&op_token)));
            };
        }
        Ok(left)
    }

    /// Parse a parenthesised argument list, recording a trailing comma on
    /// the last argument
    fn parse_argument_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let mut arguments = Vec::new();
        loop {
            if self.check_punctuator(Punctuator::RParen) {
                break;
            }
            let argument = if self.check_punctuator(Punctuator::Spread) {
                self.parse_spread_element()?
            } else {
                self.parse_expression_with(ExprContext {
                    can_be_sequence: false,
                    ..Default::default()
                })?
            };
            arguments.push(argument);
            if self.check_punctuator(Punctuator::Comma) {
                self.advance()?;
                if self.check_punctuator(Punctuator::RParen) {
                    if let Some(last) = arguments.last_mut() {
                        last.meta_mut().trailing_comma = true;
                    }
                }
            } else {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RParen)?;
        Ok(arguments)
    }

    /// Parse a function parameter list into patterns, validating rest
    /// placement
    fn parse_parameter_list(&mut self) -> Result<Vec<Pattern>, ParseError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let mut params = Vec::new();
        loop {
            if self.check_punctuator(Punctuator::RParen) {
                break;
            }
            let param = if self.check_punctuator(Punctuator::Spread) {
                self.start_node();
                self.advance()?;
                let target = self.parse_expression_with(ExprContext {
                    can_be_sequence: false,
                    can_be_assignment: false,
                    ..Default::default()
                })?;
                let argument = pattern::expression_to_pattern(target)?;
                let mut meta = NodeMeta::default();
                self.finish_node(&mut meta);
                Pattern::RestElement {
                    argument: Box::new(argument),
                    meta,
                }
            } else {
                let target = self.parse_expression_with(ExprContext {
                    can_be_sequence: false,
                    ..Default::default()
                })?;
                pattern::expression_to_pattern(target)?
            };
            params.push(param);
            if self.check_punctuator(Punctuator::Comma) {
                self.advance()?;
                if self.check_punctuator(Punctuator::RParen) {
                    if let Some(last) = params.last_mut() {
                        last.meta_mut().trailing_comma = true;
                    }
                }
            } else {
                break;
            }
        }
        self.expect_punctuator(Punctuator::RParen)?;
        pattern::validate_parameter_list(&params)?;
        Ok(params)
    }
}

fn assignment_operator_for(p: Punctuator) -> Option<AssignmentOperator> {
    match p {
        Punctuator::Assign => Some(AssignmentOperator::Assign),
        Punctuator::PlusEq => Some(AssignmentOperator::AddAssign),
        Punctuator::MinusEq => Some(AssignmentOperator::SubAssign),
        Punctuator::StarEq => Some(AssignmentOperator::MulAssign),
        Punctuator::SlashEq => Some(AssignmentOperator::DivAssign),
        Punctuator::PercentEq => Some(AssignmentOperator::ModAssign),
        Punctuator::StarStarEq => Some(AssignmentOperator::ExpAssign),
        Punctuator::LtLtEq => Some(AssignmentOperator::LeftShiftAssign),
        Punctuator::GtGtEq => Some(AssignmentOperator::RightShiftAssign),
        Punctuator::GtGtGtEq => Some(AssignmentOperator::UnsignedRightShiftAssign),
        Punctuator::OrEq => Some(AssignmentOperator::BitOrAssign),
        Punctuator::XorEq => Some(AssignmentOperator::BitXorAssign),
        Punctuator::AndEq => Some(AssignmentOperator::BitAndAssign),
        Punctuator::OrOrEq => Some(AssignmentOperator::LogicalOrAssign),
        Punctuator::AndAndEq => Some(AssignmentOperator::LogicalAndAssign),
        Punctuator::NullishCoalesceEq => Some(AssignmentOperator::NullishCoalesceAssign),
        _ => None,
    }
}

fn logical_operator_for(kind: TokenKind) -> Option<LogicalOperator> {
    match kind {
        TokenKind::Punctuator(Punctuator::OrOr) => Some(LogicalOperator::Or),
        TokenKind::Punctuator(Punctuator::AndAnd) => Some(LogicalOperator::And),
        TokenKind::Punctuator(Punctuator::NullishCoalesce) => {
            Some(LogicalOperator::NullishCoalesce)
        }
        _ => None,
    }
}

fn binary_operator_for(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Keyword(Keyword::In) => Some(BinaryOperator::In),
        TokenKind::Keyword(Keyword::Instanceof) => Some(BinaryOperator::Instanceof),
        TokenKind::Punctuator(p) => match p {
            Punctuator::Plus => Some(BinaryOperator::Add),
            Punctuator::Minus => Some(BinaryOperator::Sub),
            Punctuator::Star => Some(BinaryOperator::Mul),
            Punctuator::Slash => Some(BinaryOperator::Div),
            Punctuator::Percent => Some(BinaryOperator::Mod),
            Punctuator::StarStar => Some(BinaryOperator::Exp),
            Punctuator::EqEq => Some(BinaryOperator::Eq),
            Punctuator::NotEq => Some(BinaryOperator::NotEq),
            Punctuator::EqEqEq => Some(BinaryOperator::StrictEq),
            Punctuator::NotEqEq => Some(BinaryOperator::StrictNotEq),
            Punctuator::Lt => Some(BinaryOperator::Lt),
            Punctuator::LtEq => Some(BinaryOperator::LtEq),
            Punctuator::Gt => Some(BinaryOperator::Gt),
            Punctuator::GtEq => Some(BinaryOperator::GtEq),
            Punctuator::And => Some(BinaryOperator::BitwiseAnd),
            Punctuator::Or => Some(BinaryOperator::BitwiseOr),
            Punctuator::Xor => Some(BinaryOperator::BitwiseXor),
            Punctuator::LtLt => Some(BinaryOperator::LeftShift),
            Punctuator::GtGt => Some(BinaryOperator::RightShift),
            Punctuator::GtGtGt => Some(BinaryOperator::UnsignedRightShift),
            _ => None,
        },
        _ => None,
    }
}

/// Find a top-level spread entry in a parenthesised expression
fn find_spread(expr: &Expression) -> Option<&Expression> {
    match expr {
        Expression::SpreadElement { .. } => Some(expr),
        Expression::SequenceExpression { expressions, .. } => expressions
            .iter()
            .find(|e| matches!(e, Expression::SpreadElement { .. })),
        _ => None,
    }
}
