//! Recursive-descent parser for minx.
//!
//! Grammar methods return `Ok(Some(node))` on a match, `Ok(None)` when
//! their construct is absent (after pushing back whatever was peeked),
//! and `Err` once a construct is committed but malformed. Alternation
//! is an if-chain over these methods; backtracking goes through the
//! lexer's push-back buffer and never re-reads source text.
//!
//! Operator expressions are not precedence-climbed. A whole
//! application sequence is gathered as a flat term list first, then
//! infix operators collapse in binding order, tightest first, and the
//! remaining terms fold into a right-nested application chain.

use minx_ast::{CaseBranch, Declaration, Expr, Ident};
use minx_diag::Diagnostic;

use crate::lexer::Lexer;
use crate::token::{OPERATOR_PRECEDENCE, Token, TokenKind};

/// Parses one source file from a [`Lexer`].
#[derive(Debug)]
pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Parser {
        Parser { lexer }
    }

    /// Parses the whole file. A file is one implicit scope bracketed by
    /// `FileStart`/`FileEnd`, with `Newline` separating declarations;
    /// an empty file is an empty scope.
    pub fn parse_file(mut self) -> Result<Expr, Diagnostic> {
        match self.scope(TokenKind::FileStart, TokenKind::Newline, TokenKind::FileEnd)? {
            Some(scope) => Ok(scope),
            None => Err(self.error("expected start of file")),
        }
    }

    /// Expression := Application ("as" Application)*
    ///
    /// `value as f` applies `f` to `value`, so a chain of casts reads
    /// as a pipeline and nests leftmost-innermost.
    fn expression(&mut self) -> Result<Option<Expr>, Diagnostic> {
        let Some(mut expression) = self.application()? else {
            return Ok(None);
        };
        while self.lexer.is_next_token(TokenKind::As)? {
            let Some(target) = self.application()? else {
                return Err(self.error("expected cast after \"as\""));
            };
            expression = Expr::Application {
                function: Box::new(target),
                argument: Box::new(expression),
            };
        }
        Ok(Some(expression))
    }

    /// UnionType := Expression ("|" Expression)*
    ///
    /// A lone alternative stays unwrapped; two or more become one flat
    /// `UnionType`.
    fn union_type(&mut self) -> Result<Option<Expr>, Diagnostic> {
        let Some(first) = self.expression()? else {
            return Ok(None);
        };
        let mut alternatives = vec![first];
        while self.lexer.is_next_token(TokenKind::Pipe)? {
            let Some(alternative) = self.expression()? else {
                return Err(self.error("expected expression after \"|\" in union"));
            };
            alternatives.push(alternative);
        }
        if alternatives.len() > 1 {
            Ok(Some(Expr::UnionType(alternatives)))
        } else {
            Ok(alternatives.pop())
        }
    }

    /// Application := MemberAccess+
    ///
    /// Gathers every adjacent term, collapses infix operators, then
    /// folds what is left into a right-nested application chain:
    /// `f a b c` is `f (a (b c))`.
    fn application(&mut self) -> Result<Option<Expr>, Diagnostic> {
        let mut terms = Vec::new();
        while let Some(term) = self.member_access()? {
            terms.push(term);
        }
        collapse_infix_operations(&mut terms);
        let Some(mut expression) = terms.pop() else {
            return Ok(None);
        };
        while let Some(function) = terms.pop() {
            expression = Expr::Application {
                function: Box::new(function),
                argument: Box::new(expression),
            };
        }
        Ok(Some(expression))
    }

    /// MemberAccess := BaseExpression ("@" MemberName)*
    fn member_access(&mut self) -> Result<Option<Expr>, Diagnostic> {
        let Some(mut expression) = self.base_expression()? else {
            return Ok(None);
        };
        while self.lexer.is_next_token(TokenKind::At)? {
            let Some(member) = self.member_name()? else {
                return Err(self.error("expected member name after \"@\""));
            };
            expression = Expr::MemberAccess {
                base: Box::new(expression),
                member: Box::new(member),
            };
        }
        Ok(Some(expression))
    }

    fn base_expression(&mut self) -> Result<Option<Expr>, Diagnostic> {
        if self.lexer.is_next_token(TokenKind::Dollar)? {
            return Ok(Some(Expr::Dollar));
        }
        if let Some(expression) = self.group()? {
            return Ok(Some(expression));
        }
        if let Some(expression) = self.meta()? {
            return Ok(Some(expression));
        }
        if let Some(scope) = self.explicit_scope()? {
            return Ok(Some(scope));
        }
        if let Some(list) = self.list_literal()? {
            return Ok(Some(list));
        }
        if let Some(case) = self.case_expr()? {
            return Ok(Some(case));
        }
        if let Some(name) = self.member_name()? {
            return Ok(Some(name));
        }
        self.string_lit()
    }

    /// A parenthesised expression. Groups only steer parsing and leave
    /// no node of their own.
    fn group(&mut self) -> Result<Option<Expr>, Diagnostic> {
        if !self.lexer.is_next_token(TokenKind::LParen)? {
            return Ok(None);
        }
        let Some(expression) = self.expression()? else {
            return Err(self.error("expected expression between parentheses"));
        };
        if !self.lexer.is_next_token(TokenKind::RParen)? {
            return Err(self.error("expected closing parenthesis \")\""));
        }
        Ok(Some(expression))
    }

    /// An expression between single quotes, kept unevaluated.
    fn meta(&mut self) -> Result<Option<Expr>, Diagnostic> {
        if !self.lexer.is_next_token(TokenKind::SingleQuote)? {
            return Ok(None);
        }
        let Some(expression) = self.expression()? else {
            return Err(self.error("expected expression between single quotes for meta"));
        };
        if !self.lexer.is_next_token(TokenKind::SingleQuote)? {
            return Err(self.error("expected closing single quote for meta"));
        }
        Ok(Some(Expr::Meta(Box::new(expression))))
    }

    /// Case := "case" Expression Indent? Branch+
    /// Branch := "|" (DeclarationName PatternType? | "else") ":" Body
    ///
    /// With an indented branch block, every branch ends in a `Newline`
    /// at the block's level and the last one ends the block with its
    /// `Dedent`. The `else` branch must come last, and at least one
    /// ordinary branch is required.
    fn case_expr(&mut self) -> Result<Option<Expr>, Diagnostic> {
        if !self.lexer.is_next_token(TokenKind::Case)? {
            return Ok(None);
        }
        let Some(scrutinee) = self.expression()? else {
            return Err(self.error("expected expression as starting point for case statement"));
        };
        let pipes_are_indented = self.lexer.is_next_token(TokenKind::Indent)?;
        let mut branches = Vec::new();
        let mut else_branch: Option<Box<Expr>> = None;
        while self.lexer.is_next_token(TokenKind::Pipe)? {
            if else_branch.is_some() {
                return Err(
                    self.error("an else branch must be the last branch of a case statement")
                );
            }
            let pattern = self.declaration_name()?;
            let is_else = pattern.is_none() && self.lexer.is_next_token(TokenKind::Else)?;
            if pattern.is_none() && !is_else {
                return Err(self.error("expected pattern for this branch of the case statement"));
            }
            let pattern_type = match &pattern {
                Some(Expr::NameRef(_) | Expr::InfixRef(_)) => self.name_ref()?,
                _ => None,
            };
            if !self.lexer.is_next_token(TokenKind::Colon)? {
                return Err(self.error("expected \":\" after pattern in case branch"));
            }
            let body = if let Some(scope) = self.implicit_scope()? {
                scope
            } else if let Some(expression) = self.expression()? {
                expression
            } else {
                return Err(
                    self.error("expected expression for this branch of the case statement")
                );
            };
            if is_else {
                else_branch = Some(Box::new(body));
            } else if let Some(pattern) = pattern {
                branches.push(CaseBranch {
                    pattern,
                    pattern_type,
                    body,
                });
            }
            if pipes_are_indented {
                if self.lexer.is_next_token(TokenKind::Dedent)? {
                    break;
                }
                if !self.lexer.is_next_token(TokenKind::Newline)? {
                    return Err(
                        self.error("expected indentation matching first branch in the case statement")
                    );
                }
            }
        }
        if branches.is_empty() {
            return Err(self.error("case statements require at least one non-else branch"));
        }
        Ok(Some(Expr::Case {
            scrutinee: Box::new(scrutinee),
            branches,
            else_branch,
        }))
    }

    /// List := "[" (UnionType ("," UnionType)*)? "]"
    ///
    /// Unlike scopes, lists reject a trailing comma.
    fn list_literal(&mut self) -> Result<Option<Expr>, Diagnostic> {
        if !self.lexer.is_next_token(TokenKind::LBracket)? {
            return Ok(None);
        }
        let mut items = Vec::new();
        let mut at_end = self.lexer.is_next_token(TokenKind::RBracket)?;
        while !at_end {
            let Some(item) = self.union_type()? else {
                return Err(self.error("expected expression in list"));
            };
            items.push(item);
            if !self.lexer.is_next_token(TokenKind::Comma)? {
                at_end = self.lexer.is_next_token(TokenKind::RBracket)?;
                if !at_end {
                    return Err(
                        self.error("expected \"]\" to close the list or \",\" between items")
                    );
                }
            }
        }
        Ok(Some(Expr::ListLit(items)))
    }

    /// Scope := start (Declaration (separator Declaration)*)? separator? end
    /// Declaration := DeclarationName DeclaredType? ("=" Value)?
    ///
    /// One routine serves all three bracketings: braces with commas,
    /// an indented block with newlines, and the whole file. A separator
    /// directly before the closing token is allowed.
    fn scope(
        &mut self,
        start: TokenKind,
        separator: TokenKind,
        end: TokenKind,
    ) -> Result<Option<Expr>, Diagnostic> {
        if !self.lexer.is_next_token(start)? {
            return Ok(None);
        }
        let mut declarations = Vec::new();
        let mut at_end = self.lexer.is_next_token(end)?;
        while !at_end {
            let Some(name) = self.declaration_name()? else {
                return Err(self.error("expected name declaration in scope"));
            };
            let declared_type = match &name {
                Expr::NameRef(_) | Expr::InfixRef(_) => self.union_type()?,
                _ => None,
            };
            let value = if self.lexer.is_next_token(TokenKind::Equals)? {
                if let Some(scope) = self.implicit_scope()? {
                    Some(scope)
                } else if let Some(value) = self.union_type()? {
                    Some(value)
                } else {
                    return Err(self.error("expected value after \"=\" in declaration"));
                }
            } else {
                None
            };
            declarations.push(Declaration {
                name,
                declared_type,
                value,
            });
            let separated = self.lexer.is_next_token(separator)?;
            at_end = self.lexer.is_next_token(end)?;
            if !separated && !at_end {
                return Err(self.error("expected end of scope or separator after declaration"));
            }
        }
        Ok(Some(Expr::Scope(declarations)))
    }

    fn explicit_scope(&mut self) -> Result<Option<Expr>, Diagnostic> {
        self.scope(TokenKind::LBrace, TokenKind::Comma, TokenKind::RBrace)
    }

    fn implicit_scope(&mut self) -> Result<Option<Expr>, Diagnostic> {
        self.scope(TokenKind::Indent, TokenKind::Newline, TokenKind::Dedent)
    }

    /// What may stand left of `=`: a plain or infix name, or an
    /// explicit scope destructuring the value.
    fn declaration_name(&mut self) -> Result<Option<Expr>, Diagnostic> {
        if let Some(scope) = self.explicit_scope()? {
            return Ok(Some(scope));
        }
        self.member_name()
    }

    fn member_name(&mut self) -> Result<Option<Expr>, Diagnostic> {
        if let Some(name) = self.name_ref()? {
            return Ok(Some(name));
        }
        self.infix_ref()
    }

    fn name_ref(&mut self) -> Result<Option<Expr>, Diagnostic> {
        match self.lexer.get_if_of_type(TokenKind::Name)? {
            Some(Token::Name {
                text,
                has_side_effects,
                is_mutable,
            }) => Ok(Some(Expr::NameRef(Ident {
                text,
                has_side_effects,
                is_mutable,
            }))),
            _ => Ok(None),
        }
    }

    fn infix_ref(&mut self) -> Result<Option<Expr>, Diagnostic> {
        match self.lexer.get_if_of_type(TokenKind::Infix)? {
            Some(Token::Infix {
                text,
                has_side_effects,
                is_mutable,
            }) => Ok(Some(Expr::InfixRef(Ident {
                text,
                has_side_effects,
                is_mutable,
            }))),
            _ => Ok(None),
        }
    }

    fn string_lit(&mut self) -> Result<Option<Expr>, Diagnostic> {
        match self.lexer.get_if_of_type(TokenKind::String)? {
            Some(Token::String(text)) => Ok(Some(Expr::StringLit(text))),
            _ => Ok(None),
        }
    }

    fn error(&self, message: &str) -> Diagnostic {
        let (line, col) = self.lexer.line_and_col();
        Diagnostic::syntax(message, line, col)
    }
}

/// Rewrites `terms` in place until no `InfixRef` is left: each round
/// finds the tightest-binding operator and replaces it and its
/// neighbors (when present) with one `InfixOperation`. Ties go to the
/// leftmost operator, which makes equal operators left-associative.
fn collapse_infix_operations(terms: &mut Vec<Expr>) {
    loop {
        let mut best: Option<(usize, Ident)> = None;
        for (index, term) in terms.iter().enumerate() {
            let Expr::InfixRef(operator) = term else {
                continue;
            };
            let replaces = match &best {
                Some((_, incumbent)) => binds_tighter(&operator.text, &incumbent.text),
                None => true,
            };
            if replaces {
                best = Some((index, operator.clone()));
            }
        }
        let Some((index, operator)) = best else {
            return;
        };
        let right = if index + 1 < terms.len() {
            Some(Box::new(terms.remove(index + 1)))
        } else {
            None
        };
        let left = if index > 0 {
            Some(Box::new(terms.remove(index - 1)))
        } else {
            None
        };
        let slot = if left.is_some() { index - 1 } else { index };
        terms[slot] = Expr::InfixOperation {
            operator,
            left,
            right,
        };
    }
}

/// Whether `candidate` binds tighter than `incumbent`. Characters are
/// compared pairwise by their rank in [`OPERATOR_PRECEDENCE`] and the
/// first difference decides; when one operator is a prefix of the
/// other, the longer one binds tighter.
fn binds_tighter(candidate: &str, incumbent: &str) -> bool {
    for (new_ch, old_ch) in candidate.chars().zip(incumbent.chars()) {
        let new_rank = precedence_rank(new_ch);
        let old_rank = precedence_rank(old_ch);
        if new_rank != old_rank {
            return new_rank < old_rank;
        }
    }
    candidate.len() > incumbent.len()
}

fn precedence_rank(ch: char) -> usize {
    OPERATOR_PRECEDENCE.find(ch).unwrap_or(OPERATOR_PRECEDENCE.len())
}
