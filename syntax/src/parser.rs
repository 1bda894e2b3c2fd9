//! The language parser.
//!
//! Parsing itself is done by the pest grammar; this module walks the resulting
//! pairs and builds the abstract syntax tree.
use crate::ast::*;
use crate::error::ParseError;
use crate::grammar::{self, Rule};
use crate::source::*;
use pest::iterators::Pair;
use std::rc::Rc;

/// Parse the given source file into a block of statements.
pub fn parse(file: SourceFile) -> Result<Block, ParseError> {
    let mut pairs = match grammar::parse(file.source(), Rule::program) {
        Ok(pairs) => pairs,
        Err(e) => return Err(ParseError::from_pest(e, file.clone())),
    };

    match pairs.next() {
        Some(program) => Builder { file: &file }.statements(program),
        None => Ok(Block::default()),
    }
}

fn is_keyword(rule: Rule) -> bool {
    matches!(rule,
        Rule::k_as
        | Rule::k_class
        | Rule::k_closure
        | Rule::k_export
        | Rule::k_function
        | Rule::k_get
        | Rule::k_import
        | Rule::k_method
        | Rule::k_module
        | Rule::k_operator
        | Rule::k_property
        | Rule::k_return
        | Rule::k_set
        | Rule::k_val
        | Rule::k_var
    )
}

/// Iterate over the children of a pair, skipping keyword tokens.
fn children(pair: Pair<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pair.into_inner().filter(|pair| !is_keyword(pair.as_rule()))
}

struct Builder<'f> {
    file: &'f SourceFile,
}

impl<'f> Builder<'f> {
    fn error(&self, message: impl Into<String>, span: pest::Span<'_>) -> ParseError {
        ParseError::new(message, span.into(), self.file.clone())
    }

    /// Take the next child of a node, failing if the node ended early.
    fn next<'i>(&self, parts: &mut impl Iterator<Item = Pair<'i, Rule>>, span: pest::Span<'i>) -> Result<Pair<'i, Rule>, ParseError> {
        parts.next().ok_or_else(|| self.error("unexpected end of syntax node", span))
    }

    fn statements(&self, pair: Pair<'_, Rule>) -> Result<Block, ParseError> {
        let statements = pair.into_inner()
            .filter(|pair| pair.as_rule() == Rule::statement)
            .map(|pair| self.statement(pair))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Block {
            statements,
        })
    }

    fn block(&self, pair: Pair<'_, Rule>) -> Result<Rc<Block>, ParseError> {
        self.statements(pair).map(Rc::new)
    }

    fn statement(&self, pair: Pair<'_, Rule>) -> Result<Statement, ParseError> {
        let span = pair.as_span();
        let text = pair.as_str().trim().to_owned();
        let inner = self.next(&mut pair.into_inner(), span)?;

        let kind = match inner.as_rule() {
            Rule::val_decl => {
                let span = inner.as_span();
                let mut parts = children(inner);
                let name = self.next(&mut parts, span)?.as_str().to_owned();
                let value = self.expr(self.next(&mut parts, span)?)?;

                StatementKind::Val {
                    name,
                    value,
                }
            }

            Rule::var_decl => {
                let span = inner.as_span();
                let mut parts = children(inner);
                let name = self.next(&mut parts, span)?.as_str().to_owned();
                let value = parts.next().map(|pair| self.expr(pair)).transpose()?;

                StatementKind::Var {
                    name,
                    value,
                }
            }

            Rule::assignment => self.assignment(inner)?,

            Rule::return_stmt => {
                let value = children(inner).next().map(|pair| self.expr(pair)).transpose()?;
                StatementKind::Return(value)
            }

            Rule::function_decl => StatementKind::Function(Rc::new(self.function(inner, true)?)),
            Rule::class_decl => StatementKind::Class(Rc::new(self.class(inner)?)),

            Rule::module_decl => {
                let span = inner.as_span();
                let mut parts = children(inner);
                let name = self.next(&mut parts, span)?.as_str().to_owned();
                let body = self.block(self.next(&mut parts, span)?)?;

                StatementKind::Module(Rc::new(ModuleDecl {
                    name,
                    body,
                }))
            }

            Rule::import_stmt => {
                let span = inner.as_span();
                let mut parts = children(inner);
                let module = self.next(&mut parts, span)?.as_str().to_owned();
                let binding = match parts.next() {
                    None => ImportBinding::All,
                    Some(pair) => match pair.as_rule() {
                        Rule::import_alias => {
                            let span = pair.as_span();
                            ImportBinding::Alias(self.next(&mut children(pair), span)?.as_str().to_owned())
                        }
                        _ => ImportBinding::Only(self.names(pair)),
                    },
                };

                StatementKind::Import(ImportStmt {
                    module,
                    binding,
                })
            }

            Rule::export_stmt => StatementKind::Export(self.names(inner)),

            _ => StatementKind::Expr(self.expr(inner)?),
        };

        Ok(Statement {
            kind,
            span: span.into(),
            text,
        })
    }

    fn names(&self, pair: Pair<'_, Rule>) -> Vec<String> {
        children(pair).map(|pair| pair.as_str().to_owned()).collect()
    }

    fn assignment(&self, pair: Pair<'_, Rule>) -> Result<StatementKind, ParseError> {
        let span = pair.as_span();
        let mut parts = children(pair);

        let target_pair = self.next(&mut parts, span)?;
        let target_span = target_pair.as_span();
        let target = match self.expr(target_pair)? {
            Expr::Reference(name) => AssignTarget::Name(name),
            Expr::Member { target, name } => AssignTarget::Member {
                target: *target,
                name,
            },
            _ => return Err(self.error("invalid assignment target", target_span)),
        };

        let op = match self.next(&mut parts, span)?.as_str() {
            "+=" => AssignOp::Add,
            "-=" => AssignOp::Sub,
            "*=" => AssignOp::Mul,
            "/=" => AssignOp::Div,
            _ => AssignOp::Assign,
        };

        let value = self.expr(self.next(&mut parts, span)?)?;

        Ok(StatementKind::Assign {
            target,
            op,
            value,
        })
    }

    /// Build a function-like declaration. Named declarations start with an
    /// identifier or operator token before the parameter list.
    fn function(&self, pair: Pair<'_, Rule>, named: bool) -> Result<FunctionDecl, ParseError> {
        let span = pair.as_span();
        let mut parts = children(pair);

        let name = match named {
            true => Some(self.next(&mut parts, span)?.as_str().to_owned()),
            false => None,
        };
        let params = self.names(self.next(&mut parts, span)?);
        let body = self.block(self.next(&mut parts, span)?)?;

        Ok(FunctionDecl {
            name,
            params,
            body,
        })
    }

    /// Build a property accessor, which carries the property name.
    fn accessor(&self, name: &str, pair: Pair<'_, Rule>) -> Result<Rc<FunctionDecl>, ParseError> {
        let span = pair.as_span();
        let mut params = Vec::new();
        let mut body = None;

        for part in children(pair) {
            match part.as_rule() {
                Rule::parameters => params = self.names(part),
                _ => body = Some(self.block(part)?),
            }
        }

        Ok(Rc::new(FunctionDecl {
            name: Some(name.to_owned()),
            params,
            body: body.ok_or_else(|| self.error("property accessor is missing a body", span))?,
        }))
    }

    fn class(&self, pair: Pair<'_, Rule>) -> Result<ClassDecl, ParseError> {
        let span = pair.as_span();
        let mut parts = children(pair);
        let name = self.next(&mut parts, span)?.as_str().to_owned();
        let mut superclass = None;
        let mut members = Vec::new();

        for part in parts {
            match part.as_rule() {
                Rule::superclass => {
                    let span = part.as_span();
                    superclass = Some(self.expr(self.next(&mut part.into_inner(), span)?)?);
                }
                _ => {
                    for member in part.into_inner() {
                        members.push(self.class_member(member)?);
                    }
                }
            }
        }

        Ok(ClassDecl {
            name,
            superclass,
            members,
        })
    }

    fn class_member(&self, pair: Pair<'_, Rule>) -> Result<ClassMember, ParseError> {
        let span = pair.as_span();

        Ok(match pair.as_rule() {
            Rule::val_decl => {
                let mut parts = children(pair);
                let name = self.next(&mut parts, span)?.as_str().to_owned();
                let value = Rc::new(self.expr(self.next(&mut parts, span)?)?);

                ClassMember::Val {
                    name,
                    value,
                }
            }

            Rule::var_decl => {
                let mut parts = children(pair);
                let name = self.next(&mut parts, span)?.as_str().to_owned();
                let value = parts.next().map(|pair| self.expr(pair).map(Rc::new)).transpose()?;

                ClassMember::Var {
                    name,
                    value,
                }
            }

            Rule::method_decl => ClassMember::Method(Rc::new(self.function(pair, true)?)),
            Rule::operator_decl => ClassMember::Operator(Rc::new(self.function(pair, true)?)),

            Rule::property_decl => {
                let mut parts = children(pair);
                let name = self.next(&mut parts, span)?.as_str().to_owned();
                let mut getter = None;
                let mut setter = None;

                for part in parts {
                    match part.as_rule() {
                        Rule::getter => getter = Some(self.accessor(&name, part)?),
                        _ => setter = Some(self.accessor(&name, part)?),
                    }
                }

                ClassMember::Property(PropertyDecl {
                    name,
                    getter,
                    setter,
                })
            }

            _ => return Err(self.error("unexpected class member", span)),
        })
    }

    fn expr(&self, pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let span = pair.as_span();

        match pair.as_rule() {
            Rule::sum | Rule::product => self.binary(pair),
            Rule::postfix => self.postfix(pair),

            Rule::integer => pair.as_str()
                .parse()
                .map(Expr::Integer)
                .map_err(|_| self.error("integer literal out of range", span)),

            Rule::float => pair.as_str()
                .parse()
                .map(Expr::Float)
                .map_err(|_| self.error("invalid float literal", span)),

            Rule::string => {
                let content = pair.into_inner().next().map(|pair| pair.as_str()).unwrap_or("");
                Ok(Expr::String(unescape(content)))
            }

            Rule::ident => Ok(Expr::Reference(pair.as_str().to_owned())),
            Rule::function_expr => Ok(Expr::Function(Rc::new(self.function(pair, false)?))),
            Rule::closure_expr => Ok(Expr::Closure(Rc::new(self.function(pair, false)?))),

            rule => Err(self.error(format!("unexpected {:?} in expression", rule), span)),
        }
    }

    /// Fold a chain of left-associative binary operators.
    fn binary(&self, pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let span = pair.as_span();
        let mut parts = pair.into_inner();
        let mut lhs = self.expr(self.next(&mut parts, span)?)?;

        while let Some(op) = parts.next() {
            let op = match op.as_str() {
                "+" => BinaryOp::Add,
                "-" => BinaryOp::Sub,
                "*" => BinaryOp::Mul,
                _ => BinaryOp::Div,
            };
            let rhs = self.expr(self.next(&mut parts, span)?)?;

            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn postfix(&self, pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let span = pair.as_span();
        let mut parts = pair.into_inner();
        let mut expr = self.expr(self.next(&mut parts, span)?)?;

        for suffix in parts {
            let suffix_span = suffix.as_span();

            expr = match suffix.as_rule() {
                Rule::call => Expr::Call {
                    callee: Box::new(expr),
                    args: self.arguments(suffix)?,
                },
                Rule::index => Expr::Index {
                    target: Box::new(expr),
                    args: self.arguments(suffix)?,
                },
                _ => Expr::Member {
                    target: Box::new(expr),
                    name: self.next(&mut suffix.into_inner(), suffix_span)?.as_str().to_owned(),
                },
            };
        }

        Ok(expr)
    }

    fn arguments(&self, pair: Pair<'_, Rule>) -> Result<Vec<Expr>, ParseError> {
        pair.into_inner().map(|pair| self.expr(pair)).collect()
    }
}

fn unescape(content: &str) -> String {
    let mut string = String::with_capacity(content.len());
    let mut chars = content.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            string.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => string.push('\n'),
            Some('t') => string.push('\t'),
            Some('r') => string.push('\r'),
            Some('0') => string.push('\0'),
            Some(other) => string.push(other),
            None => string.push('\\'),
        }
    }

    string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_sequences() {
        assert_eq!(unescape(r#"a\nb"#), "a\nb");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r#"back\\slash"#), "back\\slash");
    }
}
