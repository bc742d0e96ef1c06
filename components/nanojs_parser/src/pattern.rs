//! Expression-to-pattern rewriter.
//!
//! The grammar is ambiguous between expressions and destructuring patterns,
//! so the parser speculatively builds expression trees and reinterprets them
//! here when context requires a binding pattern: function parameters,
//! variable declarators, assignment left-hand sides, and arrow parameter
//! lists. The rewrite consumes its input and returns a fresh pattern node;
//! auxiliary data (span, trailing comma) is carried across.

use crate::ast::{
    AssignmentOperator, AssignmentTarget, Expression, NodeMeta, ObjectMember, ObjectPatternMember,
    Pattern,
};
use crate::error::syntax_error;
use nanojs_core::{ParseError, SourcePosition};

const REST_LAST_IN_PATTERN: &str = "A rest element must be last in a destructuring pattern";
const REST_LAST_IN_PARAMS: &str = "A rest element must be last in a parameter list";
const REST_TRAILING_COMMA: &str = "A rest element cannot have a trailing comma";

fn meta_position(meta: &NodeMeta) -> Option<SourcePosition> {
    meta.span.as_ref().map(|s| s.start.clone())
}

/// Rewrite an expression into a binding pattern.
///
/// Identifiers pass through unchanged apart from the node type, so the
/// rewrite is idempotent over anything that is already pattern-shaped.
/// Expressions with no pattern counterpart fail with a syntax error naming
/// the node kind.
pub fn expression_to_pattern(expr: Expression) -> Result<Pattern, ParseError> {
    match expr {
        Expression::Identifier { name, meta } => Ok(Pattern::Identifier { name, meta }),

        Expression::AssignmentExpression {
            operator,
            left,
            right,
            meta,
        } => {
            if operator != AssignmentOperator::Assign {
                return Err(syntax_error(
                    format!(
                        "Invalid assignment pattern operator {}, expected =",
                        operator.as_str()
                    ),
                    meta_position(&meta),
                ));
            }
            let left = match left {
                AssignmentTarget::Pattern(pattern) => pattern,
                AssignmentTarget::Expression(expr) => expression_to_pattern(*expr)?,
            };
            Ok(Pattern::AssignmentPattern {
                left: Box::new(left),
                right,
                meta,
            })
        }

        Expression::ArrayExpression { elements, meta } => {
            let last = elements.len().saturating_sub(1);
            let mut rewritten = Vec::with_capacity(elements.len());
            for (index, element) in elements.into_iter().enumerate() {
                match element {
                    None => rewritten.push(None),
                    Some(Expression::SpreadElement {
                        argument,
                        meta: rest_meta,
                    }) => {
                        if index != last {
                            return Err(syntax_error(
                                REST_LAST_IN_PATTERN,
                                meta_position(&rest_meta),
                            ));
                        }
                        if rest_meta.trailing_comma {
                            return Err(syntax_error(
                                REST_TRAILING_COMMA,
                                meta_position(&rest_meta),
                            ));
                        }
                        rewritten.push(Some(Pattern::RestElement {
                            argument: Box::new(expression_to_pattern(*argument)?),
                            meta: rest_meta,
                        }));
                    }
                    Some(other) => rewritten.push(Some(expression_to_pattern(other)?)),
                }
            }
            Ok(Pattern::ArrayPattern {
                elements: rewritten,
                meta,
            })
        }

        Expression::ObjectExpression { properties, meta } => {
            let last = properties.len().saturating_sub(1);
            let mut rewritten = Vec::with_capacity(properties.len());
            for (index, member) in properties.into_iter().enumerate() {
                match member {
                    ObjectMember::Spread {
                        argument,
                        meta: rest_meta,
                    } => {
                        if index != last {
                            return Err(syntax_error(
                                REST_LAST_IN_PATTERN,
                                meta_position(&rest_meta),
                            ));
                        }
                        if rest_meta.trailing_comma {
                            return Err(syntax_error(
                                REST_TRAILING_COMMA,
                                meta_position(&rest_meta),
                            ));
                        }
                        rewritten.push(ObjectPatternMember::Rest {
                            argument: Box::new(expression_to_pattern(*argument)?),
                            meta: rest_meta,
                        });
                    }
                    ObjectMember::Property(property) => {
                        rewritten.push(ObjectPatternMember::Property {
                            key: property.key,
                            value: expression_to_pattern(property.value)?,
                            computed: property.computed,
                            shorthand: property.shorthand,
                            meta: property.meta,
                        });
                    }
                    ObjectMember::Method(method) => {
                        return Err(syntax_error(
                            "Invalid pattern ObjectMethod",
                            meta_position(&method.meta),
                        ));
                    }
                }
            }
            Ok(Pattern::ObjectPattern {
                properties: rewritten,
                meta,
            })
        }

        Expression::SpreadElement { argument, meta } => Ok(Pattern::RestElement {
            argument: Box::new(expression_to_pattern(*argument)?),
            meta,
        }),

        other => Err(syntax_error(
            format!("Invalid pattern {}", other.kind_name()),
            meta_position(other.meta()),
        )),
    }
}

/// Rewrite an arrow function's left side into its parameter list.
///
/// A sequence expression contributes one parameter per entry; anything else
/// is a single parameter. Spread elements become rest elements, which must
/// come last and must not carry a trailing comma.
pub fn expression_to_parameters(expr: Expression) -> Result<Vec<Pattern>, ParseError> {
    let items = match expr {
        Expression::SequenceExpression { expressions, .. } => expressions,
        other => vec![other],
    };

    let last = items.len().saturating_sub(1);
    let mut params = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let param = match item {
            Expression::SpreadElement { argument, meta } => {
                if index != last {
                    return Err(syntax_error(REST_LAST_IN_PARAMS, meta_position(&meta)));
                }
                if meta.trailing_comma {
                    return Err(syntax_error(REST_TRAILING_COMMA, meta_position(&meta)));
                }
                Pattern::RestElement {
                    argument: Box::new(expression_to_pattern(*argument)?),
                    meta,
                }
            }
            other => expression_to_pattern(other)?,
        };
        params.push(param);
    }
    Ok(params)
}

/// Validate rest-element placement in an already-built parameter list
pub fn validate_parameter_list(params: &[Pattern]) -> Result<(), ParseError> {
    let last = params.len().saturating_sub(1);
    for (index, param) in params.iter().enumerate() {
        if let Pattern::RestElement { meta, .. } = param {
            if index != last {
                return Err(syntax_error(REST_LAST_IN_PARAMS, meta_position(meta)));
            }
            if meta.trailing_comma {
                return Err(syntax_error(REST_TRAILING_COMMA, meta_position(meta)));
            }
        }
    }
    Ok(())
}
