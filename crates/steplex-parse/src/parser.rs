use thiserror::Error;

use crate::lexer::{Lexer, Token, TokenKind};
use steplex_solver::{Constraint, ConstraintOp};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expression '{0}' contains no variables")]
    NoVariables(String),
    #[error("invalid coefficient '{0}'")]
    InvalidNumber(String),
    #[error("invalid variable '{0}': expected x followed by an index of 1 or higher")]
    InvalidVariable(String),
    #[error("unexpected '{found}' at position {at}")]
    UnexpectedToken { found: String, at: usize },
    #[error("constraint is missing a comparison operator (<=, >= or =)")]
    MissingOperator,
    #[error("constraint has more than one comparison operator")]
    MultipleOperators,
    #[error("right-hand side '{0}' is not a number")]
    RhsNotNumeric(String),
    #[error("right-hand side must be non-negative, got {0}")]
    NegativeRhs(f64),
}

/// Parser for linear expressions such as `3x1 + 2x2 - x3` and constraints
/// such as `3x1 + 2x2 <= 18`.
///
/// Variables are referenced by 1-based index; an omitted coefficient means
/// +1 (or -1 after a lone minus sign), and variables not referenced get
/// coefficient 0 up to the highest index seen. When the same variable is
/// referenced twice, the last occurrence wins.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse an expression into a coefficient vector whose length is the
    /// highest variable index referenced.
    pub fn expression(source: &str) -> Result<Vec<f64>, ParseError> {
        let mut parser = Parser::new(Lexer::tokenize(source));
        let terms = parser.parse_terms()?;
        match parser.peek_kind() {
            TokenKind::Eof => {}
            _ => return Err(parser.unexpected()),
        }
        Self::build_coefficients(source, terms)
    }

    /// Parse a full constraint: expression, exactly one comparison
    /// operator, and a non-negative decimal right-hand side.
    pub fn constraint(source: &str) -> Result<Constraint, ParseError> {
        let tokens = Lexer::tokenize(source);
        let operators = tokens
            .iter()
            .filter(|t| {
                matches!(t.kind, TokenKind::Le | TokenKind::Ge | TokenKind::Eq)
            })
            .count();
        match operators {
            0 => return Err(ParseError::MissingOperator),
            1 => {}
            _ => return Err(ParseError::MultipleOperators),
        }

        let mut parser = Parser::new(tokens);
        let terms = parser.parse_terms()?;

        let op = match parser.peek_kind() {
            TokenKind::Le => ConstraintOp::Le,
            TokenKind::Ge => ConstraintOp::Ge,
            TokenKind::Eq => ConstraintOp::Eq,
            _ => return Err(parser.unexpected()),
        };
        parser.advance();

        let rhs_text = source[parser.current_span_start()..].trim().to_string();
        let rhs = parser.parse_rhs(&rhs_text)?;

        let coefficients = Self::build_coefficients(source, terms)?;
        Ok(Constraint::new(coefficients, op, rhs))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn current_span_start(&self) -> usize {
        self.peek().map(|t| t.span.start).unwrap_or(0)
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(t) => ParseError::UnexpectedToken {
                found: t.text.clone(),
                at: t.span.start,
            },
            None => ParseError::UnexpectedToken {
                found: String::new(),
                at: 0,
            },
        }
    }

    /// Parse `(sign? number? var)+` until a comparison operator or the end
    /// of input, returning `(1-based index, signed coefficient)` pairs.
    fn parse_terms(&mut self) -> Result<Vec<(usize, f64)>, ParseError> {
        let mut terms = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Eof | TokenKind::Le | TokenKind::Ge | TokenKind::Eq => break,
                _ => terms.push(self.parse_term()?),
            }
        }
        Ok(terms)
    }

    fn parse_term(&mut self) -> Result<(usize, f64), ParseError> {
        let sign = match self.peek_kind() {
            TokenKind::Plus => {
                self.advance();
                1.0
            }
            TokenKind::Minus => {
                self.advance();
                -1.0
            }
            _ => 1.0,
        };

        let coefficient = if self.peek_kind() == TokenKind::Number {
            let token = self.advance().unwrap();
            let text = token.text.clone();
            text.parse::<f64>()
                .map_err(|_| ParseError::InvalidNumber(text))?
        } else {
            1.0
        };

        if self.peek_kind() != TokenKind::Var {
            return Err(self.unexpected());
        }
        let token = self.advance().unwrap();
        let index = Self::variable_index(&token.text)?;
        Ok((index, sign * coefficient))
    }

    fn variable_index(text: &str) -> Result<usize, ParseError> {
        let mut chars = text.chars();
        let letter = chars.next();
        let rest = chars.as_str();
        if !matches!(letter, Some('x') | Some('X')) || rest.is_empty() {
            return Err(ParseError::InvalidVariable(text.to_string()));
        }
        let index: usize = rest
            .parse()
            .map_err(|_| ParseError::InvalidVariable(text.to_string()))?;
        if index == 0 {
            return Err(ParseError::InvalidVariable(text.to_string()));
        }
        Ok(index)
    }

    fn parse_rhs(&mut self, raw: &str) -> Result<f64, ParseError> {
        let negative = match self.peek_kind() {
            TokenKind::Plus => {
                self.advance();
                false
            }
            TokenKind::Minus => {
                self.advance();
                true
            }
            _ => false,
        };
        if self.peek_kind() != TokenKind::Number {
            return Err(ParseError::RhsNotNumeric(raw.to_string()));
        }
        let text = self.advance().unwrap().text.clone();
        let value: f64 = text
            .parse()
            .map_err(|_| ParseError::RhsNotNumeric(raw.to_string()))?;
        if self.peek_kind() != TokenKind::Eof {
            return Err(ParseError::RhsNotNumeric(raw.to_string()));
        }
        let value = if negative { -value } else { value };
        if value < 0.0 {
            return Err(ParseError::NegativeRhs(value));
        }
        Ok(value)
    }

    fn build_coefficients(
        source: &str,
        terms: Vec<(usize, f64)>,
    ) -> Result<Vec<f64>, ParseError> {
        if terms.is_empty() {
            return Err(ParseError::NoVariables(source.trim().to_string()));
        }
        let width = terms.iter().map(|(index, _)| *index).max().unwrap_or(0);
        let mut coefficients = vec![0.0; width];
        for (index, coefficient) in terms {
            coefficients[index - 1] = coefficient;
        }
        Ok(coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_with_implicit_coefficients() {
        let coefficients = Parser::expression("3x1 + 2x2 - x3").unwrap();
        assert_eq!(coefficients, vec![3.0, 2.0, -1.0]);
    }

    #[test]
    fn test_missing_indices_default_to_zero() {
        let coefficients = Parser::expression("2x1 + 4x3").unwrap();
        assert_eq!(coefficients, vec![2.0, 0.0, 4.0]);
    }

    #[test]
    fn test_decimal_and_signed_coefficients() {
        let coefficients = Parser::expression("-1.5x1 + .5x2 + x3").unwrap();
        assert_eq!(coefficients, vec![-1.5, 0.5, 1.0]);
    }

    #[test]
    fn test_duplicate_variable_last_wins() {
        let coefficients = Parser::expression("2x1 + 3x1").unwrap();
        assert_eq!(coefficients, vec![3.0]);
    }

    #[test]
    fn test_expression_without_variables_fails() {
        assert!(matches!(
            Parser::expression("3 + 4"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Parser::expression(""),
            Err(ParseError::NoVariables(_))
        ));
    }

    #[test]
    fn test_variable_index_must_be_positive() {
        assert!(matches!(
            Parser::expression("3x0"),
            Err(ParseError::InvalidVariable(_))
        ));
        assert!(matches!(
            Parser::expression("3y1"),
            Err(ParseError::InvalidVariable(_))
        ));
    }

    #[test]
    fn test_constraint_operators() {
        let c = Parser::constraint("3x1 + 2x2 <= 18").unwrap();
        assert_eq!(c.coefficients, vec![3.0, 2.0]);
        assert_eq!(c.op, ConstraintOp::Le);
        assert_eq!(c.rhs, 18.0);

        let c = Parser::constraint("x1 + x2 >= 10").unwrap();
        assert_eq!(c.op, ConstraintOp::Ge);

        let c = Parser::constraint("x1 = 1").unwrap();
        assert_eq!(c.op, ConstraintOp::Eq);
    }

    #[test]
    fn test_constraint_requires_exactly_one_operator() {
        assert_eq!(
            Parser::constraint("3x1 + 2x2"),
            Err(ParseError::MissingOperator)
        );
        assert_eq!(
            Parser::constraint("x1 <= 4 <= 5"),
            Err(ParseError::MultipleOperators)
        );
        assert_eq!(
            Parser::constraint("x1 = 1 = 1"),
            Err(ParseError::MultipleOperators)
        );
    }

    #[test]
    fn test_constraint_rhs_validation() {
        assert!(matches!(
            Parser::constraint("x1 <= abc"),
            Err(ParseError::RhsNotNumeric(_))
        ));
        assert!(matches!(
            Parser::constraint("x1 <= 4 5"),
            Err(ParseError::RhsNotNumeric(_))
        ));
        assert_eq!(
            Parser::constraint("x1 >= -2"),
            Err(ParseError::NegativeRhs(-2.0))
        );
        assert_eq!(Parser::constraint("x1 >= 0").unwrap().rhs, 0.0);
    }

    #[test]
    fn test_whitespace_and_case_are_ignored() {
        let c = Parser::constraint("  3X1+2X2<=18 ").unwrap();
        assert_eq!(c.coefficients, vec![3.0, 2.0]);
        assert_eq!(c.rhs, 18.0);
    }

    #[test]
    fn test_render_and_reparse_round_trip() {
        let cases: Vec<Vec<f64>> = vec![
            vec![3.0, 2.0, -1.0],
            vec![-1.5, 0.0, 0.25],
            vec![1.0],
            vec![0.0, 0.0, 7.5],
        ];
        for expected in cases {
            let rendered = steplex_solver::render_expression(&expected);
            let reparsed = Parser::expression(&rendered).unwrap();
            assert_eq!(reparsed.len(), expected.len());
            for (a, b) in reparsed.iter().zip(&expected) {
                assert!((a - b).abs() < 1e-9, "{rendered}: {a} vs {b}");
            }
        }
    }
}
