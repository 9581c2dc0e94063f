use crate::ast::{BinOp, Expr};
use crate::error::ExprError;
use crate::lexer::{lex, Token};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parses a restricted expression. Parsing is the only place this grammar
/// is interpreted: evaluation is a total function over the parsed tree,
/// never touching the original text.
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let tokens = lex(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        let rest = &parser.tokens[parser.pos..];
        return Err(ExprError::TrailingInput(format!("{rest:?}")));
    }
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, expected: &Token, name: &'static str) -> Result<(), ExprError> {
        match self.advance() {
            Some(ref t) if t == expected => Ok(()),
            Some(t) => Err(ExprError::Expected {
                expected: name,
                found: format!("{t:?}"),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::OrOr)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_cmp()?;
        while matches!(self.peek(), Some(Token::AndAnd)) {
            self.advance();
            let rhs = self.parse_cmp()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::EqEq) => Some(BinOp::Eq),
            Some(Token::NotEq) => Some(BinOp::Ne),
            Some(Token::Lt) => Some(BinOp::Lt),
            Some(Token::Le) => Some(BinOp::Le),
            Some(Token::Gt) => Some(BinOp::Gt),
            Some(Token::Ge) => Some(BinOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.parse_add()?;
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Bang) => {
                self.advance();
                Ok(Expr::Not(Box::new(self.parse_unary()?)))
            }
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = match self.advance() {
                        Some(Token::Ident(n)) => n,
                        Some(t) => {
                            return Err(ExprError::Expected {
                                expected: "accessor name",
                                found: format!("{t:?}"),
                            })
                        }
                        None => return Err(ExprError::UnexpectedEnd),
                    };
                    self.expect(&Token::LParen, "(")?;
                    self.expect(&Token::RParen, ")")?;
                    expr = match name.as_str() {
                        "first" => Expr::First(Box::new(expr)),
                        "last" => Expr::Last(Box::new(expr)),
                        other => return Err(ExprError::UnknownAccessor(other.to_string())),
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_or()?;
                    self.expect(&Token::RBracket, "]")?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::String(s)) => Ok(Expr::Text(s)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::Ident(name)) => Ok(Expr::Field(name)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen, ")")?;
                Ok(inner)
            }
            Some(t) => Err(ExprError::Expected {
                expected: "expression",
                found: format!("{t:?}"),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_comparison() {
        let expr = parse("value[0] == 1").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinOp::Eq,
                Box::new(Expr::Index(
                    Box::new(Expr::Field("value".into())),
                    Box::new(Expr::Number(0.0))
                )),
                Box::new(Expr::Number(1.0))
            )
        );
    }

    #[test]
    fn parses_accessor_chain() {
        let expr = parse("clicked_name.first() == correct_target.first()").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinOp::Eq,
                Box::new(Expr::First(Box::new(Expr::Field("clicked_name".into())))),
                Box::new(Expr::First(Box::new(Expr::Field("correct_target".into()))))
            )
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("1 == 1 )").is_err());
    }
}
