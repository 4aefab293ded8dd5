use std::fmt::{Display, Formatter};
use std::iter::Peekable;

use thiserror::Error;

use ast::*;
use lexer::*;

#[derive(Error, Clone, Debug)]
pub struct ParseError {
    message: String,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ParseError {
    fn new(message: String) -> Self {
        Self { message }
    }

    fn expected(construct: &str, found: Option<&Token>) -> Self {
        match found {
            Some(t) => Self::new(format!(
                "Expected {}, but found {:?} at {}:{}",
                construct, t.kind, t.line, t.col
            )),
            None => Self::new(format!(
                "Expected {}, but found end of file instead",
                construct
            )),
        }
    }
}

macro_rules! match_token_types {
    ($( $token:pat ),+ ) => {
        $(
        Some(Token{ kind: $token, ..})
        )|+
    };
}

pub struct Parser {
    tokens: Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    pub fn parse(&mut self) -> Result<TranslationUnit, ParseError> {
        let func = self.parse_func()?;
        self.expect_empty()?;
        Ok(TranslationUnit { func })
    }

    fn parse_func(&mut self) -> Result<Func, ParseError> {
        self.expect(TokenType::Int)?;
        let name = self.parse_ident()?;

        self.expect(TokenType::OpenParen)?;
        self.expect(TokenType::Void)?;
        self.expect(TokenType::CloseParen)?;
        self.expect(TokenType::OpenBrace)?;

        let body = self.parse_stmt()?;

        self.expect(TokenType::CloseBrace)?;

        Ok(Func { ident: name, body })
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        match self.tokens.next() {
            Some(Token {
                kind: TokenType::Identifier,
                value: TokenValue::Ident(ident),
                ..
            }) => Ok(ident),
            t => Err(ParseError::expected("an identifier", t.as_ref())),
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenType::Return)?;

        let expr = self.parse_expr(0)?;

        self.expect(TokenType::Semicolon)?;

        Ok(Stmt::Return { expr })
    }

    fn parse_expr(&mut self, min_prec: i32) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;

        while let Some(next) = self.peek() {
            match get_precedence(next.kind) {
                Some(prec) if prec >= min_prec => {
                    let operator = self.parse_binop()?;
                    // all operators here are left-associative, so the right
                    // operand is parsed one level tighter
                    let right = self.parse_expr(prec + 1)?;
                    left = Expr::Binary {
                        op: operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        match self.tokens.peek() {
            match_token_types!(TokenType::Minus, TokenType::Tilde) => {
                let unop = self.parse_unop()?;
                // unary operators recurse into factor, not expression, so
                // "-1 + 1" parses as (-1) + 1
                let expr = self.parse_factor()?;

                Ok(Expr::Unary {
                    op: unop,
                    expr: Box::new(expr),
                })
            }
            Some(Token {
                kind: TokenType::OpenParen,
                ..
            }) => {
                self.tokens.next();
                let expr = self.parse_expr(0)?;
                self.expect(TokenType::CloseParen)?;

                Ok(expr)
            }
            Some(Token {
                kind: TokenType::Constant,
                value: TokenValue::Integer(val),
                ..
            }) => {
                let val = *val;
                self.tokens.next();
                Ok(Expr::Constant(val))
            }
            t => Err(ParseError::expected("a factor", t)),
        }
    }

    fn parse_unop(&mut self) -> Result<UnaryOp, ParseError> {
        match self.tokens.next() {
            Some(Token {
                kind: TokenType::Minus,
                ..
            }) => Ok(UnaryOp::Negate),
            Some(Token {
                kind: TokenType::Tilde,
                ..
            }) => Ok(UnaryOp::Complement),
            t => Err(ParseError::expected("a unary operator", t.as_ref())),
        }
    }

    fn parse_binop(&mut self) -> Result<BinaryOp, ParseError> {
        let t = self.tokens.next();

        match t {
            Some(Token {
                kind: TokenType::Plus,
                ..
            }) => Ok(BinaryOp::Add),
            Some(Token {
                kind: TokenType::Minus,
                ..
            }) => Ok(BinaryOp::Subtract),
            Some(Token {
                kind: TokenType::Star,
                ..
            }) => Ok(BinaryOp::Multiply),
            Some(Token {
                kind: TokenType::Slash,
                ..
            }) => Ok(BinaryOp::Divide),
            Some(Token {
                kind: TokenType::Percent,
                ..
            }) => Ok(BinaryOp::Modulo),

            Some(Token {
                kind: TokenType::Less,
                ..
            }) => Ok(BinaryOp::Less),
            Some(Token {
                kind: TokenType::LessEqual,
                ..
            }) => Ok(BinaryOp::LessEqual),
            Some(Token {
                kind: TokenType::Greater,
                ..
            }) => Ok(BinaryOp::Greater),
            Some(Token {
                kind: TokenType::GreaterEqual,
                ..
            }) => Ok(BinaryOp::GreaterEqual),
            Some(Token {
                kind: TokenType::AmpAmp,
                ..
            }) => Ok(BinaryOp::And),
            Some(Token {
                kind: TokenType::PipePipe,
                ..
            }) => Ok(BinaryOp::Or),
            Some(Token {
                kind: TokenType::EqualEqual,
                ..
            }) => Ok(BinaryOp::Equal),
            Some(Token {
                kind: TokenType::BangEqual,
                ..
            }) => Ok(BinaryOp::NotEqual),

            // Bitwise
            Some(Token {
                kind: TokenType::Amp,
                ..
            }) => Ok(BinaryOp::BitwiseAnd),
            Some(Token {
                kind: TokenType::Pipe,
                ..
            }) => Ok(BinaryOp::BitwiseOr),
            Some(Token {
                kind: TokenType::Xor,
                ..
            }) => Ok(BinaryOp::BitwiseXor),
            Some(Token {
                kind: TokenType::LessLess,
                ..
            }) => Ok(BinaryOp::BitshiftLeft),
            Some(Token {
                kind: TokenType::GreaterGreater,
                ..
            }) => Ok(BinaryOp::BitshiftRight),
            _ => Err(ParseError::expected("a binary operator", t.as_ref())),
        }
    }

    /// Checks if next token is of correct expected type
    fn expect(&mut self, expected: TokenType) -> Result<Token, ParseError> {
        match self.tokens.next() {
            Some(t) if t.kind == expected => Ok(t),
            t => Err(ParseError::expected(&format!("{:?}", expected), t.as_ref())),
        }
    }

    fn expect_empty(&mut self) -> Result<(), ParseError> {
        match self.tokens.next() {
            Some(t) => Err(ParseError::expected("end of file", Some(&t))),
            None => Ok(()),
        }
    }

    fn peek(&mut self) -> Option<Token> {
        self.tokens.peek().cloned()
    }
}

fn get_precedence(token: TokenType) -> Option<i32> {
    match token {
        TokenType::Star | TokenType::Slash | TokenType::Percent => Some(50),
        TokenType::Plus | TokenType::Minus => Some(45),
        TokenType::LessLess | TokenType::GreaterGreater => Some(40),
        TokenType::Less | TokenType::LessEqual | TokenType::Greater | TokenType::GreaterEqual => {
            Some(35)
        }
        TokenType::EqualEqual | TokenType::BangEqual => Some(30),
        TokenType::Amp => Some(25),
        TokenType::Xor => Some(20),
        TokenType::Pipe => Some(15),
        TokenType::AmpAmp => Some(10),
        TokenType::PipePipe => Some(5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use lexer::*;

    use super::*;

    fn parse_expr_str(src: &str) -> Result<Expr, ParseError> {
        let tokens = Lexer::new(src).tokenize().collect();
        Parser::new(tokens).parse_expr(0)
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn simple_add() {
        let ast = parse_expr_str("3 + 5").unwrap();

        assert_eq!(
            ast,
            binary(BinaryOp::Add, Expr::Constant(3), Expr::Constant(5))
        )
    }

    #[test]
    fn mul_binds_tighter_than_add() {
        let ast = parse_expr_str("1 + 2 * 3").unwrap();

        assert_eq!(
            ast,
            binary(
                BinaryOp::Add,
                Expr::Constant(1),
                binary(BinaryOp::Multiply, Expr::Constant(2), Expr::Constant(3)),
            )
        )
    }

    #[test]
    fn div_left_associative() {
        let ast = parse_expr_str("4 / 2 / 1").unwrap();

        assert_eq!(
            ast,
            binary(
                BinaryOp::Divide,
                binary(BinaryOp::Divide, Expr::Constant(4), Expr::Constant(2)),
                Expr::Constant(1),
            )
        )
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        let ast = parse_expr_str("-1 + 1").unwrap();

        assert_eq!(
            ast,
            binary(
                BinaryOp::Add,
                Expr::Unary {
                    op: UnaryOp::Negate,
                    expr: Box::new(Expr::Constant(1)),
                },
                Expr::Constant(1),
            )
        )
    }

    #[test]
    fn add_binds_tighter_than_shift() {
        let ast = parse_expr_str("1 + 2 << 3").unwrap();

        assert_eq!(
            ast,
            binary(
                BinaryOp::BitshiftLeft,
                binary(BinaryOp::Add, Expr::Constant(1), Expr::Constant(2)),
                Expr::Constant(3),
            )
        )
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let ast = parse_expr_str("1 || 2 && 3").unwrap();

        assert_eq!(
            ast,
            binary(
                BinaryOp::Or,
                Expr::Constant(1),
                binary(BinaryOp::And, Expr::Constant(2), Expr::Constant(3)),
            )
        )
    }

    #[test]
    fn parens_do_not_change_constant() {
        assert_eq!(parse_expr_str("(1)").unwrap(), parse_expr_str("1").unwrap())
    }

    #[test]
    fn parens_override_precedence() {
        let ast = parse_expr_str("(1 + 2) * 3").unwrap();

        assert_eq!(
            ast,
            binary(
                BinaryOp::Multiply,
                binary(BinaryOp::Add, Expr::Constant(1), Expr::Constant(2)),
                Expr::Constant(3),
            )
        )
    }

    #[test]
    fn unterminated_paren() {
        assert!(parse_expr_str("(1").is_err())
    }

    #[test]
    fn bang_is_not_a_factor() {
        assert!(parse_expr_str("!1").is_err())
    }

    #[test]
    fn full_program() {
        let src = "int main(void) { return 2; }";
        let tokens = Lexer::new(src).tokenize().collect();

        let ast = Parser::new(tokens).parse().unwrap();

        assert_eq!(
            ast,
            TranslationUnit {
                func: Func {
                    ident: "main".to_string(),
                    body: Stmt::Return {
                        expr: Expr::Constant(2),
                    },
                },
            }
        )
    }

    #[test]
    fn reparse_is_deterministic() {
        let src = "int main(void) { return (1 + 3) % (1 + 2); }";

        let tokens: Vec<Token> = Lexer::new(src).tokenize().collect();
        let first = Parser::new(tokens.clone()).parse().unwrap();
        let second = Parser::new(tokens).parse().unwrap();

        assert_eq!(first, second)
    }

    #[test]
    fn trailing_tokens_rejected() {
        let src = "int main(void) { return 2; } int";
        let tokens = Lexer::new(src).tokenize().collect();

        assert!(Parser::new(tokens).parse().is_err())
    }

    #[test]
    fn missing_semicolon() {
        let src = "int main(void) { return 2 }";
        let tokens = Lexer::new(src).tokenize().collect();

        assert!(Parser::new(tokens).parse().is_err())
    }

    #[test]
    fn empty_input() {
        assert!(Parser::new(vec![]).parse().is_err())
    }
}
