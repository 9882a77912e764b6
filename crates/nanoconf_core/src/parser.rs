//! Flat assignment files
//!
//! A configuration file is a sequence of `name = expression` lines with `#`
//! comments. Expressions are literals, references to options assigned
//! earlier (or left at their defaults), and `+ - * / //` arithmetic.

use crate::error::{EvalError, LoadError, ParseError};
use crate::record::TrainConfig;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

/// Right-hand side of an assignment, evaluated lazily against the record
/// it is applied to.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Unary(UnaryOp, Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Evaluates with `lookup` resolving names.
    pub fn eval(&self, lookup: &dyn Fn(&str) -> Option<Value>) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Name(name) => lookup(name.as_str()).ok_or_else(|| EvalError::UnknownName(name.clone())),
            Expr::Unary(op, operand) => unary(*op, operand.eval(lookup)?),
            Expr::Binary { op, lhs, rhs } => binary(*op, lhs.eval(lookup)?, rhs.eval(lookup)?),
        }
    }

    /// A plain literal, optionally signed: `3`, `-1e-3`, `'cpu'`, `True`.
    /// No names and no arithmetic.
    pub fn is_literal(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::Unary(_, operand) => matches!(
                operand.as_ref(),
                Expr::Literal(Value::Int(_) | Value::Float(_))
            ),
            _ => false,
        }
    }

    /// Evaluates an expression that may only contain literals.
    pub fn eval_literal(&self) -> Result<Value, EvalError> {
        self.eval(&|_: &str| None)
    }
}

fn unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    match (op, v) {
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Pos, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (op, v) => Err(EvalError::BadOperand {
            op: if op == UnaryOp::Neg { "-" } else { "+" },
            operand: v.type_name(),
        }),
    }
}

fn floor_div_int(a: i64, b: i64) -> Result<i64, EvalError> {
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let q = a.checked_div(b).ok_or(EvalError::Overflow)?;
    // round toward negative infinity
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

#[allow(clippy::cast_precision_loss)]
fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    let result = match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinOp::Add => a.checked_add(b).map(Value::Int).ok_or(EvalError::Overflow)?,
                BinOp::Sub => a.checked_sub(b).map(Value::Int).ok_or(EvalError::Overflow)?,
                BinOp::Mul => a.checked_mul(b).map(Value::Int).ok_or(EvalError::Overflow)?,
                BinOp::Div => {
                    if b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    Value::Float(a as f64 / b as f64)
                }
                BinOp::FloorDiv => Value::Int(floor_div_int(a, b)?),
            }
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = as_f64(&lhs);
            let b = as_f64(&rhs);
            match op {
                BinOp::Add => Value::Float(a + b),
                BinOp::Sub => Value::Float(a - b),
                BinOp::Mul => Value::Float(a * b),
                BinOp::Div | BinOp::FloorDiv if b == 0.0 => return Err(EvalError::DivisionByZero),
                BinOp::Div => Value::Float(a / b),
                BinOp::FloorDiv => Value::Float((a / b).floor()),
            }
        }
        (Value::Str(a), Value::Str(b)) if op == BinOp::Add => Value::Str(format!("{a}{b}")),
        _ => {
            return Err(EvalError::BadOperands {
                op: op.symbol(),
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            })
        }
    };
    match result {
        Value::Float(x) if !x.is_finite() => Err(EvalError::NotFinite),
        v => Ok(v),
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Float(x) => *x,
        _ => f64::NAN,
    }
}

// ------------------------------------------------------------
// Lexer
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Lit(Value),
    Op(BinOp),
    Minus,
    Plus,
    LParen,
    RParen,
    Eq,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    column: usize,
}

fn lex_line(line: &str, line_no: usize) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;
        match c {
            ' ' | '\t' => i += 1,
            '#' => break,
            '=' => {
                tokens.push(Token { tok: Tok::Eq, column });
                i += 1;
            }
            '(' => {
                tokens.push(Token { tok: Tok::LParen, column });
                i += 1;
            }
            ')' => {
                tokens.push(Token { tok: Tok::RParen, column });
                i += 1;
            }
            '+' => {
                tokens.push(Token { tok: Tok::Plus, column });
                i += 1;
            }
            '-' => {
                tokens.push(Token { tok: Tok::Minus, column });
                i += 1;
            }
            '*' => {
                tokens.push(Token { tok: Tok::Op(BinOp::Mul), column });
                i += 1;
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token { tok: Tok::Op(BinOp::FloorDiv), column });
                    i += 2;
                } else {
                    tokens.push(Token { tok: Tok::Op(BinOp::Div), column });
                    i += 1;
                }
            }
            '\'' | '"' => {
                let (s, next) = lex_string(&chars, i, line_no)?;
                tokens.push(Token { tok: Tok::Lit(Value::Str(s)), column });
                i = next;
            }
            c if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) => {
                let (v, next) = lex_number(&chars, i, line_no)?;
                tokens.push(Token { tok: Tok::Lit(v), column });
                i = next;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let tok = match word.as_str() {
                    "True" => Tok::Lit(Value::Bool(true)),
                    "False" => Tok::Lit(Value::Bool(false)),
                    "None" => Tok::Lit(Value::None),
                    _ => Tok::Ident(word),
                };
                tokens.push(Token { tok, column });
            }
            other => {
                return Err(ParseError::new(
                    line_no,
                    column,
                    format!("unexpected character `{other}`"),
                ))
            }
        }
    }
    Ok(tokens)
}

fn lex_string(chars: &[char], start: usize, line_no: usize) -> Result<(String, usize), ParseError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((out, i + 1)),
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| {
                    ParseError::new(line_no, i + 1, "unterminated escape sequence")
                })?;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    '\\' | '\'' | '"' => out.push(*escaped),
                    other => {
                        // unknown escapes are kept verbatim, as Python does
                        out.push('\\');
                        out.push(*other);
                    }
                }
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err(ParseError::new(line_no, start + 1, "unterminated string literal"))
}

fn lex_number(chars: &[char], start: usize, line_no: usize) -> Result<(Value, usize), ParseError> {
    let mut i = start;
    let mut is_float = false;
    let digits = |i: &mut usize| {
        while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '_') {
            *i += 1;
        }
    };

    digits(&mut i);
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        digits(&mut i);
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            is_float = true;
            i = j;
            digits(&mut i);
        }
    }
    if i < chars.len() && (chars[i].is_alphabetic() || chars[i] == '_') {
        return Err(ParseError::new(line_no, i + 1, "invalid numeric literal"));
    }

    let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
    let value = if is_float {
        match text.parse::<f64>() {
            Ok(x) if x.is_finite() => Value::Float(x),
            _ => return Err(ParseError::new(line_no, start + 1, format!("invalid float `{text}`"))),
        }
    } else {
        let n = text.parse::<i64>().map_err(|_| {
            ParseError::new(line_no, start + 1, format!("integer literal `{text}` is too large"))
        })?;
        Value::Int(n)
    };
    Ok((value, i))
}

// ------------------------------------------------------------
// Parser
// ------------------------------------------------------------

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    line: usize,
    line_len: usize,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn column(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.line_len + 1, |t| t.column)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, self.column(), message)
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        while let Some(Tok::Op(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Tok::Minus) => UnaryOp::Neg,
            Some(Tok::Plus) => UnaryOp::Pos,
            _ => return self.atom(),
        };
        self.pos += 1;
        Ok(Expr::Unary(op, Box::new(self.unary()?)))
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let expr = match self.peek() {
            Some(Tok::Lit(v)) => Expr::Literal(v.clone()),
            Some(Tok::Ident(name)) => Expr::Name(name.clone()),
            Some(Tok::LParen) => {
                self.pos += 1;
                let inner = self.expr()?;
                if self.peek() != Some(&Tok::RParen) {
                    return Err(self.error("expected `)`"));
                }
                inner
            }
            Some(_) => return Err(self.error("expected a value")),
            None => return Err(self.error("expected a value, found end of line")),
        };
        self.pos += 1;
        Ok(expr)
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(Tok::Ident(_) | Tok::Lit(_) | Tok::LParen) => {
                Err(self.error("expected an operator or end of line"))
            }
            Some(_) => Err(self.error("unexpected token")),
        }
    }
}

/// Parses a standalone expression such as the value of a `--key=value`
/// override.
pub fn parse_expr(text: &str) -> Result<Expr, ParseError> {
    let tokens = lex_line(text, 1)?;
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        line: 1,
        line_len: text.chars().count(),
    };
    let expr = parser.expr()?;
    parser.finish()?;
    Ok(expr)
}

/// One `name = expression` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub key: String,
    pub expr: Expr,
    /// 1-based source line
    pub line: usize,
}

/// A parsed configuration file, assignments in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub assignments: Vec<Assignment>,
}

impl ConfigFile {
    pub fn parse(src: &str) -> Result<Self, ParseError> {
        let mut assignments = Vec::new();

        for (idx, raw) in src.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end_matches('\r');
            let tokens = lex_line(line, line_no)?;
            if tokens.is_empty() {
                continue;
            }
            if line.starts_with([' ', '\t']) {
                return Err(ParseError::new(line_no, 1, "unexpected indentation"));
            }

            let key = match &tokens[0].tok {
                Tok::Ident(name) => name.clone(),
                _ => return Err(ParseError::new(line_no, tokens[0].column, "expected an option name")),
            };
            match tokens.get(1) {
                Some(Token { tok: Tok::Eq, .. }) => {}
                Some(t) => {
                    return Err(ParseError::new(
                        line_no,
                        t.column,
                        format!("expected `=` after `{key}`; only flat assignments are supported"),
                    ))
                }
                None => {
                    return Err(ParseError::new(
                        line_no,
                        line.chars().count() + 1,
                        format!("expected `=` after `{key}`"),
                    ))
                }
            }

            let mut parser = ExprParser {
                tokens: &tokens[2..],
                pos: 0,
                line: line_no,
                line_len: line.chars().count(),
            };
            let expr = parser.expr()?;
            parser.finish()?;
            assignments.push(Assignment {
                key,
                expr,
                line: line_no,
            });
        }

        Ok(Self { assignments })
    }

    /// Applies the assignments in order. Names on the right-hand side see the
    /// record as it stands, so earlier lines and defaults are both visible.
    pub fn apply(&self, config: &mut TrainConfig) -> Result<(), LoadError> {
        for a in &self.assignments {
            let value = {
                let current: &TrainConfig = config;
                a.expr
                    .eval(&|name: &str| current.get(name))
                    .map_err(|source| LoadError::Eval { line: a.line, source })?
            };
            config
                .set(&a.key, value)
                .map_err(|source| LoadError::Assign { line: a.line, source })?;
        }
        Ok(())
    }

    /// Resolves the file on top of the trainer defaults.
    pub fn resolve(&self) -> Result<TrainConfig, LoadError> {
        let mut config = TrainConfig::default();
        self.apply(&mut config)?;
        Ok(config)
    }

    /// Keys assigned more than once; the last assignment wins.
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut dups = Vec::new();
        for a in &self.assignments {
            if !seen.insert(a.key.as_str()) && !dups.contains(&a.key.as_str()) {
                dups.push(a.key.as_str());
            }
        }
        dups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn eval(text: &str) -> Result<Value, EvalError> {
        parse_expr(text).unwrap().eval_literal()
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("1e-3"), Ok(Value::Float(0.001)));
        assert_eq!(eval(".5"), Ok(Value::Float(0.5)));
        assert_eq!(eval("600_000"), Ok(Value::Int(600_000)));
        assert_eq!(eval("'mini-gpt'"), Ok(Value::from("mini-gpt")));
        assert_eq!(eval("\"a\\tb\""), Ok(Value::from("a\tb")));
        assert_eq!(eval("False"), Ok(Value::Bool(false)));
        assert_eq!(eval("None"), Ok(Value::None));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("5 * 8"), Ok(Value::Int(40)));
        assert_eq!(eval("1 + 2 * 3"), Ok(Value::Int(7)));
        assert_eq!(eval("(1 + 2) * 3"), Ok(Value::Int(9)));
        assert_eq!(eval("3 / 2"), Ok(Value::Float(1.5)));
        assert_eq!(eval("7 / 2"), Ok(Value::Float(3.5)));
        assert_eq!(eval("7 // 2"), Ok(Value::Int(3)));
        assert_eq!(eval("-7 // 2"), Ok(Value::Int(-4)));
        assert_eq!(eval("--3"), Ok(Value::Int(3)));
        assert_eq!(eval("'out-' + 'x'"), Ok(Value::from("out-x")));
    }

    #[test]
    fn test_eval_errors() {
        assert_eq!(eval("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1.0 // 0"), Err(EvalError::DivisionByZero));
        assert!(matches!(eval("'a' * 2"), Err(EvalError::BadOperands { .. })));
        assert!(matches!(eval("-True"), Err(EvalError::BadOperand { .. })));
        assert_eq!(eval("cpu"), Err(EvalError::UnknownName("cpu".to_string())));
        assert_eq!(eval("9223372036854775807 + 1"), Err(EvalError::Overflow));
    }

    #[test]
    fn test_parse_errors_carry_position() {
        let err = ConfigFile::parse("n_layer = 3\nimport time\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 8);

        let err = ConfigFile::parse("device = 'cpu\n").unwrap_err();
        assert_eq!((err.line, err.column), (1, 10));

        let err = ConfigFile::parse("n_layer = 3 4\n").unwrap_err();
        assert_eq!((err.line, err.column), (1, 13));

        let err = ConfigFile::parse("  n_layer = 3\n").unwrap_err();
        assert_eq!(err.line, 1);

        let err = ConfigFile::parse("n_layer = 3;\n").unwrap_err();
        assert_eq!(err.column, 12);

        assert!(ConfigFile::parse("x = 12abc").is_err());
        assert!(ConfigFile::parse("x = (1 + 2").is_err());
        assert!(ConfigFile::parse("x =").is_err());
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let src = "# header\n\nn_layer = 3 # blocks\nwandb_run_name = 'a#b'\r\n";
        let file = ConfigFile::parse(src).unwrap();
        assert_eq!(file.assignments.len(), 2);
        assert_eq!(file.assignments[0].line, 3);
        let config = file.resolve().unwrap();
        assert_eq!(config.wandb_run_name, "a#b");
    }

    #[test]
    fn test_names_see_earlier_lines_and_defaults() {
        let src = "out_dir = 'out-x'\nwandb_project = out_dir\nmin_lr = learning_rate / 10\n";
        let config = ConfigFile::parse(src).unwrap().resolve().unwrap();
        assert_eq!(config.wandb_project, "out-x");
        assert!((config.min_lr - 6e-5).abs() < 1e-12);
    }

    #[test]
    fn test_apply_reports_line() {
        let file = ConfigFile::parse("n_layer = 3\nn_layers = 4\n").unwrap();
        let err = file.resolve().unwrap_err();
        assert_eq!(
            err,
            LoadError::Assign {
                line: 2,
                source: ConfigError::UnknownKey("n_layers".to_string())
            }
        );

        let file = ConfigFile::parse("batch_size = foo\n").unwrap();
        assert!(matches!(file.resolve(), Err(LoadError::Eval { line: 1, .. })));
    }

    #[test]
    fn test_last_assignment_wins() {
        let file = ConfigFile::parse("n_layer = 3\nn_layer = 4\n").unwrap();
        assert_eq!(file.duplicate_keys(), vec!["n_layer"]);
        assert_eq!(file.resolve().unwrap().n_layer, 4);
    }
}
