//! Evaluation of `Plural-Forms` header expressions

/// A parsed `plural=` expression over the variable `n`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    N,
    Num(u64),
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    N,
    Num(u64),
    Op(&'static str),
    Open,
    Close,
    Question,
    Colon,
}

const OPERATORS: &[&str] = &[
    "&&", "||", "==", "!=", "<=", ">=", "<", ">", "!", "*", "/", "%", "+", "-",
];

fn tokenize(src: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = src.trim_start();
    while !rest.is_empty() {
        let c = rest.chars().next()?;
        let len = if c.is_ascii_digit() {
            let len = rest.bytes().take_while(u8::is_ascii_digit).count();
            tokens.push(Token::Num(rest[..len].parse().ok()?));
            len
        } else if c == 'n' {
            tokens.push(Token::N);
            1
        } else if c == '(' {
            tokens.push(Token::Open);
            1
        } else if c == ')' {
            tokens.push(Token::Close);
            1
        } else if c == '?' {
            tokens.push(Token::Question);
            1
        } else if c == ':' {
            tokens.push(Token::Colon);
            1
        } else {
            let op = OPERATORS.iter().copied().find(|op| rest.starts_with(op))?;
            tokens.push(Token::Op(op));
            op.len()
        };
        rest = rest[len..].trim_start();
    }
    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ternary(&mut self) -> Option<Expr> {
        let cond = self.binary(0)?;
        if !self.eat(Token::Question) {
            return Some(cond);
        }
        let then = self.ternary()?;
        if !self.eat(Token::Colon) {
            return None;
        }
        let other = self.ternary()?;
        Some(Expr::Cond(Box::new(cond), Box::new(then), Box::new(other)))
    }

    /// Precedence climbing over the binary operator levels.
    fn binary(&mut self, level: usize) -> Option<Expr> {
        const LEVELS: &[&[(&str, BinOp)]] = &[
            &[("||", BinOp::Or)],
            &[("&&", BinOp::And)],
            &[("==", BinOp::Eq), ("!=", BinOp::Ne)],
            &[("<", BinOp::Lt), ("<=", BinOp::Le), (">", BinOp::Gt), (">=", BinOp::Ge)],
            &[("+", BinOp::Add), ("-", BinOp::Sub)],
            &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Rem)],
        ];
        if level == LEVELS.len() {
            return self.unary();
        }
        let mut lhs = self.binary(level + 1)?;
        loop {
            let Some(Token::Op(sym)) = self.peek() else {
                return Some(lhs);
            };
            let Some(&(_, op)) = LEVELS[level].iter().find(|(s, _)| *s == sym) else {
                return Some(lhs);
            };
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Option<Expr> {
        if self.eat(Token::Op("!")) {
            return Some(Expr::Not(Box::new(self.unary()?)));
        }
        match self.peek()? {
            Token::N => {
                self.pos += 1;
                Some(Expr::N)
            }
            Token::Num(value) => {
                self.pos += 1;
                Some(Expr::Num(value))
            }
            Token::Open => {
                self.pos += 1;
                let inner = self.ternary()?;
                self.eat(Token::Close).then_some(inner)
            }
            _ => None,
        }
    }
}

impl Expr {
    pub fn parse(src: &str) -> Option<Self> {
        let mut parser = Parser {
            tokens: tokenize(src)?,
            pos: 0,
        };
        let expr = parser.ternary()?;
        (parser.pos == parser.tokens.len()).then_some(expr)
    }

    pub fn eval(&self, n: u64) -> u64 {
        match self {
            Expr::N => n,
            Expr::Num(value) => *value,
            Expr::Not(inner) => u64::from(inner.eval(n) == 0),
            Expr::Cond(cond, then, other) => {
                if cond.eval(n) != 0 {
                    then.eval(n)
                } else {
                    other.eval(n)
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(n);
                // Short-circuit before touching the right side.
                match op {
                    BinOp::And if a == 0 => return 0,
                    BinOp::Or if a != 0 => return 1,
                    _ => {}
                }
                let b = rhs.eval(n);
                match op {
                    BinOp::Mul => a.wrapping_mul(b),
                    BinOp::Div => a.checked_div(b).unwrap_or(0),
                    BinOp::Rem => a.checked_rem(b).unwrap_or(0),
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Lt => u64::from(a < b),
                    BinOp::Le => u64::from(a <= b),
                    BinOp::Gt => u64::from(a > b),
                    BinOp::Ge => u64::from(a >= b),
                    BinOp::Eq => u64::from(a == b),
                    BinOp::Ne => u64::from(a != b),
                    BinOp::And | BinOp::Or => u64::from(b != 0),
                }
            }
        }
    }
}

/// Value of the `name=` assignment in a `Plural-Forms` header.
fn assignment<'a>(forms: &'a str, name: &str) -> Option<&'a str> {
    forms.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

/// Number of plural forms declared by a `Plural-Forms` header.
pub fn nplurals(forms: &str) -> Option<usize> {
    assignment(forms, "nplurals")?.parse().ok()
}

/// The plural expression of a `Plural-Forms` header.
pub fn plural_expression(forms: &str) -> Option<Expr> {
    Expr::parse(assignment(forms, "plural")?)
}

/// Translation slots that only ever serve one number, sampled over
/// `0..=1000`.
pub fn single_number_indices(expr: &Expr) -> Vec<usize> {
    let mut hits: Vec<usize> = Vec::new();
    for n in 0..=1000 {
        let index = expr.eval(n) as usize;
        if index >= hits.len() {
            hits.resize(index + 1, 0);
        }
        hits[index] += 1;
    }
    hits.iter()
        .enumerate()
        .filter(|(_, count)| **count == 1)
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERBIAN: &str = "nplurals=4; plural=n==1 ? 3 : n%10==1 && n%100!=11 ? 0 : \
                           n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2;";

    #[test]
    fn test_english() {
        let expr = plural_expression("nplurals=2; plural=(n != 1);").unwrap();
        assert_eq!(expr.eval(1), 0);
        assert_eq!(expr.eval(0), 1);
        assert_eq!(expr.eval(5), 1);
        assert_eq!(single_number_indices(&expr), vec![0]);
    }

    #[test]
    fn test_serbian() {
        assert_eq!(nplurals(SERBIAN), Some(4));
        let expr = plural_expression(SERBIAN).unwrap();
        assert_eq!(expr.eval(1), 3);
        assert_eq!(expr.eval(21), 0);
        assert_eq!(expr.eval(11), 2);
        assert_eq!(expr.eval(3), 1);
        assert_eq!(expr.eval(13), 2);
        assert_eq!(single_number_indices(&expr), vec![3]);
    }

    #[test]
    fn test_division_by_zero() {
        let expr = Expr::parse("n / 0 + n % 0").unwrap();
        assert_eq!(expr.eval(7), 0);
    }

    #[test]
    fn test_malformed() {
        assert_eq!(Expr::parse("n == "), None);
        assert_eq!(Expr::parse("(n"), None);
        assert_eq!(Expr::parse("n ? 1"), None);
        assert_eq!(plural_expression("nplurals=INTEGER; plural=EXPRESSION;"), None);
        assert_eq!(nplurals("nplurals=INTEGER; plural=EXPRESSION;"), None);
    }
}
