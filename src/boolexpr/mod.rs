//! Boolean-expression evaluator used by feature gates (REQUIRES, XFAIL, ...).
//!
//! Grammar:
//!   expr       := or
//!   or         := and ('||' and)*
//!   and        := not ('&&' not)*
//!   not        := '!' not | '(' or ')' | identifier
//!   identifier := [-+=._A-Za-z0-9]+
//!
//! An identifier is true iff it is literally `true`, OR is a member of the
//! evaluation feature set, OR occurs as a substring of the triple. Ported
//! from `BooleanExpression.cpp`'s regex-driven tokenizer and recursive
//! descent parser.

use crate::error::LitError;

const END_MARK: &str = "END_PARSE_MARK";

lazy_static::lazy_static! {
    static ref TOKEN_PATTERN: regex_lite::Regex =
        regex_lite::Regex::new(r#"^\s*([()]|[-+=._A-Za-z0-9]+|&&|\|\||!)\s*(.*)$"#).unwrap();
}

fn quote(token: &str) -> String {
    if token == END_MARK {
        "<end of expression>".to_string()
    } else {
        format!("'{}'", token)
    }
}

/// Split `str` into a flat token stream, ending in the `END_PARSE_MARK`
/// sentinel. Fails with `couldn't parse text: '<tail>'` on an unconsumed
/// tail, exactly as the original tokenizer.
fn tokenize(mut input: &str) -> Result<Vec<String>, LitError> {
    let mut tokens = Vec::new();
    loop {
        match TOKEN_PATTERN.captures(input) {
            Some(caps) => {
                let token = caps.get(1).unwrap().as_str().to_string();
                let rest_start = caps.get(2).unwrap().start();
                // Slice from after the whole match's start using the rest group's range.
                input = &input[rest_start..];
                tokens.push(token);
            }
            None => {
                if input.is_empty() {
                    tokens.push(END_MARK.to_string());
                    break;
                } else {
                    return Err(LitError::value(format!("couldn't parse text: {}", quote(input))));
                }
            }
        }
    }
    Ok(tokens)
}

struct BooleanExpression<'a> {
    tokens: Vec<String>,
    pos: usize,
    token: Option<String>,
    variables: Vec<&'a str>,
    triple: &'a str,
    value: Option<bool>,
}

impl<'a> BooleanExpression<'a> {
    fn new(tokens: Vec<String>, variables: Vec<&'a str>, triple: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            token: None,
            variables,
            triple,
            value: None,
        }
    }

    fn advance(&mut self) {
        self.token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
    }

    fn accept(&mut self, token: &str) -> bool {
        if self.token.as_deref() == Some(token) {
            if self.token.as_deref() != Some(END_MARK) {
                self.advance();
            }
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), LitError> {
        if self.token.as_deref() == Some(token) {
            if self.token.as_deref() != Some(END_MARK) {
                self.advance();
            }
            Ok(())
        } else {
            Err(LitError::value(format!(
                "expected: {}\nhave: {}",
                quote(token),
                quote(self.token.as_deref().unwrap_or(END_MARK))
            )))
        }
    }

    fn is_identifier(token: &str) -> bool {
        !matches!(token, "END_PARSE_MARK" | "&&" | "||" | "!" | "(" | ")")
    }

    fn parsed_value(&self) -> bool {
        self.value.unwrap_or(false)
    }

    fn parse_not(&mut self) -> Result<(), LitError> {
        if self.accept("!") {
            self.parse_not()?;
            self.value = Some(!self.parsed_value());
        } else if self.accept("(") {
            self.parse_or()?;
            self.expect(")")?;
        } else {
            let current = self.token.clone().unwrap_or_else(|| END_MARK.to_string());
            if !Self::is_identifier(&current) {
                return Err(LitError::value(format!(
                    "expected: '!' or '(' or identifier\nhave: {}",
                    quote(&current)
                )));
            }
            self.value = Some(
                current == "true"
                    || self.variables.contains(&current.as_str())
                    || self.triple.contains(&current),
            );
            self.advance();
        }
        Ok(())
    }

    // Both `&&` and `||` parse both operands before combining: this is the
    // wrong associativity in general, but harmless for a side-effect-free
    // grammar. Preserved verbatim from the original.
    fn parse_and(&mut self) -> Result<(), LitError> {
        self.parse_not()?;
        while self.accept("&&") {
            let left = self.parsed_value();
            self.parse_not()?;
            let right = self.parsed_value();
            self.value = Some(left && right);
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<(), LitError> {
        self.parse_and()?;
        while self.accept("||") {
            let left = self.parsed_value();
            self.parse_and()?;
            let right = self.parsed_value();
            self.value = Some(left || right);
        }
        Ok(())
    }

    fn parse_all(&mut self) -> Result<bool, LitError> {
        self.advance();
        self.parse_or()?;
        self.expect(END_MARK)?;
        Ok(self.parsed_value())
    }
}

/// Evaluate `expr` as a boolean expression under feature set `variables` and
/// optional target `triple`. Identifiers are true iff literally `true`, a
/// member of `variables`, or a substring of `triple`.
pub fn evaluate(expr: &str, variables: &[&str], triple: &str) -> Result<bool, LitError> {
    let tokens = tokenize(expr).map_err(|e| LitError::value(format!("{}\nin expression: '{}'", e, expr)))?;
    let mut vars = variables.to_vec();
    vars.push("true");
    let mut parser = BooleanExpression::new(tokens, vars, triple);
    parser
        .parse_all()
        .map_err(|e| LitError::value(format!("{}\nin expression: '{}'", e, expr)))
}
