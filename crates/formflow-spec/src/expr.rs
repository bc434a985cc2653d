use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::is_blank;

/// Visibility predicate AST.
///
/// Expressions are evaluated against a context built by
/// [`crate::context::build_expression_context`]. Evaluation yields `None`
/// when the outcome cannot be decided, typically because a controlling answer
/// is missing; callers treat an undecided gate as closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    Literal { value: Value },
    Answer { path: String },
    IsSet { path: String },
    And { expressions: Vec<Expr> },
    Or { expressions: Vec<Expr> },
    Not { expression: Box<Expr> },
    Eq { left: Box<Expr>, right: Box<Expr> },
    Ne { left: Box<Expr>, right: Box<Expr> },
    OneOf { left: Box<Expr>, values: Vec<Value> },
    Lt { left: Box<Expr>, right: Box<Expr> },
    Lte { left: Box<Expr>, right: Box<Expr> },
    Gt { left: Box<Expr>, right: Box<Expr> },
    Gte { left: Box<Expr>, right: Box<Expr> },
}

impl Expr {
    pub fn answer(path: impl Into<String>) -> Self {
        Expr::Answer { path: path.into() }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal {
            value: value.into(),
        }
    }

    /// Boolean or categorical gate: `path == value`.
    pub fn answer_eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Eq {
            left: Box::new(Self::answer(path)),
            right: Box::new(Self::literal(value)),
        }
    }

    pub fn answer_in<I, V>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::OneOf {
            left: Box::new(Self::answer(path)),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_set(path: impl Into<String>) -> Self {
        Expr::IsSet { path: path.into() }
    }

    /// Evaluates the expression and returns a JSON value when possible.
    pub fn evaluate_value(&self, ctx: &Value) -> Option<Value> {
        let flag = match self {
            Expr::Literal { value } => return Some(value.clone()),
            Expr::Answer { path } => return Self::lookup(ctx, path).cloned(),
            Expr::IsSet { path } => Self::lookup(ctx, path).is_some(),
            Expr::And { expressions } => Self::connective(expressions, ctx, false)?,
            Expr::Or { expressions } => Self::connective(expressions, ctx, true)?,
            Expr::Not { expression } => !expression.evaluate_bool(ctx)?,
            Expr::Eq { left, right } => {
                let (left, right) = Self::operands(left, right, ctx)?;
                left == right
            }
            Expr::Ne { left, right } => {
                let (left, right) = Self::operands(left, right, ctx)?;
                left != right
            }
            Expr::OneOf { left, values } => values.contains(&left.evaluate_value(ctx)?),
            Expr::Lt { left, right } => Self::ordered(left, right, ctx)?.is_lt(),
            Expr::Lte { left, right } => Self::ordered(left, right, ctx)?.is_le(),
            Expr::Gt { left, right } => Self::ordered(left, right, ctx)?.is_gt(),
            Expr::Gte { left, right } => Self::ordered(left, right, ctx)?.is_ge(),
        };
        Some(Value::Bool(flag))
    }

    /// Evaluates the expression as a gate. Yes/no strings and numbers coerce.
    pub fn evaluate_bool(&self, ctx: &Value) -> Option<bool> {
        match self.evaluate_value(ctx)? {
            Value::Bool(flag) => Some(flag),
            Value::Null => Some(false),
            Value::Number(number) => number.as_f64().map(|number| number != 0.0),
            Value::String(text) => {
                let text = text.to_lowercase();
                if ["true", "t", "yes", "y", "1"].contains(&text.as_str()) {
                    Some(true)
                } else if ["false", "f", "no", "n", "0"].contains(&text.as_str()) {
                    Some(false)
                } else {
                    None
                }
            }
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Three-valued `and` (`decisive == false`) or `or` (`decisive == true`).
    /// One decisive operand settles the result even when others are undecided.
    fn connective(expressions: &[Expr], ctx: &Value, decisive: bool) -> Option<bool> {
        let outcomes: Vec<Option<bool>> = expressions
            .iter()
            .map(|expression| expression.evaluate_bool(ctx))
            .collect();
        if outcomes.contains(&Some(decisive)) {
            Some(decisive)
        } else if outcomes.contains(&None) {
            None
        } else {
            Some(!decisive)
        }
    }

    fn operands(left: &Expr, right: &Expr, ctx: &Value) -> Option<(Value, Value)> {
        Some((left.evaluate_value(ctx)?, right.evaluate_value(ctx)?))
    }

    /// Numbers order numerically and strings lexically. Mixed operands only
    /// compare when equal.
    fn ordered(left: &Expr, right: &Expr, ctx: &Value) -> Option<Ordering> {
        match Self::operands(left, right, ctx)? {
            (Value::Number(left), Value::Number(right)) => {
                left.as_f64()?.partial_cmp(&right.as_f64()?)
            }
            (Value::String(left), Value::String(right)) => Some(left.cmp(&right)),
            (left, right) => (left == right).then_some(Ordering::Equal),
        }
    }

    /// Blank answers count as unanswered so that a gate over them stays undecided.
    fn lookup<'a>(ctx: &'a Value, path: &str) -> Option<&'a Value> {
        let mut current = ctx;
        for segment in path.split('.') {
            if segment.is_empty() {
                continue;
            }
            current = if let Ok(index) = segment.parse::<usize>() {
                current.get(index)?
            } else {
                current.get(segment)?
            };
        }
        (!is_blank(current)).then_some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ordered(op: &str, left: Value, right: Value) -> Option<bool> {
        let expr: Expr = serde_json::from_value(json!({
            "op": op,
            "left": {"op": "literal", "value": left},
            "right": {"op": "literal", "value": right},
        }))
        .expect("expression parses");
        expr.evaluate_bool(&Value::Null)
    }

    #[test]
    fn comparisons_order_numbers_and_strings() {
        assert_eq!(ordered("lt", json!(2), json!(10)), Some(true));
        assert_eq!(ordered("lte", json!(10), json!(10.0)), Some(true));
        assert_eq!(ordered("gt", json!("b"), json!("a")), Some(true));
        assert_eq!(ordered("gte", json!("a"), json!("b")), Some(false));
        assert_eq!(ordered("lt", json!(1), json!("2")), None);
        assert_eq!(ordered("gte", json!(true), json!(true)), Some(true));
    }

    #[test]
    fn connectives_settle_on_a_decisive_operand() {
        let ctx = json!({"known": "Y"});
        let yes = Expr::answer_eq("known", "Y");
        let no = Expr::answer_eq("known", "N");
        let undecided = Expr::answer_eq("missing", "Y");

        let and = |expressions: Vec<Expr>| Expr::And { expressions }.evaluate_bool(&ctx);
        let or = |expressions: Vec<Expr>| Expr::Or { expressions }.evaluate_bool(&ctx);
        assert_eq!(and(vec![undecided.clone(), no.clone()]), Some(false));
        assert_eq!(and(vec![yes.clone(), undecided.clone()]), None);
        assert_eq!(and(vec![]), Some(true));
        assert_eq!(or(vec![undecided.clone(), yes.clone()]), Some(true));
        assert_eq!(or(vec![no.clone(), undecided.clone()]), None);
        assert_eq!(or(vec![]), Some(false));
        let negated = Expr::Not {
            expression: Box::new(undecided),
        };
        assert_eq!(negated.evaluate_bool(&ctx), None);
    }

    #[test]
    fn blank_answers_are_unset() {
        let ctx = json!({"name": "  ", "parts": {"day": "01"}});
        assert_eq!(Expr::is_set("name").evaluate_bool(&ctx), Some(false));
        assert_eq!(Expr::is_set("parts.day").evaluate_bool(&ctx), Some(true));
        assert_eq!(Expr::answer("parts").evaluate_bool(&ctx), None);
    }
}
