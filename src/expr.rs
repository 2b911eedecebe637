use std::fmt;
use std::str::FromStr;

use crate::{GraphiteError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
        }
    }

    /// Strict IEEE comparison, so a NaN on either side is always false.
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Eq => value == threshold,
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = GraphiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "==" => Ok(Comparator::Eq),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            _ => Err(GraphiteError::InvalidComparator),
        }
    }
}

// Two-character operators come before their one-character prefix.
const SCAN_ORDER: [(&str, Comparator); 5] = [
    ("<=", Comparator::Le),
    ("<", Comparator::Lt),
    (">=", Comparator::Ge),
    (">", Comparator::Gt),
    ("==", Comparator::Eq),
];

/// A parsed `<target> <comparator> <threshold>` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub target: String,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Expression {
    /// Splits `eval` on the first operator found in scan order.
    ///
    /// An operator at index 0 does not count, so a target is mandatory.
    /// Targets holding a literal `<` or `>` are split at that character.
    pub fn parse(eval: &str) -> Result<Self> {
        let (start, op, comparator) = SCAN_ORDER
            .iter()
            .find_map(|(op, cmp)| match eval.find(op) {
                Some(start) if start > 0 => Some((start, *op, *cmp)),
                _ => None,
            })
            .ok_or(GraphiteError::InvalidComparator)?;

        let target = eval[..start].trim();
        if target.is_empty() {
            return Err(GraphiteError::EmptyTarget);
        }

        let threshold = eval[start + op.len()..]
            .trim()
            .parse::<f64>()
            .map_err(|_| GraphiteError::InvalidThreshold)?;

        Ok(Self {
            target: target.to_string(),
            comparator,
            threshold,
        })
    }

    pub fn matches(&self, value: f64) -> bool {
        self.comparator.check(value, self.threshold)
    }
}

impl FromStr for Expression {
    type Err = GraphiteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.target, self.comparator, self.threshold)
    }
}
