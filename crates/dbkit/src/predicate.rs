//! Predicate clauses: the WHERE/HAVING algebra.
//!
//! A [`Predicate`] is a tree of clauses that renders into SQL through a
//! [`QueryWriter`], redeeming bound values from the caller's binding map
//! as it goes. Build trees through the constructors: they normalize at
//! construction time (AND/OR flattening, double-negation collapse,
//! single-operand degeneration), so equivalent trees render identically.

use crate::error::{DbError, DbResult};
use crate::marker::Marker;
use crate::value::{Bindings, Value};
use crate::writer::QueryWriter;

/// Comparison operators usable between a marker and a bound value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

impl CompareOp {
    fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// One node of a where/having clause tree.
#[derive(Clone, Debug)]
pub enum Predicate {
    /// `marker OP $n`, value redeemed from the binding map by key
    Compare { marker: Marker, op: CompareOp },
    /// `marker IN ($n, …)` over a list value from the binding map;
    /// an empty list renders the contradiction `1=0`
    In(Marker),
    /// `marker IS NULL`
    IsNull(Marker),
    /// `marker IS NOT NULL`
    IsNotNull(Marker),
    /// `EXISTS(SELECT 1 FROM table WHERE inner)`
    Exists {
        table: String,
        clause: Box<Predicate>,
    },
    /// `NOT (inner)`
    Not(Box<Predicate>),
    /// Conjunction; empty renders the contradiction `1=0`
    And(Vec<Predicate>),
    /// Disjunction; empty renders the contradiction `1=0`
    Or(Vec<Predicate>),
    /// `marker OP $n` against a pre-bound value, independent of the
    /// binding map
    CompareValue {
        marker: Marker,
        op: CompareOp,
        value: Value,
    },
    /// `marker IN (…)` against a pre-bound list
    InValues { marker: Marker, values: Vec<Value> },
    /// `left = right`, marker to marker, no placeholder
    EqMarkers { left: Marker, right: Marker },
    /// Escape hatch: renders the text verbatim, no placeholders
    Sql(String),
}

impl Predicate {
    pub fn eq(marker: Marker) -> Self {
        Predicate::Compare {
            marker,
            op: CompareOp::Eq,
        }
    }

    pub fn ne(marker: Marker) -> Self {
        Predicate::Compare {
            marker,
            op: CompareOp::Ne,
        }
    }

    pub fn lt(marker: Marker) -> Self {
        Predicate::Compare {
            marker,
            op: CompareOp::Lt,
        }
    }

    pub fn lte(marker: Marker) -> Self {
        Predicate::Compare {
            marker,
            op: CompareOp::Lte,
        }
    }

    pub fn gt(marker: Marker) -> Self {
        Predicate::Compare {
            marker,
            op: CompareOp::Gt,
        }
    }

    pub fn gte(marker: Marker) -> Self {
        Predicate::Compare {
            marker,
            op: CompareOp::Gte,
        }
    }

    pub fn like(marker: Marker) -> Self {
        Predicate::Compare {
            marker,
            op: CompareOp::Like,
        }
    }

    /// Membership over a list value bound under the marker's key.
    pub fn in_list(marker: Marker) -> Self {
        Predicate::In(marker)
    }

    pub fn is_null(marker: Marker) -> Self {
        Predicate::IsNull(marker)
    }

    pub fn is_not_null(marker: Marker) -> Self {
        Predicate::IsNotNull(marker)
    }

    /// Correlate against another table: `EXISTS(SELECT 1 FROM table WHERE …)`.
    pub fn exists(table: impl Into<String>, clause: Predicate) -> Self {
        Predicate::Exists {
            table: table.into(),
            clause: Box::new(clause),
        }
    }

    /// Negate a clause. `not(not(p))` collapses to `p`.
    pub fn not(clause: Predicate) -> Self {
        match clause {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    /// Conjoin clauses, flattening nested ANDs. A single operand
    /// degenerates to itself; no operands renders `1=0`.
    pub fn and(clauses: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        flatten_and(clauses, &mut flat);

        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Predicate::And(flat)
        }
    }

    /// Disjoin clauses, flattening nested ORs. A single operand
    /// degenerates to itself; no operands renders `1=0`.
    pub fn or(clauses: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        flatten_or(clauses, &mut flat);

        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Predicate::Or(flat)
        }
    }

    /// Comparison pre-bound to a fixed value.
    pub fn compare_value(marker: Marker, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::CompareValue {
            marker,
            op,
            value: value.into(),
        }
    }

    pub fn eq_value(marker: Marker, value: impl Into<Value>) -> Self {
        Self::compare_value(marker, CompareOp::Eq, value)
    }

    pub fn ne_value(marker: Marker, value: impl Into<Value>) -> Self {
        Self::compare_value(marker, CompareOp::Ne, value)
    }

    pub fn lt_value(marker: Marker, value: impl Into<Value>) -> Self {
        Self::compare_value(marker, CompareOp::Lt, value)
    }

    pub fn lte_value(marker: Marker, value: impl Into<Value>) -> Self {
        Self::compare_value(marker, CompareOp::Lte, value)
    }

    pub fn gt_value(marker: Marker, value: impl Into<Value>) -> Self {
        Self::compare_value(marker, CompareOp::Gt, value)
    }

    pub fn gte_value(marker: Marker, value: impl Into<Value>) -> Self {
        Self::compare_value(marker, CompareOp::Gte, value)
    }

    pub fn like_value(marker: Marker, value: impl Into<Value>) -> Self {
        Self::compare_value(marker, CompareOp::Like, value)
    }

    /// Membership pre-bound to a fixed list.
    pub fn in_values<I, T>(marker: Marker, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Predicate::InValues {
            marker,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Marker-to-marker equality, typically a join condition.
    pub fn eq_markers(left: Marker, right: Marker) -> Self {
        Predicate::EqMarkers { left, right }
    }

    /// Verbatim SQL escape hatch.
    pub fn sql(text: impl Into<String>) -> Self {
        Predicate::Sql(text.into())
    }

    /// Render into `w`, redeeming bound values from `bindings`.
    pub fn write_to(&self, w: &mut QueryWriter, bindings: &Bindings) -> DbResult<()> {
        match self {
            Predicate::Compare { marker, op } => {
                let value = marker.bound_value(bindings)?;
                let ph = w.redeem(value);
                w.push(&format!("{} {} {}", marker.to_sql(), op.sql(), ph));
            }
            Predicate::In(marker) => {
                let value = marker.bound_value(bindings)?;
                let Value::List(items) = value else {
                    return Err(DbError::InvalidType);
                };
                write_in(w, marker, items);
            }
            Predicate::IsNull(marker) => {
                w.push(&format!("{} IS NULL", marker.to_sql()));
            }
            Predicate::IsNotNull(marker) => {
                w.push(&format!("{} IS NOT NULL", marker.to_sql()));
            }
            Predicate::Exists { table, clause } => {
                w.push(&format!("EXISTS(SELECT 1 FROM {table} WHERE "));
                clause.write_to(w, bindings)?;
                w.push(")");
            }
            Predicate::Not(inner) => {
                w.push("NOT (");
                inner.write_to(w, bindings)?;
                w.push(")");
            }
            Predicate::And(clauses) => write_group(w, bindings, clauses, " AND ")?,
            Predicate::Or(clauses) => write_group(w, bindings, clauses, " OR ")?,
            Predicate::CompareValue { marker, op, value } => {
                let ph = w.redeem(value.clone());
                w.push(&format!("{} {} {}", marker.to_sql(), op.sql(), ph));
            }
            Predicate::InValues { marker, values } => {
                write_in(w, marker, values.clone());
            }
            Predicate::EqMarkers { left, right } => {
                w.push(&format!("{} = {}", left.to_sql(), right.to_sql()));
            }
            Predicate::Sql(text) => w.push(text),
        }

        Ok(())
    }
}

fn write_in(w: &mut QueryWriter, marker: &Marker, items: Vec<Value>) {
    if items.is_empty() {
        w.push("1=0");
        return;
    }

    let placeholders: Vec<String> = items.into_iter().map(|v| w.redeem(v)).collect();
    w.push(&format!(
        "{} IN ({})",
        marker.to_sql(),
        placeholders.join(", ")
    ));
}

fn write_group(
    w: &mut QueryWriter,
    bindings: &Bindings,
    clauses: &[Predicate],
    op: &str,
) -> DbResult<()> {
    match clauses {
        [] => w.push("1=0"),
        [only] => only.write_to(w, bindings)?,
        _ => {
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    w.push(op);
                }
                w.push("(");
                clause.write_to(w, bindings)?;
                w.push(")");
            }
        }
    }

    Ok(())
}

fn flatten_and(clauses: impl IntoIterator<Item = Predicate>, out: &mut Vec<Predicate>) {
    for clause in clauses {
        match clause {
            Predicate::And(children) => flatten_and(children, out),
            other => out.push(other),
        }
    }
}

fn flatten_or(clauses: impl IntoIterator<Item = Predicate>, out: &mut Vec<Predicate>) {
    for clause in clauses {
        match clause {
            Predicate::Or(children) => flatten_or(children, out),
            other => out.push(other),
        }
    }
}
