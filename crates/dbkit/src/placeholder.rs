//! Placeholder dialect adaptation.
//!
//! Core rendering always emits `$N`. Adapters for backends that only
//! understand bare `?` placeholders rewrite the statement after the
//! fact; since `?` is purely positional, values are permuted (and
//! duplicated, for a repeated `$N`) into occurrence order.

use crate::error::{DbError, DbResult};
use crate::options::strip_options;
use crate::value::Arg;

/// Rewrite every `$N` placeholder in `sql` to `?` and permute the
/// argument values into occurrence order.
///
/// The rewrite is lossless: every supplied value must be referenced at
/// least once and every referenced index must be supplied, otherwise
/// [`DbError::PlaceholderMismatch`] is returned and nothing is rewritten.
/// Options in `args` carry no position; they come back after the values,
/// in their original relative order. A `$` not followed by digits is
/// copied through untouched.
pub fn to_question_marks(sql: &str, args: &[Arg]) -> DbResult<(String, Vec<Arg>)> {
    let (values, options) = strip_options(args.to_vec());

    let mut out = String::with_capacity(sql.len());
    let mut reordered = Vec::with_capacity(values.len() + options.len());
    let mut seen = vec![false; values.len()];

    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let digits = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());
        if digits == 0 {
            out.push('$');
            rest = after;
            continue;
        }

        let mut index = 0usize;
        for b in after[..digits].bytes() {
            index = index
                .saturating_mul(10)
                .saturating_add(usize::from(b - b'0'));
        }
        if index == 0 || index > values.len() {
            return Err(DbError::PlaceholderMismatch {
                expected: index,
                supplied: values.len(),
            });
        }

        seen[index - 1] = true;
        reordered.push(Arg::Value(values[index - 1].clone()));
        out.push('?');
        rest = &after[digits..];
    }
    out.push_str(rest);

    let referenced = seen.iter().filter(|hit| **hit).count();
    if referenced < values.len() {
        return Err(DbError::PlaceholderMismatch {
            expected: referenced,
            supplied: values.len(),
        });
    }

    reordered.extend(options.into_iter().map(Arg::Option));
    Ok((out, reordered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CallOption, Consistency};
    use crate::value::Value;

    fn value(v: i64) -> Arg {
        Arg::Value(Value::Int(v))
    }

    #[test]
    fn rewrites_in_occurrence_order() {
        let (sql, args) =
            to_question_marks("SELECT $2, $1", &[value(1), value(2)]).unwrap();
        assert_eq!(sql, "SELECT ?, ?");
        assert_eq!(args, vec![value(2), value(1)]);
    }

    #[test]
    fn sequential_placeholders_keep_their_order() {
        let (sql, args) = to_question_marks(
            "UPDATE t SET a = $1 WHERE b = $2",
            &[value(10), value(20)],
        )
        .unwrap();
        assert_eq!(sql, "UPDATE t SET a = ? WHERE b = ?");
        assert_eq!(args, vec![value(10), value(20)]);
    }

    #[test]
    fn repeated_placeholder_duplicates_its_value() {
        let (sql, args) = to_question_marks("$1 = $1", &[value(7)]).unwrap();
        assert_eq!(sql, "? = ?");
        assert_eq!(args, vec![value(7), value(7)]);
    }

    #[test]
    fn unreferenced_value_is_rejected() {
        let err = to_question_marks("x = $1", &[value(1), value(2)]).unwrap_err();
        assert_eq!(
            err,
            DbError::PlaceholderMismatch {
                expected: 1,
                supplied: 2,
            }
        );
    }

    #[test]
    fn out_of_range_placeholder_is_rejected() {
        let err = to_question_marks("x = $2", &[value(1)]).unwrap_err();
        assert_eq!(
            err,
            DbError::PlaceholderMismatch {
                expected: 2,
                supplied: 1,
            }
        );
    }

    #[test]
    fn options_ride_behind_the_values() {
        let option = Arg::Option(CallOption::Consistency(Consistency::Strong));
        let (sql, args) =
            to_question_marks("x = $1", &[value(1), option.clone()]).unwrap();
        assert_eq!(sql, "x = ?");
        assert_eq!(args, vec![value(1), option]);
    }

    #[test]
    fn bare_dollar_is_copied_through() {
        let (sql, args) = to_question_marks("SELECT $$tag$$ FROM t", &[]).unwrap();
        assert_eq!(sql, "SELECT $$tag$$ FROM t");
        assert!(args.is_empty());
    }

    #[test]
    fn statement_without_placeholders_is_unchanged() {
        let (sql, args) = to_question_marks("DELETE FROM t", &[]).unwrap();
        assert_eq!(sql, "DELETE FROM t");
        assert!(args.is_empty());
    }
}
