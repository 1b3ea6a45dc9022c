//! Per-call options carried in argument lists.
//!
//! Options are values a caller attaches to one execution without touching
//! the SQL text: they ride in the [`Arg`] list after every bindable value,
//! and adapters peel them off with [`strip_options`] before binding.

use crate::value::{Arg, Value};

/// Ask a write to report the value of one generated column.
///
/// Backends with native `RETURNING` run the statement as a row query and
/// surface the scanned value as `last_insert_id`; others fall back to the
/// driver-reported insert id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Returning {
    pub field: String,
}

impl Returning {
    pub fn new(field: impl Into<String>) -> Self {
        Returning {
            field: field.into(),
        }
    }
}

/// How stale a read the caller tolerates. A hint for replicated backends;
/// single-node adapters ignore it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Consistency {
    #[default]
    Eventual,
    Strong,
}

/// The closed set of per-call options a statement may append to its
/// argument list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOption {
    Returning(Returning),
    Consistency(Consistency),
}

impl CallOption {
    /// The returning payload, if this option is one.
    pub fn as_returning(&self) -> Option<&Returning> {
        match self {
            CallOption::Returning(r) => Some(r),
            CallOption::Consistency(_) => None,
        }
    }
}

/// Split a rendered argument list into bindable values and options.
///
/// Relative order is preserved on both sides, so value positions still
/// line up with `$N` placeholders afterwards.
pub fn strip_options(args: Vec<Arg>) -> (Vec<Value>, Vec<CallOption>) {
    let mut values = Vec::with_capacity(args.len());
    let mut options = Vec::new();

    for arg in args {
        match arg {
            Arg::Value(v) => values.push(v),
            Arg::Option(o) => options.push(o),
        }
    }

    (values, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_preserves_order() {
        let args = vec![
            Arg::Value(Value::Int(1)),
            Arg::Option(CallOption::Returning(Returning::new("id"))),
            Arg::Value(Value::Text("x".into())),
            Arg::Option(CallOption::Consistency(Consistency::Strong)),
        ];

        let (values, options) = strip_options(args);

        assert_eq!(values, vec![Value::Int(1), Value::Text("x".into())]);
        assert_eq!(
            options,
            vec![
                CallOption::Returning(Returning::new("id")),
                CallOption::Consistency(Consistency::Strong),
            ]
        );
    }

    #[test]
    fn strip_without_options() {
        let (values, options) = strip_options(vec![Arg::Value(Value::Bool(true))]);
        assert_eq!(values, vec![Value::Bool(true)]);
        assert!(options.is_empty());
    }
}
