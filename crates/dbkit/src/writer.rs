//! SQL text accumulation and parameter redemption.

use std::fmt;

use crate::options::CallOption;
use crate::value::{Arg, Value};

/// Accumulates the SQL text and ordered argument list of one render.
///
/// Every bound value is *redeemed*: appended to the argument list in
/// exchange for its positional `$N` placeholder, numbered 1-based in
/// redemption order. Options appended via [`QueryWriter::push_option`]
/// ride the same list but never consume a placeholder number.
#[derive(Debug, Default)]
pub struct QueryWriter {
    sql: String,
    args: Vec<Arg>,
    redeemed: usize,
}

impl QueryWriter {
    pub fn new() -> Self {
        QueryWriter::default()
    }

    /// Append raw SQL text.
    pub fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Append a bound value, returning its `$N` placeholder.
    pub fn redeem(&mut self, value: Value) -> String {
        self.redeemed += 1;
        self.args.push(Arg::Value(value));
        format!("${}", self.redeemed)
    }

    /// Append a per-call option to the argument list.
    pub fn push_option(&mut self, option: CallOption) {
        self.args.push(Arg::Option(option));
    }

    /// How many values have been redeemed so far.
    pub fn redeemed(&self) -> usize {
        self.redeemed
    }

    /// Finish the render, yielding the SQL text and argument list.
    pub fn finish(self) -> (String, Vec<Arg>) {
        (self.sql, self.args)
    }
}

impl fmt::Write for QueryWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.sql.push_str(s);
        Ok(())
    }
}
