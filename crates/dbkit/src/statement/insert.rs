//! INSERT statement template.

use crate::error::{DbError, DbResult};
use crate::marker::Marker;
use crate::options::{CallOption, Returning};
use crate::predicate::Predicate;
use crate::statement::BuiltQuery;
use crate::value::Bindings;
use crate::writer::QueryWriter;

/// Which index arbitrates an `ON CONFLICT` clause.
#[derive(Clone, Debug, Default)]
pub struct ConflictTarget {
    pub fields: Vec<Marker>,
    pub where_clause: Option<Predicate>,
}

/// What to do when the conflict target matches an existing row.
#[derive(Clone, Debug)]
pub enum ConflictAction {
    /// `DO NOTHING`
    Nothing,
    /// `DO UPDATE SET f = $n, …` over the given fields
    Update(Vec<Marker>),
}

/// `ON CONFLICT` clause of an INSERT.
#[derive(Clone, Debug)]
pub struct OnConflict {
    pub target: Option<ConflictTarget>,
    pub action: ConflictAction,
}

impl OnConflict {
    /// Swallow conflicts on any arbiter: `ON CONFLICT DO NOTHING`.
    pub fn do_nothing() -> Self {
        OnConflict {
            target: None,
            action: ConflictAction::Nothing,
        }
    }

    /// React to conflicts on a specific column set.
    pub fn on_fields(fields: impl IntoIterator<Item = Marker>, action: ConflictAction) -> Self {
        OnConflict {
            target: Some(ConflictTarget {
                fields: fields.into_iter().collect(),
                where_clause: None,
            }),
            action,
        }
    }

    fn write_to(&self, w: &mut QueryWriter, bindings: &Bindings) -> DbResult<()> {
        w.push(" ON CONFLICT");

        if let Some(target) = &self.target {
            let names: Vec<&str> = target.fields.iter().map(Marker::column_name).collect();
            w.push(&format!(" ({})", names.join(", ")));
            if let Some(clause) = &target.where_clause {
                w.push(" WHERE ");
                clause.write_to(w, bindings)?;
            }
        }

        match &self.action {
            ConflictAction::Nothing => w.push(" DO NOTHING"),
            ConflictAction::Update(fields) => {
                w.push(" DO UPDATE SET ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        w.push(", ");
                    }
                    let value = field.bound_value(bindings)?;
                    let ph = w.redeem(value);
                    w.push(&format!("{} = {}", field.column_name(), ph));
                }
            }
        }

        Ok(())
    }
}

/// A reusable INSERT template.
#[derive(Clone, Debug, Default)]
pub struct InsertStatement {
    pub table: String,
    pub fields: Vec<Marker>,
    /// Generated columns to report back. One field stays out of the SQL
    /// and rides the argument list as a [`Returning`] option; several
    /// render a `RETURNING` suffix and turn the statement into a query.
    pub returning: Vec<Marker>,
    pub on_conflict: Option<OnConflict>,
}

impl InsertStatement {
    pub fn new(table: impl Into<String>) -> Self {
        InsertStatement {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: Marker) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Marker>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn returning(mut self, field: Marker) -> Self {
        self.returning.push(field);
        self
    }

    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }

    /// Binding keys of the returning fields, labeling query-mode rows.
    pub fn returning_keys(&self) -> Vec<String> {
        self.returning
            .iter()
            .map(|f| f.binding().to_owned())
            .collect()
    }

    /// Render a single-row INSERT for execution.
    pub fn build(&self, bindings: &Bindings) -> DbResult<BuiltQuery> {
        self.render(&[bindings], bindings, false)
    }

    /// Render a multi-row INSERT: one VALUES tuple per row map.
    ///
    /// `shared` feeds the conflict clauses and fills keys missing from an
    /// individual row. An empty `rows` slice is rejected as
    /// [`DbError::NoMarkers`]: there is nothing to render.
    pub fn build_many(&self, rows: &[&Bindings], shared: &Bindings) -> DbResult<BuiltQuery> {
        if rows.is_empty() {
            return Err(DbError::NoMarkers);
        }
        self.render(rows, shared, false)
    }

    /// Render in query mode: RETURNING always lands in the SQL so the
    /// statement can run as a row query.
    pub(crate) fn build_query(&self, bindings: &Bindings) -> DbResult<BuiltQuery> {
        self.render(&[bindings], bindings, true)
    }

    fn render(&self, rows: &[&Bindings], shared: &Bindings, as_query: bool) -> DbResult<BuiltQuery> {
        if self.fields.is_empty() {
            return Err(DbError::NoMarkers);
        }

        let mut w = QueryWriter::new();

        let names: Vec<&str> = self.fields.iter().map(Marker::column_name).collect();
        w.push(&format!(
            "INSERT INTO {}({}) VALUES ",
            self.table,
            names.join(", ")
        ));

        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }

            let mut placeholders = Vec::with_capacity(self.fields.len());
            for field in &self.fields {
                let value = row
                    .get(field.binding())
                    .or_else(|| shared.get(field.binding()))
                    .cloned()
                    .ok_or_else(|| DbError::missing_key(field.binding()))?;
                placeholders.push(w.redeem(value));
            }
            w.push(&format!("({})", placeholders.join(", ")));
        }

        if let Some(on_conflict) = &self.on_conflict {
            on_conflict.write_to(&mut w, shared)?;
        }

        match self.returning.as_slice() {
            [] => {}
            [single] if !as_query => {
                w.push_option(CallOption::Returning(Returning::new(single.column_name())));
            }
            many => {
                let names: Vec<&str> = many.iter().map(Marker::column_name).collect();
                w.push(&format!(" RETURNING {}", names.join(", ")));
            }
        }

        let (sql, args) = w.finish();
        Ok(BuiltQuery { sql, args })
    }
}
