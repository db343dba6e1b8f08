//! Column tables built from solver trace events.
//!
//! `heat-core` reports its search loops through `tracing` events with an
//! explicit target per loop. [`TableSubscriber`] turns every target into a
//! [`Table`] whose columns are the event fields, so tests can inspect how a
//! search progressed without the solver keeping any history itself.
//!
//! # Usage
//!
//! ```ignore
//! // In solver code:
//! tracing::info!(target: "best_response", round, switches);
//!
//! // In a test:
//! let (result, recorder) = instrument::capture(|| market.analyse(&mut rng));
//! let rounds = recorder.table("best_response").unwrap().u64s("round");
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

/// One typed column. The type is fixed by the first value recorded under a name.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TraceColumn {
    pub fn len(&self) -> usize {
        match self {
            TraceColumn::U64(v) => v.len(),
            TraceColumn::I64(v) => v.len(),
            TraceColumn::F64(v) => v.len(),
            TraceColumn::Bool(v) => v.len(),
            TraceColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extend with the type's zero value until the column holds `rows` values.
    fn fill_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        if missing == 0 {
            return;
        }
        match self {
            TraceColumn::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TraceColumn::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TraceColumn::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            TraceColumn::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            TraceColumn::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }
}

/// Rows recorded under one tracing target.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: BTreeMap<String, TraceColumn>,
    rows: usize,
}

impl Table {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&TraceColumn> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn f64s(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            TraceColumn::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn u64s(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            TraceColumn::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn bools(&self, name: &str) -> Option<&[bool]> {
        match self.columns.get(name)? {
            TraceColumn::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn strs(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            TraceColumn::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Close the current row: every column ends up exactly `rows` long.
    fn finish_row(&mut self) {
        self.rows += 1;
        let rows = self.rows;
        for column in self.columns.values_mut() {
            column.fill_to(rows);
        }
    }

    /// Convert to a polars DataFrame with one column per recorded field.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| match column {
                TraceColumn::U64(v) => Column::new(name.into(), v),
                TraceColumn::I64(v) => Column::new(name.into(), v),
                TraceColumn::F64(v) => Column::new(name.into(), v),
                TraceColumn::Bool(v) => Column::new(name.into(), v),
                TraceColumn::Str(v) => Column::new(name.into(), v),
            })
            .collect();
        DataFrame::new(columns)
    }
}

/// All tables recorded on the current thread, keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: HashMap<String, Table>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&Table> {
        self.tables.get(target)
    }

    /// Row count for a target, zero when nothing was recorded under it.
    pub fn rows(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, Table::rows)
    }
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

/// Writes the fields of one event into the open row of a table.
struct RowVisitor<'a> {
    table: &'a mut Table,
}

impl RowVisitor<'_> {
    /// Column for `field`, created zero-filled for the rows it missed.
    fn slot(&mut self, field: &Field, empty: fn(usize) -> TraceColumn) -> &mut TraceColumn {
        let rows = self.table.rows;
        self.table
            .columns
            .entry(field.name().to_string())
            .or_insert_with(|| empty(rows))
    }
}

impl Visit for RowVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if let TraceColumn::U64(v) = self.slot(field, |n| TraceColumn::U64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let TraceColumn::I64(v) = self.slot(field, |n| TraceColumn::I64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let TraceColumn::F64(v) = self.slot(field, |n| TraceColumn::F64(vec![0.0; n])) {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if let TraceColumn::Bool(v) = self.slot(field, |n| TraceColumn::Bool(vec![false; n])) {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if let TraceColumn::Str(v) =
            self.slot(field, |n| TraceColumn::Str(vec![String::new(); n]))
        {
            v.push(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{:?}", value));
    }
}

/// Subscriber that appends every info-or-above event to the thread-local recorder.
pub struct TableSubscriber;

impl Subscriber for TableSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target().to_string();
        RECORDER.with(|r| {
            let mut recorder = r.borrow_mut();
            let table = recorder.tables.entry(target).or_default();
            event.record(&mut RowVisitor { table: &mut *table });
            table.finish_row();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Take everything recorded on this thread so far.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

/// Run `f` with a [`TableSubscriber`] scoped to this thread and return its
/// result together with the tables it produced.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, Recorder) {
    clear();
    let out = tracing::subscriber::with_default(TableSubscriber, f);
    (out, drain())
}
