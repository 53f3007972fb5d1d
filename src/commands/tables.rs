//! Report tables rendered with the tabled crate.
//!
//! Every report knows its columns up front so they're declared as a static slice of
//! [`Column`]s next to the report and rows are pushed whole with [`row!`]. With
//! `--titles` a header and dashes line are added, with `--explain` each column's help
//! is listed after the table:
//! ```text
//! index  tag        value          if titles
//! -----  ---        -----
//!     0  DT_NEEDED  libc.so.6
//!     1  DT_SONAME  libfoo.so
//!
//! index: the .dynamic index        if explain
//! tag: what the entry is for
//! ```
use crate::utils::{Styling, uwriteln};
use std::fmt::Display;
use std::io::Write;
use tabled::Table;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Padding, Style};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub align: Align,
    pub help: &'static str,
}

impl Column {
    pub const fn left(name: &'static str, help: &'static str) -> Column {
        Column {
            name,
            align: Align::Left,
            help,
        }
    }

    pub const fn right(name: &'static str, help: &'static str) -> Column {
        Column {
            name,
            align: Align::Right,
            help,
        }
    }
}

pub struct ReportTable {
    columns: &'static [Column],
    rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn new(columns: &'static [Column]) -> ReportTable {
        ReportTable {
            columns,
            rows: Vec::new(),
        }
    }

    /// Cells are in column order. Typically row! is used to build them.
    pub fn push(&mut self, cells: Vec<String>) {
        debug_assert_eq!(cells.len(), self.columns.len(), "{cells:?}");
        self.rows.push(cells.into_iter().map(field).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn writeln(&self, out: &mut impl Write, titles: bool, explain: bool) {
        let mut builder = Builder::with_capacity(self.rows.len() + 2, self.columns.len());
        if titles {
            builder.push_record(self.columns.iter().map(|c| c.name.table_header().to_string()));
            builder.push_record(
                self.columns
                    .iter()
                    .map(|c| "-".repeat(c.name.len()).table_sep().to_string()),
            );
        }
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }

        let mut table = builder.build();
        for (i, col) in self.columns.iter().enumerate() {
            let align = match col.align {
                Align::Left => Alignment::left(),
                Align::Right => Alignment::right(),
            };
            table.modify(Columns::one(i), align);
        }
        uwriteln!(out, "{}", finish(table));

        if explain {
            write_explain(out, self.columns.iter().map(|c| (c.name, c.help)));
        }
    }
}

/// Cells for a [`ReportTable`] row, e.g. `row![index, name, format!("{addr:x}")]`.
macro_rules! row {
    ($($cell:expr),+ $(,)?) => {
        vec![$(($cell).to_string()),+]
    };
}
pub(crate) use row;

/// Name/value pairs without titles, e.g. the ELF header:
/// ```text
/// class    ELF64
/// data     2's complement, little-endian
/// ```
pub struct FieldList {
    fields: Vec<(&'static str, String, &'static str)>,
}

impl FieldList {
    pub fn new() -> FieldList {
        FieldList { fields: Vec::new() }
    }

    pub fn push(&mut self, name: &'static str, value: impl Display, help: &'static str) {
        self.fields.push((name, field(value.to_string()), help));
    }

    pub fn writeln(&self, out: &mut impl Write, explain: bool) {
        let mut builder = Builder::with_capacity(self.fields.len(), 2);
        for (name, value, _) in &self.fields {
            builder.push_record([name.to_string(), value.clone()]);
        }
        let mut table = builder.build();
        table.modify(Columns::new(0..2), Alignment::left());
        uwriteln!(out, "{}", finish(table));

        if explain {
            write_explain(out, self.fields.iter().map(|(name, _, help)| (*name, *help)));
        }
    }
}

impl Default for FieldList {
    fn default() -> Self {
        FieldList::new()
    }
}

fn field(value: String) -> String {
    // tabled mis-sizes columns with empty cells
    let value = if value.is_empty() { " ".to_string() } else { value };
    value.table_field().to_string()
}

fn finish(mut table: Table) -> String {
    table.modify(Columns::first(), Padding::new(0, 1, 0, 0));
    table.with(Style::empty());
    table.to_string()
}

fn write_explain<'a>(out: &mut impl Write, help: impl Iterator<Item = (&'a str, &'a str)>) {
    uwriteln!(out);
    for (name, text) in help {
        uwriteln!(out, "{}: {}", name.explain_title(), text.explain_text());
    }
}
