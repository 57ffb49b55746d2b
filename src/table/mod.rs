//! Named sections of headers and columns, and the stores that hold them.
//!
//! A [`Section`] is the in-memory form of one binary table (or, for the
//! primary HDU, just a header). The OIFITS codec only ever talks to a
//! [`TableStore`]; whether the sections live in memory ([`MemoryStore`]) or
//! in a FITS file ([`fits::FitsStore`]) doesn't matter to it.

mod error;
pub mod fits;

pub use error::{SectionError, StoreError};

use ndarray::prelude::*;

/// The value of a header card.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl HeaderValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integers are converted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(f) => Some(*f),
            HeaderValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Floats with no fractional part are converted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(i) => Some(*i),
            HeaderValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }
}

impl From<bool> for HeaderValue {
    fn from(v: bool) -> Self {
        HeaderValue::Bool(v)
    }
}

impl From<i64> for HeaderValue {
    fn from(v: i64) -> Self {
        HeaderValue::Int(v)
    }
}

impl From<f64> for HeaderValue {
    fn from(v: f64) -> Self {
        HeaderValue::Float(v)
    }
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self {
        HeaderValue::Str(v.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(v: String) -> Self {
        HeaderValue::Str(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub key: String,
    pub value: HeaderValue,
    pub comment: Option<String>,
}

/// An ordered set of keyed cards, plus free-text COMMENT cards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    cards: Vec<Card>,
    comments: Vec<String>,
}

impl Header {
    /// Set a key, replacing any existing card with the same key in place.
    pub fn set<V: Into<HeaderValue>>(&mut self, key: &str, value: V, comment: Option<&str>) {
        let card = Card {
            key: key.to_string(),
            value: value.into(),
            comment: comment.map(|c| c.to_string()),
        };
        match self.cards.iter_mut().find(|c| c.key == key) {
            Some(existing) => *existing = card,
            None => self.cards.push(card),
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.cards.iter().find(|c| c.key == key).map(|c| &c.value)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn add_comment<S: Into<String>>(&mut self, comment: S) {
        self.comments.push(comment.into());
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

/// Column values, flattened row-major: row `r`, element `e` lives at
/// `r * repeat + e`. Text columns hold one string per row.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Logical(Vec<bool>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Text { width: usize, values: Vec<String> },
}

impl ColumnData {
    /// The number of stored elements (strings for text columns).
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Logical(v) => v.len(),
            ColumnData::Short(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Double(v) => v.len(),
            ColumnData::Text { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The FITS binary table data type letter.
    pub fn type_code(&self) -> char {
        match self {
            ColumnData::Logical(_) => 'L',
            ColumnData::Short(_) => 'I',
            ColumnData::Int(_) => 'J',
            ColumnData::Float(_) => 'E',
            ColumnData::Double(_) => 'D',
            ColumnData::Text { .. } => 'A',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub unit: Option<String>,

    /// Elements per row. Ignored for text columns.
    pub repeat: usize,

    pub data: ColumnData,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, repeat: usize, data: ColumnData) -> Column {
        Column {
            name: name.into(),
            unit: None,
            repeat,
            data,
        }
    }

    /// A single-element-per-row column of `f64`s.
    pub fn doubles<S: Into<String>>(name: S, values: Vec<f64>) -> Column {
        Column::new(name, 1, ColumnData::Double(values))
    }

    /// A fixed-width text column.
    pub fn text<S: Into<String>>(name: S, width: usize, values: Vec<String>) -> Column {
        Column::new(name, width, ColumnData::Text { width, values })
    }

    pub fn with_unit(mut self, unit: &str) -> Column {
        self.unit = Some(unit.to_string());
        self
    }

    /// The TFORM of this column, e.g. `3D` or `16A`.
    pub fn tform(&self) -> String {
        match &self.data {
            ColumnData::Text { width, .. } => format!("{width}A"),
            data => format!("{}{}", self.repeat, data.type_code()),
        }
    }

    pub fn num_rows(&self) -> usize {
        match &self.data {
            ColumnData::Text { values, .. } => values.len(),
            data if self.repeat == 0 => {
                if data.is_empty() {
                    0
                } else {
                    1
                }
            }
            data => data.len() / self.repeat,
        }
    }

    fn to_f64(&self) -> Option<Vec<f64>> {
        let v = match &self.data {
            ColumnData::Short(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Int(v) => v.iter().map(|&x| x as f64).collect(),
            ColumnData::Float(v) => v.iter().map(|&x| widen(x)).collect(),
            ColumnData::Double(v) => v.clone(),
            ColumnData::Logical(_) | ColumnData::Text { .. } => return None,
        };
        Some(v)
    }

    fn to_i64(&self) -> Option<Vec<i64>> {
        let v = match &self.data {
            ColumnData::Short(v) => v.iter().map(|&x| x as i64).collect(),
            ColumnData::Int(v) => v.iter().map(|&x| x as i64).collect(),
            ColumnData::Float(v) => v.iter().map(|&x| x as i64).collect(),
            ColumnData::Double(v) => v.iter().map(|&x| x as i64).collect(),
            ColumnData::Logical(_) | ColumnData::Text { .. } => return None,
        };
        Some(v)
    }
}

/// Widen an `f32` through its shortest decimal representation, so that e.g.
/// 2.2e-6 stored as an `f32` comes back as the `f64` 2.2e-6 rather than
/// 2.2000000054e-6.
fn widen(x: f32) -> f64 {
    if x.is_finite() {
        x.to_string().parse().unwrap_or(x as f64)
    } else {
        x as f64
    }
}

/// One named table: a header and its columns. All columns of a section have
/// the same number of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub header: Header,
    pub columns: Vec<Column>,
}

impl Section {
    pub fn new<S: Into<String>>(name: S) -> Section {
        Section {
            name: name.into(),
            header: Header::default(),
            columns: vec![],
        }
    }

    pub fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.num_rows()).unwrap_or(0)
    }

    fn required_column(&self, name: &str) -> Result<&Column, SectionError> {
        self.column(name).ok_or_else(|| SectionError::MissingColumn {
            section: self.name.clone(),
            column: name.to_string(),
        })
    }

    fn wrong_type(&self, name: &str, expected: &'static str) -> SectionError {
        SectionError::WrongType {
            section: self.name.clone(),
            name: name.to_string(),
            expected,
        }
    }

    /// Every element of a numeric column as `f64`.
    pub fn f64_column(&self, name: &str) -> Result<Vec<f64>, SectionError> {
        self.required_column(name)?
            .to_f64()
            .ok_or_else(|| self.wrong_type(name, "numeric"))
    }

    /// A numeric column as `f64`s, one row per table row.
    pub fn f64_rows(&self, name: &str) -> Result<Array2<f64>, SectionError> {
        let column = self.required_column(name)?;
        let values = column
            .to_f64()
            .ok_or_else(|| self.wrong_type(name, "numeric"))?;
        self.shape_rows(column, values)
    }

    /// Every element of a numeric column as `i64`.
    pub fn i64_column(&self, name: &str) -> Result<Vec<i64>, SectionError> {
        self.required_column(name)?
            .to_i64()
            .ok_or_else(|| self.wrong_type(name, "numeric"))
    }

    /// A numeric column as `i64`s, one row per table row.
    pub fn i64_rows(&self, name: &str) -> Result<Array2<i64>, SectionError> {
        let column = self.required_column(name)?;
        let values = column
            .to_i64()
            .ok_or_else(|| self.wrong_type(name, "numeric"))?;
        self.shape_rows(column, values)
    }

    /// A logical column, one row per table row.
    pub fn bool_rows(&self, name: &str) -> Result<Array2<bool>, SectionError> {
        let column = self.required_column(name)?;
        match &column.data {
            ColumnData::Logical(v) => self.shape_rows(column, v.clone()),
            _ => Err(self.wrong_type(name, "logical")),
        }
    }

    pub fn str_column(&self, name: &str) -> Result<&[String], SectionError> {
        match &self.required_column(name)?.data {
            ColumnData::Text { values, .. } => Ok(values),
            _ => Err(self.wrong_type(name, "text")),
        }
    }

    fn shape_rows<T>(&self, column: &Column, values: Vec<T>) -> Result<Array2<T>, SectionError> {
        let rows = column.num_rows();
        let repeat = if rows == 0 { column.repeat } else { values.len() / rows };
        Array2::from_shape_vec((rows, repeat), values)
            .map_err(|_| self.wrong_type(&column.name, "rectangular"))
    }

    pub fn key(&self, key: &str) -> Result<&HeaderValue, SectionError> {
        self.header.get(key).ok_or_else(|| SectionError::MissingKey {
            section: self.name.clone(),
            key: key.to_string(),
        })
    }

    pub fn key_str(&self, key: &str) -> Result<&str, SectionError> {
        self.key(key)?
            .as_str()
            .ok_or_else(|| self.wrong_type(key, "a string"))
    }

    pub fn key_f64(&self, key: &str) -> Result<f64, SectionError> {
        self.key(key)?
            .as_f64()
            .ok_or_else(|| self.wrong_type(key, "a number"))
    }

    pub fn key_i64(&self, key: &str) -> Result<i64, SectionError> {
        self.key(key)?
            .as_i64()
            .ok_or_else(|| self.wrong_type(key, "an integer"))
    }

    /// A string key that may be absent. A present key of the wrong type is
    /// still an error.
    pub fn optional_key_str(&self, key: &str) -> Result<Option<&str>, SectionError> {
        match self.header.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| self.wrong_type(key, "a string")),
        }
    }
}

/// Somewhere sections can be read from and written to.
pub trait TableStore {
    /// The sections currently held, in order.
    fn sections(&self) -> &[Section];

    /// Replace everything held with `sections`.
    fn write(&mut self, sections: Vec<Section>) -> Result<(), StoreError>;
}

/// Sections held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    sections: Vec<Section>,
}

impl MemoryStore {
    pub fn new(sections: Vec<Section>) -> MemoryStore {
        MemoryStore { sections }
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }
}

impl TableStore for MemoryStore {
    fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn write(&mut self, sections: Vec<Section>) -> Result<(), StoreError> {
        self.sections = sections;
        Ok(())
    }
}
