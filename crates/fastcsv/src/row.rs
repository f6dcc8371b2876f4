use std::{fmt, ops::Index};

/// One comma-delimited unit of a row.
///
/// An empty field is the empty string; whether it was written as `""` is
/// recorded separately in [`is_quoted`](Field::is_quoted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    text: String,
    quoted: bool,
}

impl Field {
    /// Creates a field.
    #[must_use]
    pub fn new(text: impl Into<String>, quoted: bool) -> Self {
        Self {
            text: text.into(),
            quoted,
        }
    }

    /// The decoded field content.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the field was enclosed in quotes in the source.
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// Takes the content out of the field.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl AsRef<str> for Field {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An ordered sequence of fields, as produced for one line of input.
///
/// A row with no fields comes from an empty line. It is distinct from a row
/// holding a single empty field.
///
/// ```rust
/// use fastcsv::{Input, ParseOptions, parse};
///
/// let mut reader = parse(Input::text("a,\"b\"\n\n"), ParseOptions::default())?;
/// let row = reader.next_row()?.unwrap();
/// assert_eq!(row, ["a", "b"]);
/// assert!(row.fields()[1].is_quoted());
/// assert!(reader.next_row()?.unwrap().is_blank());
/// # Ok::<(), fastcsv::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    fields: Vec<Field>,
    line: usize,
}

impl Row {
    /// Creates a row that starts on `line`.
    #[must_use]
    pub fn new(fields: Vec<Field>, line: usize) -> Self {
        Self { fields, line }
    }

    /// The fields, in source order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The 1-based line this row starts on.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Same as [`is_blank`](Row::is_blank).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether this row came from an empty line (zero fields).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields.is_empty()
    }

    /// Content of the field at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(Field::as_str)
    }

    /// Iterates over field contents.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Field::as_str)
    }

    /// Converts the row into its field contents.
    #[must_use]
    pub fn into_strings(self) -> Vec<String> {
        self.fields.into_iter().map(Field::into_string).collect()
    }
}

impl Index<usize> for Row {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        self.fields[index].as_str()
    }
}

impl IntoIterator for Row {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<S: AsRef<str>> PartialEq<[S]> for Row {
    fn eq(&self, other: &[S]) -> bool {
        self.fields.len() == other.len() && self.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}

impl<S: AsRef<str>> PartialEq<Vec<S>> for Row {
    fn eq(&self, other: &Vec<S>) -> bool {
        *self == other[..]
    }
}

impl<S: AsRef<str>, const N: usize> PartialEq<[S; N]> for Row {
    fn eq(&self, other: &[S; N]) -> bool {
        *self == other[..]
    }
}
