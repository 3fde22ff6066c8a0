//! Input columns and coercion of raw input values.

use crate::predict::PredictInputValue;

/// How values of a column are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    /// No usable signal during training; values are ignored.
    Unknown,
    Number,
    /// Categorical column. Enum indices start at 1; 0 means missing.
    Enum { options: Vec<String> },
    Text,
}

/// A named input column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A single input value after coercion to its column's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue<'a> {
    Unknown,
    /// NaN when missing or not a number.
    Number(f32),
    /// 1-based option index, 0 when missing or not a known option.
    Enum(usize),
    Text(&'a str),
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Coerce a raw input value (or its absence) to this column's kind.
    ///
    /// Values of the wrong type count as missing: a number column only takes
    /// numbers (otherwise NaN), enum and text columns only take strings.
    pub fn parse<'a>(&self, value: Option<&'a PredictInputValue>) -> ColumnValue<'a> {
        match &self.kind {
            ColumnKind::Unknown => ColumnValue::Unknown,
            ColumnKind::Number => ColumnValue::Number(match value {
                Some(PredictInputValue::Number(n)) => *n as f32,
                _ => f32::NAN,
            }),
            ColumnKind::Enum { options } => {
                let index = value
                    .and_then(PredictInputValue::as_str)
                    .and_then(|text| options.iter().position(|option| option == text));
                ColumnValue::Enum(index.map_or(0, |i| i + 1))
            }
            ColumnKind::Text => {
                ColumnValue::Text(value.and_then(PredictInputValue::as_str).unwrap_or(""))
            }
        }
    }
}

impl ColumnValue<'_> {
    /// The value as a tree/identity feature: numbers as-is, enum indices as
    /// floats, everything else NaN.
    pub fn as_feature(&self) -> f32 {
        match self {
            ColumnValue::Number(n) => *n,
            ColumnValue::Enum(index) => *index as f32,
            ColumnValue::Unknown | ColumnValue::Text(_) => f32::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color() -> Column {
        Column::new(
            "color",
            ColumnKind::Enum {
                options: vec!["red".into(), "green".into(), "3".into()],
            },
        )
    }

    #[test]
    fn number_coercion() {
        let column = Column::new("age", ColumnKind::Number);
        assert_eq!(
            column.parse(Some(&PredictInputValue::Number(63.0))),
            ColumnValue::Number(63.0)
        );
        // Numeric strings are not parsed.
        assert!(column
            .parse(Some(&PredictInputValue::String(" 1.5 ".into())))
            .as_feature()
            .is_nan());
        assert!(column.parse(Some(&"abc".into())).as_feature().is_nan());
        assert!(column.parse(None).as_feature().is_nan());
    }

    #[test]
    fn enum_coercion() {
        let column = color();
        assert_eq!(column.parse(Some(&"red".into())), ColumnValue::Enum(1));
        assert_eq!(column.parse(Some(&"green".into())), ColumnValue::Enum(2));
        assert_eq!(column.parse(Some(&"purple".into())), ColumnValue::Enum(0));
        assert_eq!(column.parse(None), ColumnValue::Enum(0));
        assert_eq!(column.parse(Some(&"3".into())), ColumnValue::Enum(3));
        // A number is missing, even when an option spells it.
        assert_eq!(column.parse(Some(&3.0.into())), ColumnValue::Enum(0));
    }

    #[test]
    fn text_coercion() {
        let column = Column::new("notes", ColumnKind::Text);
        assert_eq!(
            column.parse(Some(&"chest pain".into())),
            ColumnValue::Text("chest pain")
        );
        assert_eq!(column.parse(Some(&12.5.into())), ColumnValue::Text(""));
        assert_eq!(column.parse(None), ColumnValue::Text(""));
    }

    #[test]
    fn unknown_column_ignores_values() {
        let column = Column::new("id", ColumnKind::Unknown);
        assert_eq!(column.parse(Some(&1.0.into())), ColumnValue::Unknown);
    }
}
