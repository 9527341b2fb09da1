use crate::engine::columns::ColumnRegistry;
use crate::engine::condition::{FilterCondition, FilterValue, ScalarValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Renders filters in the same syntax `parse_filters` reads.
pub fn render_filters(filters: &[FilterCondition]) -> String {
    Joined::new("; ", filters).to_string()
}

/// One human readable line per filter, using column and operator labels.
///
/// ```text
/// Status equals "active"
/// Tags is any of ("a", "b")
/// Metadata exists
/// ```
pub fn describe_filters(
    filters: &[FilterCondition],
    columns: &ColumnRegistry,
    empty_message: &str,
) -> String {
    if filters.is_empty() {
        return empty_message.to_string();
    }

    filters
        .iter()
        .map(|filter| {
            let label = columns
                .get(&filter.column)
                .map(|column| column.label.as_str())
                .unwrap_or(filter.column.as_str());
            let operator = filter.operator.label();

            if filter.operator.requires_value() {
                format!("{label} {operator} {}", Quoted(&filter.value))
            } else {
                format!("{label} {operator}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Items with a separator between each of them, like "a; b; c" or "a, b, c".
struct Joined<'a, T> {
    ligature: &'a str,
    items: &'a [T],
}

impl<'a, T> Joined<'a, T> {
    fn new(ligature: &'a str, items: &'a [T]) -> Self {
        Joined { ligature, items }
    }
}

impl<T> Display for Joined<'_, T>
where
    T: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self { ligature, items } = self;

        if let Some((first, rest)) = items.split_first() {
            write!(f, "{first}")?;

            for item in rest {
                write!(f, "{ligature}{item}")?;
            }
        }

        Ok(())
    }
}

impl Display for FilterCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.column, self.operator)?;

        if self.operator.requires_value() {
            write!(f, " {}", self.value)?;
        }

        Ok(())
    }
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterValue::ValueFree => Ok(()),
            FilterValue::Scalar(None) => write!(f, "\"\""),
            FilterValue::Scalar(Some(ScalarValue::Number(number))) => write!(f, "{number}"),
            FilterValue::Scalar(Some(ScalarValue::Text(text))) => write!(f, "{}", Literal(text)),
            FilterValue::MultiValue(items) => {
                let items: Vec<Literal> = items
                    .iter()
                    .flatten()
                    .map(|item| Literal(item.as_str()))
                    .collect();

                write!(f, "({})", Joined::new(", ", &items))
            }
        }
    }
}

/// A text value, bare when it can be read back as one word, quoted otherwise.
struct Literal<'a>(&'a str);

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        static BARE_VALUE_REGEX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:-]+$").expect("bare value regex is valid"));

        if BARE_VALUE_REGEX.is_match(self.0) {
            write!(f, "{}", self.0)
        } else {
            write!(f, "\"{}\"", escape(self.0))
        }
    }
}

/// Always quotes text, for descriptions meant for people.
struct Quoted<'a>(&'a FilterValue);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            FilterValue::Scalar(Some(ScalarValue::Text(text))) => write!(f, "\"{}\"", escape(text)),
            FilterValue::MultiValue(Some(items)) => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| format!("\"{}\"", escape(item)))
                    .collect();

                write!(f, "({})", items.join(", "))
            }
            other => write!(f, "{other}"),
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
