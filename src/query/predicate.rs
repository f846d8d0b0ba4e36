/// A value bound to a query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// A boolean condition over store columns.
///
/// Column names are fixed by the query builders; only values are bound as
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq {
        column: &'static str,
        value: SqlValue,
    },
    In {
        column: &'static str,
        values: Vec<SqlValue>,
    },
    /// Exact prefix comparison (case-sensitive, unlike `LIKE`).
    Prefix {
        column: &'static str,
        prefix: String,
    },
    IsNull {
        column: &'static str,
    },
    Not(Box<Predicate>),
    Any(Vec<Predicate>),
    /// Matches nothing.
    Never,
}

impl Predicate {
    /// `column = value`, or `column IN (...)` for several values.
    pub fn one_of(column: &'static str, mut values: Vec<SqlValue>) -> Predicate {
        match values.len() {
            0 => Predicate::Never,
            1 => Predicate::Eq {
                column,
                value: values.remove(0),
            },
            _ => Predicate::In { column, values },
        }
    }

    /// Disjunction that drops `Never` members and collapses trivial cases.
    pub fn any(predicates: Vec<Predicate>) -> Predicate {
        let mut kept: Vec<Predicate> = predicates
            .into_iter()
            .filter(|p| *p != Predicate::Never)
            .collect();
        match kept.len() {
            0 => Predicate::Never,
            1 => kept.remove(0),
            _ => Predicate::Any(kept),
        }
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Renders the predicate as SQL, appending bound values to `params`.
    ///
    /// Placeholders are numbered (`?1`, `?2`, ...) after whatever `params`
    /// already holds, so several predicates can share one parameter list.
    pub fn render(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            Predicate::Eq { column, value } => {
                let slot = bind(params, value.clone());
                format!("{column} = {slot}")
            }
            Predicate::In { column, values } => {
                if values.is_empty() {
                    return "0".to_string();
                }
                let slots: Vec<String> = values.iter().map(|v| bind(params, v.clone())).collect();
                format!("{column} IN ({})", slots.join(", "))
            }
            Predicate::Prefix { column, prefix } => {
                let slot = bind(params, SqlValue::Text(prefix.clone()));
                format!("substr({column}, 1, length({slot})) = {slot}")
            }
            Predicate::IsNull { column } => format!("{column} IS NULL"),
            Predicate::Not(inner) => format!("NOT ({})", inner.render(params)),
            Predicate::Any(items) => join(items, " OR ", "0", params),
            Predicate::Never => "0".to_string(),
        }
    }
}

fn bind(params: &mut Vec<SqlValue>, value: SqlValue) -> String {
    params.push(value);
    format!("?{}", params.len())
}

fn join(items: &[Predicate], separator: &str, empty: &str, params: &mut Vec<SqlValue>) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = items.iter().map(|p| p.render(params)).collect();
    format!("({})", parts.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_after_existing_params() {
        let mut params = vec![SqlValue::from("earlier")];
        let sql = Predicate::one_of("m.hostname", vec!["a".into(), "b".into()]).render(&mut params);
        assert_eq!(sql, "m.hostname IN (?2, ?3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn prefix_reuses_its_placeholder() {
        let mut params = Vec::new();
        let sql = Predicate::Prefix {
            column: "m.normalized_url",
            prefix: "http://a.com/blog".to_string(),
        }
        .render(&mut params);
        assert_eq!(sql, "substr(m.normalized_url, 1, length(?1)) = ?1");
        assert_eq!(params, vec![SqlValue::Text("http://a.com/blog".to_string())]);
    }

    #[test]
    fn any_collapses_never_members() {
        assert_eq!(
            Predicate::any(vec![Predicate::Never, Predicate::Never]),
            Predicate::Never
        );
        let single = Predicate::IsNull { column: "e.type" };
        assert_eq!(Predicate::any(vec![Predicate::Never, single.clone()]), single);
    }
}
