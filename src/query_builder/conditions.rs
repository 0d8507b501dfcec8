use serde_json::Value;

/// Represents different types of SQL conditions
///
/// Rendering appends `?` placeholders to the SQL text and pushes the
/// corresponding values onto the shared bindings vector, in order.
#[derive(Debug, Clone)]
pub enum Condition {
    Simple {
        column: String,
        operator: String,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    NotIn {
        column: String,
        values: Vec<Value>,
    },
    Between {
        column: String,
        start: Value,
        end: Value,
    },
    IsNull {
        column: String,
    },
    IsNotNull {
        column: String,
    },
    Nested {
        clauses: Vec<WhereClause>,
    },
    Raw {
        sql: String,
        bindings: Vec<Value>,
    },
}

impl Condition {
    /// Convert condition to SQL, pushing bound values onto `bindings`
    pub fn to_sql(&self, bindings: &mut Vec<Value>) -> String {
        match self {
            Condition::Simple {
                column,
                operator,
                value,
            } => {
                bindings.push(value.clone());
                format!("{column} {operator} ?")
            }
            Condition::In { column, values } => {
                if values.is_empty() {
                    // IN over an empty set matches nothing
                    return "0 = 1".to_string();
                }
                bindings.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{column} IN ({placeholders})")
            }
            Condition::NotIn { column, values } => {
                if values.is_empty() {
                    return "1 = 1".to_string();
                }
                bindings.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{column} NOT IN ({placeholders})")
            }
            Condition::Between { column, start, end } => {
                bindings.push(start.clone());
                bindings.push(end.clone());
                format!("{column} BETWEEN ? AND ?")
            }
            Condition::IsNull { column } => {
                format!("{column} IS NULL")
            }
            Condition::IsNotNull { column } => {
                format!("{column} IS NOT NULL")
            }
            Condition::Nested { clauses } => {
                let inner = render_clause_list(clauses, bindings);
                if inner.is_empty() {
                    String::new()
                } else {
                    format!("({inner})")
                }
            }
            Condition::Raw {
                sql,
                bindings: raw_bindings,
            } => {
                bindings.extend(raw_bindings.iter().cloned());
                sql.clone()
            }
        }
    }
}

/// A single entry in a WHERE (or HAVING) list: the condition plus the
/// boolean that joins it to the clauses before it
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub condition: Condition,
    pub boolean: LogicalOperator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl WhereClause {
    /// Wrap a condition joined with AND
    pub fn and(condition: Condition) -> Self {
        Self {
            condition,
            boolean: LogicalOperator::And,
        }
    }

    /// Wrap a condition joined with OR
    pub fn or(condition: Condition) -> Self {
        Self {
            condition,
            boolean: LogicalOperator::Or,
        }
    }

    /// Create a simple WHERE clause with a single comparison
    pub fn simple(column: &str, operator: &str, value: Value) -> Self {
        Self::and(Condition::Simple {
            column: column.to_string(),
            operator: operator.to_string(),
            value,
        })
    }

    /// Create WHERE IN clause
    pub fn in_condition(column: &str, values: Vec<Value>) -> Self {
        Self::and(Condition::In {
            column: column.to_string(),
            values,
        })
    }

    /// Create WHERE NOT IN clause
    pub fn not_in_condition(column: &str, values: Vec<Value>) -> Self {
        Self::and(Condition::NotIn {
            column: column.to_string(),
            values,
        })
    }

    /// Create WHERE BETWEEN clause
    pub fn between(column: &str, start: Value, end: Value) -> Self {
        Self::and(Condition::Between {
            column: column.to_string(),
            start,
            end,
        })
    }

    /// Create WHERE IS NULL clause
    pub fn is_null(column: &str) -> Self {
        Self::and(Condition::IsNull {
            column: column.to_string(),
        })
    }

    /// Create WHERE IS NOT NULL clause
    pub fn is_not_null(column: &str) -> Self {
        Self::and(Condition::IsNotNull {
            column: column.to_string(),
        })
    }

    /// Create a parenthesized group of clauses
    pub fn nested(clauses: Vec<WhereClause>) -> Self {
        Self::and(Condition::Nested { clauses })
    }

    /// Create raw SQL condition with its own bindings
    pub fn raw(sql: &str, bindings: Vec<Value>) -> Self {
        Self::and(Condition::Raw {
            sql: sql.to_string(),
            bindings,
        })
    }

    /// True when this clause is `column IS NULL` for the given column
    pub fn is_null_check_on(&self, column: &str) -> bool {
        matches!(&self.condition, Condition::IsNull { column: c } if c == column)
    }
}

/// Render a clause list, joining each entry with its own boolean.
///
/// The first rendered clause carries no leading keyword. Clauses that
/// render empty (an empty nested group) are skipped entirely.
pub(crate) fn render_clause_list(clauses: &[WhereClause], bindings: &mut Vec<Value>) -> String {
    let mut sql = String::new();
    for clause in clauses {
        let part = clause.condition.to_sql(bindings);
        if part.is_empty() {
            continue;
        }
        if sql.is_empty() {
            sql.push_str(&part);
        } else {
            sql.push(' ');
            sql.push_str(clause.boolean.keyword());
            sql.push(' ');
            sql.push_str(&part);
        }
    }
    sql
}
