//! Eager-load bookkeeping: relation path parsing and the load pipeline.

use std::fmt;
use std::sync::Arc;

use crate::connection::Connection;
use crate::error::{QuarryError, Result};
use crate::model::Model;
use crate::relations::Constrainable;

/// Constraint applied to a relation's query before it runs
pub type Constraint = Arc<dyn Fn(&mut dyn Constrainable) + Send + Sync>;

/// A registered eager-load entry: relation path plus optional constraint
#[derive(Clone)]
pub struct EagerSpec {
    pub name: String,
    pub constraint: Option<Constraint>,
}

impl EagerSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    pub fn constrained(name: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            constraint: Some(constraint),
        }
    }

    pub fn has_constraint(&self) -> bool {
        self.constraint.is_some()
    }
}

impl fmt::Debug for EagerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerSpec")
            .field("name", &self.name)
            .field("constrained", &self.constraint.is_some())
            .finish()
    }
}

/// Register a relation path, inserting parent prefixes ahead of it.
///
/// `orders.lines` registers `orders` first (no constraint) and then
/// `orders.lines`. An auto-inserted parent never overwrites an existing
/// entry; an explicit constraint always lands on its path.
pub(crate) fn register_path(
    specs: &mut Vec<EagerSpec>,
    path: &str,
    constraint: Option<Constraint>,
) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut prefix = String::new();
    for segment in &segments[..segments.len() - 1] {
        if !prefix.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(segment);
        merge_spec(specs, &prefix, None);
    }
    merge_spec(specs, path, constraint);
}

fn merge_spec(specs: &mut Vec<EagerSpec>, name: &str, constraint: Option<Constraint>) {
    if let Some(existing) = specs.iter_mut().find(|spec| spec.name == name) {
        if constraint.is_some() {
            existing.constraint = constraint;
        }
    } else {
        specs.push(EagerSpec {
            name: name.to_string(),
            constraint,
        });
    }
}

/// Relation paths registered under `parent`, with the prefix stripped
pub(crate) fn nested_specs(specs: &[EagerSpec], parent: &str) -> Vec<EagerSpec> {
    let prefix = format!("{parent}.");
    specs
        .iter()
        .filter(|spec| spec.name.starts_with(&prefix))
        .map(|spec| EagerSpec {
            name: spec.name[prefix.len()..].to_string(),
            constraint: spec.constraint.clone(),
        })
        .collect()
}

/// Run the load pipeline over every directly registered relation.
///
/// Dotted paths are skipped here; they reach the related model through
/// `set_nested` and load one level down.
pub(crate) async fn load_relations<M: Model>(
    conn: &dyn Connection,
    specs: &[EagerSpec],
    models: &mut Vec<M>,
) -> Result<()> {
    for spec in specs {
        if spec.name.contains('.') {
            continue;
        }

        tracing::debug!(model = M::NAME, relation = %spec.name, "eager loading relation");

        let mut relation = M::relation(&spec.name)
            .ok_or_else(|| QuarryError::relation_not_found(M::NAME, &spec.name))?;

        relation.set_nested(nested_specs(specs, &spec.name));
        relation.add_eager_constraints(models.as_slice());
        if let Some(constraint) = &spec.constraint {
            relation.constrain(constraint.as_ref());
        }
        relation.init_relation(models.as_mut_slice());
        relation.load(conn).await?;
        relation.match_parents(models.as_mut_slice());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(specs: &[EagerSpec]) -> Vec<&str> {
        specs.iter().map(|spec| spec.name.as_str()).collect()
    }

    #[test]
    fn test_register_path_inserts_parents_first() {
        let mut specs = Vec::new();
        register_path(&mut specs, "orders.lines", None);
        assert_eq!(names(&specs), vec!["orders", "orders.lines"]);
    }

    #[test]
    fn test_register_path_keeps_existing_constraint() {
        let mut specs = Vec::new();
        register_path(
            &mut specs,
            "orders",
            Some(Arc::new(|query: &mut dyn Constrainable| {
                query.where_null("shipped_at");
            })),
        );
        register_path(&mut specs, "orders.lines", None);

        assert_eq!(names(&specs), vec!["orders", "orders.lines"]);
        assert!(specs[0].has_constraint());
        assert!(!specs[1].has_constraint());
    }

    #[test]
    fn test_nested_specs_strip_parent_prefix() {
        let mut specs = Vec::new();
        register_path(&mut specs, "orders.lines.items", None);
        register_path(&mut specs, "profile", None);

        let nested = nested_specs(&specs, "orders");
        assert_eq!(names(&nested), vec!["lines", "lines.items"]);
    }
}
