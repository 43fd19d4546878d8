//! Scripted hypothesis language
//!
//! ```text
//! DIST mostly_red { red 9 blue 1 }
//! DIST mostly_blue { red 1 blue 9 }
//! LIST urns [mostly_red mostly_blue]
//! PERMUTE urns
//! BUCKET left = urns[0]
//! BUCKET right = urns[1]
//! SCHEDULE { left right }
//! ```
//!
//! Source text is lexed and parsed into statements, then replayed in order
//! against a [`ScriptBuilder`]. The builder does the enumeration.

pub mod builder;
pub mod lexer;
pub mod parser;

pub use builder::{ListId, ResolvedScript, ScriptBuilder, Selection};
pub use parser::{ParsedScript, Parser, Statement};

use crate::errors::{DslError, DslResult};
use beliefflow_types::{Distribution, SlotId};
use std::collections::HashMap;

/// Parse script text and replay it into a builder (first pass)
pub fn compile(source: &str) -> DslResult<ScriptBuilder> {
    let parsed = Parser::parse(source)?;
    compile_parsed(&parsed)
}

/// Replay parsed statements into a builder
pub fn compile_parsed(parsed: &ParsedScript) -> DslResult<ScriptBuilder> {
    let mut builder = ScriptBuilder::new();
    let mut dists: HashMap<&str, Distribution> = HashMap::new();

    for statement in &parsed.statements {
        match statement {
            Statement::Dist { name, weights, .. } => {
                if dists.contains_key(name.as_str()) {
                    return Err(DslError::DuplicateName(name.clone()));
                }
                let dist = Distribution::from_pairs(
                    weights.iter().map(|(color, weight)| (color.as_str(), *weight)),
                );
                dist.validate()
                    .map_err(|source| DslError::InvalidDistribution {
                        name: name.clone(),
                        source,
                    })?;
                dists.insert(name, dist);
            }
            Statement::List { name, items, .. } => {
                let resolved = items
                    .iter()
                    .map(|item| {
                        dists
                            .get(item.as_str())
                            .map(|d| (item.clone(), d.clone()))
                            .ok_or_else(|| DslError::UnknownDistribution(item.clone()))
                    })
                    .collect::<DslResult<Vec<_>>>()?;
                builder.list(name.clone(), resolved)?;
            }
            Statement::Permute { list, .. } => {
                let id = builder
                    .list_id(list)
                    .ok_or_else(|| DslError::UnknownList(list.clone()))?;
                builder.permute(id)?;
            }
            Statement::Bucket {
                slot, list, index, ..
            } => {
                let id = builder
                    .list_id(list)
                    .ok_or_else(|| DslError::UnknownList(list.clone()))?;
                let selection = builder.select(id, *index)?;
                builder.bucket(slot.as_str(), selection)?;
            }
            Statement::Schedule { buckets, .. } => {
                builder.schedule(buckets.iter().map(|b| SlotId::new(b.as_str())).collect())?;
            }
        }
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorLimits;

    #[test]
    fn test_compile_and_resolve() {
        let source = r#"
        DIST a { red 1 }
        DIST b { blue 1 }
        DIST c { red 1 blue 1 }
        LIST urns [a b c]
        PERMUTE urns
        BUCKET left = urns[0]
        BUCKET right = urns[1]
        SCHEDULE { left right }
        "#;

        let builder = compile(source).unwrap();
        let resolved = builder.resolve(&GeneratorLimits::default()).unwrap();
        assert_eq!(resolved.hypotheses.len(), 6);
        assert_eq!(resolved.hypotheses[0].label, "left=a, right=b");
        assert_eq!(resolved.schedule, vec![SlotId::new("left"), SlotId::new("right")]);
    }

    #[test]
    fn test_unknown_distribution() {
        let result = compile("LIST urns [missing]");
        assert!(matches!(result, Err(DslError::UnknownDistribution(d)) if d == "missing"));
    }

    #[test]
    fn test_permute_before_definition() {
        let result = compile("PERMUTE urns\nDIST a { red 1 }\nLIST urns [a]");
        assert!(matches!(result, Err(DslError::UnknownList(_))));
    }

    #[test]
    fn test_invalid_distribution() {
        let result = compile("DIST nothing { red 0 }");
        assert!(matches!(result, Err(DslError::InvalidDistribution { .. })));
    }

    #[test]
    fn test_duplicate_bucket() {
        let source = r#"
        DIST a { red 1 }
        LIST urns [a]
        BUCKET left = urns[0]
        BUCKET left = urns[0]
        "#;
        assert!(matches!(compile(source), Err(DslError::DuplicateName(_))));
    }
}
