//! Reference-rewriting namespacer.
//!
//! Sibling subtrees of the route tree each produce a fragment keyed by their
//! local names. Before a parent merges them, every fragment is moved under
//! the child's identifier: paths gain a `/<prefix>` segment, definitions gain
//! a `<prefix>.` qualifier, and references to those definitions follow.

use std::collections::{BTreeMap, HashSet};

use crate::domain::{Components, Fragment, SchemaRef};

/// Move `fragment` under `prefix`.
///
/// Path keys already start with `/`, so `/op` becomes `/<prefix>/op`. Only
/// references to definitions carried by this fragment are rewritten; anything
/// else is left exactly as it was. Applying this twice prefixes twice.
pub fn namespace(prefix: &str, fragment: Fragment) -> Fragment {
    let paths = fragment.paths.map(|paths| {
        paths
            .into_iter()
            .map(|(path, item)| (format!("/{prefix}{path}"), item))
            .collect::<BTreeMap<_, _>>()
    });

    let mut renamed = HashSet::new();
    let components = fragment.components.map(|components| {
        let schemas = components
            .schemas
            .into_iter()
            .map(|(name, schema)| {
                let qualified = qualify(prefix, &name);
                renamed.insert(name);
                (qualified, schema)
            })
            .collect();
        Components { schemas }
    });

    let mut namespaced = Fragment { paths, components };
    if !renamed.is_empty() {
        rewrite_refs(prefix, &renamed, &mut namespaced);
    }
    namespaced
}

fn qualify(prefix: &str, name: &str) -> String {
    format!("{prefix}.{name}")
}

fn rewrite_refs(prefix: &str, renamed: &HashSet<String>, fragment: &mut Fragment) {
    let mut repoint = |reference: &mut SchemaRef| {
        if renamed.contains(reference.definition_name()) {
            *reference = SchemaRef::to_definition(&qualify(prefix, reference.definition_name()));
        }
    };
    for schema in fragment.schemas_mut() {
        schema.for_each_ref_mut(&mut repoint);
    }
}
