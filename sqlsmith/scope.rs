use crate::ast::TableRef;
use crate::catalog::Catalog;
use crate::names::NameAllocator;
use crate::opts::GenerationOpts;

/// Generation-time view of one subtree.
///
/// `refs` is owned by each scope and copied on [`Scope::push`], so tables a
/// child brings into view never become visible to its parent or siblings.
/// Everything else is shared by reference for the whole statement.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    pub level: u32,
    pub refs: Vec<TableRef>,
    pub catalog: &'a Catalog,
    pub names: &'a NameAllocator,
    pub opts: &'a GenerationOpts,
}

impl<'a> Scope<'a> {
    /// A level-0 scope with nothing in view.
    pub fn root(catalog: &'a Catalog, names: &'a NameAllocator, opts: &'a GenerationOpts) -> Self {
        Self {
            level: 0,
            refs: Vec::new(),
            catalog,
            names,
            opts,
        }
    }

    /// A child one level deeper holding a snapshot of this scope's refs.
    pub fn push(&self) -> Scope<'a> {
        Scope {
            level: self.level + 1,
            refs: self.refs.clone(),
            catalog: self.catalog,
            names: self.names,
            opts: self.opts,
        }
    }

    pub fn allocate_name(&self, prefix: &str) -> String {
        self.names.allocate(prefix)
    }

    /// True once the configured hard depth has been reached; generators then
    /// only produce terminal variants.
    pub fn at_depth_limit(&self) -> bool {
        self.opts
            .max_depth
            .is_some_and(|max_depth| self.level >= max_depth)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::{Column, Table};
    use crate::types::SqlType;

    fn table_ref(alias: &str) -> TableRef {
        TableRef {
            table: Arc::new(Table::new("t", vec![Column::new("a", SqlType::INT)])),
            alias: alias.to_string(),
        }
    }

    #[test]
    fn push_copies_refs() {
        let catalog = Catalog::default();
        let names = NameAllocator::new();
        let opts = GenerationOpts::default();
        let mut root = Scope::root(&catalog, &names, &opts);
        root.refs.push(table_ref("tab_1"));

        let mut left = root.push();
        left.refs.push(table_ref("tab_2"));
        let right = root.push();

        assert_eq!(left.level, 1);
        assert_eq!(left.refs.len(), 2);
        assert_eq!(right.refs.len(), 1);
        assert_eq!(root.refs.len(), 1);
        assert!(right.refs.iter().all(|r| r.alias != "tab_2"));
    }

    #[test]
    fn children_share_the_allocator() {
        let catalog = Catalog::default();
        let names = NameAllocator::new();
        let opts = GenerationOpts::default();
        let root = Scope::root(&catalog, &names, &opts);
        let a = root.push().allocate_name("tab");
        let b = root.push().push().allocate_name("tab");
        assert_ne!(a, b);
        assert_eq!(names.allocated(), 2);
    }

    #[test]
    fn depth_limit() {
        let catalog = Catalog::default();
        let names = NameAllocator::new();
        let opts = GenerationOpts {
            max_depth: Some(2),
            ..Default::default()
        };
        let root = Scope::root(&catalog, &names, &opts);
        assert!(!root.at_depth_limit());
        assert!(!root.push().at_depth_limit());
        assert!(root.push().push().at_depth_limit());

        let unbounded = GenerationOpts {
            max_depth: None,
            ..Default::default()
        };
        let mut scope = Scope::root(&catalog, &names, &unbounded);
        for _ in 0..100 {
            scope = scope.push();
        }
        assert!(!scope.at_depth_limit());
    }
}
