use crate::domain::model::Term;
use crate::domain::ports::TermCatalog;
use std::collections::HashMap;

/// Term catalog loaded once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTermCatalog {
    terms: HashMap<String, Term>,
}

impl StaticTermCatalog {
    pub fn new(terms: Vec<Term>) -> Self {
        Self {
            terms: terms.into_iter().map(|t| (t.slug.clone(), t)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl TermCatalog for StaticTermCatalog {
    fn lookup_term(&self, slug: &str) -> Option<Term> {
        self.terms.get(slug).cloned()
    }
}
