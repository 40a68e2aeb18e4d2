use std::cmp::Ordering;
use std::collections::HashSet;

use civic_core::{Category, Program};
use serde::Serialize;

use crate::tokenize::tokenize;

#[derive(Debug, Clone)]
struct IndexedProgram {
    program_id: String,
    name: String,
    category: Category,
    keywords: HashSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub program_id: String,
    pub name: String,
    pub category: Category,
    pub score: f32,
}

/// Keyword-overlap index over program text for the explorer search box.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<IndexedProgram>,
}

impl CatalogIndex {
    pub fn build(catalog: &[Program]) -> Self {
        let entries = catalog
            .iter()
            .map(|program| {
                let text = format!(
                    "{} {} {} {}",
                    program.name, program.description, program.benefits, program.category
                );
                IndexedProgram {
                    program_id: program.id.clone(),
                    name: program.name.clone(),
                    category: program.category,
                    keywords: tokenize(&text).into_iter().collect(),
                }
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best `top_k` programs by the share of query tokens they contain.
    /// Ties keep catalog order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let query_tokens = tokenize(query).into_iter().collect::<HashSet<_>>();

        let mut scored = self
            .entries
            .iter()
            .map(|entry| (keyword_score(&query_tokens, &entry.keywords), entry))
            .filter(|(score, _)| *score > 0.0)
            .collect::<Vec<_>>();

        scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| SearchHit {
                program_id: entry.program_id.clone(),
                name: entry.name.clone(),
                category: entry.category,
                score,
            })
            .collect()
    }
}

fn keyword_score(query_tokens: &HashSet<String>, doc_tokens: &HashSet<String>) -> f32 {
    if query_tokens.is_empty() || doc_tokens.is_empty() {
        return 0.0;
    }

    let overlap = query_tokens
        .iter()
        .filter(|token| doc_tokens.contains(*token))
        .count() as f32;

    overlap / query_tokens.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_bundle;

    #[test]
    fn ranks_by_query_overlap() {
        let bundle = default_bundle().unwrap();
        let index = CatalogIndex::build(&bundle.programs);
        assert_eq!(index.len(), bundle.programs.len());

        let hits = index.search("rooftop solar subsidy", 3);
        assert!(!hits.is_empty());
        assert!(hits.iter().take(2).all(|hit| hit.category == Category::Energy));
        assert_eq!(hits[0].program_id, "energy-surya-ghar");
        assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn unrelated_query_finds_nothing() {
        let bundle = default_bundle().unwrap();
        let index = CatalogIndex::build(&bundle.programs);
        assert!(index.search("zzzz qqqq", 5).is_empty());
        assert!(index.search("", 5).is_empty());
    }
}
