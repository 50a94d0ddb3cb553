//! Incident queries served to the dashboard.
//!
//! Three views over an [`IncidentStore`]: every record, records whose
//! description contains a caller keyword, and the residual "other" set of
//! records matching none of [`OTHER_CATEGORY_KEYWORDS`].

use tracing::debug;

use crate::db::{IncidentRecord, IncidentStore};
use crate::error::Result;

/// Category keywords the dashboard offers as named filters, in menu order.
///
/// The residual "other" view is everything these do not match. The list
/// assumes the upstream category vocabulary stays stable; a new category that
/// none of these substrings cover lands in "other".
pub const OTHER_CATEGORY_KEYWORDS: [&str; 27] = [
    "ASSAULT",
    "ARSON",
    "BATTERY",
    "BIKE",
    "BOMB",
    "BUNCO",
    "BURGLARY",
    "COUNTERFEIT",
    "CREDIT CARD",
    "CRIMINAL HOMICIDE",
    "DISTURBING THE PEACE",
    "FORGERY",
    "EMBEZZLEMENT",
    "EXTORTION",
    "HUMAN TRAFFICKING",
    "INDECENT EXPOSURE",
    "KIDNAPPING",
    "LEWD",
    "PICKPOCKET",
    "ROBBERY",
    "SHOPLIFTING",
    "SEX",
    "STALKING",
    "THEFT",
    "TRESPASSING",
    "VANDALISM",
    "VEHICLE",
];

/// Whether a description falls outside every named category.
pub fn is_other_category(description: &str) -> bool {
    let upper = description.to_uppercase();
    !OTHER_CATEGORY_KEYWORDS
        .iter()
        .any(|keyword| upper.contains(keyword))
}

/// Read-only query facade over the incident store.
#[derive(Debug, Clone, Copy)]
pub struct IncidentQueries<'a> {
    store: &'a IncidentStore,
}

impl<'a> IncidentQueries<'a> {
    pub fn new(store: &'a IncidentStore) -> Self {
        Self { store }
    }

    /// Every incident in file order.
    pub fn all(&self) -> Result<Vec<IncidentRecord>> {
        self.store.query_all()
    }

    /// Incidents whose description contains `keyword`.
    ///
    /// The keyword is upper-cased and matched as a literal substring, so any
    /// text (quotes, `%`, SQL fragments) only ever narrows the result.
    pub fn by_keyword(&self, keyword: &str) -> Result<Vec<IncidentRecord>> {
        let keyword = keyword.to_uppercase();
        debug!(keyword = %keyword, "filtering incidents by keyword");
        self.store
            .query_like(self.store.description_column(), &keyword)
    }

    /// Incidents matching none of [`OTHER_CATEGORY_KEYWORDS`].
    pub fn other(&self) -> Result<Vec<IncidentRecord>> {
        self.store
            .query_not_like(self.store.description_column(), &OTHER_CATEGORY_KEYWORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{StoreOptions, DEFAULT_DESCRIPTION_COLUMN};
    use std::io::Cursor;

    fn store(rows: &[&str]) -> IncidentStore {
        let mut csv = String::from("DR_NO,Crm Cd Desc\n");
        for (idx, desc) in rows.iter().enumerate() {
            csv.push_str(&format!("{idx},\"{desc}\"\n"));
        }
        IncidentStore::from_reader(Cursor::new(csv), StoreOptions::default()).unwrap()
    }

    fn descriptions(records: &[IncidentRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r[DEFAULT_DESCRIPTION_COLUMN].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn keyword_list_is_upper_case_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for keyword in OTHER_CATEGORY_KEYWORDS {
            assert_eq!(keyword, keyword.to_uppercase());
            assert!(seen.insert(keyword), "duplicate keyword {keyword}");
        }
    }

    #[test]
    fn is_other_category_ignores_case() {
        assert!(!is_other_category("grand theft auto"));
        assert!(!is_other_category("BIKE - STOLEN"));
        assert!(is_other_category("CHILD NEGLECT (SEE 300 W.I.C.)"));
        assert!(is_other_category("BRANDISH WEAPON"));
    }

    #[test]
    fn dashboard_example_scenario() {
        let store = store(&["GRAND THEFT AUTO", "ASSAULT WITH DEADLY WEAPON", "VANDALISM"]);
        let queries = IncidentQueries::new(&store);

        assert_eq!(queries.all().unwrap().len(), 3);
        assert_eq!(
            descriptions(&queries.by_keyword("theft").unwrap()),
            vec!["GRAND THEFT AUTO"]
        );
        assert!(queries.other().unwrap().is_empty());
    }

    #[test]
    fn other_returns_only_uncategorised_records() {
        let store = store(&[
            "BRANDISH WEAPON",
            "THEFT PLAIN - PETTY ($950 & UNDER)",
            "VIOLATION OF RESTRAINING ORDER",
            "VEHICLE - STOLEN",
        ]);
        let queries = IncidentQueries::new(&store);
        assert_eq!(
            descriptions(&queries.other().unwrap()),
            vec!["BRANDISH WEAPON", "VIOLATION OF RESTRAINING ORDER"]
        );
    }

    #[test]
    fn injection_shaped_keyword_is_literal() {
        let store = store(&["GRAND THEFT AUTO", "X' OR '1'='1 CONFIRMED"]);
        let queries = IncidentQueries::new(&store);

        let matched = queries.by_keyword("x' or '1'='1").unwrap();
        assert_eq!(descriptions(&matched), vec!["X' OR '1'='1 CONFIRMED"]);

        assert!(queries
            .by_keyword("%' OR 1=1 --")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn keyword_with_nul_byte_matches_nothing() {
        let store = store(&["GRAND THEFT AUTO", "ARSON", "VANDALISM"]);
        let queries = IncidentQueries::new(&store);

        assert!(queries.by_keyword("\0").unwrap().is_empty());
        assert!(queries.by_keyword("m\0zzz").unwrap().is_empty());
        assert_eq!(queries.by_keyword("vandal").unwrap().len(), 1);
    }
}
