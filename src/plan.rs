// src/plan.rs

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::catalog::Catalog;

/// Where a country's disease table comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchPlan {
    /// The country's own detail page. More than one table on the page is
    /// ambiguous unless `allow_multiple` is set.
    Single {
        #[serde(default)]
        table_index: usize,
        #[serde(default)]
        allow_multiple: bool,
    },
    /// Cell-wise sum of tables from several catalog pages.
    Union { parts: Vec<PagePart> },
}

impl Default for FetchPlan {
    fn default() -> Self {
        FetchPlan::Single {
            table_index: 0,
            allow_multiple: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PagePart {
    /// Catalog entry name of the page.
    pub entry: String,
    #[serde(default)]
    pub table_index: usize,
}

impl PagePart {
    pub fn new(entry: &str, table_index: usize) -> Self {
        Self {
            entry: entry.to_string(),
            table_index,
        }
    }
}

/// A country assembled from other catalog entries, processed after the catalog pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Composite {
    pub country: String,
    pub parts: Vec<PagePart>,
}

/// A country to process, under the name used for its population table and output rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryPlan {
    pub country: String,
    pub plan: FetchPlan,
}

/// Declarative per-country handling, so the pipeline never branches on names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlanTable {
    /// Catalog entries never processed on their own.
    pub skip: Vec<String>,
    /// Catalog entries containing any of these are never processed on their own.
    pub skip_containing: Vec<String>,
    pub overrides: BTreeMap<String, FetchPlan>,
    pub composites: Vec<Composite>,
}

impl Default for PlanTable {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "Ireland".to_string(),
            FetchPlan::Single {
                table_index: 0,
                allow_multiple: true,
            },
        );
        Self {
            skip: vec!["Jersey".into(), "References".into()],
            skip_containing: vec!["United Kingdom".into()],
            overrides,
            composites: vec![Composite {
                country: "United Kingdom".into(),
                parts: vec![
                    PagePart::new("United Kingdom (England, Wales and Northern Ireland)", 0),
                    PagePart::new("United Kingdom (Scotland)", 1),
                    PagePart::new("Jersey", 0),
                ],
            }],
        }
    }
}

impl PlanTable {
    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip.iter().any(|s| s == name)
            || self.skip_containing.iter().any(|s| name.contains(s.as_str()))
    }

    /// Catalog entries in page order, then composites.
    pub fn plans(&self, catalog: &Catalog) -> Vec<CountryPlan> {
        let mut out: Vec<CountryPlan> = catalog
            .iter()
            .filter(|e| !self.is_skipped(&e.name))
            .map(|e| CountryPlan {
                country: e.name.clone(),
                plan: self.overrides.get(&e.name).cloned().unwrap_or_default(),
            })
            .collect();
        out.extend(self.composites.iter().map(|c| CountryPlan {
            country: c.country.clone(),
            plan: FetchPlan::Union {
                parts: c.parts.clone(),
            },
        }));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut c = Catalog::default();
        for name in [
            "Austria",
            "Ireland",
            "Jersey",
            "United Kingdom (Scotland)",
            "United Kingdom (England, Wales and Northern Ireland)",
            "References",
        ] {
            c.insert(name, &format!("/{}", name));
        }
        c
    }

    #[test]
    fn test_default_plans() {
        let plans = PlanTable::default().plans(&catalog());
        let names: Vec<_> = plans.iter().map(|p| p.country.as_str()).collect();
        assert_eq!(names, ["Austria", "Ireland", "United Kingdom"]);
        assert_eq!(plans[0].plan, FetchPlan::default());
        assert_eq!(
            plans[1].plan,
            FetchPlan::Single {
                table_index: 0,
                allow_multiple: true
            }
        );
        match &plans[2].plan {
            FetchPlan::Union { parts } => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[1], PagePart::new("United Kingdom (Scotland)", 1));
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_yaml_plans() {
        let yaml = r#"
skip: [References]
overrides:
  Austria: { kind: single, table_index: 2 }
composites:
  - country: Benelux
    parts:
      - entry: Belgium
      - entry: Netherlands
        table_index: 1
"#;
        let table: PlanTable = serde_yaml::from_str(yaml).unwrap();
        assert!(table.skip_containing.is_empty());
        assert_eq!(
            table.overrides["Austria"],
            FetchPlan::Single {
                table_index: 2,
                allow_multiple: false
            }
        );
        assert_eq!(table.composites[0].parts[1].table_index, 1);
    }
}
