// src/catalog.rs

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, trace};

static SIDEBAR_ITEM_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div#sidebar li").expect("CSS selector for sidebar items should be valid")
});
static LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("CSS selector for links should be valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub path: String,
}

/// Country name to detail-page path, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Last write wins; a repeated name keeps its first position.
    pub fn insert(&mut self, name: &str, path: &str) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(e) => e.path = path.to_string(),
            None => self.entries.push(CatalogEntry {
                name: name.to_string(),
                path: path.to_string(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.path.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read every `li` of the `div#sidebar` navigation: its text is the country
/// name, its link the detail-page path. Items without a link are ignored.
pub fn build_catalog(doc: &Html) -> Catalog {
    let mut catalog = Catalog::default();
    for item in doc.select(&SIDEBAR_ITEM_SEL) {
        let Some(href) = item
            .select(&LINK_SEL)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let name = item.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            continue;
        }
        trace!(name = %name, path = %href, "catalog entry");
        catalog.insert(&name, href);
    }
    debug!(entries = catalog.len(), "built catalog");
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidebar_links() {
        let html = Html::parse_document(
            r#"<html><body>
              <ul><li><a href="/elsewhere">Not sidebar</a></li></ul>
              <div id="sidebar"><ul>
                <li><a href="/countries/austria">Austria</a></li>
                <li><a href="/countries/belgium">
                  Belgium</a></li>
                <li>No link</li>
                <li><a href="/countries/austria-new">Austria</a></li>
              </ul></div>
            </body></html>"#,
        );
        let catalog = build_catalog(&html);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("Austria"), Some("/countries/austria-new"));
        assert_eq!(catalog.get("Belgium"), Some("/countries/belgium"));
        assert_eq!(catalog.get("Not sidebar"), None);
        let names: Vec<_> = catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Austria", "Belgium"]);
    }

    #[test]
    fn test_no_sidebar() {
        let html = Html::parse_document("<p>nothing here</p>");
        assert!(build_catalog(&html).is_empty());
    }
}
