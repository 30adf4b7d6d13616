use crate::config::{ARTICLE_NAMESPACE, FALLBACK_NAMESPACE};
use rustc_hash::FxHashMap;

/// Read-only prefix → namespace label mapping, e.g. `Talk` → `talk`.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTable {
    labels: FxHashMap<String, String>,
}

impl NamespaceTable {
    pub fn new(labels: FxHashMap<String, String>) -> Self {
        Self { labels }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.labels.get(prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Namespace label for a page title.
    ///
    /// A title is prefixed when it contains a colon that is followed by something
    /// other than whitespace (`Talk:Foo`, not `Foo: a story`). Prefixed titles map
    /// through the table, falling back to `wikipedia`; everything else is `article`.
    pub fn classify<'a>(&'a self, page: &str) -> &'a str {
        match namespace_prefix(page) {
            Some(prefix) => self.get(prefix).unwrap_or(FALLBACK_NAMESPACE),
            None => ARTICLE_NAMESPACE,
        }
    }
}

fn namespace_prefix(page: &str) -> Option<&str> {
    let (prefix, rest) = page.split_once(':')?;
    // Nothing but colons after the first one counts as no prefix at all.
    if rest.chars().all(|c| c == ':') {
        return None;
    }
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> NamespaceTable {
        NamespaceTable::from_pairs([("Talk", "talk"), ("User", "user"), ("", "main")])
    }

    #[test]
    fn known_prefix_maps_to_label() {
        assert_eq!(table().classify("Talk:Foo"), "talk");
        assert_eq!(table().classify("User:Alice/sandbox"), "user");
    }

    #[test]
    fn unknown_prefix_is_wikipedia() {
        assert_eq!(table().classify("Unknown_ns:Foo"), "wikipedia");
        assert_eq!(NamespaceTable::default().classify("Talk:Foo"), "wikipedia");
    }

    #[test]
    fn plain_title_is_article() {
        assert_eq!(table().classify("Plain Title"), "article");
    }

    #[test]
    fn colon_followed_by_whitespace_is_article() {
        assert_eq!(table().classify("Star Wars: A New Hope"), "article");
        assert_eq!(table().classify("Talk:\tFoo"), "article");
    }

    #[test]
    fn only_first_colon_splits() {
        assert_eq!(table().classify("Talk:Foo: bar"), "talk");
        assert_eq!(table().classify("Talk::Foo"), "talk");
    }

    #[test]
    fn trailing_colons_are_article() {
        assert_eq!(table().classify("Talk:"), "article");
        assert_eq!(table().classify("Talk::"), "article");
    }

    #[test]
    fn leading_colon_uses_empty_prefix() {
        assert_eq!(table().classify(":Foo"), "main");
    }

    #[test]
    fn table_lookup() {
        let t = table();
        assert_eq!(t.len(), 3);
        assert!(!t.is_empty());
        assert_eq!(t.get("Talk"), Some("talk"));
        assert_eq!(t.get("talk"), None);
    }
}
