//! Acceptance predicates over item templates

use crate::item::{TemplateId, TemplateList};
use serde::{Deserialize, Serialize};

/// A composable test over an item's template
///
/// Matchers are plain values: build them once at configuration time and
/// clone them into as many inventories as needed. Evaluation has no side
/// effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Any template
    Any,
    /// Exactly this template
    ItemIs(TemplateId),
    /// Any template in the list
    InList(TemplateList),
    /// Every child matches. An empty `And` matches everything.
    And(Vec<Matcher>),
    /// At least one child matches. An empty `Or` matches nothing.
    Or(Vec<Matcher>),
    /// Inverse of the child
    Not(Box<Matcher>),
}

impl Matcher {
    /// Match anything
    pub fn any() -> Self {
        Self::Any
    }

    /// Match one template
    pub fn item(template: TemplateId) -> Self {
        Self::ItemIs(template)
    }

    /// Match templates in a list
    pub fn list(templates: impl IntoIterator<Item = TemplateId>) -> Self {
        Self::InList(TemplateList::new(templates))
    }

    /// Match when all children match
    pub fn and(children: impl IntoIterator<Item = Matcher>) -> Self {
        Self::And(children.into_iter().collect())
    }

    /// Match when any child matches
    pub fn or(children: impl IntoIterator<Item = Matcher>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    /// Negate a matcher
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Matcher) -> Self {
        Self::Not(Box::new(child))
    }

    /// Evaluate against a template
    pub fn matches(&self, template: TemplateId) -> bool {
        match self {
            Self::Any => true,
            Self::ItemIs(expected) => *expected == template,
            Self::InList(list) => list.contains(template),
            Self::And(children) => children.iter().all(|m| m.matches(template)),
            Self::Or(children) => children.iter().any(|m| m.matches(template)),
            Self::Not(child) => !child.matches(template),
        }
    }

    /// Evaluate against a possibly missing template. Missing never matches.
    pub fn matches_opt(&self, template: Option<TemplateId>) -> bool {
        template.is_some_and(|t| self.matches(t))
    }

    /// Every template the tree names, in depth-first order
    pub fn templates(&self) -> Vec<TemplateId> {
        let mut out = Vec::new();
        self.collect_templates(&mut out);
        out
    }

    fn collect_templates(&self, out: &mut Vec<TemplateId>) {
        match self {
            Self::Any => {}
            Self::ItemIs(t) => out.push(*t),
            Self::InList(list) => out.extend(list.iter()),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_templates(out);
                }
            }
            Self::Not(child) => child.collect_templates(out),
        }
    }

    /// Nesting depth of the tree (a leaf is 1)
    pub fn depth(&self) -> usize {
        match self {
            Self::Any | Self::ItemIs(_) | Self::InList(_) => 1,
            Self::And(children) | Self::Or(children) => {
                1 + children.iter().map(Matcher::depth).max().unwrap_or(0)
            }
            Self::Not(child) => 1 + child.depth(),
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::Any
    }
}

/// Legacy allow-list / deny-list pair
///
/// If a whitelist is set it alone decides membership and the blacklist is
/// ignored. Otherwise a blacklist excludes what it lists. With neither set
/// everything is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemFilter {
    /// The only templates allowed
    pub whitelist: Option<TemplateList>,
    /// Templates refused
    pub blacklist: Option<TemplateList>,
}

impl ItemFilter {
    /// Filter that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow only these templates
    pub fn only(templates: impl IntoIterator<Item = TemplateId>) -> Self {
        Self {
            whitelist: Some(TemplateList::new(templates)),
            blacklist: None,
        }
    }

    /// Refuse these templates
    pub fn except(templates: impl IntoIterator<Item = TemplateId>) -> Self {
        Self {
            whitelist: None,
            blacklist: Some(TemplateList::new(templates)),
        }
    }

    /// Check a template. A missing template never passes.
    pub fn passes(&self, template: Option<TemplateId>) -> bool {
        let Some(template) = template else {
            return false;
        };
        if let Some(whitelist) = &self.whitelist {
            return whitelist.contains(template);
        }
        if let Some(blacklist) = &self.blacklist {
            return !blacklist.contains(template);
        }
        true
    }

    /// Equivalent matcher tree
    pub fn to_matcher(&self) -> Matcher {
        match (&self.whitelist, &self.blacklist) {
            (Some(whitelist), _) => Matcher::InList(whitelist.clone()),
            (None, Some(blacklist)) => Matcher::not(Matcher::InList(blacklist.clone())),
            (None, None) => Matcher::Any,
        }
    }
}

impl From<ItemFilter> for Matcher {
    fn from(filter: ItemFilter) -> Self {
        filter.to_matcher()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Catalog, ItemTemplate};

    fn fruit() -> (Catalog, TemplateId, TemplateId, TemplateId) {
        let mut catalog = Catalog::new();
        let apple = catalog.register(ItemTemplate::new("Apple"));
        let pear = catalog.register(ItemTemplate::new("Pear"));
        let weed = catalog.register(ItemTemplate::new("Weed"));
        (catalog, apple, pear, weed)
    }

    #[test]
    fn test_leaf_matchers() {
        let (_, apple, pear, _) = fruit();

        assert!(Matcher::any().matches(apple));
        assert!(Matcher::item(apple).matches(apple));
        assert!(!Matcher::item(apple).matches(pear));
        assert!(Matcher::list([apple, pear]).matches(pear));
        assert!(!Matcher::list([apple]).matches(pear));
    }

    #[test]
    fn test_composite_matchers() {
        let (_, apple, pear, weed) = fruit();
        let fruit_only = Matcher::or([Matcher::item(apple), Matcher::item(pear)]);
        let no_pears = Matcher::and([fruit_only.clone(), Matcher::not(Matcher::item(pear))]);

        assert!(fruit_only.matches(apple));
        assert!(!fruit_only.matches(weed));
        assert!(no_pears.matches(apple));
        assert!(!no_pears.matches(pear));
        assert!(Matcher::not(fruit_only).matches(weed));
    }

    #[test]
    fn test_empty_composites() {
        let (_, apple, _, _) = fruit();
        // Vacuous truth for And, nothing for Or
        assert!(Matcher::And(vec![]).matches(apple));
        assert!(!Matcher::Or(vec![]).matches(apple));
    }

    #[test]
    fn test_missing_template_never_matches() {
        assert!(!Matcher::any().matches_opt(None));
        assert!(!Matcher::not(Matcher::Or(vec![])).matches_opt(None));
        assert!(!ItemFilter::new().passes(None));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let (_, apple, pear, weed) = fruit();
        let m = Matcher::and([Matcher::list([apple, pear]), Matcher::not(Matcher::item(weed))]);
        let before = m.clone();
        for _ in 0..3 {
            assert!(m.matches(apple));
            assert!(!m.matches(weed));
        }
        assert_eq!(m, before);
    }

    #[test]
    fn test_templates_and_depth() {
        let (_, apple, pear, weed) = fruit();
        let m = Matcher::and([
            Matcher::item(apple),
            Matcher::not(Matcher::list([pear, weed])),
        ]);
        assert_eq!(m.templates(), vec![apple, pear, weed]);
        assert_eq!(m.depth(), 3);
        assert_eq!(Matcher::any().depth(), 1);
    }

    #[test]
    fn test_legacy_filter() {
        let (_, apple, pear, weed) = fruit();

        let open = ItemFilter::new();
        assert!(open.passes(Some(weed)));

        let whitelist = ItemFilter::only([apple]);
        assert!(whitelist.passes(Some(apple)));
        assert!(!whitelist.passes(Some(pear)));

        let blacklist = ItemFilter::except([weed]);
        assert!(blacklist.passes(Some(apple)));
        assert!(!blacklist.passes(Some(weed)));

        // Whitelist wins over blacklist
        let both = ItemFilter {
            whitelist: Some(TemplateList::new([weed])),
            blacklist: Some(TemplateList::new([weed])),
        };
        assert!(both.passes(Some(weed)));
        assert!(!both.passes(Some(apple)));
    }

    #[test]
    fn test_legacy_filter_agrees_with_matcher() {
        let (_, apple, pear, weed) = fruit();
        let filters = [
            ItemFilter::new(),
            ItemFilter::only([apple, pear]),
            ItemFilter::except([weed]),
        ];
        for filter in filters {
            let matcher = filter.to_matcher();
            for t in [apple, pear, weed] {
                assert_eq!(filter.passes(Some(t)), matcher.matches(t));
            }
        }
    }

    #[test]
    fn test_matcher_from_json() {
        let (_, apple, pear, _) = fruit();
        let json = format!(
            r#"{{ "or": [ {{ "item_is": {} }}, {{ "not": "any" }} ] }}"#,
            apple.to_bits()
        );
        let m: Matcher = serde_json::from_str(&json).unwrap();
        assert!(m.matches(apple));
        assert!(!m.matches(pear));
    }
}
