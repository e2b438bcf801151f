//! Rules mapping search categories onto a tracker's category tree
//!
//! A destination category is described by two lists of group rules:
//! - include-all-except: take every category of the matching groups unless
//!   its name contains one of the keywords
//! - include-only: take only categories whose name contains a keyword
//!
//! Accepting a category accepts its whole subtree. A rejected category is
//! not emitted, but its children are still checked against the same rule.

use crate::taxonomy::tree::{CategoryTree, NodeId};
use crate::trackers::SearchCategory;
use std::collections::BTreeMap;

/// Keywords applied to every group whose name contains `group`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    pub group: String,
    pub keywords: Vec<String>,
}

impl GroupRule {
    pub fn new(group: &str, keywords: &[&str]) -> Self {
        Self {
            group: group.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Both rule lists of one destination category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRules {
    pub include_all_except: Vec<GroupRule>,
    pub include_only: Vec<GroupRule>,
}

/// Filter carried down the tree during a scan
#[derive(Debug, Clone, Copy)]
enum RuleState<'a> {
    AcceptAll,
    Exclude(&'a [String]),
    Require(&'a [String]),
}

impl RuleState<'_> {
    fn accepts(&self, name: &str) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::Exclude(keywords) => !keywords.iter().any(|k| name.contains(k.as_str())),
            Self::Require(keywords) => keywords.iter().any(|k| name.contains(k.as_str())),
        }
    }
}

impl CategoryRules {
    /// Collects the codes this rule set selects, in tree order
    ///
    /// A code reached through more than one rule appears more than once.
    pub fn resolve(&self, tree: &CategoryTree) -> Vec<String> {
        let mut codes = Vec::new();
        for rule in &self.include_all_except {
            apply(tree, rule, RuleState::Exclude(&rule.keywords), &mut codes);
        }
        for rule in &self.include_only {
            apply(tree, rule, RuleState::Require(&rule.keywords), &mut codes);
        }
        codes
    }
}

fn apply(tree: &CategoryTree, rule: &GroupRule, state: RuleState<'_>, codes: &mut Vec<String>) {
    let mut matched = false;
    for &group in tree.groups() {
        if tree.node(group).name.contains(rule.group.as_str()) {
            matched = true;
            scan(tree, group, state, codes);
        }
    }
    if !matched {
        tracing::warn!("No category group matches '{}'", rule.group);
    }
}

fn scan(tree: &CategoryTree, parent: NodeId, state: RuleState<'_>, codes: &mut Vec<String>) {
    for &child in &tree.node(parent).children {
        let node = tree.node(child);
        let next = if state.accepts(&node.name) {
            if let Some(code) = &node.code {
                codes.push(code.clone());
            }
            RuleState::AcceptAll
        } else {
            state
        };
        scan(tree, child, next, codes);
    }
}

/// Rules for every destination category a tracker resolves dynamically
#[derive(Debug, Clone, Default)]
pub struct TaxonomyRules {
    pub destinations: Vec<(SearchCategory, CategoryRules)>,
}

impl TaxonomyRules {
    /// Resolves every destination against the tree
    ///
    /// Destinations that select nothing are left out so the tracker's
    /// static code stays in effect.
    pub fn resolve(&self, tree: &CategoryTree) -> BTreeMap<SearchCategory, String> {
        let mut resolved = BTreeMap::new();
        for (category, rules) in &self.destinations {
            let codes = rules.resolve(tree);
            if codes.is_empty() {
                tracing::warn!("No codes resolved for category {}", category);
                continue;
            }
            tracing::debug!("Category {} resolved to {} codes", category, codes.len());
            resolved.insert(*category, codes.join(","));
        }
        resolved
    }

    /// The rutracker forum layout
    pub fn rutracker() -> Self {
        Self {
            destinations: vec![
                (
                    SearchCategory::Movies,
                    CategoryRules {
                        include_all_except: vec![GroupRule::new(
                            "Кино",
                            &[
                                " дорожки",
                                "Документальные",
                                "Анимация",
                                "Театр",
                                "3D",
                                "Мультфильмы",
                                "Мультсериалы",
                                "Аниме",
                            ],
                        )],
                        include_only: vec![
                            GroupRule::new("Apple", &[" Фильмы"]),
                            GroupRule::new("Разное", &[" Видео"]),
                        ],
                    },
                ),
                (
                    SearchCategory::Tv,
                    CategoryRules {
                        include_all_except: vec![GroupRule::new("Сериалы", &[])],
                        include_only: vec![GroupRule::new("Apple", &[" Сериалы"])],
                    },
                ),
                (
                    SearchCategory::Games,
                    CategoryRules {
                        include_all_except: vec![GroupRule::new("Игры", &["Видео", " видео"])],
                        include_only: vec![GroupRule::new("Apple", &[" Игры"])],
                    },
                ),
                (
                    SearchCategory::Software,
                    CategoryRules {
                        include_all_except: vec![
                            GroupRule::new("Программы", &[]),
                            GroupRule::new("Мобильные", &["Видео "]),
                        ],
                        include_only: vec![GroupRule::new("Apple", &[" Macintosh", "Программы "])],
                    },
                ),
            ],
        }
    }
}
