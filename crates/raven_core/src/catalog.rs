//! Every rule instantiation available to the composer, grouped by attribute.

use crate::attribute::{Attribute, ATTRIBUTE_COUNT};
use crate::rule::{LogicOp, Rule, RuleKindTag, PROGRESSION_STEPS};
use std::collections::BTreeSet;
use std::sync::OnceLock;

static GLOBAL: OnceLock<RuleCatalog> = OnceLock::new();

/// Read-only table of rules per attribute.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: Vec<Vec<Rule>>,
}

impl RuleCatalog {
    /// Enumerate the full vocabulary: constant, every progression step,
    /// every 3-subset for distribute-three and every fitting logical op.
    pub fn new() -> Self {
        let mut rules = vec![Vec::new(); ATTRIBUTE_COUNT];
        for attribute in Attribute::ALL {
            let slot = &mut rules[attribute.index()];
            slot.push(Rule::constant(attribute));

            slot.extend(
                PROGRESSION_STEPS
                    .iter()
                    .map(|&step| Rule::progression(attribute, step))
                    .filter(Rule::is_applicable),
            );

            let size = attribute.domain_size();
            for a in 0..size {
                for b in a + 1..size {
                    for c in b + 1..size {
                        slot.push(Rule::distribute_three(attribute, [a, b, c]));
                    }
                }
            }

            slot.extend(
                LogicOp::ALL
                    .iter()
                    .map(|&op| Rule::logical(attribute, op))
                    .filter(Rule::is_applicable),
            );
        }
        Self { rules }
    }

    /// Catalog holding exactly the given rules.
    ///
    /// Rules are not checked for applicability, so callers can build
    /// catalogs that are deliberately unusable.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut table = vec![Vec::new(); ATTRIBUTE_COUNT];
        for rule in rules {
            table[rule.attribute.index()].push(rule);
        }
        Self { rules: table }
    }

    /// Process-wide catalog, built on first use.
    pub fn global() -> &'static RuleCatalog {
        GLOBAL.get_or_init(RuleCatalog::new)
    }

    pub fn rules_for(&self, attribute: Attribute) -> &[Rule] {
        &self.rules[attribute.index()]
    }

    pub fn rules_of(
        &self,
        attribute: Attribute,
        tag: RuleKindTag,
    ) -> impl Iterator<Item = &Rule> + '_ {
        self.rules_for(attribute)
            .iter()
            .filter(move |rule| rule.tag() == tag)
    }

    /// Tags with at least one rule for `attribute`, in declaration order.
    pub fn tags_for(&self, attribute: Attribute) -> Vec<RuleKindTag> {
        RuleKindTag::ALL
            .into_iter()
            .filter(|&tag| self.rules_of(attribute, tag).next().is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values for the missing cell predicted by any rule consistent with the
    /// context.
    ///
    /// A rule is consistent when it validates every `complete` line. It then
    /// predicts each value `v` for which every `partial` line `[a, b]`
    /// validates as `[a, b, v]`.
    pub fn predictions(
        &self,
        attribute: Attribute,
        complete: &[[u8; 3]],
        partial: &[[u8; 2]],
    ) -> BTreeSet<u8> {
        let mut predicted = BTreeSet::new();
        for rule in self.rules_for(attribute) {
            if !complete.iter().all(|&line| rule.validate(line)) {
                continue;
            }
            predicted.extend(attribute.values().filter(|&v| {
                partial
                    .iter()
                    .all(|&[a, b]| rule.validate([a, b, v]))
            }));
        }
        predicted
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleKind;

    #[test]
    fn test_catalog_contents() {
        let catalog = RuleCatalog::new();

        // constant + C(6,3) subsets
        assert_eq!(catalog.rules_for(Attribute::Shape).len(), 1 + 20);
        // constant + 4 steps + C(9,3) + add/subtract
        assert_eq!(catalog.rules_for(Attribute::Count).len(), 1 + 4 + 84 + 2);
        // constant + C(15,3) + and/or/xor
        assert_eq!(catalog.rules_for(Attribute::Position).len(), 1 + 455 + 3);
        assert!(catalog
            .rules_for(Attribute::Shape)
            .iter()
            .all(Rule::is_applicable));
    }

    #[test]
    fn test_tags_for() {
        let catalog = RuleCatalog::global();
        assert_eq!(
            catalog.tags_for(Attribute::Color),
            vec![RuleKindTag::Constant, RuleKindTag::DistributeThree]
        );
        assert_eq!(catalog.tags_for(Attribute::Rotation), RuleKindTag::ALL.to_vec());
    }

    #[test]
    fn test_round_trip_law_over_catalog() {
        let catalog = RuleCatalog::global();
        for attribute in Attribute::ALL {
            for rule in catalog.rules_for(attribute) {
                for a in attribute.values() {
                    for b in attribute.values() {
                        if let Ok(c) = rule.apply(&[a, b]) {
                            assert!(rule.validate([a, b, c]), "{} failed on {} {}", rule, a, b);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_predictions_unique_for_progression() {
        let catalog = RuleCatalog::global();
        let predicted = catalog.predictions(Attribute::Count, &[[0, 1, 2], [3, 4, 5]], &[[1, 2]]);
        assert_eq!(predicted.into_iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_predictions_detect_ambiguity() {
        // (tl, tr, tl+tr) twice fits distribute-three as well as or and xor,
        // which disagree on the last cell.
        let catalog = RuleCatalog::global();
        let predicted =
            catalog.predictions(Attribute::Position, &[[0, 1, 2], [0, 1, 2]], &[[0, 2]]);
        assert_eq!(predicted.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_from_rules_keeps_given_rules() {
        let catalog = RuleCatalog::from_rules([Rule::progression(Attribute::Shape, 1)]);
        assert_eq!(catalog.len(), 1);
        assert!(matches!(
            catalog.rules_for(Attribute::Shape)[0].kind,
            RuleKind::Progression { step: 1 }
        ));
        assert!(catalog.rules_for(Attribute::Count).is_empty());
    }
}
