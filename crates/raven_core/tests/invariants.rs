//! End-to-end properties of generated problems.

use proptest::prelude::*;
use raven_core::{
    generate_batch, generate_problem, Attribute, DistractorGenerator, ElementBuilder,
    GeneratorConfig, Matrix, Rule, RuleKind, RuleKindTag, RuleSlot, StdRandom,
};

fn example_config() -> GeneratorConfig {
    GeneratorConfig {
        active_attributes: [Attribute::Shape, Attribute::Count].into_iter().collect(),
        rule_weights: [(RuleKindTag::Constant, 1.0), (RuleKindTag::Progression, 1.0)]
            .into_iter()
            .collect(),
        strict_columns: false,
        distractor_count: 5,
        random_seed: 42,
        ..Default::default()
    }
}

/// Attributes on which two single-layer elements differ.
fn differing(a: &raven_core::Element, b: &raven_core::Element) -> Vec<Attribute> {
    Attribute::ALL
        .into_iter()
        .filter(|&attr| a.value(0, attr) != b.value(0, attr))
        .collect()
}

#[test]
fn test_example_scenario() {
    let config = example_config();
    let problem = generate_problem(&config).unwrap();
    problem.check_invariants().unwrap();
    assert_eq!(problem.options().len(), 6);
    assert_eq!(problem.seed(), 42);

    for (slot, rule) in problem.rules() {
        match slot.attribute {
            Attribute::Shape => assert_eq!(rule.kind, RuleKind::Constant),
            Attribute::Count => assert!(matches!(
                rule.kind,
                RuleKind::Constant | RuleKind::Progression { .. }
            )),
            other => panic!("unexpected active attribute {}", other),
        }
    }

    let truth = problem.ground_truth().unwrap();
    for distractor in problem.distractors() {
        let diff = differing(truth, distractor);
        assert_eq!(diff.len(), 1, "{} vs {}", truth, distractor);
        assert!(diff[0] == Attribute::Shape || diff[0] == Attribute::Count);
    }
}

#[test]
fn test_example_scenario_is_pinned() {
    let problem = generate_problem(&example_config()).unwrap();
    let active = [Attribute::Shape, Attribute::Count];

    let kinds: Vec<(Attribute, RuleKind)> = problem
        .rules()
        .iter()
        .map(|(slot, rule)| (slot.attribute, rule.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (Attribute::Shape, RuleKind::Constant),
            (Attribute::Count, RuleKind::Constant)
        ]
    );

    let row = |r: usize| -> Vec<String> {
        (0..3)
            .filter_map(|c| problem.context_panel(r, c))
            .map(|panel| panel.element.describe(&active))
            .collect()
    };
    assert_eq!(row(0), vec!["(diamond, 1)"; 3]);
    assert_eq!(row(1), vec!["(square, 5)"; 3]);
    assert_eq!(row(2), vec!["(circle, 5)"; 2]);
    assert_eq!(problem.ground_truth().unwrap().describe(&active), "(circle, 5)");

    let mut distractors: Vec<String> = problem
        .distractors()
        .map(|e| e.describe(&active))
        .collect();
    distractors.sort();
    assert_eq!(
        distractors,
        vec![
            "(circle, 4)",
            "(circle, 7)",
            "(circle, 9)",
            "(diamond, 5)",
            "(square, 5)"
        ]
    );
}

#[test]
fn test_circle_counting_matrix() {
    let elements = (0..9)
        .map(|i| {
            Attribute::ALL
                .into_iter()
                .fold(ElementBuilder::new(), |b, a| b.set(0, a, 0))
                .set(0, Attribute::Count, (i % 3) as u8)
                .build()
                .unwrap()
        })
        .collect();
    let matrix = Matrix::new(
        elements,
        vec![
            (RuleSlot::new(0, Attribute::Shape), Rule::constant(Attribute::Shape)),
            (RuleSlot::new(0, Attribute::Count), Rule::progression(Attribute::Count, 1)),
        ],
        false,
    )
    .unwrap();
    let active = [Attribute::Shape, Attribute::Count];
    assert_eq!(matrix.ground_truth().describe(&active), "(circle, 3)");

    let config = example_config();
    let mut rng = StdRandom::from_seed(42);
    let problem = DistractorGenerator::new(&config)
        .generate(&matrix, &mut rng)
        .unwrap();
    problem.check_invariants().unwrap();
    assert_eq!(problem.ground_truth().unwrap().describe(&active), "(circle, 3)");
    for distractor in problem.distractors() {
        let diff = differing(problem.ground_truth().unwrap(), distractor);
        assert_eq!(diff.len(), 1);
    }
}

#[test]
fn test_same_seed_same_problem() {
    let config = GeneratorConfig {
        random_seed: 1234,
        active_attributes: Attribute::ALL.into_iter().collect(),
        distractor_count: 7,
        ..Default::default()
    };
    let a = generate_problem(&config).unwrap();
    let b = generate_problem(&config).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_two_layers_all_attributes() {
    let config = GeneratorConfig {
        layers: 2,
        active_attributes: Attribute::ALL.into_iter().collect(),
        random_seed: 8,
        ..Default::default()
    };
    let problem = generate_problem(&config).unwrap();
    problem.check_invariants().unwrap();
    assert_eq!(problem.rules().len(), 14);
    assert!(problem.options().iter().all(|e| e.layer_count() == 2));
}

#[test]
fn test_batch_is_order_stable() {
    let config = example_config();
    let first: Vec<_> = generate_batch(&config, 6)
        .into_iter()
        .map(|item| item.result.unwrap())
        .collect();
    let second: Vec<_> = generate_batch(&config, 6)
        .into_iter()
        .map(|item| item.result.unwrap())
        .collect();
    assert_eq!(first, second);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_generated_problems_hold_invariants(seed in any::<u64>(), strict in any::<bool>()) {
        let config = GeneratorConfig {
            random_seed: seed,
            strict_columns: strict,
            ..Default::default()
        };
        let problem = generate_problem(&config).unwrap();
        prop_assert!(problem.check_invariants().is_ok());
        prop_assert_eq!(problem.options().len(), config.distractor_count + 1);
        for distractor in problem.distractors() {
            prop_assert_eq!(problem.violated_slots(distractor).len(), 1);
        }
    }

    #[test]
    fn prop_generation_is_deterministic(seed in any::<u64>()) {
        let config = example_config().with_seed(seed);
        prop_assert_eq!(generate_problem(&config).unwrap(), generate_problem(&config).unwrap());
    }
}
