use classifier::{snapshot, Model};
use proptest::prelude::*;

const POOL: [&str; 6] = ["alpha", "beta", "gamma", "delta", "eps", "zeta"];
const CATEGORIES: [&str; 3] = ["spam", "ham", "eggs"];

const SPAM_POOL: [&str; 4] = ["buy", "cheap", "pills", "offer"];
const HAM_POOL: [&str; 4] = ["meeting", "agenda", "project", "notes"];
// Same length as SPAM_POOL so one index range serves both.
const FRESH_POOL: [&str; 4] = ["zebra", "quartz", "violin", "harbor"];

/// Likelihoods this close to one cannot rise further in `f64`.
const SATURATED: f64 = 1e-12;

#[derive(Debug, Clone)]
struct Op {
    category: usize,
    tokens: Vec<usize>,
    untrain: bool,
}

fn op() -> impl Strategy<Value = Op> {
    (
        0..CATEGORIES.len(),
        prop::collection::vec(0..POOL.len(), 0..8),
        prop::bool::weighted(0.25),
    )
        .prop_map(|(category, tokens, untrain)| Op {
            category,
            tokens,
            untrain,
        })
}

fn words(indices: &[usize]) -> Vec<&'static str> {
    indices.iter().map(|i| POOL[*i]).collect()
}

fn build(ops: &[Op]) -> Model {
    let mut model = Model::new();
    for op in ops {
        let tokens = words(&op.tokens);
        let category = CATEGORIES[op.category];
        if op.untrain {
            model.untrain(&tokens, category).expect("untrain");
        } else {
            model.train(&tokens, category).expect("train");
        }
    }
    model
}

proptest! {
    #[test]
    fn reload_classifies_identically(
        ops in prop::collection::vec(op(), 0..20),
        query in prop::collection::vec(0..POOL.len(), 0..8),
    ) {
        let model = build(&ops);
        let restored = snapshot::load(&snapshot::dump(&model).expect("dump")).expect("load");
        let query = words(&query);

        let before = model.classify(&query);
        let reloaded = restored.classify(&query);
        prop_assert_eq!(before.len(), reloaded.len());
        for ((a, x), (b, y)) in before.iter().zip(reloaded.iter()) {
            prop_assert_eq!(a, b);
            prop_assert!((x - y).abs() < 1e-12);
        }
        prop_assert_eq!(before.max_class(), reloaded.max_class());
    }

    #[test]
    fn purge_is_idempotent(ops in prop::collection::vec(op(), 0..20), threshold in 0u64..6) {
        let model = build(&ops);

        let mut untouched = model.clone();
        prop_assert_eq!(untouched.purge_less_than(0), 0);
        prop_assert_eq!(&untouched, &model);

        let mut once = model.clone();
        once.purge_less_than(threshold);
        let mut twice = once.clone();
        prop_assert_eq!(twice.purge_less_than(threshold), 0);
        prop_assert_eq!(&twice, &once);
    }

    #[test]
    fn untrain_never_goes_below_zero(trained in 0usize..5, untrained in 0usize..10) {
        let mut model = Model::new();
        for _ in 0..trained {
            model.train(&["alpha"], "spam").expect("train");
        }
        for _ in 0..untrained {
            model.untrain(&["alpha"], "spam").expect("untrain");
        }

        let expected = trained.saturating_sub(untrained) as u64;
        prop_assert_eq!(model.store().count("spam", "alpha"), expected);
        if let Some(totals) = model.store().totals("spam") {
            prop_assert_eq!(totals.total_tokens(), expected);
            prop_assert_eq!(totals.documents(), expected);
        }
    }

    #[test]
    fn training_lowers_competing_likelihood(
        seed in prop::collection::vec(0..POOL.len(), 1..6),
        text in prop::collection::vec(0..POOL.len(), 1..6),
    ) {
        let mut model = Model::new();
        model.train(&POOL, "ham").expect("ham");
        model.train(&words(&seed), "spam").expect("spam");
        let text = words(&text);

        let before = model.classify(&text);
        model.train(&text, "spam").expect("train");
        let after = model.classify(&text);

        prop_assert!(after.get("ham").expect("ham") < before.get("ham").expect("ham"));
        let (spam_before, spam_after) = (
            before.get("spam").expect("spam"),
            after.get("spam").expect("spam"),
        );
        prop_assert!(spam_after > spam_before || spam_before > 1.0 - SATURATED);
    }

    #[test]
    fn training_raises_likelihood_even_with_new_vocabulary(
        spam_docs in prop::collection::vec(prop::collection::vec(0..SPAM_POOL.len(), 6..10), 1..4),
        ham_docs in prop::collection::vec(prop::collection::vec(0..HAM_POOL.len(), 6..10), 1..4),
        text in prop::collection::vec((prop::bool::ANY, 0..SPAM_POOL.len()), 1..4),
    ) {
        let mut model = Model::new();
        for doc in &spam_docs {
            let tokens: Vec<&str> = doc.iter().map(|i| SPAM_POOL[*i]).collect();
            model.train(&tokens, "spam").expect("spam");
        }
        for doc in &ham_docs {
            let tokens: Vec<&str> = doc.iter().map(|i| HAM_POOL[*i]).collect();
            model.train(&tokens, "ham").expect("ham");
        }
        let text: Vec<&str> = text
            .iter()
            .map(|(fresh, i)| if *fresh { FRESH_POOL[*i] } else { SPAM_POOL[*i] })
            .collect();
        let vocabulary_before = model.store().vocabulary().len();

        let before = model.classify(&text).get("ham").expect("ham");
        model.train(&text, "ham").expect("train");
        let after = model.classify(&text).get("ham").expect("ham");

        let introduces_tokens = text.iter().any(|token| FRESH_POOL.contains(token));
        prop_assert_eq!(
            model.store().vocabulary().len() > vocabulary_before,
            introduces_tokens
        );
        prop_assert!(after > before || before > 1.0 - SATURATED);
    }
}
