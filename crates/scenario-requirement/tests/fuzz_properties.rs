use proptest::prelude::*;
use scenario_requirement::{cardinality, fuzz, ConcreteRequirement, Spec, StaticRequirement};
use serde_json::json;
use std::collections::BTreeSet;

fn literal_requirement(values: Vec<i64>) -> StaticRequirement {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (format!("dim{i}"), Spec::literal(v)))
        .collect()
}

fn ranged_requirement(sizes: &[usize]) -> StaticRequirement {
    sizes
        .iter()
        .enumerate()
        .map(|(i, n)| (format!("dim{i}"), Spec::range(0, *n as i64)))
        .collect()
}

proptest! {
    #[test]
    fn prop_literal_only_is_identity(values in prop::collection::vec(any::<i64>(), 0..6)) {
        let requirement = literal_requirement(values.clone());
        let variants = fuzz(&requirement).unwrap();

        prop_assert_eq!(variants.len(), 1);
        let expected: ConcreteRequirement = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("dim{i}"), json!(v)))
            .collect();
        prop_assert_eq!(&variants[0], &expected);
    }

    #[test]
    fn prop_product_size_and_distinctness(sizes in prop::collection::vec(1usize..4, 1..5)) {
        let requirement = ranged_requirement(&sizes);
        let variants = fuzz(&requirement).unwrap();

        let expected: usize = sizes.iter().product();
        prop_assert_eq!(variants.len(), expected);
        prop_assert_eq!(cardinality(&requirement).unwrap(), expected);

        let distinct: BTreeSet<String> = variants.iter().map(ToString::to_string).collect();
        prop_assert_eq!(distinct.len(), expected);
    }

    #[test]
    fn prop_fuzz_is_deterministic(sizes in prop::collection::vec(0usize..4, 0..5)) {
        let requirement = ranged_requirement(&sizes);
        prop_assert_eq!(fuzz(&requirement).unwrap(), fuzz(&requirement).unwrap());
    }

    #[test]
    fn prop_empty_dimension_vetoes(
        sizes in prop::collection::vec(1usize..4, 1..5),
        position in 0usize..5,
    ) {
        let mut sizes = sizes;
        let position = position % sizes.len();
        sizes[position] = 0;

        let requirement = ranged_requirement(&sizes);
        prop_assert!(fuzz(&requirement).unwrap().is_empty());
    }
}
