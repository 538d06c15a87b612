//! Tests for identifier chains

use std::collections::HashSet;

use rstest::rstest;

use featmodel::domain::{DomainError, FeatureModel, Identifiable, IdentifierFactory, IdentifierStrategy, Mutable};
use featmodel::util::testing;

#[test]
fn given_counter_chain_when_deriving_identifiers_then_counter_is_shared() {
    testing::init_test_setup();
    // Arrange
    let factory = IdentifierFactory::counter();

    // Act
    let first = factory.new_identifier().unwrap();
    let second = first.new_identifier().unwrap();
    let third = second.new_identifier().unwrap();
    let fourth = factory.new_identifier().unwrap();

    // Assert
    assert_eq!(first.to_string(), "1");
    assert_eq!(second.to_string(), "2");
    assert_eq!(third.to_string(), "3");
    assert_eq!(fourth.to_string(), "4");
    assert!(first.factory().same_chain(third.factory()));
}

#[test]
fn given_two_counter_chains_when_allocating_then_chains_are_independent() {
    testing::init_test_setup();
    let a = IdentifierFactory::counter();
    let b = IdentifierFactory::counter();

    let from_a = a.new_identifier().unwrap();
    let from_b = b.new_identifier().unwrap();

    assert_eq!(from_a, from_b);
    assert!(!a.same_chain(&b));
    assert_eq!(a.new_identifier().unwrap().to_string(), "2");
}

#[test]
fn given_many_allocations_when_collecting_then_all_identifiers_are_distinct() {
    testing::init_test_setup();
    let counter = IdentifierFactory::counter_from(10);
    let uuid = IdentifierFactory::uuid();

    let counted: Vec<_> = (0..200).map(|_| counter.new_identifier().unwrap()).collect();
    let random: HashSet<_> = (0..200).map(|_| uuid.new_identifier().unwrap()).collect();

    assert_eq!(counted.iter().collect::<HashSet<_>>().len(), 200);
    assert!(counted.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(counted[0].to_string(), "10");
    assert_eq!(random.len(), 200);
}

#[rstest]
#[case::counter(IdentifierFactory::counter_from(41))]
#[case::uuid(IdentifierFactory::uuid())]
fn given_identifier_when_parsing_display_form_then_equal_identifier_on_same_chain(
    #[case] factory: IdentifierFactory,
) {
    testing::init_test_setup();
    let identifier = factory.new_identifier().unwrap();

    let parsed = factory.parse(&identifier.to_string()).unwrap();

    assert_eq!(parsed, identifier);
    assert_eq!(parsed.strategy(), identifier.strategy());
    assert!(parsed.factory().same_chain(&factory));
}

#[test]
fn given_counter_chain_when_parsing_then_counter_does_not_advance() {
    testing::init_test_setup();
    let factory = IdentifierFactory::counter();
    factory.new_identifier().unwrap();

    factory.parse("99").unwrap();

    assert_eq!(factory.new_identifier().unwrap().to_string(), "2");
}

#[rstest]
#[case::counter_text(IdentifierFactory::counter(), "abc")]
#[case::counter_negative(IdentifierFactory::counter(), "-1")]
#[case::counter_empty(IdentifierFactory::counter(), "")]
#[case::uuid_number(IdentifierFactory::uuid(), "123")]
#[case::uuid_truncated(IdentifierFactory::uuid(), "67e55044-10b1-426f-9247")]
fn given_malformed_text_when_parsing_then_format_error(#[case] factory: IdentifierFactory, #[case] input: &str) {
    testing::init_test_setup();

    let result = factory.parse(input);

    match result {
        Err(DomainError::Format { input: rejected, .. }) => assert_eq!(rejected, input),
        other => panic!("expected format error, got {:?}", other),
    }
}

#[test]
fn given_uuid_chain_when_allocating_then_strategy_is_uuid() {
    testing::init_test_setup();
    let identifier = IdentifierFactory::uuid().new_identifier().unwrap();

    assert_eq!(identifier.strategy(), IdentifierStrategy::Uuid);
    assert_eq!(identifier.to_string().len(), 36);
    assert_ne!(identifier.new_identifier().unwrap(), identifier);
}

#[test]
fn given_fresh_model_when_creating_entities_then_identifiers_continue_the_root_chain() {
    testing::init_test_setup();
    let mut model = FeatureModel::new(IdentifierFactory::counter()).unwrap();
    let root = model.root_feature().identifier().clone();

    let reserved = model.new_identifier().unwrap();
    let child = model.mutate().create_feature(&root, None).unwrap();

    assert_eq!(root.to_string(), "1");
    assert_eq!(reserved.to_string(), "2");
    assert_eq!(child.to_string(), "3");
    assert!(child.factory().same_chain(model.identifier_factory()));
}

#[test]
fn given_counter_near_its_limit_when_allocating_then_exhausted_instead_of_wrapping() {
    testing::init_test_setup();
    // Arrange
    let factory = IdentifierFactory::counter_from(u64::MAX - 2);
    let mut model = FeatureModel::new(factory.clone()).unwrap();
    let root = model.root_feature().identifier().clone();

    // Act
    let last = model.mutate().create_feature(&root, None);
    let beyond = model.mutate().create_feature(&root, None);
    let detached = model.mutate().create_detached_feature();

    // Assert
    assert_eq!(last.unwrap().to_string(), (u64::MAX - 1).to_string());
    assert!(matches!(beyond, Err(DomainError::Exhausted(_))));
    assert!(matches!(detached, Err(DomainError::Exhausted(_))));
    assert!(matches!(FeatureModel::new(factory), Err(DomainError::Exhausted(_))));
    assert_eq!(model.number_of_features(), 2);
}
