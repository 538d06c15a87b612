//! Tests for the constraint sequence and model-level operations

use rstest::{fixture, rstest};

use featmodel::domain::{
    Analyzable, Analyzer, DomainError, Expression, FeatureModel, Identifiable, Identifier, IdentifierFactory,
    Mutable, Mutator,
};
use featmodel::util::testing;

#[fixture]
fn model() -> FeatureModel {
    testing::init_test_setup();
    let mut model = FeatureModel::new(IdentifierFactory::counter()).unwrap();
    let root = model.root_feature().identifier().clone();
    let child = model.mutate().create_feature(&root, None).unwrap();
    model.mutate_feature(&root).unwrap().set_name("Root");
    model.mutate_feature(&child).unwrap().set_name("Child");
    model
}

fn sequence(model: &FeatureModel) -> Vec<Identifier> {
    model
        .constraints()
        .map(|constraint| constraint.identifier().clone())
        .collect()
}

fn create(model: &mut FeatureModel, formula: Expression) -> Identifier {
    model.mutate().create_constraint(formula, None).unwrap()
}

fn unregistered(model: &mut FeatureModel) -> Identifier {
    model.mutate().new_constraint(Expression::var("Child")).unwrap()
}

#[rstest]
fn given_registered_constraint_when_added_again_then_duplicate_and_sequence_unchanged(mut model: FeatureModel) {
    let constraint = create(&mut model, Expression::var("Child"));

    let result = model.mutate().add_constraint(&constraint, None);

    assert!(matches!(result, Err(DomainError::Duplicate(_))));
    assert_eq!(model.number_of_constraints(), 1);
}

#[rstest]
fn given_positions_when_adding_constraints_then_sequence_follows_positions(mut model: FeatureModel) {
    let first = create(&mut model, Expression::var("Child"));
    let second = unregistered(&mut model);
    let third = unregistered(&mut model);

    model.mutate().add_constraint(&second, Some(0)).unwrap();
    model.mutate().add_constraint(&third, Some(1)).unwrap();

    assert_eq!(sequence(&model), vec![second.clone(), third.clone(), first.clone()]);
    assert_eq!(model.constraint_index(&first), Some(2));
    assert_eq!(model.analyze_constraint(&third).unwrap().index(), Some(1));
}

#[rstest]
fn given_position_beyond_sequence_when_adding_then_out_of_bounds(mut model: FeatureModel) {
    let constraint = unregistered(&mut model);

    let result = model.mutate().add_constraint(&constraint, Some(1));

    assert_eq!(result, Err(DomainError::OutOfBounds { index: 1, len: 0 }));
    assert_eq!(model.number_of_constraints(), 0);
}

#[rstest]
fn given_position_beyond_sequence_when_creating_then_constraint_is_discarded(mut model: FeatureModel) {
    let result = model.mutate().create_constraint(Expression::var("Root"), Some(4));

    assert_eq!(result, Err(DomainError::OutOfBounds { index: 4, len: 0 }));
    assert_eq!(model.number_of_constraints(), 0);
    assert!(model.constraints().next().is_none());
}

#[rstest]
fn given_unregistered_constraint_when_set_at_position_then_it_replaces_the_slot(mut model: FeatureModel) {
    let first = create(&mut model, Expression::var("Child"));
    let second = create(&mut model, Expression::var("Root"));
    let replacement = unregistered(&mut model);

    model.mutate().set_constraint(0, &replacement).unwrap();

    assert_eq!(sequence(&model), vec![replacement, second]);
    assert!(!model.has_constraint(&first));
    assert!(model.analyze_constraint(&first).is_ok());
}

#[rstest]
fn given_registered_constraint_when_set_at_position_then_duplicate(mut model: FeatureModel) {
    let first = create(&mut model, Expression::var("Child"));
    let second = create(&mut model, Expression::var("Root"));

    let result = model.mutate().set_constraint(0, &second);

    assert!(matches!(result, Err(DomainError::Duplicate(_))));
    assert_eq!(sequence(&model), vec![first, second]);
}

#[rstest]
fn given_position_beyond_sequence_when_setting_constraint_then_out_of_bounds(mut model: FeatureModel) {
    create(&mut model, Expression::var("Child"));
    let replacement = unregistered(&mut model);

    let result = model.mutate().set_constraint(1, &replacement);

    assert_eq!(result, Err(DomainError::OutOfBounds { index: 1, len: 1 }));
}

#[rstest]
fn given_identifiers_when_setting_constraints_then_sequence_is_replaced_in_order(mut model: FeatureModel) {
    let first = create(&mut model, Expression::var("Child"));
    let second = create(&mut model, Expression::var("Root"));
    let third = unregistered(&mut model);

    model.mutate().set_constraints([&third, &first]).unwrap();

    assert_eq!(sequence(&model), vec![third, first]);
    assert!(!model.has_constraint(&second));
}

#[rstest]
fn given_repeated_identifier_when_setting_constraints_then_duplicate_after_first(mut model: FeatureModel) {
    let first = create(&mut model, Expression::var("Child"));
    let second = create(&mut model, Expression::var("Root"));

    let result = model.mutate().set_constraints([&second, &second, &first]);

    assert!(matches!(result, Err(DomainError::Duplicate(_))));
    assert_eq!(sequence(&model), vec![second]);
}

#[rstest]
fn given_constraints_when_removed_then_they_can_be_added_again(mut model: FeatureModel) {
    let first = create(&mut model, Expression::var("Child"));
    let second = create(&mut model, Expression::var("Root"));

    model.mutate().remove_constraint(&first).unwrap();
    let removed = model.mutate().remove_constraint_at(0).unwrap();

    assert_eq!(removed, second);
    assert_eq!(model.number_of_constraints(), 0);
    assert!(matches!(
        model.mutate().remove_constraint(&first),
        Err(DomainError::NotFound(_))
    ));
    assert_eq!(
        model.mutate().remove_constraint_at(0),
        Err(DomainError::OutOfBounds { index: 0, len: 0 })
    );

    model.mutate().add_constraint(&first, None).unwrap();
    assert_eq!(sequence(&model), vec![first]);
}

#[rstest]
fn given_constraint_when_deleted_then_it_is_forgotten(mut model: FeatureModel) {
    let constraint = create(&mut model, Expression::var("Child"));
    let child = model.resolve_feature("Child").unwrap().identifier().clone();

    model.mutate().delete_constraint(&constraint).unwrap();

    assert_eq!(model.number_of_constraints(), 0);
    assert!(matches!(model.analyze_constraint(&constraint), Err(DomainError::NotFound(_))));
    assert!(matches!(
        model.mutate().delete_constraint(&constraint),
        Err(DomainError::NotFound(_))
    ));
    // no constraint references the child anymore
    model.mutate().delete_feature(&child).unwrap();
}

#[rstest]
fn given_unknown_constraint_when_mutating_then_not_found(mut model: FeatureModel) {
    let unknown = model.new_identifier().unwrap();

    assert!(matches!(model.mutate_constraint(&unknown), Err(DomainError::NotFound(_))));
    assert!(matches!(model.mutate().add_constraint(&unknown, None), Err(DomainError::NotFound(_))));
    assert!(model.constraint(&unknown).is_none());
    assert_eq!(model.constraint_index(&unknown), None);
}

#[rstest]
fn given_two_models_when_comparing_identity_then_entities_record_their_model(mut model: FeatureModel) {
    let other = FeatureModel::new(IdentifierFactory::counter()).unwrap();
    let constraint = create(&mut model, Expression::var("Child"));

    assert_ne!(model.id(), other.id());
    assert_eq!(model.root_feature().model_id(), model.id());
    assert_eq!(model.constraint(&constraint).unwrap().model_id(), model.id());
    assert_eq!(other.root_feature().model_id(), other.id());
}

#[rstest]
fn given_model_when_using_role_handles_then_they_expose_the_model(mut model: FeatureModel) {
    let id = model.id();

    let mutator = model.mutate();
    assert_eq!(mutator.mutable().id(), id);
    assert_eq!(mutator.mutable().number_of_features(), 2);

    let analyzer = model.analyze();
    assert_eq!(analyzer.analyzable().id(), id);
}

#[rstest]
fn given_uuid_model_when_building_then_operations_work_the_same(#[values(true, false)] uuid: bool) {
    testing::init_test_setup();
    let factory = if uuid {
        IdentifierFactory::uuid()
    } else {
        IdentifierFactory::counter_from(100)
    };
    let mut model = FeatureModel::new(factory).unwrap();
    let root = model.root_feature().identifier().clone();
    let child = model.mutate().create_feature(&root, None).unwrap();

    let constraint = create(&mut model, Expression::var(child.to_string()));

    assert!(model.constraint(&constraint).unwrap().references(&child));
    assert_eq!(model.identifier_factory().strategy(), child.strategy());
}

#[rstest]
fn given_foreign_constraint_with_matching_identifier_value_when_registering_then_structural_error(
    mut model: FeatureModel,
) {
    // Arrange
    let own = create(&mut model, Expression::var("Child"));
    let mut other = FeatureModel::new(IdentifierFactory::counter()).unwrap();
    let other_root = other.root_feature().identifier().clone();
    other.mutate().create_feature(&other_root, None).unwrap();
    let foreign = other.mutate().new_constraint(Expression::True).unwrap();
    assert_eq!(foreign, own);

    // Act
    let added = model.mutate().add_constraint(&foreign, None);
    let replaced = model.mutate().set_constraint(0, &foreign);

    // Assert
    assert!(matches!(added, Err(DomainError::Structural(_))));
    assert!(matches!(replaced, Err(DomainError::Structural(_))));
    assert_eq!(sequence(&model), vec![own]);
    assert!(model.constraint(&foreign).is_none());
    assert_eq!(model.constraint_index(&foreign), None);
    assert!(matches!(model.mutate_constraint(&foreign), Err(DomainError::NotFound(_))));
    assert!(matches!(model.mutate().delete_constraint(&foreign), Err(DomainError::NotFound(_))));
    assert_eq!(model.number_of_constraints(), 1);
}
