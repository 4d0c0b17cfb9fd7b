//! Resolution pipeline.
//!
//! The [`Resolver`] folds every operation contributed by a character's
//! content into a fresh [`VariableStore`]. A pass is a pure function of
//! (content, selections, custom operations): it never mutates the
//! character, performs no I/O of its own and may be rerun at any time.
//!
//! Top-level sources resolve in a fixed precedence:
//!
//! ```text
//! content sources → ancestry → background → class → class features
//!   → feats → equipped items (slot order) → conditions → custom operations
//! ```
//!
//! Grants, chosen select options and satisfied conditionals are spliced in
//! lazily at their position, so a conditional observes exactly the store
//! state produced by the operations before it.

mod errors;
mod pipeline;
mod report;

pub use errors::{ResolveError, ResolvePhase};
pub use report::{
    Issue, IssueKind, OperationRecord, ResolutionReport, SelectionPoint, SelectionState,
};

use crate::character::Character;
use crate::conditional::AdvisoryModifier;
use crate::config::ResolverConfig;
use crate::content::ContentProvider;
use crate::operation::{Operation, OperationId};
use crate::variable::{CHARACTER_SCOPE, ScopeView, StackingRules, Variable, VariableStore};

/// Output of one resolution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolution {
    pub(crate) store: VariableStore,
    pub(crate) report: ResolutionReport,
    pub(crate) trace: Vec<OperationRecord>,
    pub(crate) selections: Vec<SelectionPoint>,
}

impl Resolution {
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn report(&self) -> &ResolutionReport {
        &self.report
    }

    /// Applied operations in application order.
    pub fn trace(&self) -> &[OperationRecord] {
        &self.trace
    }

    /// Every `select` reached in the pass, in the order reached.
    pub fn selections(&self) -> &[SelectionPoint] {
        &self.selections
    }

    /// Reached `select` operations awaiting a choice.
    pub fn pending_selections(&self) -> impl Iterator<Item = &Operation> {
        self.selections
            .iter()
            .filter(|p| p.is_pending())
            .map(|p| &p.operation)
    }

    pub fn selection_point(&self, operation: OperationId) -> Option<&SelectionPoint> {
        self.selections.iter().find(|p| p.operation.id == operation)
    }

    pub fn character_scope(&self) -> ScopeView<'_> {
        self.store.scope(CHARACTER_SCOPE)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.store.get(CHARACTER_SCOPE, name)
    }

    /// Conditional bonuses left for the player to invoke.
    pub fn advisories(&self) -> Vec<AdvisoryModifier> {
        self.store.advisories()
    }
}

/// Entry point of the resolution pipeline.
#[derive(Clone, Debug, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Runs a full pass for `character` against `provider`.
    ///
    /// Non-fatal findings land in [`Resolution::report`]; only structural
    /// failures return `Err`.
    pub fn resolve(
        &self,
        character: &Character,
        provider: &dyn ContentProvider,
    ) -> Result<Resolution, ResolveError> {
        let span = tracing::debug_span!("resolve", character = %character.id);
        let _enter = span.enter();

        let store = VariableStore::new(StackingRules::from(&self.config));
        let resolution = pipeline::Pass::new(&self.config, character, provider, store).run()?;

        tracing::debug!(
            operations = resolution.trace.len(),
            issues = resolution.report.len(),
            "resolution complete"
        );
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::ItemSlot;
    use crate::config::ConditionalPolicy;
    use crate::content::ContentRef;
    use crate::operation::{Comparison, OperationKind, Predicate, SelectOption};
    use crate::testing::StaticProvider;
    use crate::variable::VariableValue;

    const SKILL_SELECT: OperationId = OperationId::from_u128(0x100);
    const ATHLETICS: OperationId = OperationId::from_u128(0x101);
    const STEALTH: OperationId = OperationId::from_u128(0x102);

    fn number(resolution: &Resolution, name: &str) -> Option<i64> {
        resolution
            .character_scope()
            .value(name)
            .and_then(VariableValue::as_number)
    }

    fn skill_select() -> Operation {
        Operation {
            id: SKILL_SELECT,
            ..Operation::select(
                "Background skill",
                vec![
                    SelectOption::new(
                        ATHLETICS,
                        "Athletics",
                        vec![Operation::adj_value("SKILL_ATHLETICS", VariableValue::Numeric(2))],
                    ),
                    SelectOption::new(
                        STEALTH,
                        "Stealth",
                        vec![Operation::adj_value("SKILL_STEALTH", VariableValue::Numeric(2))],
                    ),
                ],
            )
        }
    }

    fn provider() -> StaticProvider {
        StaticProvider::default()
            .with(
                ContentRef::ancestry("dwarf"),
                vec![
                    Operation::adj_value("MAX_HEALTH_ANCESTRY", VariableValue::Numeric(10)),
                    Operation::set_value("HAS_DARKVISION", VariableValue::Boolean(true)),
                    Operation::give_language("Dwarven"),
                    Operation::adj_value("ATTRIBUTE_CON", VariableValue::Numeric(1)),
                ],
            )
            .with(ContentRef::background("farmhand"), vec![skill_select()])
            .with(
                ContentRef::class("fighter"),
                vec![Operation::adj_value(
                    "MAX_HEALTH_CLASS_PER_LEVEL",
                    VariableValue::Numeric(10),
                )],
            )
            .with_feature(
                "fighter",
                3,
                "bravery",
                vec![Operation::add_bonus("SAVE_WILL", 1, "untyped")],
            )
            .with_feature(
                "fighter",
                1,
                "shield_block",
                vec![Operation::give_trait(12)],
            )
            .with(
                ContentRef::item("buckler"),
                vec![Operation::add_bonus("AC_BONUS", 1, "item")],
            )
            .with(
                ContentRef::feat("armor_expert"),
                vec![Operation::add_bonus("AC_BONUS", 2, "item")],
            )
            .with(
                ContentRef::condition("shielded"),
                vec![Operation::add_bonus("AC_BONUS", 1, "circumstance")],
            )
    }

    fn character() -> Character {
        Character::new("c1", "Harsk", 3)
            .with_ancestry("dwarf")
            .with_background("farmhand")
            .with_class("fighter")
            .with_feat("armor_expert")
            .with_item(ItemSlot::equipped("buckler", 0))
    }

    fn resolve(character: &Character, provider: &StaticProvider) -> Resolution {
        Resolver::default().resolve(character, provider).unwrap()
    }

    #[test]
    fn same_type_bonuses_take_the_largest() {
        let provider = provider();
        let resolution = resolve(&character(), &provider);
        assert_eq!(number(&resolution, "AC_BONUS"), Some(2));

        let shielded = character().with_condition("shielded");
        let resolution = resolve(&shielded, &provider);
        assert_eq!(number(&resolution, "AC_BONUS"), Some(3));
    }

    #[test]
    fn resolution_is_deterministic_and_idempotent() {
        let provider = provider();
        let character = character();
        let first = resolve(&character, &provider);
        let second = resolve(&character, &provider);
        assert_eq!(first.store(), second.store());
        assert_eq!(first.report().counts(), second.report().counts());
        assert_eq!(first.trace(), second.trace());
    }

    #[test]
    fn derived_max_health_and_baseline() {
        let resolution = resolve(&character(), &provider());
        // 10 + (10 + 1) × 3
        assert_eq!(number(&resolution, "MAX_HEALTH"), Some(43));
        assert_eq!(number(&resolution, "SPEED"), Some(25));
        assert_eq!(
            resolution.character_scope().value("LANGUAGE_NAMES"),
            Some(&VariableValue::ListOfString(vec!["Dwarven".into()]))
        );
    }

    #[test]
    fn class_features_follow_level() {
        let provider = provider();
        let resolution = resolve(&character(), &provider);
        assert_eq!(
            resolution.character_scope().value("CLASS_FEATURE_IDS"),
            Some(&VariableValue::ListOfString(vec![
                "shield_block".into(),
                "bravery".into()
            ]))
        );
        assert_eq!(number(&resolution, "SAVE_WILL"), Some(1));

        let mut novice = character();
        novice.level = 1;
        let resolution = resolve(&novice, &provider);
        assert_eq!(number(&resolution, "SAVE_WILL"), Some(0));
    }

    #[test]
    fn pending_selection_then_choice_applies_branch() {
        let provider = provider();
        let mut character = character();

        let resolution = resolve(&character, &provider);
        let pending: Vec<OperationId> = resolution.pending_selections().map(|op| op.id).collect();
        assert_eq!(pending, vec![SKILL_SELECT]);
        assert_eq!(
            resolution.report().counts().get(&IssueKind::PendingSelection),
            Some(&1)
        );
        assert!(resolution.variable("SKILL_ATHLETICS").is_none());

        character
            .operation_data
            .record_selection(SKILL_SELECT, ATHLETICS);
        let resolution = resolve(&character, &provider);
        assert_eq!(resolution.pending_selections().count(), 0);
        assert_eq!(number(&resolution, "SKILL_ATHLETICS"), Some(2));
        assert!(resolution.variable("SKILL_STEALTH").is_none());
        assert_eq!(
            resolution.selection_point(SKILL_SELECT).map(|p| &p.state),
            Some(&SelectionState::Chosen { option: ATHLETICS })
        );
    }

    #[test]
    fn stale_selection_is_reported_and_skipped() {
        let provider = provider();
        let mut character = character();
        character
            .operation_data
            .record_selection(SKILL_SELECT, OperationId::from_u128(0xdead));

        let resolution = resolve(&character, &provider);
        assert_eq!(resolution.report().of_kind(IssueKind::StaleSelection).count(), 1);
        assert!(resolution.variable("SKILL_ATHLETICS").is_none());
        assert!(resolution.report().needs_attention());
    }

    #[test]
    fn orphaned_selection_is_reported() {
        let provider = provider();
        let mut character = character();
        character
            .operation_data
            .record_selection(OperationId::from_u128(0xbeef), ATHLETICS);

        let resolution = resolve(&character, &provider);
        assert!(matches!(
            resolution.report().of_kind(IssueKind::OrphanedSelection).next(),
            Some(Issue::OrphanedSelection { .. })
        ));
    }

    #[test]
    fn select_reached_through_two_grants_is_listed_once() {
        let provider = StaticProvider::default()
            .with(
                ContentRef::feat("one"),
                vec![Operation::grant(ContentRef::feat("shared"))],
            )
            .with(
                ContentRef::feat("two"),
                vec![Operation::grant(ContentRef::feat("shared"))],
            )
            .with(ContentRef::feat("shared"), vec![skill_select()]);
        let mut character = Character::new("c", "T", 1)
            .with_feat("one")
            .with_feat("two");

        let resolution = resolve(&character, &provider);
        assert_eq!(crate::selection::list_pending_selections(&resolution).len(), 1);
        assert_eq!(resolution.selections().len(), 1);
        assert_eq!(
            resolution.report().counts().get(&IssueKind::PendingSelection),
            Some(&1)
        );

        character
            .operation_data
            .record_selection(SKILL_SELECT, ATHLETICS);
        let resolution = resolve(&character, &provider);
        assert_eq!(resolution.pending_selections().count(), 0);
        assert_eq!(
            resolution.selection_point(SKILL_SELECT).map(|p| &p.state),
            Some(&SelectionState::Chosen { option: ATHLETICS })
        );
    }

    #[test]
    fn selection_keys_match_regardless_of_case() {
        let provider = provider();
        let mut character = character();
        character.operation_data.selections.insert(
            SKILL_SELECT.to_string().to_uppercase(),
            ATHLETICS.to_string().to_uppercase(),
        );

        let resolution = resolve(&character, &provider);
        assert_eq!(number(&resolution, "SKILL_ATHLETICS"), Some(2));
        assert_eq!(resolution.pending_selections().count(), 0);
        assert_eq!(resolution.report().of_kind(IssueKind::OrphanedSelection).count(), 0);
        assert_eq!(resolution.report().of_kind(IssueKind::StaleSelection).count(), 0);
    }

    #[test]
    fn extreme_adjustments_saturate_instead_of_overflowing() {
        let provider = StaticProvider::default().with(
            ContentRef::feat("absurd"),
            vec![
                Operation::adj_value("SPEED", VariableValue::Numeric(i64::MAX)),
                Operation::add_bonus("SPEED", i64::MAX, "untyped"),
                Operation::adj_value("ATTRIBUTE_STR", VariableValue::Numeric(1_000_000_000_000)),
            ],
        );
        let character = Character::new("c", "T", 1).with_feat("absurd");

        let resolution = resolve(&character, &provider);
        assert_eq!(number(&resolution, "SPEED"), Some(i64::MAX));
        assert!(number(&resolution, "ATTRIBUTE_STR").is_some_and(|v| v > 4));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn resolution_survives_json() {
        let provider = provider();
        let mut character = character().with_condition("shielded");
        character
            .operation_data
            .record_selection(OperationId::from_u128(0xbeef), ATHLETICS);
        let resolution = resolve(&character, &provider);

        let json = serde_json::to_string(&resolution).unwrap();
        let restored: Resolution = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, resolution);

        let value = serde_json::to_value(resolution.report()).unwrap();
        assert_eq!(value[0]["kind"], "pending_selection");
    }

    #[test]
    fn cyclic_grant_drops_only_the_branch() {
        let provider = StaticProvider::default()
            .with(
                ContentRef::feat("a"),
                vec![
                    Operation::grant(ContentRef::feat("b")),
                    Operation::adj_value("SPEED", VariableValue::Numeric(5)),
                ],
            )
            .with(
                ContentRef::feat("b"),
                vec![
                    Operation::grant(ContentRef::feat("a")),
                    Operation::give_language("Sylvan"),
                ],
            );
        let character = Character::new("c2", "Loop", 1).with_feat("a");

        let resolution = resolve(&character, &provider);
        let cycles: Vec<&Issue> = resolution.report().of_kind(IssueKind::CyclicGrant).collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(number(&resolution, "SPEED"), Some(30));
        assert_eq!(
            resolution.character_scope().value("FEAT_IDS"),
            Some(&VariableValue::ListOfString(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            resolution.character_scope().value("LANGUAGE_NAMES"),
            Some(&VariableValue::ListOfString(vec!["Sylvan".into()]))
        );
    }

    #[test]
    fn conditional_sees_only_earlier_operations() {
        let darkvision = || {
            Operation::conditional(
                Predicate::Truthy("HAS_DARKVISION".into()),
                vec![Operation::add_bonus("PERCEPTION_BONUS", 1, "")],
                vec![Operation::give_language("Undercommon")],
            )
        };
        let provider = StaticProvider::default()
            .with(
                ContentRef::ancestry("before"),
                vec![
                    darkvision(),
                    Operation::set_value("HAS_DARKVISION", VariableValue::Boolean(true)),
                ],
            )
            .with(
                ContentRef::ancestry("after"),
                vec![
                    Operation::set_value("HAS_DARKVISION", VariableValue::Boolean(true)),
                    darkvision(),
                ],
            );

        let before = resolve(&Character::new("c", "A", 1).with_ancestry("before"), &provider);
        assert_eq!(number(&before, "PERCEPTION_BONUS"), Some(0));
        assert!(
            before
                .character_scope()
                .value("LANGUAGE_NAMES")
                .is_some_and(|v| v.contains(&VariableValue::String("Undercommon".into())))
        );

        let after = resolve(&Character::new("c", "B", 1).with_ancestry("after"), &provider);
        assert_eq!(number(&after, "PERCEPTION_BONUS"), Some(1));
    }

    #[test]
    fn conditional_splices_before_remaining_operations() {
        let provider = StaticProvider::default().with(
            ContentRef::class("wizard"),
            vec![
                Operation::conditional(
                    Predicate::compare("LEVEL", Comparison::Ge, VariableValue::Numeric(1)),
                    vec![Operation::set_value("SIZE", VariableValue::String("SMALL".into()))],
                    vec![],
                ),
                Operation::set_value("SIZE", VariableValue::String("TINY".into())),
            ],
        );
        let resolution = resolve(&Character::new("c", "W", 1).with_class("wizard"), &provider);
        assert_eq!(
            resolution.character_scope().value("SIZE"),
            Some(&VariableValue::String("TINY".into()))
        );
    }

    #[test]
    fn type_mismatch_is_reported_and_variable_kept() {
        let provider = StaticProvider::default().with(
            ContentRef::feat("odd"),
            vec![
                Operation::add_bonus("LANGUAGE_NAMES", 1, "item"),
                Operation::set_value("SPEED", VariableValue::String("fast".into())),
                Operation::give_language("Common"),
            ],
        );
        let resolution = resolve(&Character::new("c", "T", 1).with_feat("odd"), &provider);

        assert_eq!(resolution.report().of_kind(IssueKind::TypeMismatch).count(), 2);
        assert_eq!(number(&resolution, "SPEED"), Some(25));
        assert_eq!(
            resolution.character_scope().value("LANGUAGE_NAMES"),
            Some(&VariableValue::ListOfString(vec!["Common".into()]))
        );
    }

    #[test]
    fn conditional_text_bonus_is_advisory() {
        let mut bonus = Operation::add_bonus("AC_BONUS", 2, "circumstance");
        if let OperationKind::AddBonusToValue(payload) = &mut bonus.kind {
            payload.text = Some("vs. undead".into());
            payload.auto_apply = true;
        }
        let provider = StaticProvider::default().with(ContentRef::feat("warden"), vec![bonus]);
        let character = Character::new("c", "P", 1).with_feat("warden");

        let resolution = resolve(&character, &provider);
        assert_eq!(number(&resolution, "AC_BONUS"), Some(0));
        let advisories = resolution.advisories();
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].source, Some(ContentRef::feat("warden")));

        let honoring = Resolver::new(
            ResolverConfig::default().with_conditional_policy(ConditionalPolicy::HonorAutoApply),
        );
        let resolution = honoring.resolve(&character, &provider).unwrap();
        assert_eq!(number(&resolution, "AC_BONUS"), Some(2));
    }

    #[test]
    fn stowed_items_contribute_nothing_and_custom_runs_last() {
        let provider = provider();
        let character = Character::new("c", "K", 1)
            .with_item(ItemSlot::stowed("buckler", 0))
            .with_custom_operation(Operation::set_value("SPEED", VariableValue::Numeric(40)))
            .with_condition("shielded");

        let resolution = resolve(&character, &provider);
        assert_eq!(number(&resolution, "AC_BONUS"), Some(1));
        assert_eq!(number(&resolution, "SPEED"), Some(40));
        assert_eq!(
            resolution.trace().last().and_then(|r| r.source.clone()),
            Some(ContentRef::custom("c"))
        );
    }

    #[test]
    fn missing_content_and_duplicates_are_reported() {
        let shared = Operation::give_language("Elven");
        let provider = StaticProvider::default()
            .with(ContentRef::feat("one"), vec![shared.clone()])
            .with(ContentRef::feat("two"), vec![shared]);
        let character = Character::new("c", "D", 1)
            .with_feat("one")
            .with_feat("two")
            .with_feat("ghost");

        let resolution = resolve(&character, &provider);
        let counts = resolution.report().counts();
        assert_eq!(counts.get(&IssueKind::DuplicateOperation), Some(&1));
        assert_eq!(counts.get(&IssueKind::MissingContent), Some(&1));
    }

    #[test]
    fn notes_and_notifications_surface() {
        let notify = Operation::notify("Darkvision", "You can see in the dark.");
        let id = notify.id;
        let provider = StaticProvider::default().with(ContentRef::ancestry("elf"), vec![notify]);
        let mut character = Character::new("c", "N", 1).with_ancestry("elf");
        character.operation_data.set_note(id, "check lighting rules");

        let resolution = resolve(&character, &provider);
        assert_eq!(resolution.report().of_kind(IssueKind::Notification).count(), 1);
        let record = resolution.trace().iter().find(|r| r.id == id).unwrap();
        assert_eq!(record.note.as_deref(), Some("check lighting rules"));
        assert_eq!(record.tag, crate::operation::OperationTag::SendNotification);
    }

    #[test]
    fn operation_limit_is_fatal() {
        let provider = provider();
        let resolver = Resolver::new(ResolverConfig::default().with_max_operations(3));
        let err = resolver.resolve(&character(), &provider).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::OperationLimitExceeded { limit: 3, .. }
        ));
    }

    #[test]
    fn grant_depth_is_bounded() {
        let provider = StaticProvider::default()
            .with(
                ContentRef::feat("outer"),
                vec![Operation::grant(ContentRef::feat("middle"))],
            )
            .with(
                ContentRef::feat("middle"),
                vec![Operation::grant(ContentRef::feat("inner"))],
            )
            .with(ContentRef::feat("inner"), vec![Operation::give_trait(1)]);
        let character = Character::new("c", "G", 1).with_feat("outer");

        let shallow = Resolver::new(ResolverConfig::default().with_max_grant_depth(2));
        assert!(matches!(
            shallow.resolve(&character, &provider),
            Err(ResolveError::GrantDepthExceeded { .. })
        ));
        assert!(Resolver::default().resolve(&character, &provider).is_ok());
    }
}
