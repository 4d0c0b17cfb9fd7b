//! One resolution pass: a work stack of entity expansions and operations.
//!
//! Work is popped from the top of the stack. Splicing pushes a child list
//! in reverse, so children run immediately and in author order before the
//! rest of the parent's list.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::errors::{ResolveError, ResolvePhase};
use super::report::{Issue, OperationRecord, ResolutionReport, SelectionPoint, SelectionState};
use super::Resolution;
use crate::character::Character;
use crate::config::ResolverConfig;
use crate::content::{ContentKind, ContentProvider, ContentRef};
use crate::operation::{Operation, OperationId, OperationKind, Select};
use crate::variable::defaults::{LANGUAGE_NAMES, SPELL_IDS, TRAIT_IDS};
use crate::variable::{
    CHARACTER_SCOPE, StoreError, VariableStore, VariableValue, finalize_derived,
    seed_character_scope,
};

/// Expansion context of an operation list.
#[derive(Clone, Debug)]
struct Frame {
    /// Entity whose operations run in this frame.
    owner: ContentRef,
    /// Entities expanded on the way here, outermost first.
    path: Rc<[ContentRef]>,
    /// Grants, chosen options and satisfied conditionals above this frame.
    depth: usize,
}

impl Frame {
    fn enter(parent: Option<&Frame>, entity: &ContentRef, limit: usize) -> Result<Self, ResolveError> {
        let mut path = parent.map(|p| p.path.to_vec()).unwrap_or_default();
        path.push(entity.clone());
        let frame = Self {
            owner: entity.clone(),
            path: path.into(),
            depth: parent.map_or(1, |p| p.depth + 1),
        };
        frame.within(limit)
    }

    fn nested(&self, limit: usize) -> Result<Self, ResolveError> {
        Self {
            depth: self.depth + 1,
            ..self.clone()
        }
        .within(limit)
    }

    fn within(self, limit: usize) -> Result<Self, ResolveError> {
        if self.depth > limit {
            return Err(ResolveError::GrantDepthExceeded {
                entity: self.owner,
                limit,
            });
        }
        Ok(self)
    }

    fn visits(&self, entity: &ContentRef) -> bool {
        self.path.contains(entity)
    }
}

enum Work {
    Expand {
        entity: ContentRef,
        via: Option<OperationId>,
        parent: Option<Frame>,
    },
    Apply {
        operation: Operation,
        frame: Frame,
    },
}

pub(super) struct Pass<'a> {
    config: &'a ResolverConfig,
    character: &'a Character,
    provider: &'a dyn ContentProvider,
    store: VariableStore,
    report: ResolutionReport,
    trace: Vec<OperationRecord>,
    selections: Vec<SelectionPoint>,
    /// Stored choices keyed by parsed operation id.
    stored: BTreeMap<OperationId, &'a str>,
    stack: Vec<Work>,
    applied: BTreeSet<OperationId>,
    phase: ResolvePhase,
}

impl<'a> Pass<'a> {
    pub(super) fn new(
        config: &'a ResolverConfig,
        character: &'a Character,
        provider: &'a dyn ContentProvider,
        store: VariableStore,
    ) -> Self {
        Self {
            config,
            character,
            provider,
            store,
            report: ResolutionReport::new(),
            trace: Vec::new(),
            selections: Vec::new(),
            stored: character.operation_data.parsed_selections(),
            stack: Vec::new(),
            applied: BTreeSet::new(),
            phase: ResolvePhase::Seed,
        }
    }

    pub(super) fn run(mut self) -> Result<Resolution, ResolveError> {
        self.store.reset(CHARACTER_SCOPE);
        seed_character_scope(&mut self.store, CHARACTER_SCOPE, self.character.level)
            .map_err(|e| ResolveError::store(ResolvePhase::Seed, e))?;

        self.phase = ResolvePhase::Expand;
        let roots = self.roots()?;
        self.stack.extend(roots.into_iter().rev());

        while let Some(work) = self.stack.pop() {
            match work {
                Work::Expand {
                    entity,
                    via,
                    parent,
                } => {
                    self.phase = ResolvePhase::Expand;
                    self.expand(entity, via, parent)?;
                }
                Work::Apply { operation, frame } => {
                    self.phase = ResolvePhase::Apply;
                    self.apply(operation, frame)?;
                }
            }
        }

        self.phase = ResolvePhase::Finalize;
        self.finish()
    }

    /// Top-level work in source precedence.
    fn roots(&self) -> Result<Vec<Work>, ResolveError> {
        let mut roots = Vec::new();
        for entity in self.character.content_refs() {
            let class_id = (entity.kind == ContentKind::Class).then(|| entity.id.clone());
            roots.push(Work::Expand {
                entity,
                via: None,
                parent: None,
            });

            if let Some(class_id) = class_id {
                let features = self
                    .provider
                    .class_features(&class_id, self.character.level)
                    .map_err(|e| ResolveError::provider(ResolvePhase::Expand, e))?;
                roots.extend(features.into_iter().map(|feature| Work::Expand {
                    entity: ContentRef::class_feature(feature.id),
                    via: None,
                    parent: None,
                }));
            }
        }

        if !self.character.custom_operations.is_empty() {
            let custom = ContentRef::custom(self.character.id.as_str());
            let frame = Frame::enter(None, &custom, self.config.max_grant_depth)?;
            roots.extend(
                self.character
                    .custom_operations
                    .iter()
                    .map(|op| Work::Apply {
                        operation: op.clone().attributed_to(&custom),
                        frame: frame.clone(),
                    }),
            );
        }
        Ok(roots)
    }

    fn expand(
        &mut self,
        entity: ContentRef,
        via: Option<OperationId>,
        parent: Option<Frame>,
    ) -> Result<(), ResolveError> {
        if let Some(parent) = parent.as_ref().filter(|p| p.visits(&entity)) {
            warn!(%entity, "cyclic grant dropped");
            self.report.push(Issue::CyclicGrant {
                operation: via,
                entity,
                path: parent.path.to_vec(),
            });
            return Ok(());
        }

        let operations = self
            .provider
            .operations(&entity)
            .map_err(|e| ResolveError::provider(self.phase, e))?;
        let Some(operations) = operations else {
            debug!(%entity, "content not found");
            self.report.push(Issue::MissingContent {
                operation: via,
                entity,
            });
            return Ok(());
        };

        if let Some(list) = entity.kind.granted_list() {
            let result = self.store.adjust(
                CHARACTER_SCOPE,
                list,
                &VariableValue::String(entity.id.clone()),
            );
            self.absorb(via, Some(&entity), result)?;
        }

        let frame = Frame::enter(parent.as_ref(), &entity, self.config.max_grant_depth)?;
        trace!(%entity, operations = operations.len(), depth = frame.depth, "expand");
        let works: Vec<Work> = operations
            .into_iter()
            .map(|op| Work::Apply {
                operation: op.attributed_to(&entity),
                frame: frame.clone(),
            })
            .collect();
        self.stack.extend(works.into_iter().rev());
        Ok(())
    }

    fn splice(&mut self, operations: &[Operation], frame: &Frame) -> Result<(), ResolveError> {
        if operations.is_empty() {
            return Ok(());
        }
        let nested = frame.nested(self.config.max_grant_depth)?;
        self.stack
            .extend(operations.iter().rev().map(|op| Work::Apply {
                operation: op.clone(),
                frame: nested.clone(),
            }));
        Ok(())
    }

    fn apply(&mut self, operation: Operation, frame: Frame) -> Result<(), ResolveError> {
        if self.trace.len() >= self.config.max_operations {
            return Err(ResolveError::OperationLimitExceeded {
                character: self.character.id.clone(),
                limit: self.config.max_operations,
            });
        }

        let id = operation.id;
        let source = operation.source.clone();
        if !self.applied.insert(id) {
            debug!(operation = %id, "duplicate operation id");
            self.report.push(Issue::DuplicateOperation {
                operation: id,
                source: source.clone(),
            });
        }
        trace!(operation = %id, tag = %operation.tag(), "apply");
        self.trace.push(OperationRecord {
            id,
            tag: operation.tag(),
            source: source.clone(),
            note: self.character.operation_data.note(id).map(str::to_string),
        });

        let result = match &operation.kind {
            OperationKind::CreateValue(change) => self
                .store
                .declare(CHARACTER_SCOPE, &change.variable, change.value.clone())
                .map(|_| ()),
            OperationKind::SetValue(change) => {
                self.store
                    .set(CHARACTER_SCOPE, &change.variable, change.value.clone())
            }
            OperationKind::AdjValue(change) => {
                self.store
                    .adjust(CHARACTER_SCOPE, &change.variable, &change.value)
            }
            OperationKind::RemoveValue(change) => {
                self.store
                    .remove_item(CHARACTER_SCOPE, &change.variable, &change.value)
            }
            OperationKind::AddBonusToValue(bonus) => {
                let mut entry = bonus.entry().with_operation(id);
                entry.source = source.clone();
                self.store.add_bonus(CHARACTER_SCOPE, &bonus.variable, entry)
            }
            OperationKind::GiveLanguage(give) => self.store.adjust(
                CHARACTER_SCOPE,
                LANGUAGE_NAMES,
                &VariableValue::String(give.language.clone()),
            ),
            OperationKind::GiveSpell(give) => self.store.adjust(
                CHARACTER_SCOPE,
                SPELL_IDS,
                &VariableValue::String(give.spell_id.clone()),
            ),
            OperationKind::GiveTrait(give) => self.store.adjust(
                CHARACTER_SCOPE,
                TRAIT_IDS,
                &VariableValue::Numeric(give.trait_id),
            ),
            OperationKind::Grant(grant) => {
                self.stack.push(Work::Expand {
                    entity: grant.entity.clone(),
                    via: Some(id),
                    parent: Some(frame),
                });
                Ok(())
            }
            OperationKind::Select(select) => {
                self.select(&operation, select, &frame)?;
                Ok(())
            }
            OperationKind::Conditional(cond) => {
                let holds = cond
                    .predicate
                    .evaluate(&self.store.scope(CHARACTER_SCOPE));
                trace!(operation = %id, holds, "conditional");
                let branch = if holds { &cond.then } else { &cond.otherwise };
                self.splice(branch, &frame)?;
                Ok(())
            }
            OperationKind::SendNotification(note) => {
                self.report.push(Issue::Notification {
                    operation: id,
                    title: note.title.clone(),
                    message: note.message.clone(),
                    source: source.clone(),
                });
                Ok(())
            }
        };

        self.absorb(Some(id), source.as_ref(), result)
    }

    /// Applies a `select`. A select reached again through another grant
    /// applies its choice again but is reported only once.
    fn select(
        &mut self,
        operation: &Operation,
        select: &Select,
        frame: &Frame,
    ) -> Result<(), ResolveError> {
        let first = !self
            .selections
            .iter()
            .any(|point| point.operation.id == operation.id);
        let stored = self.stored.get(&operation.id).copied();
        let state = match stored {
            None => {
                if first {
                    self.report.push(Issue::PendingSelection {
                        operation: operation.id,
                        title: select.title.clone(),
                        source: operation.source.clone(),
                    });
                }
                SelectionState::Pending
            }
            Some(raw) => match raw
                .parse::<OperationId>()
                .ok()
                .and_then(|option| select.option(option))
            {
                Some(option) => {
                    self.splice(&option.operations, frame)?;
                    SelectionState::Chosen { option: option.id }
                }
                None => {
                    if first {
                        warn!(operation = %operation.id, option = raw, "stale selection");
                        self.report.push(Issue::StaleSelection {
                            operation: operation.id,
                            title: select.title.clone(),
                            option: raw.to_string(),
                            source: operation.source.clone(),
                        });
                    }
                    SelectionState::Stale {
                        option: raw.to_string(),
                    }
                }
            },
        };

        if first {
            self.selections.push(SelectionPoint {
                operation: operation.clone(),
                state,
            });
        }
        Ok(())
    }

    /// Records a rejected store write in the report. Type mismatches leave
    /// the variable untouched and the pass continues.
    fn absorb(
        &mut self,
        operation: Option<OperationId>,
        source: Option<&ContentRef>,
        result: Result<(), StoreError>,
    ) -> Result<(), ResolveError> {
        match result {
            Ok(()) => Ok(()),
            Err(StoreError::TypeMismatch {
                variable,
                expected,
                found,
                ..
            }) => {
                warn!(%variable, %expected, %found, "type mismatch");
                self.report.push(Issue::TypeMismatch {
                    operation,
                    source: source.cloned(),
                    variable,
                    expected,
                    found,
                });
                Ok(())
            }
            Err(err @ StoreError::NotFound { .. }) => Err(ResolveError::store(self.phase, err)),
        }
    }

    fn finish(mut self) -> Result<Resolution, ResolveError> {
        let derived = finalize_derived(&mut self.store, CHARACTER_SCOPE);
        self.absorb(None, None, derived)?;

        let character = self.character;
        for (key, option) in &character.operation_data.selections {
            let reached = key
                .parse::<OperationId>()
                .is_ok_and(|id| self.selections.iter().any(|p| p.operation.id == id));
            if !reached {
                debug!(operation = %key, "orphaned selection");
                self.report.push(Issue::OrphanedSelection {
                    operation: key.clone(),
                    option: option.clone(),
                });
            }
        }

        Ok(Resolution {
            store: self.store,
            report: self.report,
            trace: self.trace,
            selections: self.selections,
        })
    }
}
