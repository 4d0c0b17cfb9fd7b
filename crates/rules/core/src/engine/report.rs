//! Non-fatal findings of a resolution pass.

use std::collections::BTreeMap;

use crate::content::ContentRef;
use crate::operation::{Operation, OperationId, OperationTag};
use crate::variable::VariableType;

/// One finding recorded while resolving.
#[derive(Clone, Debug, PartialEq, Eq, strum::EnumDiscriminants)]
#[strum_discriminants(
    name(IssueKind),
    derive(Hash, PartialOrd, Ord, strum::Display, strum::AsRefStr),
    strum(serialize_all = "snake_case")
)]
#[cfg_attr(
    feature = "serde",
    strum_discriminants(derive(serde::Serialize, serde::Deserialize)),
    strum_discriminants(serde(rename_all = "snake_case"))
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Issue {
    /// A `select` with no stored choice; its options were skipped.
    PendingSelection {
        operation: OperationId,
        title: String,
        source: Option<ContentRef>,
    },

    /// A stored choice naming an option the `select` no longer offers.
    StaleSelection {
        operation: OperationId,
        title: String,
        option: String,
        source: Option<ContentRef>,
    },

    /// A stored choice whose key matched no `select` reached in the pass.
    OrphanedSelection { operation: String, option: String },

    /// An operation targeted a variable of an incompatible type. The
    /// variable was left unchanged.
    TypeMismatch {
        operation: Option<OperationId>,
        source: Option<ContentRef>,
        variable: String,
        expected: VariableType,
        found: VariableType,
    },

    /// A grant revisited an entity already on its expansion path. The
    /// branch was dropped.
    CyclicGrant {
        operation: Option<OperationId>,
        entity: ContentRef,
        path: Vec<ContentRef>,
    },

    /// A referenced entity is unknown to the content provider.
    MissingContent {
        operation: Option<OperationId>,
        entity: ContentRef,
    },

    /// An operation id was applied more than once in the pass.
    DuplicateOperation {
        operation: OperationId,
        source: Option<ContentRef>,
    },

    /// Message raised by a `sendNotification` operation.
    Notification {
        operation: OperationId,
        title: String,
        message: String,
        source: Option<ContentRef>,
    },
}

impl Issue {
    pub fn kind(&self) -> IssueKind {
        IssueKind::from(self)
    }
}

impl IssueKind {
    /// Kinds that indicate content or stored choices out of sync.
    pub const fn needs_attention(&self) -> bool {
        matches!(
            self,
            Self::StaleSelection | Self::OrphanedSelection | Self::TypeMismatch | Self::CyclicGrant
        )
    }
}

impl core::fmt::Display for Issue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PendingSelection { title, .. } => write!(f, "selection pending: {}", title),
            Self::StaleSelection { title, option, .. } => {
                write!(f, "selection {} no longer offers option {}", title, option)
            }
            Self::OrphanedSelection { operation, .. } => {
                write!(f, "stored selection {} matches no operation", operation)
            }
            Self::TypeMismatch {
                variable,
                expected,
                found,
                ..
            } => write!(f, "{} is {}, operation supplied {}", variable, expected, found),
            Self::CyclicGrant { entity, .. } => write!(f, "cyclic grant of {}", entity),
            Self::MissingContent { entity, .. } => write!(f, "unknown content {}", entity),
            Self::DuplicateOperation { operation, .. } => {
                write!(f, "operation {} applied more than once", operation)
            }
            Self::Notification { title, message, .. } => write!(f, "{}: {}", title, message),
        }
    }
}

/// Accumulated findings of one pass, in the order they were met.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ResolutionReport {
    issues: Vec<Issue>,
}

impl ResolutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind() == kind)
    }

    /// Number of findings per kind.
    pub fn counts(&self) -> BTreeMap<IssueKind, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind()).or_insert(0) += 1;
        }
        counts
    }

    pub fn needs_attention(&self) -> bool {
        self.issues.iter().any(|i| i.kind().needs_attention())
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }
}

/// One applied operation, in application order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationRecord {
    pub id: OperationId,
    pub tag: OperationTag,
    pub source: Option<ContentRef>,
    /// Player note stored for this operation.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub note: Option<String>,
}

/// State of a `select` operation reached during the pass.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", rename_all = "snake_case"))]
pub enum SelectionState {
    Pending,
    Chosen { option: OperationId },
    Stale { option: String },
}

/// A `select` operation reached during the pass with its choice state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionPoint {
    pub operation: Operation,
    pub state: SelectionState,
}

impl SelectionPoint {
    pub fn is_pending(&self) -> bool {
        matches!(self.state, SelectionState::Pending)
    }
}
