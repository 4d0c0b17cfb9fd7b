/// Policy for bonus entries that carry conditional text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConditionalPolicy {
    /// Conditional bonuses are never folded into a value; they are surfaced
    /// as player-invoked modifiers only.
    #[default]
    Advisory,

    /// Conditional bonuses whose operation sets `auto_apply` are folded in.
    /// Entries without the flag stay advisory.
    HonorAutoApply,
}

/// How negative entries of the same bonus type compete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PenaltyStacking {
    /// All same-type entries compete together; the largest signed amount wins.
    #[default]
    LargestSigned,

    /// Bonuses and penalties of a type are tracked apart: the largest
    /// positive entry and the most negative entry both apply.
    SeparatePenalties,
}

/// Resolver configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverConfig {
    /// Maximum nesting of grants, selections and conditionals on one path.
    pub max_grant_depth: usize,

    /// Maximum number of operations applied in one pass.
    pub max_operations: usize,

    pub conditional_policy: ConditionalPolicy,

    pub penalty_stacking: PenaltyStacking,
}

impl ResolverConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_GRANT_DEPTH: usize = 32;
    pub const DEFAULT_MAX_OPERATIONS: usize = 10_000;

    pub fn new() -> Self {
        Self {
            max_grant_depth: Self::DEFAULT_MAX_GRANT_DEPTH,
            max_operations: Self::DEFAULT_MAX_OPERATIONS,
            conditional_policy: ConditionalPolicy::default(),
            penalty_stacking: PenaltyStacking::default(),
        }
    }

    pub fn with_conditional_policy(mut self, policy: ConditionalPolicy) -> Self {
        self.conditional_policy = policy;
        self
    }

    pub fn with_penalty_stacking(mut self, stacking: PenaltyStacking) -> Self {
        self.penalty_stacking = stacking;
        self
    }

    pub fn with_max_operations(mut self, max_operations: usize) -> Self {
        self.max_operations = max_operations;
        self
    }

    pub fn with_max_grant_depth(mut self, max_grant_depth: usize) -> Self {
        self.max_grant_depth = max_grant_depth;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}
