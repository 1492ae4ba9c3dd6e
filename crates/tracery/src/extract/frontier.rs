//! Open ends of the traversal.

use tracery_core::step::StepId;

/// The set of steps the next constructed step connects from, together with
/// the level that step will occupy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Frontier {
    level: u32,
    parents: Vec<StepId>,
}

impl Frontier {
    /// The frontier before any step exists.
    pub(crate) fn root() -> Self {
        Self::default()
    }

    /// A frontier consisting of one freshly created step.
    pub(crate) fn single(level: u32, parent: StepId) -> Self {
        Self {
            level,
            parents: vec![parent],
        }
    }

    pub(crate) fn level(&self) -> u32 {
        self.level
    }

    pub(crate) fn parents(&self) -> &[StepId] {
        &self.parents
    }

    pub(crate) fn first_parent(&self) -> Option<&StepId> {
        self.parents.first()
    }

    /// Joins two frontiers where control flow reconverges.
    ///
    /// Parents keep first-seen order with duplicates removed; the level is
    /// the deeper of the two.
    pub(crate) fn union(mut self, other: Frontier) -> Frontier {
        self.level = self.level.max(other.level);
        for parent in other.parents {
            if !self.parents.contains(&parent) {
                self.parents.push(parent);
            }
        }
        self
    }

    /// Folds any number of branch ends into one frontier.
    ///
    /// Returns `None` when there is nothing to merge.
    pub(crate) fn merge<I>(frontiers: I) -> Option<Self>
    where
        I: IntoIterator<Item = Frontier>,
    {
        frontiers.into_iter().reduce(Frontier::union)
    }
}
