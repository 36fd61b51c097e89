/*!

The record of traced contacts that a positive test walks.

History is a queue of per-step contact sets, oldest first. Storing step `t` drops every step
before `t - limit`: a positive test at step `t` only ever looks at steps `t - limit ..= t`, so
nothing the cascade could ask for is ever lost. Memory grows with the steps actually retained,
never with `limit` itself.

*/

use crate::{
    context::{Context, DataPlugin},
    network::NodeId,
    HashMap,
    HashSet,
};
use std::collections::VecDeque;

/// Traced contacts recorded during a single step, in both directions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepContacts {
    contacts: HashMap<NodeId, HashSet<NodeId>>,
}

impl StepContacts {
    /// Records the undirected contact `u`-`v`.
    pub fn record(&mut self, u: NodeId, v: NodeId) {
        self.contacts.entry(u).or_default().insert(v);
        self.contacts.entry(v).or_default().insert(u);
    }

    pub fn contacts_of(&self, node_id: NodeId) -> Option<&HashSet<NodeId>> {
        self.contacts.get(&node_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Number of distinct undirected contacts recorded.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.contacts.values().map(HashSet::len).sum::<usize>() / 2
    }
}

pub struct ContactHistory {
    limit: usize,
    // Sorted by step, at most one entry per step.
    steps: VecDeque<(usize, StepContacts)>,
    total_contacts: usize,
}

impl DataPlugin for ContactHistory {
    const new: &'static dyn Fn() -> Self = &|| ContactHistory::with_limit(0);
}

impl ContactHistory {
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        ContactHistory {
            limit,
            steps: VecDeque::new(),
            total_contacts: 0,
        }
    }

    /// How many steps before the current one are retained.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of steps currently held.
    #[must_use]
    pub fn retained_steps(&self) -> usize {
        self.steps.len()
    }

    /// Stores the contacts traced at step `t` and forgets every step older than `t - limit`.
    pub fn insert(&mut self, t: usize, contacts: StepContacts) {
        self.total_contacts += contacts.contact_count();
        match self.steps.binary_search_by_key(&t, |(step, _)| *step) {
            Ok(index) => self.steps[index].1 = contacts,
            Err(index) => self.steps.insert(index, (t, contacts)),
        }

        let oldest = t.saturating_sub(self.limit);
        while self.steps.front().is_some_and(|(step, _)| *step < oldest) {
            self.steps.pop_front();
        }
    }

    /// The contacts traced at step `t`, if step `t` is still retained.
    #[must_use]
    pub fn at(&self, t: usize) -> Option<&StepContacts> {
        self.steps
            .binary_search_by_key(&t, |(step, _)| *step)
            .ok()
            .map(|index| &self.steps[index].1)
    }

    /// Everyone `node_id` was traced as contacting at step `t`.
    pub fn contacts_at(&self, t: usize, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.at(t)
            .and_then(|contacts| contacts.contacts_of(node_id))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Everyone `node_id` was traced as contacting during the retained steps in `from ..= to`,
    /// with repeats.
    pub fn contacts_between(&self, node_id: NodeId, from: usize, to: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.steps
            .iter()
            .filter(move |(step, _)| (from..=to).contains(step))
            .filter_map(move |(_, contacts)| contacts.contacts_of(node_id))
            .flatten()
            .copied()
    }

    /// Total traced contacts ever recorded in this trial, including ones no longer retained.
    #[must_use]
    pub fn total_contacts(&self) -> usize {
        self.total_contacts
    }
}

pub trait ContextContactHistoryExt {
    /// Replaces the history with an empty one retaining `limit` past steps.
    fn init_contact_history(&mut self, limit: usize);

    fn get_contact_history(&self) -> Option<&ContactHistory>;

    fn record_contacts(&mut self, t: usize, contacts: StepContacts);

    /// Everyone `node_id` was traced as contacting during steps `from ..= to`, with repeats.
    fn traced_contacts_between(&self, node_id: NodeId, from: usize, to: usize) -> Vec<NodeId>;
}

impl ContextContactHistoryExt for Context {
    fn init_contact_history(&mut self, limit: usize) {
        *self.get_data_container_mut::<ContactHistory>() = ContactHistory::with_limit(limit);
    }

    fn get_contact_history(&self) -> Option<&ContactHistory> {
        self.get_data_container::<ContactHistory>()
    }

    fn record_contacts(&mut self, t: usize, contacts: StepContacts) {
        self.get_data_container_mut::<ContactHistory>()
            .insert(t, contacts);
    }

    fn traced_contacts_between(&self, node_id: NodeId, from: usize, to: usize) -> Vec<NodeId> {
        let Some(history) = self.get_contact_history() else {
            return Vec::new();
        };
        history.contacts_between(node_id, from, to).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contacts(pairs: &[(usize, usize)]) -> StepContacts {
        let mut step = StepContacts::default();
        for &(u, v) in pairs {
            step.record(NodeId(u), NodeId(v));
        }
        step
    }

    #[test]
    fn contacts_are_symmetric() {
        let step = contacts(&[(0, 1), (1, 2)]);
        assert!(step.contacts_of(NodeId(0)).unwrap().contains(&NodeId(1)));
        assert!(step.contacts_of(NodeId(1)).unwrap().contains(&NodeId(0)));
        assert_eq!(step.contacts_of(NodeId(1)).unwrap().len(), 2);
        assert_eq!(step.contact_count(), 2);
    }

    #[test]
    fn window_keeps_limit_plus_one_steps() {
        let mut history = ContactHistory::with_limit(2);
        for t in 0..5 {
            history.insert(t, contacts(&[(t, t + 1)]));
        }
        assert!(history.at(0).is_none());
        assert!(history.at(1).is_none());
        assert_eq!(history.retained_steps(), 3);
        for t in 2..5 {
            let mut traced: Vec<NodeId> = history.contacts_at(t, NodeId(t)).collect();
            traced.sort();
            assert_eq!(traced, vec![NodeId(t + 1)]);
        }
        assert_eq!(history.total_contacts(), 5);
    }

    #[test]
    fn zero_limit_keeps_only_current_step() {
        let mut history = ContactHistory::with_limit(0);
        history.insert(0, contacts(&[(0, 1)]));
        history.insert(1, contacts(&[(1, 2)]));
        assert!(history.at(0).is_none());
        assert_eq!(history.contacts_at(1, NodeId(2)).collect::<Vec<_>>(), vec![NodeId(1)]);
    }

    #[test]
    fn unrecorded_steps_are_empty() {
        let history = ContactHistory::with_limit(3);
        assert_eq!(history.contacts_at(2, NodeId(0)).count(), 0);
    }

    #[test]
    fn context_lookup_spans_window() {
        let mut context = Context::new();
        context.init_contact_history(5);
        context.record_contacts(3, contacts(&[(0, 1)]));
        context.record_contacts(4, contacts(&[(0, 2), (0, 1)]));
        let mut traced = context.traced_contacts_between(NodeId(0), 0, 4);
        traced.sort();
        assert_eq!(traced, vec![NodeId(1), NodeId(1), NodeId(2)]);
        assert!(context.traced_contacts_between(NodeId(0), 0, 2).is_empty());
    }

    #[test]
    fn huge_limit_keeps_only_recorded_steps() {
        for limit in [usize::MAX, 1 << 40] {
            let mut history = ContactHistory::with_limit(limit);
            assert_eq!(history.limit(), limit);
            for t in 0..4 {
                history.insert(t, contacts(&[(0, t + 1)]));
            }
            assert_eq!(history.retained_steps(), 4);
            assert_eq!(history.contacts_between(NodeId(0), 0, 3).count(), 4);
            assert_eq!(history.contacts_at(0, NodeId(1)).collect::<Vec<_>>(), vec![NodeId(0)]);
        }
    }

    #[test]
    fn rewriting_a_step_replaces_it() {
        let mut history = ContactHistory::with_limit(1);
        history.insert(0, contacts(&[(0, 1)]));
        history.insert(0, contacts(&[(0, 2)]));
        assert_eq!(history.retained_steps(), 1);
        assert_eq!(history.contacts_at(0, NodeId(0)).collect::<Vec<_>>(), vec![NodeId(2)]);
    }
}
