use crate::flood::structs::actor::ActorId;
use crate::flood::structs::vector_clock::VClock;
use std::collections::{BTreeSet, HashMap};

/**
 * Most recent timestamp observed from each origin, one row per actor.
 * The pointwise minimum over the rows of the current membership plus the
 * local node is the stable version vector: every timestamp it descends
 * has been observed by the whole group.
 */
#[derive(Debug)]
pub struct TimestampMatrix {
    rows: HashMap<ActorId, VClock>,
}

impl TimestampMatrix {
    /**
     * Builds an empty matrix with a fresh row per group member.
     *
     * # Arguments
     *
     * `actor` - Local node's identity.
     *
     * `members` - Current member set, excluding the local node.
     */
    pub fn new(actor: &ActorId, members: &BTreeSet<ActorId>) -> TimestampMatrix {
        let mut rows = HashMap::new();
        rows.insert(actor.clone(), VClock::fresh());

        for member in members {
            rows.insert(member.clone(), VClock::fresh());
        }

        TimestampMatrix { rows }
    }

    /**
     * Merges an observed timestamp into its origin's row. Returns true
     * when the row changed.
     *
     * # Arguments
     *
     * `origin` - Actor the timestamp originated from.
     *
     * `ts` - Observed timestamp.
     */
    pub fn observe(&mut self, origin: &ActorId, ts: &VClock) -> bool {
        let row = self
            .rows
            .entry(origin.clone())
            .or_insert_with(VClock::fresh);

        if row.descends(ts) {
            return false;
        }

        row.merge(ts);
        true
    }

    /**
     * Replaces the local row with the node's current causal knowledge.
     *
     * # Arguments
     *
     * `actor` - Local node's identity.
     *
     * `vv` - The node's vector clock after the latest broadcast or delivery.
     */
    pub fn update_local(&mut self, actor: &ActorId, vv: &VClock) {
        self.rows.insert(actor.clone(), vv.clone());
    }

    /**
     * Adjusts the rows to a new member set: departed members lose their
     * row and joiners start from a fresh one, which conservatively holds
     * the stable vector down until they catch up.
     *
     * # Arguments
     *
     * `actor` - Local node's identity, whose row is always kept.
     *
     * `members` - The new member set, excluding the local node.
     */
    pub fn rescope(&mut self, actor: &ActorId, members: &BTreeSet<ActorId>) {
        self.rows
            .retain(|row_actor, _| row_actor == actor || members.contains(row_actor));

        for member in members {
            self.rows.entry(member.clone()).or_insert_with(VClock::fresh);
        }
    }

    /**
     * Recomputes the stable version vector: the pointwise minimum over
     * the rows of the given members plus the local node.
     *
     * # Arguments
     *
     * `actor` - Local node's identity.
     *
     * `members` - Current member set, excluding the local node.
     */
    pub fn stable_vector(&self, actor: &ActorId, members: &BTreeSet<ActorId>) -> VClock {
        let mut svv = match self.rows.get(actor) {
            Some(row) => row.clone(),
            None => return VClock::fresh(),
        };

        for member in members {
            match self.rows.get(member) {
                Some(row) => svv = svv.glb(row),
                None => return VClock::fresh(),
            }
        }

        svv
    }

    /**
     * Reads an actor's row.
     */
    pub fn row(&self, actor: &ActorId) -> Option<&VClock> {
        self.rows.get(actor)
    }
}
