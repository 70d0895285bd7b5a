use super::actor::ActorId;
use std::collections::BTreeMap;

/**
 * Vector clock mapping actor identities to monotone counters.
 * Absent entries read as zero and zero entries are never stored, so the
 * derived equality is pointwise equality. The sorted map representation
 * also fixes the wire order of the entries.
 */
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VClock(BTreeMap<ActorId, u64>);

impl VClock {
    /**
     * Creates an empty vector clock.
     */
    pub fn fresh() -> VClock {
        VClock(BTreeMap::new())
    }

    /**
     * Reads an actor's counter. Absent entries read as zero.
     *
     * # Arguments
     *
     * `actor` - Actor whose counter to read.
     */
    pub fn get(&self, actor: &ActorId) -> u64 {
        match self.0.get(actor) {
            Some(counter) => *counter,
            None => 0,
        }
    }

    /**
     * Advances an actor's counter by one and returns the new value.
     *
     * # Arguments
     *
     * `actor` - Actor whose counter to advance.
     */
    pub fn increment(&mut self, actor: &ActorId) -> u64 {
        let counter = self.0.entry(actor.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    /**
     * Merges another clock into this one by pointwise maximum.
     *
     * # Arguments
     *
     * `other` - Clock to merge in.
     */
    pub fn merge(&mut self, other: &VClock) {
        for (actor, counter) in &other.0 {
            let entry = self.0.entry(actor.clone()).or_insert(0);
            if *counter > *entry {
                *entry = *counter;
            }
        }
    }

    /**
     * Returns the pointwise minimum of two clocks. Only entries that are
     * positive on both sides survive.
     *
     * # Arguments
     *
     * `other` - Clock to take the minimum against.
     */
    pub fn glb(&self, other: &VClock) -> VClock {
        let mut floor = BTreeMap::new();

        for (actor, counter) in &self.0 {
            let min = (*counter).min(other.get(actor));
            if min > 0 {
                floor.insert(actor.clone(), min);
            }
        }

        VClock(floor)
    }

    /**
     * Checks if this clock is pointwise greater or equal to another.
     *
     * # Arguments
     *
     * `other` - The smaller clock.
     */
    pub fn descends(&self, other: &VClock) -> bool {
        other
            .0
            .iter()
            .all(|(actor, counter)| self.get(actor) >= *counter)
    }

    /**
     * Checks if this clock strictly dominates another: pointwise greater
     * or equal, and different in at least one entry.
     *
     * # Arguments
     *
     * `other` - The smaller clock.
     */
    pub fn dominates(&self, other: &VClock) -> bool {
        self.descends(other) && self != other
    }

    /**
     * The causal delivery precondition: a cast tagged `ts` by `origin` is
     * ready when it is the origin's next message and every other entry of
     * its timestamp is already covered by this clock.
     *
     * # Arguments
     *
     * `origin` - Actor that created the timestamp.
     *
     * `ts` - Timestamp of the received cast.
     */
    pub fn admits(&self, origin: &ActorId, ts: &VClock) -> bool {
        if ts.get(origin) != self.get(origin) + 1 {
            return false;
        }

        ts.0.iter()
            .all(|(actor, counter)| actor == origin || *counter <= self.get(actor))
    }

    /**
     * Iterates over the positive entries in actor order.
     */
    pub fn entries(&self) -> impl Iterator<Item = (&ActorId, u64)> {
        self.0.iter().map(|(actor, counter)| (actor, *counter))
    }

    /**
     * Number of positive entries.
     */
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
