use crate::flood::structs::actor::ActorId;
use crate::flood::structs::vector_clock::VClock;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

/**
 * Bookkeeping for one sent cast that still has unacknowledged recipients.
 */
#[derive(Debug)]
pub struct RetransmitEntry {
    ///Actor that created the cast
    pub origin: ActorId,
    ///Cast payload
    pub payload: Vec<u8>,
    ///When the cast was last written to the transport
    pub last_sent: Instant,
    ///Recipients that have not acknowledged yet
    pub awaiting: BTreeSet<ActorId>,
}

/**
 * Sent casts indexed by timestamp, kept until every recipient
 * acknowledged them.
 */
#[derive(Debug)]
pub struct RetransmitQueue {
    entries: HashMap<VClock, RetransmitEntry>,
}

impl RetransmitQueue {
    pub fn new() -> RetransmitQueue {
        RetransmitQueue {
            entries: HashMap::new(),
        }
    }

    /**
     * Registers a sent cast. Nothing is kept when there is nobody to
     * wait for.
     *
     * # Arguments
     *
     * `ts` - Timestamp of the cast.
     *
     * `origin` - Actor that created the cast.
     *
     * `payload` - Cast payload.
     *
     * `awaiting` - Recipients the cast was sent to.
     */
    pub fn register(
        &mut self,
        ts: VClock,
        origin: ActorId,
        payload: Vec<u8>,
        awaiting: BTreeSet<ActorId>,
    ) {
        if awaiting.is_empty() {
            return;
        }

        self.entries.insert(
            ts,
            RetransmitEntry {
                origin,
                payload,
                last_sent: Instant::now(),
                awaiting,
            },
        );
    }

    /**
     * Removes a recipient from a cast's awaiting set, erasing the entry
     * once it drains. Returns false when the timestamp is unknown.
     *
     * # Arguments
     *
     * `ts` - Timestamp the acknowledgement refers to.
     *
     * `sender` - Acknowledging peer.
     */
    pub fn ack(&mut self, ts: &VClock, sender: &ActorId) -> bool {
        match self.entries.get_mut(ts) {
            Some(entry) => {
                entry.awaiting.remove(sender);

                if entry.awaiting.is_empty() {
                    self.entries.remove(ts);
                }

                true
            }
            None => false,
        }
    }

    /**
     * Iterates over the entries whose last send is older than the
     * threshold, for the periodic resend scan.
     *
     * # Arguments
     *
     * `resend_after` - Age threshold.
     */
    pub fn due_mut<'a>(
        &'a mut self,
        resend_after: Duration,
    ) -> impl Iterator<Item = (&'a VClock, &'a mut RetransmitEntry)> {
        self.entries
            .iter_mut()
            .filter(move |(_, entry)| entry.last_sent.elapsed() >= resend_after)
    }

    pub fn contains(&self, ts: &VClock) -> bool {
        self.entries.contains_key(ts)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(tag: u64) -> ActorId {
        ActorId::new("test", tag)
    }

    fn ts(tag: u64) -> VClock {
        let mut vc = VClock::fresh();
        vc.increment(&actor(tag));
        vc
    }

    #[test]
    fn entry_is_erased_once_everyone_acked() {
        let mut queue = RetransmitQueue::new();
        let awaiting: BTreeSet<ActorId> = vec![actor(1), actor(2)].into_iter().collect();
        queue.register(ts(0), actor(0), b"x".to_vec(), awaiting);

        assert!(queue.ack(&ts(0), &actor(1)));
        assert!(queue.contains(&ts(0)));
        assert!(queue.ack(&ts(0), &actor(2)));
        assert!(queue.is_empty());
    }

    #[test]
    fn unknown_acks_are_reported() {
        let mut queue = RetransmitQueue::new();

        assert!(!queue.ack(&ts(0), &actor(1)));
    }

    #[test]
    fn empty_recipient_sets_are_not_registered() {
        let mut queue = RetransmitQueue::new();
        queue.register(ts(0), actor(0), b"x".to_vec(), BTreeSet::new());

        assert!(queue.is_empty());
    }

    #[test]
    fn due_scan_honors_the_age_threshold() {
        let mut queue = RetransmitQueue::new();
        let awaiting: BTreeSet<ActorId> = vec![actor(1)].into_iter().collect();
        queue.register(ts(0), actor(0), b"x".to_vec(), awaiting);

        assert_eq!(queue.due_mut(Duration::from_secs(3600)).count(), 0);
        assert_eq!(queue.due_mut(Duration::from_millis(0)).count(), 1);
    }
}
