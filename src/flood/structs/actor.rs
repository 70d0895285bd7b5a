use std::fmt;

/**
 * Globally unique, totally ordered identity of a node in the group.
 * Derived once at startup from a host name plus a locally unique tag
 * and stable for the lifetime of the process.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId {
    ///Host part of the identity
    host: String,
    ///Disambiguating tag within the host
    tag: u64,
}

impl ActorId {
    /**
     * Builds a new actor identity.
     *
     * # Arguments
     *
     * `host` - Host name part of the identity.
     *
     * `tag` - Unique integer within the host.
     */
    pub fn new(host: &str, tag: u64) -> ActorId {
        ActorId {
            host: host.to_string(),
            tag,
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.tag)
    }
}
