/**
 * Thread for accepting connections from the other peers.
 */
pub mod acceptor;
/**
 * Connects to the other peers' acceptor threads.
 */
pub mod connector;
/**
 * Initial handshake process between peers.
 */
pub mod handshake;
/**
 * Reads frames sent from another peer.
 */
pub mod reader;
/**
 * Sends frames to another peer.
 */
pub mod sender;
/**
 * Outgoing seam between the engine and the peer service.
 */
pub mod transport;
