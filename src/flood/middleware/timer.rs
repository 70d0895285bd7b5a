use crate::flood::structs::messages::EngineEvent;
use crossbeam::Sender;
use std::thread;
use std::time::Duration;

/**
 * Timer loop driving the periodic retransmit scan. Posts a tick into the
 * middleware mailbox so the scan serializes with every other event, and
 * ends once the middleware goes away.
 *
 * # Arguments
 *
 * `middleware_channel` - Channel to the middleware thread.
 *
 * `period` - Time between ticks.
 */
pub fn start(middleware_channel: Sender<EngineEvent>, period: Duration) {
    loop {
        thread::sleep(period);

        if middleware_channel.send(EngineEvent::Tick).is_err() {
            break;
        }
    }
}
