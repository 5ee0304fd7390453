use super::messages::{CodecError, NetMessage};
use super::PlayerId;
use log::{debug, warn};
use std::collections::{BTreeMap, VecDeque};

/// An in-process stand-in for a room's message channel.  Every message is
/// encoded to JSON on send and decoded on receipt, exactly as it would be on
/// a real connection, and is delivered to every peer except its sender.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct LoopbackRelay {
    inboxes: BTreeMap<PlayerId, VecDeque<String>>,
}

impl LoopbackRelay {
    pub(crate) fn new() -> LoopbackRelay {
        LoopbackRelay::default()
    }

    /// Register a peer.  Messages sent before a peer joins are not delivered
    /// to it.
    pub(crate) fn join(&mut self, peer: PlayerId) {
        self.inboxes.entry(peer).or_default();
    }

    pub(crate) fn send(&mut self, from: PlayerId, msg: &NetMessage) -> Result<(), CodecError> {
        let src = msg.encode()?;
        for (&peer, inbox) in &mut self.inboxes {
            if peer != from {
                inbox.push_back(src.clone());
            }
        }
        debug!("Relayed from {from}: {src}");
        Ok(())
    }

    /// Take the next message waiting for `peer`.  Messages that fail to
    /// decode are logged and skipped.
    pub(crate) fn recv(&mut self, peer: PlayerId) -> Option<NetMessage> {
        let inbox = self.inboxes.get_mut(&peer)?;
        while let Some(src) = inbox.pop_front() {
            match NetMessage::decode(&src) {
                Ok(msg) => return Some(msg),
                Err(e) => warn!("Dropping message for {peer}: {e}"),
            }
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn pending(&self, peer: PlayerId) -> usize {
        self.inboxes.get(&peer).map_or(0, VecDeque::len)
    }

    #[cfg(test)]
    fn inject(&mut self, peer: PlayerId, raw: &str) {
        self.inboxes.entry(peer).or_default().push_back(raw.to_owned());
    }
}
