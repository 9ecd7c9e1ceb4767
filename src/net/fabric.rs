//
// Copyright (c) 2022 ZettaScale Technology
//
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// http://www.eclipse.org/legal/epl-2.0, or the Apache License, Version 2.0
// which is available at https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: EPL-2.0 OR Apache-2.0
//
// Contributors:
//   ZettaScale Zenoh Team, <zenoh@zettascale.tech>
//

//! The network fabric: message send/receive between peers and peer membership.
use super::protocol::core::PeerId;
use super::protocol::message::ZenohMessage;
use crate::core::{ZErrorKind, ZResult};
use crate::FABRIC_CHANNEL_SIZE;
use async_trait::async_trait;
use flume::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// What a session needs from the network it is attached to.
#[async_trait]
pub trait Fabric: Send + Sync {
    /// The id of the local peer on this fabric.
    fn pid(&self) -> PeerId;

    /// The remote peers currently reachable, the local one excluded.
    fn peers(&self) -> Vec<PeerId>;

    async fn send(&self, dest: &PeerId, msg: ZenohMessage) -> ZResult<()>;

    /// Waits for the next inbound message and its origin.
    ///
    /// Fails once the fabric is closed.
    async fn recv(&self) -> ZResult<(PeerId, ZenohMessage)>;

    async fn close(&self);
}

type Links = HashMap<PeerId, Sender<(PeerId, ZenohMessage)>>;

/// An in-process fabric: every [`LocalLink`] joined to a hub reaches every other one.
#[derive(Clone, Default)]
pub struct LocalHub {
    links: Arc<RwLock<Links>>,
}

impl LocalHub {
    pub fn new() -> LocalHub {
        LocalHub::default()
    }

    /// Attaches a new peer to this hub.
    pub fn join(&self, pid: PeerId) -> LocalLink {
        let (sender, receiver) = flume::bounded(*FABRIC_CHANNEL_SIZE);
        log::trace!("Peer {} joins local hub", pid);
        zwrite!(self.links).insert(pid, sender);
        LocalLink {
            pid,
            hub: self.clone(),
            receiver,
        }
    }

    /// The peers currently attached to this hub.
    pub fn peers(&self) -> Vec<PeerId> {
        zread!(self.links).keys().copied().collect()
    }
}

/// A peer's attachment to a [`LocalHub`].
pub struct LocalLink {
    pid: PeerId,
    hub: LocalHub,
    receiver: Receiver<(PeerId, ZenohMessage)>,
}

#[async_trait]
impl Fabric for LocalLink {
    fn pid(&self) -> PeerId {
        self.pid
    }

    fn peers(&self) -> Vec<PeerId> {
        zread!(self.hub.links)
            .keys()
            .filter(|pid| **pid != self.pid)
            .copied()
            .collect()
    }

    async fn send(&self, dest: &PeerId, msg: ZenohMessage) -> ZResult<()> {
        let sender = zread!(self.hub.links).get(dest).cloned();
        let sender = match sender {
            Some(sender) => sender,
            None => {
                return zerror!(ZErrorKind::IoError {
                    descr: format!("Peer {} is not reachable", dest),
                })
            }
        };
        sender.send_async((self.pid, msg)).await.map_err(|e| {
            zerror2!(ZErrorKind::IoError {
                descr: format!("Failed to send to {}: {}", dest, e),
            })
        })
    }

    async fn recv(&self) -> ZResult<(PeerId, ZenohMessage)> {
        self.receiver.recv_async().await.map_err(|e| {
            zerror2!(ZErrorKind::IoError {
                descr: format!("Link of {} closed: {}", self.pid, e),
            })
        })
    }

    async fn close(&self) {
        log::trace!("Peer {} leaves local hub", self.pid);
        zwrite!(self.hub.links).remove(&self.pid);
    }
}

impl Drop for LocalLink {
    fn drop(&mut self) {
        zwrite!(self.hub.links).remove(&self.pid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_std::task;

    #[test]
    fn local_hub_membership_and_delivery() {
        task::block_on(async {
            let hub = LocalHub::new();
            let (a, b) = (PeerId::rand(), PeerId::rand());
            let link_a = hub.join(a);
            let link_b = hub.join(b);
            assert_eq!(link_a.peers(), vec![b]);
            assert_eq!(link_b.peers(), vec![a]);

            link_a
                .send(&b, ZenohMessage::ReplyFinal { qid: 7 })
                .await
                .unwrap();
            match link_b.recv().await.unwrap() {
                (origin, ZenohMessage::ReplyFinal { qid }) => {
                    assert_eq!(origin, a);
                    assert_eq!(qid, 7);
                }
                other => panic!("Unexpected message {:?}", other),
            }

            link_b.close().await;
            assert!(link_a.peers().is_empty());
            assert!(link_a
                .send(&b, ZenohMessage::ReplyFinal { qid: 8 })
                .await
                .is_err());
            assert!(link_b.recv().await.is_err());
        });
    }
}
