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
use async_std::prelude::FutureExt;
use async_std::task;
use std::sync::Arc;
use std::time::Duration;
use zenoh_queryable::net::fabric::Fabric;
use zenoh_queryable::net::protocol::message::ZenohMessage;
use zenoh_queryable::prelude::*;
use zenoh_queryable::ZErrorKind;

const TIMEOUT: Duration = Duration::from_secs(60);

macro_rules! ztimeout {
    ($f:expr) => {
        $f.timeout(TIMEOUT).await.unwrap()
    };
}

async fn open_session(hub: &LocalHub) -> Session {
    let _ = env_logger::try_init();
    ztimeout!(zenoh_queryable::open(config::peer()).hub(hub).res_async()).unwrap()
}

async fn collect(replies: flume::Receiver<Reply>) -> Vec<Reply> {
    let mut received = vec![];
    while let Ok(reply) = ztimeout!(replies.recv_async()) {
        received.push(reply);
    }
    received
}

fn replier(session: &Session, key_expr: &'static str) -> Queryable<()> {
    let id = session.id();
    session
        .declare_queryable(key_expr)
        .callback(move |query| {
            for n in 0..2 {
                let sample = Sample::try_from("test/session/x", format!("{}-{}", id, n)).unwrap();
                query.reply(sample).unwrap();
            }
        })
        .res()
        .unwrap()
}

#[test]
fn session_remote_replies() {
    task::block_on(async {
        let hub = LocalHub::new();
        println!("[  ][01a] Opening 3 sessions");
        let peer01 = open_session(&hub).await;
        let peer02 = open_session(&hub).await;
        let peer03 = open_session(&hub).await;
        assert_eq!(hub.peers().len(), 3);

        let _q01 = replier(&peer01, "test/session/*");
        let _q02 = replier(&peer02, "test/session/**");

        println!("[QR][02a] Getting from peer03");
        let replies = ztimeout!(peer03.get("test/session/x").res_async()).unwrap();
        let received = collect(replies).await;
        assert_eq!(received.len(), 4);
        for peer in [&peer01, &peer02] {
            let values: Vec<String> = received
                .iter()
                .filter(|reply| reply.replier_id.to_string() == peer.id())
                .map(|reply| reply.sample.as_ref().unwrap().value.to_string())
                .collect();
            assert_eq!(
                values,
                vec![format!("{}-0", peer.id()), format!("{}-1", peer.id())]
            );
        }

        println!("[QR][03a] Closing peer02");
        ztimeout!(peer02.close().res_async()).unwrap();
        assert_eq!(hub.peers().len(), 2);
        let replies = ztimeout!(peer03.get("test/session/x").res_async()).unwrap();
        assert_eq!(collect(replies).await.len(), 2);

        ztimeout!(peer01.close().res_async()).unwrap();
        ztimeout!(peer03.close().res_async()).unwrap();
    });
}

#[test]
fn session_local_routing() {
    task::block_on(async {
        let hub = LocalHub::new();
        let peer01 = open_session(&hub).await;
        let peer02 = open_session(&hub).await;
        let _q01 = replier(&peer01, "test/session/**");
        let _q02 = replier(&peer02, "test/session/**");

        let replies = ztimeout!(peer01.get("test/session/x").res_async()).unwrap();
        assert_eq!(collect(replies).await.len(), 4);

        println!("[QR][01b] Getting without local routing");
        let replies = ztimeout!(peer01
            .get("test/session/x")
            .local_routing(false)
            .res_async())
        .unwrap();
        let received = collect(replies).await;
        assert_eq!(received.len(), 2);
        assert!(received
            .iter()
            .all(|reply| reply.replier_id.to_string() == peer02.id()));

        ztimeout!(peer01.close().res_async()).unwrap();
        ztimeout!(peer02.close().res_async()).unwrap();
    });
}

#[test]
fn session_remote_timeout() {
    task::block_on(async {
        let hub = LocalHub::new();
        let peer01 = open_session(&hub).await;
        let peer02 = open_session(&hub).await;
        let queryable = ztimeout!(peer01.declare_queryable("test/session/slow").res_async()).unwrap();

        let replies = ztimeout!(peer02
            .get("test/session/slow")
            .timeout(Duration::from_millis(500))
            .res_async())
        .unwrap();
        let query = ztimeout!(queryable.recv_async()).unwrap();
        let received = collect(replies).await;
        assert_eq!(received.len(), 1);
        assert!(matches!(
            received[0].sample,
            Err(ZErrorKind::Timeout { .. })
        ));
        assert_eq!(received[0].replier_id.to_string(), peer02.id());
        drop(query);

        ztimeout!(peer01.close().res_async()).unwrap();
        ztimeout!(peer02.close().res_async()).unwrap();
    });
}

#[test]
fn session_inbound_queries() {
    task::block_on(async {
        let hub = LocalHub::new();
        let peer01 = open_session(&hub).await;
        let pid: PeerId = peer01.id().parse().unwrap();
        let _q01 = ztimeout!(peer01
            .declare_queryable("test/session/*")
            .callback(|query| {
                // Queries with ambiguous parameters are not answered.
                if let Ok(parameters) = query.decode_value_selector() {
                    let value = parameters.get("x").cloned().unwrap_or_default();
                    query
                        .reply(Sample::try_from("test/session/in", value).unwrap())
                        .unwrap();
                }
            })
            .res_async())
        .unwrap();

        let remote_id = PeerId::rand();
        let link = hub.join(remote_id);

        println!("[QR][01d] Delivering a query with an invalid key expression");
        let err = peer01
            .deliver_query(remote_id, 7, "test/a*b?x=1", QueryTarget::All)
            .unwrap_err();
        assert!(matches!(err.kind(), ZErrorKind::InvalidKeyExpr { .. }));
        match ztimeout!(link.recv()).unwrap() {
            (origin, ZenohMessage::ReplyFinal { qid }) => {
                assert_eq!(origin, pid);
                assert_eq!(qid, 7);
            }
            other => panic!("Unexpected message {:?}", other),
        }

        println!("[QR][02d] Delivering a valid query");
        let dispatched = peer01
            .deliver_query(remote_id, 8, "test/session/in?x=42", QueryTarget::All)
            .unwrap();
        assert_eq!(dispatched, 1);
        match ztimeout!(link.recv()).unwrap() {
            (_, ZenohMessage::ReplyData {
                qid,
                replier_id,
                sample,
            }) => {
                assert_eq!(qid, 8);
                assert_eq!(replier_id, pid);
                assert_eq!(sample.value.to_string(), "42");
            }
            other => panic!("Unexpected message {:?}", other),
        }
        assert!(matches!(
            ztimeout!(link.recv()).unwrap(),
            (_, ZenohMessage::ReplyFinal { qid: 8 })
        ));

        println!("[QR][03d] Sending a query through the fabric");
        ztimeout!(link.send(
            &pid,
            ZenohMessage::Query {
                key_expr: "test//session/in".to_string(),
                value_selector: "x=1&x=2".to_string(),
                qid: 9,
                target: QueryTarget::All,
                consolidation: ConsolidationMode::None,
            },
        ))
        .unwrap();
        // The duplicate parameter is rejected by the queryable: no reply, only the final.
        assert!(matches!(
            ztimeout!(link.recv()).unwrap(),
            (_, ZenohMessage::ReplyFinal { qid: 9 })
        ));

        println!("[QR][04d] Sending a query with an invalid key expression through the fabric");
        ztimeout!(link.send(
            &pid,
            ZenohMessage::Query {
                key_expr: "test/a*b".to_string(),
                value_selector: String::new(),
                qid: 10,
                target: QueryTarget::All,
                consolidation: ConsolidationMode::None,
            },
        ))
        .unwrap();
        assert!(matches!(
            ztimeout!(link.recv()).unwrap(),
            (_, ZenohMessage::ReplyFinal { qid: 10 })
        ));
        assert_eq!(
            peer01
                .deliver_query(remote_id, 11, "test/session/in?x=5", QueryTarget::All)
                .unwrap(),
            1
        );

        link.close().await;
        ztimeout!(peer01.close().res_async()).unwrap();
    });
}

#[test]
fn session_custom_fabric() {
    task::block_on(async {
        let hub = LocalHub::new();
        let link: Arc<dyn Fabric> = Arc::new(hub.join(PeerId::rand()));
        let pid = link.pid();
        let session = ztimeout!(zenoh_queryable::open(config::peer())
            .fabric(link)
            .res_async())
        .unwrap();
        assert_eq!(session.id(), pid.to_string());
        assert!(session.hlc().is_some());
        ztimeout!(session.close().res_async()).unwrap();
        assert!(hub.peers().is_empty());
    });
}
