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
use async_std::task::sleep;
use clap::{App, Arg};
use std::time::Duration;
use zenoh_queryable::prelude::*;

fn parse_args() -> (Config, String, String, usize) {
    let args = App::new("zenoh queryable example")
        .arg(Arg::from_usage(
            "-c, --config=[FILE]      'A configuration file.'",
        ))
        .arg(
            Arg::from_usage("-k, --key=[KEYEXPR] 'The key expression matching queries to evaluate.'")
                .default_value("demo/example/zenoh-rs-queryable"),
        )
        .arg(
            Arg::from_usage("-v, --value=[VALUE] 'The value to reply to queries.'")
                .default_value("Queryable from Rust!"),
        )
        .arg(
            Arg::from_usage("-n, --count=[N] 'The number of queries to send to the queryable.'")
                .default_value("3"),
        )
        .get_matches();

    let config = match args.value_of("config") {
        Some(path) => Config::from_file(path).unwrap(),
        None => config::default(),
    };
    let key_expr = args.value_of("key").unwrap().to_string();
    let value = args.value_of("value").unwrap().to_string();
    let count: usize = args.value_of("count").unwrap().parse().unwrap();

    (config, key_expr, value, count)
}

#[async_std::main]
async fn main() {
    // initiate logging
    env_logger::init();

    let (config, key_expr, value, count) = parse_args();
    let hub = LocalHub::new();

    println!("Opening session...");
    let session = zenoh_queryable::open(config)
        .hub(&hub)
        .res_async()
        .await
        .unwrap();

    println!("Declaring Queryable on '{}'...", key_expr);
    let queryable = session
        .declare_queryable(&key_expr)
        .res_async()
        .await
        .unwrap();

    let querier = zenoh_queryable::open(config::peer())
        .hub(&hub)
        .res_async()
        .await
        .unwrap();
    let c_key_expr = key_expr.clone();
    let querying = async_std::task::spawn(async move {
        for idx in 0..count {
            sleep(Duration::from_secs(1)).await;
            let selector = format!("{}?idx={}", c_key_expr, idx);
            let replies = querier.get(&selector).res_async().await.unwrap();
            while let Ok(reply) = replies.recv_async().await {
                if let Ok(sample) = reply.sample {
                    println!(">> [Querier   ] Received ('{}': '{}')", sample.key_expr, sample.value);
                }
            }
        }
        querier.close().res_async().await.unwrap();
    });

    for _ in 0..count {
        let query = queryable.recv_async().await.unwrap();
        println!(">> [Queryable ] Received Query '{}'", query.selector());
        let sample = Sample::try_from(key_expr.clone(), value.clone()).unwrap();
        query.reply_async(sample).await.unwrap();
    }

    querying.await;
    queryable.undeclare().res_async().await.unwrap();
    session.close().res_async().await.unwrap();
}
