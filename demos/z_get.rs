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
use clap::{App, Arg};
use std::time::Duration;
use zenoh_queryable::prelude::*;

//
// Argument parsing -- look at the main for the zenoh-related code
//
fn parse_args() -> (Config, String, QueryTarget, Duration) {
    let args = App::new("zenoh get example")
        .arg(Arg::from_usage(
            "-c, --config=[FILE]      'A configuration file.'",
        ))
        .arg(
            Arg::from_usage("-s, --selector=[SELECTOR] 'The selection of resources to query'")
                .default_value("demo/example/**"),
        )
        .arg(
            Arg::from_usage("-t, --target=[TARGET] 'The target queryables of the query'")
                .possible_values(&["BEST_MATCHING", "ALL", "ALL_COMPLETE"])
                .default_value("ALL"),
        )
        .arg(
            Arg::from_usage("-o, --timeout=[TIME] 'The query timeout in milliseconds'")
                .default_value("10000"),
        )
        .get_matches();

    let config = match args.value_of("config") {
        Some(path) => Config::from_file(path).unwrap(),
        None => config::default(),
    };
    let selector = args.value_of("selector").unwrap().to_string();
    let target = match args.value_of("target") {
        Some("BEST_MATCHING") => QueryTarget::BestMatching,
        Some("ALL_COMPLETE") => QueryTarget::AllComplete,
        _ => QueryTarget::All,
    };
    let timeout = Duration::from_millis(args.value_of("timeout").unwrap().parse().unwrap());

    (config, selector, target, timeout)
}

#[async_std::main]
async fn main() {
    // initiate logging
    env_logger::init();

    let (config, selector, target, timeout) = parse_args();
    let hub = LocalHub::new();

    println!("Opening replier session...");
    let replier = zenoh_queryable::open(config::peer())
        .hub(&hub)
        .res_async()
        .await
        .unwrap();
    let _queryable = replier
        .declare_queryable("demo/example/**")
        .callback(|query| {
            let key_expr = match query.key_expr().as_str() {
                "demo/example/**" => "demo/example/zenoh-rs-get",
                key_expr => key_expr,
            };
            let value = format!("Reply to '{}'", query.selector());
            if let Err(e) = Sample::try_from(key_expr, value).and_then(|s| query.reply(s)) {
                println!(">> [Queryable ] Failed to reply: {}", e);
            }
        })
        .res_async()
        .await
        .unwrap();

    println!("Opening session...");
    let session = zenoh_queryable::open(config)
        .hub(&hub)
        .res_async()
        .await
        .unwrap();

    println!("Sending Query '{}'...", selector);
    let replies = session
        .get(&selector)
        .target(target)
        .timeout(timeout)
        .res_async()
        .await
        .unwrap();
    while let Ok(reply) = replies.recv_async().await {
        match reply.sample {
            Ok(sample) => println!(
                ">> Received ('{}': '{}') from {}",
                sample.key_expr, sample.value, reply.replier_id
            ),
            Err(e) => println!(">> Received (ERROR: '{:?}')", e),
        }
    }

    session.close().res_async().await.unwrap();
    replier.close().res_async().await.unwrap();
}
