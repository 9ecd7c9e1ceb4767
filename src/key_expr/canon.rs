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
use super::{DELIMITER, DOUBLE_WILD, STAR_DSL};

pub trait Canonizable {
    fn canonize(&mut self);
}

/// Rewrites a single chunk so that `$*$*` collapses into `$*` and a lone `$*` becomes `*`.
fn canonize_chunk(chunk: &str) -> String {
    let mut chunk = chunk.to_string();
    let doubled = format!("{}{}", STAR_DSL, STAR_DSL);
    while chunk.contains(&doubled) {
        chunk = chunk.replace(&doubled, STAR_DSL);
    }
    if chunk == STAR_DSL {
        chunk = "*".to_string();
    }
    chunk
}

impl Canonizable for String {
    fn canonize(&mut self) {
        let mut out = String::with_capacity(self.len());
        let mut in_big_wild = false;
        let push = |out: &mut String, s: &str| {
            if !out.is_empty() {
                out.push(DELIMITER);
            }
            out.push_str(s);
        };

        for chunk in self.split(DELIMITER) {
            if chunk.is_empty() {
                continue;
            }
            let chunk = canonize_chunk(chunk);
            if in_big_wild {
                match chunk.as_str() {
                    // `**/*` is written `*/**`: emit the `*` and stay in the big wild.
                    "*" => push(&mut out, "*"),
                    DOUBLE_WILD => {}
                    _ => {
                        push(&mut out, DOUBLE_WILD);
                        push(&mut out, &chunk);
                        in_big_wild = false;
                    }
                }
            } else if chunk == DOUBLE_WILD {
                in_big_wild = true;
            } else {
                push(&mut out, &chunk);
            }
        }
        if in_big_wild {
            push(&mut out, DOUBLE_WILD);
        }
        *self = out;
    }
}
