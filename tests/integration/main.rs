#![cfg_attr(test, allow(clippy::float_cmp))]

mod jwk;
mod jws;
mod jwt;
