#![allow(async_fn_in_trait)]

pub mod connection;
pub mod quiz;
pub mod recommend;
pub mod user;
