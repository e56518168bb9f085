#![allow(dead_code)]

pub mod character_server;
