#![allow(dead_code)]

pub mod assertions;
pub mod mock_server;
pub mod vectors;
