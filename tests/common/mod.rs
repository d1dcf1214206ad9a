#![allow(dead_code)]

pub mod planner_server;
pub mod utils;
