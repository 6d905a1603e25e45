#![doc = include_str!("../README.md")]
#[macro_use]
extern crate log;

pub(crate) mod cli;
pub mod builder;
pub mod corpus;
pub mod error;
pub mod index;
pub mod lang;
pub mod merger;
pub mod preprocess;
pub mod query;
