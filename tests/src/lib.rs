#![cfg(test)]

mod support;
mod topology;
