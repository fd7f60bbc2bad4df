mod cache;
mod export;
mod probing;
mod scenarios;
