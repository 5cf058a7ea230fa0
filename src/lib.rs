pub mod annot;
pub mod cli;
pub mod ctx;
pub mod db;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod search;
