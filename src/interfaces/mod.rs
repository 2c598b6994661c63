//! File formats used by the admin command line.

pub mod backup;
pub mod csv;
