//! Domain logic for the radiostar movie-rental API: entity models, sort-key
//! allow-lists, the `{data, meta}` response envelope, and row formatters.
//! No HTTP or SQL in here; the server crate owns both ends.

pub mod envelope;
pub mod format;
pub mod model;
