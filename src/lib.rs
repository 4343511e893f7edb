pub mod consolidate;
pub mod dates;
pub mod features;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod sanitize;
pub mod sources;
pub mod summary;
