mod scrape;
mod structs;
pub mod validators;

pub use scrape::render_scrape_job;
pub use structs::*;
