mod path_resolver;
mod probe;
mod strategy;


pub use path_resolver::ExecutableResolver;
pub use strategy::{Resolution, Strategy};
