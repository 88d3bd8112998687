mod api;
mod model;
mod policy;

pub use api::*;
pub use model::*;
pub use policy::*;
