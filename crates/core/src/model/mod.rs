mod descriptor;
mod query;

pub use descriptor::ModelDescriptor;
pub use query::{Filter, Operator, Order, QueryDescriptor};
