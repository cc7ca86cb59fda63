//! Core traits for the component container.

mod aware;
mod dispose;
mod producer;
mod resolver;

pub use aware::{ContainerAware, InitializingComponent, NameAware};
pub use dispose::{AsyncDispose, Dispose};
pub use producer::Producer;
pub(crate) use producer::ErasedProducer;
pub use resolver::{Resolver, ResolverCore};
