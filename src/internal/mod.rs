//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod dispose_bag;

pub(crate) use circular::{current_chain, current_parent, ChainGuard, ProducingGuard};
pub(crate) use dispose_bag::{BoxFutureUnit, DisposeBag, Teardown};
