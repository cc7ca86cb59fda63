//! Product resolution for indirect producers.

use std::sync::Arc;

use super::resolve::Resolved;
use super::ContainerInner;
use crate::cache::{AcquireError, Acquired};
use crate::definition::ComponentDefinition;
use crate::error::{DiError, DiResult, Stage};
use crate::hooks::HookStage;
use crate::internal::{current_chain, ProducingGuard};
use crate::naming::product_name;
use crate::traits::ErasedProducer;

impl ContainerInner {
    /// The product of `def`'s finished producer.
    ///
    /// Cacheable products are singletons stored under a synthetic name; the
    /// others are produced on every request and not owned by the cache.
    pub(super) fn product(&self, def: &ComponentDefinition, producer: Arc<dyn ErasedProducer>) -> DiResult<Resolved> {
        let name = def.name.as_str();
        let Some(_producing) = ProducingGuard::enter(name) else {
            return Err(DiError::ProducerSelfReference { name: name.to_string(), chain: current_chain() });
        };

        if !producer.is_cacheable() {
            let bean = self.produce(name, producer.as_ref())?;
            return Ok(Resolved { bean, managed: false });
        }

        let cache_name = product_name(name);
        match self.cache.acquire(&cache_name, self.config.wait_timeout()) {
            Ok(Acquired::Finished(bean)) => Ok(Resolved::managed(bean)),
            Ok(Acquired::Owner(guard)) => match self.produce(name, producer.as_ref()) {
                Ok(bean) => {
                    guard.finish(bean.clone());
                    tracing::debug!(component = name, "product cached");
                    Ok(Resolved::managed(bean))
                }
                Err(error) => {
                    guard.fail(error.clone());
                    Err(error)
                }
            },
            // Products never register early factories
            Ok(Acquired::Early(_)) | Ok(Acquired::EarlyFactory(_)) | Err(AcquireError::Cycle) => {
                Err(DiError::Circular { chain: current_chain() })
            }
            Err(AcquireError::Timeout(waited)) => Err(DiError::ResolutionTimeout {
                name: name.to_string(),
                waited,
                chain: current_chain(),
            }),
            Err(AcquireError::Failed(error)) => Err(error),
        }
    }

    fn produce(&self, name: &str, producer: &dyn ErasedProducer) -> DiResult<crate::bean::Bean> {
        tracing::trace!(component = name, "producing");
        let product = producer
            .produce_bean(self)
            .map_err(|e| DiError::construction(name, Stage::Produce, current_chain(), e))?;
        self.hooks.apply(HookStage::AfterInit, name, &current_chain(), product)
    }
}
