//! Error types for the component container.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Boxed error returned by user code (constructors, callbacks, hooks, producers).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Lifecycle stage in which a component failed.
///
/// Carried by [`DiError::Construction`] so that a failure can be traced back to
/// the exact step of the creation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Running the constructor or computing the exposed view of the raw instance
    Instantiate,
    /// Assigning a field-level dependency into the raw instance
    Inject,
    /// Name-aware / container-aware callbacks
    Aware,
    /// Early-reference hooks (tier-3 promotion)
    EarlyReference,
    /// Hooks run before initialization
    BeforeInit,
    /// The component's after-properties-set callback
    AfterPropertiesSet,
    /// The explicit init method
    InitMethod,
    /// Hooks run after initialization
    AfterInit,
    /// A producer's `produce()` call
    Produce,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Instantiate => "instantiation",
            Stage::Inject => "field injection",
            Stage::Aware => "aware callbacks",
            Stage::EarlyReference => "early reference hooks",
            Stage::BeforeInit => "before-init hooks",
            Stage::AfterPropertiesSet => "after-properties-set",
            Stage::InitMethod => "init method",
            Stage::AfterInit => "after-init hooks",
            Stage::Produce => "produce",
        };
        f.write_str(s)
    }
}

fn render_chain(chain: &[String]) -> String {
    if chain.is_empty() {
        "<root>".to_string()
    } else {
        chain.join(" -> ")
    }
}

/// Container errors
///
/// Every resolution error carries the dependency chain (outermost request first)
/// that led to the failure.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::DiError;
///
/// let circular = DiError::Circular {
///     chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
/// };
/// assert_eq!(circular.to_string(), "Circular dependency: a -> b -> a");
/// assert_eq!(circular.chain().len(), 3);
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// No definition registered under the name
    #[error("Component not found: {name} (chain: {})", render_chain(chain))]
    UnknownComponent { name: String, chain: Vec<String> },

    /// The definition is marked non-instantiable
    #[error("Component is abstract: {name} (chain: {})", render_chain(chain))]
    AbstractDefinition { name: String, chain: Vec<String> },

    /// Cycle through an edge that cannot be broken with an early reference
    #[error("Circular dependency: {}", chain.join(" -> "))]
    Circular { chain: Vec<String> },

    /// A producer asked for its own product while producing it
    #[error("Producer requested its own product: {name} (chain: {})", render_chain(chain))]
    ProducerSelfReference { name: String, chain: Vec<String> },

    /// User code failed during one of the lifecycle stages
    #[error("Failed to construct {name} during {stage}: {source} (chain: {})", render_chain(chain))]
    Construction {
        name: String,
        stage: Stage,
        chain: Vec<String>,
        #[source]
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    /// Waiting on another thread's creation exceeded the configured deadline
    #[error("Timed out after {waited:?} waiting for {name} (chain: {})", render_chain(chain))]
    ResolutionTimeout {
        name: String,
        waited: Duration,
        chain: Vec<String>,
    },

    /// `&name` was requested but the component is not a producer
    #[error("Component is not a producer: {name}")]
    NotAProducer { name: String },

    /// The resolved object is not of the requested type
    #[error("Type mismatch for {name}: expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// An early reference was handed out, then initialization replaced the object
    #[error("Early reference of {name} was injected but the component was replaced during initialization (chain: {})", render_chain(chain))]
    InconsistentEarlyReference { name: String, chain: Vec<String> },

    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),

    /// A definition with the same name is already registered
    #[error("Component already registered: {0}")]
    DuplicateDefinition(String),

    /// The name is empty or starts with the producer prefix
    #[error("Invalid component name: {0:?}")]
    InvalidName(String),

    /// The container was shut down
    #[error("Container has been shut down")]
    ContainerClosed,
}

impl DiError {
    /// Wraps a failure coming out of user code.
    ///
    /// A `DiError` returned through user code (e.g. a constructor that resolved
    /// another component with `?`) is propagated unchanged so the root cause keeps
    /// its own variant and chain.
    pub(crate) fn construction(name: &str, stage: Stage, chain: Vec<String>, error: BoxError) -> Self {
        match error.downcast::<DiError>() {
            Ok(inner) => *inner,
            Err(other) => DiError::Construction {
                name: name.to_string(),
                stage,
                chain,
                source: Arc::from(other),
            },
        }
    }

    /// The dependency chain attached to this error, if any.
    pub fn chain(&self) -> &[String] {
        match self {
            DiError::UnknownComponent { chain, .. }
            | DiError::AbstractDefinition { chain, .. }
            | DiError::Circular { chain }
            | DiError::ProducerSelfReference { chain, .. }
            | DiError::Construction { chain, .. }
            | DiError::ResolutionTimeout { chain, .. }
            | DiError::InconsistentEarlyReference { chain, .. } => chain,
            _ => &[],
        }
    }

    /// The lifecycle stage for construction failures.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DiError::Construction { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type for container operations
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{DiResult, DiError};
///
/// fn lookup(name: &str) -> DiResult<()> {
///     Err(DiError::UnknownComponent { name: name.to_string(), chain: vec![name.to_string()] })
/// }
///
/// assert!(lookup("missing").is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
