use ferrous_ioc::{
    stage_hook, Autowired, Bean, BoxError, ComponentCollection, ComponentDefinition, ComponentHook,
    ContainerConfig, DiError, HookStage, Resolver, Stage,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

impl std::fmt::Debug for dyn Greeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Greeter").finish_non_exhaustive()
    }
}

/// Greets and holds a back-reference that closes a cycle.
#[derive(Default)]
struct Host {
    friend: Autowired<Friend>,
}

impl Greeter for Host {
    fn greet(&self) -> String {
        "host".to_string()
    }
}

#[derive(Default)]
struct Friend {
    host: Autowired<dyn Greeter>,
}

struct Loud {
    inner: Arc<dyn Greeter>,
}

impl Greeter for Loud {
    fn greet(&self) -> String {
        self.inner.greet().to_uppercase()
    }
}

fn loud(bean: &Bean) -> Result<Bean, BoxError> {
    let inner = bean.downcast_trait::<dyn Greeter>().ok_or("not a greeter")?;
    Ok(Bean::from_trait(Arc::new(Loud { inner }) as Arc<dyn Greeter>))
}

/// Wraps `target` in a [`Loud`] proxy, handing out the same proxy early and late.
struct ProxyHook {
    target: &'static str,
    proxies: Mutex<HashMap<String, Bean>>,
}

impl ProxyHook {
    fn new(target: &'static str) -> Arc<Self> {
        Arc::new(Self { target, proxies: Mutex::new(HashMap::new()) })
    }

    fn proxy(&self, name: &str, bean: Bean) -> Result<Bean, BoxError> {
        if name != self.target {
            return Ok(bean);
        }
        let mut proxies = self.proxies.lock();
        if let Some(proxy) = proxies.get(name) {
            return Ok(proxy.clone());
        }
        let proxy = loud(&bean)?;
        proxies.insert(name.to_string(), proxy.clone());
        Ok(proxy)
    }
}

impl ComponentHook for ProxyHook {
    fn handles(&self, stage: HookStage) -> bool {
        matches!(stage, HookStage::EarlyReference | HookStage::AfterInit)
    }

    fn early_reference(&self, name: &str, bean: Bean) -> Result<Bean, BoxError> {
        self.proxy(name, bean)
    }

    fn after_init(&self, name: &str, bean: Bean) -> Result<Bean, BoxError> {
        self.proxy(name, bean)
    }
}

fn host_and_friend(config: ContainerConfig) -> ComponentCollection {
    let mut components = ComponentCollection::with_config(config);
    components
        .register(
            ComponentDefinition::builder::<Host>("host")
                .with_default()
                .expose_as::<dyn Greeter, _>(|h| h as Arc<dyn Greeter>)
                .autowire::<Friend, _>("friend", |h| &h.friend)
                .build(),
        )
        .unwrap()
        .register(
            ComponentDefinition::builder::<Friend>("friend")
                .with_default()
                .autowire_trait::<dyn Greeter, _>("host", |f| &f.host)
                .build(),
        )
        .unwrap();
    components
}

#[test]
fn hooks_run_in_registration_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut components = ComponentCollection::new();
    for tag in ["first", "second"] {
        let seen = seen.clone();
        components.add_hook(stage_hook(HookStage::BeforeInit, move |name, bean| {
            seen.lock().push(format!("{tag}:{name}"));
            Ok(bean)
        }));
    }
    components.register(ComponentDefinition::from_instance("x", 1u8)).unwrap();
    let _container = components.build().unwrap();

    assert_eq!(*seen.lock(), ["first:x", "second:x"]);
}

#[test]
fn before_init_runs_before_init_callbacks_and_after_init_after() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (before, init, after) = (log.clone(), log.clone(), log.clone());

    let mut components = ComponentCollection::new();
    components
        .add_hook(stage_hook(HookStage::BeforeInit, move |_, bean| {
            before.lock().push("before");
            Ok(bean)
        }))
        .add_hook(stage_hook(HookStage::AfterInit, move |_, bean| {
            after.lock().push("after");
            Ok(bean)
        }));
    components
        .register(
            ComponentDefinition::builder::<u8>("x")
                .constructor(|_| Ok(0))
                .init_method(move |_| {
                    init.lock().push("init");
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    let _container = components.build().unwrap();

    assert_eq!(*log.lock(), ["before", "init", "after"]);
}

#[test]
fn after_init_replacement_becomes_the_singleton() {
    let mut components = ComponentCollection::new();
    components.add_hook(stage_hook(HookStage::AfterInit, |_, bean| loud(&bean)));
    components
        .register(
            ComponentDefinition::builder::<Host>("host")
                .with_default()
                .expose_as::<dyn Greeter, _>(|h| h as Arc<dyn Greeter>)
                .build(),
        )
        .unwrap();
    let container = components.build().unwrap();

    assert_eq!(container.get_trait::<dyn Greeter>("host").unwrap().greet(), "HOST");
}

#[test]
fn early_proxy_matches_the_finished_proxy() {
    let hook = ProxyHook::new("host");
    let mut components = host_and_friend(ContainerConfig::default());
    components.add_hook(hook);
    let container = components.build().unwrap();

    let host = container.get_trait::<dyn Greeter>("host").unwrap();
    let friend = container.get::<Friend>("friend").unwrap();
    assert_eq!(host.greet(), "HOST");
    assert!(Arc::ptr_eq(&friend.host.get_required(), &host));
}

#[test]
fn early_proxy_from_the_other_entry_point() {
    let hook = ProxyHook::new("host");
    let mut components = host_and_friend(ContainerConfig::default().with_eager_init(false));
    components.add_hook(hook);
    let container = components.build().unwrap();

    // friend first: host is created in full and never handed out early
    let friend = container.get::<Friend>("friend").unwrap();
    let host = container.get_trait::<dyn Greeter>("host").unwrap();
    assert_eq!(friend.host.get_required().greet(), "HOST");
    assert!(Arc::ptr_eq(&friend.host.get_required(), &host));
}

#[test]
fn late_only_wrapping_after_early_exposure_is_inconsistent() {
    let mut components = host_and_friend(ContainerConfig::default().with_eager_init(false));
    components.add_hook(stage_hook(HookStage::AfterInit, |name, bean| {
        if name == "host" {
            loud(&bean)
        } else {
            Ok(bean)
        }
    }));
    let container = components.build().unwrap();

    match container.get_trait::<dyn Greeter>("host") {
        Err(DiError::InconsistentEarlyReference { name, .. }) => assert_eq!(name, "host"),
        other => panic!("expected InconsistentEarlyReference, got {other:?}"),
    }
    // friend captured the discarded early reference, so it went too
    assert!(!container.is_singleton_finished("friend"));
    assert!(!container.is_singleton_finished("host"));
}

#[test]
fn raw_injection_can_be_allowed() {
    let config = ContainerConfig::default().with_raw_injection_despite_wrapping(true);
    let mut components = host_and_friend(config);
    components.add_hook(stage_hook(HookStage::AfterInit, |name, bean| {
        if name == "host" {
            loud(&bean)
        } else {
            Ok(bean)
        }
    }));
    let container = components.build().unwrap();

    let host = container.get_trait::<dyn Greeter>("host").unwrap();
    let friend = container.get::<Friend>("friend").unwrap();
    assert_eq!(host.greet(), "HOST");
    // friend keeps the raw object it was given
    let raw = friend.host.get_required();
    assert_eq!(raw.greet(), "host");
    assert!(!Arc::ptr_eq(&raw, &host));
}

#[test]
fn hook_failure_is_a_construction_error() {
    let mut components = ComponentCollection::new();
    components.add_hook(stage_hook(HookStage::BeforeInit, |_, _| Err("rejected".into())));
    components.register(ComponentDefinition::from_instance("x", 1u8)).unwrap();

    match components.build() {
        Err(err) => {
            assert_eq!(err.stage(), Some(Stage::BeforeInit));
            assert!(err.to_string().contains("rejected"));
        }
        Ok(_) => panic!("expected the hook to fail the build"),
    }
}

/// A hook that is itself a component, with a dependency of its own.
#[derive(Default)]
struct Audit {
    prefix: Autowired<String>,
    seen: Mutex<Vec<String>>,
}

impl ComponentHook for Audit {
    fn handles(&self, stage: HookStage) -> bool {
        stage == HookStage::AfterInit
    }

    fn after_init(&self, name: &str, bean: Bean) -> Result<Bean, BoxError> {
        let prefix = self.prefix.get().ok_or("prefix released")?;
        self.seen.lock().push(format!("{prefix}{name}"));
        Ok(bean)
    }
}

#[test]
fn hook_components_are_created_first_and_see_later_components() {
    let builder_seen = Arc::new(Mutex::new(Vec::new()));
    let seen = builder_seen.clone();

    let mut components = ComponentCollection::new();
    components.add_hook(stage_hook(HookStage::AfterInit, move |name, bean| {
        seen.lock().push(name.to_string());
        Ok(bean)
    }));
    components
        .register(ComponentDefinition::from_instance("x", 1u8))
        .unwrap()
        .register(ComponentDefinition::from_instance("prefix", "audit:".to_string()))
        .unwrap()
        .register(
            ComponentDefinition::builder::<Audit>("audit")
                .with_default()
                .autowire::<String, _>("prefix", |a| &a.prefix)
                .hook()
                .build(),
        )
        .unwrap();
    let container = components.build().unwrap();

    // the hook component and its dependency were created before anything else
    assert_eq!(container.singleton_names(), ["prefix", "audit", "x"]);
    assert_eq!(*builder_seen.lock(), ["prefix", "audit", "x"]);
    let audit = container.get::<Audit>("audit").unwrap();
    assert_eq!(*audit.seen.lock(), ["audit:x"]);
}
