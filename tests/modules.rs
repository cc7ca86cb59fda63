/// Tests for grouped registration through ComponentModule

use ferrous_ioc::{
    Autowired, ComponentCollection, ComponentDefinition, ComponentModule, DiError, DiResult, Resolver,
};

#[derive(Debug)]
struct Settings {
    url: String,
}

#[derive(Default)]
struct Database {
    settings: Autowired<Settings>,
}

#[derive(Default)]
struct UserService {
    db: Autowired<Database>,
}

struct InfrastructureModule {
    url: &'static str,
}

impl ComponentModule for InfrastructureModule {
    fn register_components(self, components: &mut ComponentCollection) -> DiResult<()> {
        components
            .register(ComponentDefinition::from_instance("settings", Settings { url: self.url.to_string() }))?
            .register(
                ComponentDefinition::builder::<Database>("database")
                    .with_default()
                    .autowire::<Settings, _>("settings", |d| &d.settings)
                    .build(),
            )?;
        Ok(())
    }
}

struct UserModule;

impl ComponentModule for UserModule {
    fn register_components(self, components: &mut ComponentCollection) -> DiResult<()> {
        components.register(
            ComponentDefinition::builder::<UserService>("users")
                .with_default()
                .autowire::<Database, _>("database", |u| &u.db)
                .build(),
        )?;
        Ok(())
    }
}

#[test]
fn modules_compose_into_one_container() {
    let mut components = ComponentCollection::new();
    components
        .add_module(UserModule)
        .unwrap()
        .add_module(InfrastructureModule { url: "db://modules" })
        .unwrap();
    assert_eq!(components.len(), 3);
    assert!(components.contains("database"));

    let container = components.build().unwrap();
    let users = container.get::<UserService>("users").unwrap();
    let settings = users.db.get_required().settings.get_required();
    assert_eq!(settings.url, "db://modules");
    assert_eq!(container.component_names(), ["users", "settings", "database"]);
}

#[test]
fn module_errors_propagate() {
    let mut components = ComponentCollection::new();
    components.add_module(InfrastructureModule { url: "a" }).unwrap();

    let err = components.add_module(InfrastructureModule { url: "b" }).err().unwrap();
    assert!(matches!(err, DiError::DuplicateDefinition(name) if name == "settings"));
}
