//! Mock construction helpers

use mockall::mock;
use visgraph::pipeline::{SubgraphTemplate, TemplateLoader, TemplateRegistry};

mock! {
    pub Loader {}

    impl TemplateLoader for Loader {
        fn load_template(&self, role: &str, name: &str) -> Option<SubgraphTemplate>;
    }
}

/// A mock loader that answers every request from the built-in registry
pub fn builtin_backed_loader() -> MockLoader {
    let registry = TemplateRegistry::with_builtins();
    let mut loader = MockLoader::new();
    loader
        .expect_load_template()
        .returning(move |role, name| registry.load_template(role, name));
    loader
}

/// A mock loader that knows no templates at all
pub fn empty_loader() -> MockLoader {
    let mut loader = MockLoader::new();
    loader.expect_load_template().returning(|_, _| None);
    loader
}
