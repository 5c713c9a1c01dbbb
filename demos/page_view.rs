use silktide_consent::{
    categories::CategoryDefinition,
    config::{BannerConfig, ConfigError},
    events::{ViewCommand, ViewEvent},
    storage::{InMemoryLocalStore, LocalStore},
    view::View,
    LifecycleManager,
};

/// A view that prints every command instead of drawing it.
struct PrintingView {
    page: &'static str,
}

impl View for PrintingView {
    fn apply(&mut self, command: ViewCommand) -> anyhow::Result<()> {
        match command {
            ViewCommand::Mount { model } => {
                println!("[{}] mount widget {} ({} categories)", self.page, model.widget_id, model.categories.len())
            }
            other => println!("[{}] {:?}", self.page, other),
        }
        Ok(())
    }
}

fn config() -> Result<BannerConfig, ConfigError> {
    BannerConfig::builder()
        .category(
            CategoryDefinition::new("essential")
                .name("Essential")
                .required(true)
                .on_accept(|| println!("  -> essential cookies active")),
        )
        .category(
            CategoryDefinition::new("analytics")
                .name("Analytics")
                .on_accept(|| println!("  -> loading analytics"))
                .on_reject(|| println!("  -> analytics disabled")),
        )
        .show_background(true)
        .on_accept_all(|| println!("  -> visitor accepted everything"))
        .build()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // One store stands in for the browser's local storage. Both page views below share it,
    // just like two visits to the same site share localStorage.
    let store = InMemoryLocalStore::new();
    let origin = url::Url::parse("https://shop.example")?.origin();

    // First visit: the banner is shown, the visitor opens the preferences, enables analytics
    // and closes the modal.
    println!("== first visit");
    let mut page = LifecycleManager::for_origin(&store, &origin, || Box::new(PrintingView { page: "first" }) as Box<dyn View>);
    page.update_config(config()?);
    page.on_document_ready();
    page.handle_event(ViewEvent::PreferencesClicked)?;
    page.handle_event(ViewEvent::CheckboxToggled { id: "analytics".into(), checked: true })?;
    page.handle_event(ViewEvent::ModalClosed)?;
    page.teardown();

    // Second visit: no banner, only the cookie icon. The stored decision fires the accept
    // callbacks straight away.
    println!("== returning visit");
    let mut page = LifecycleManager::for_origin(&store, &origin, || Box::new(PrintingView { page: "second" }) as Box<dyn View>);
    page.on_document_ready();
    page.update_config(config()?);

    let area = store.area(&origin)?;
    for key in area.keys() {
        println!("stored {key} = {:?}", area.get_item(&key).ok().flatten());
    }

    Ok(())
}
