use dash_core::{PluginRegistry, WidgetInstanceNamer};

#[test]
fn single_instance_kinds_use_the_module_name() {
    let registry = PluginRegistry::with_bundled();
    let clock = registry.resolve("clock").unwrap();
    let mut namer = WidgetInstanceNamer::new();
    assert_eq!(namer.allocate(clock, Some("My Clock")), "clock");
    assert_eq!(namer.allocate(clock, None), "clock_1");
    assert_eq!(namer.live_count(), 2);
}

#[test]
fn multi_instance_kinds_append_the_title() {
    let registry = PluginRegistry::with_bundled();
    let list = registry.resolve("custom_list").unwrap();
    let mut namer = WidgetInstanceNamer::new();
    assert_eq!(namer.allocate(list, Some("Groceries")), "custom_list_groceries");
    assert_eq!(namer.allocate(list, Some("To Do")), "custom_list_to_do");
    assert_eq!(namer.allocate(list, Some("Groceries")), "custom_list_1");
    assert_eq!(namer.allocate(list, Some("  ")), "custom_list");
}

#[test]
fn retired_ids_are_not_reused_within_a_session() {
    let registry = PluginRegistry::with_bundled();
    let list = registry.resolve("custom_list").unwrap();
    let mut namer = WidgetInstanceNamer::new();
    let first = namer.allocate(list, Some("Groceries"));
    namer.release(&first);
    assert!(!namer.is_live(&first));
    assert_eq!(namer.allocate(list, Some("Groceries")), "custom_list_1");

    namer.clear();
    assert_eq!(namer.allocate(list, Some("Groceries")), "custom_list_groceries");
}

#[test]
fn claim_keeps_persisted_ids_unless_taken() {
    let mut namer = WidgetInstanceNamer::new();
    assert_eq!(namer.claim("custom_list_groceries", "custom_list"), "custom_list_groceries");
    assert_eq!(namer.claim("custom_list_groceries", "custom_list"), "custom_list_1");
    assert_eq!(namer.claim("clock", "clock"), "clock");
}

#[test]
fn rename_moves_multi_instance_ids_only() {
    let registry = PluginRegistry::with_bundled();
    let list = registry.resolve("custom_list").unwrap();
    let clock = registry.resolve("clock").unwrap();
    let mut namer = WidgetInstanceNamer::new();
    let id = namer.allocate(list, Some("Foo"));

    assert_eq!(namer.rename(list, &id, "Bar"), "custom_list_bar");
    assert!(!namer.is_live("custom_list_foo"));
    assert_eq!(namer.rename(list, "custom_list_bar", "bar"), "custom_list_bar");

    let clock_id = namer.allocate(clock, None);
    assert_eq!(namer.rename(clock, &clock_id, "Wall Clock"), "clock");
}
