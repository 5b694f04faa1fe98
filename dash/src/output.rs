use dash_core::engine::Dashboard;
use dash_core::plugin::PluginSource;
use dash_core::{PluginDescriptor, RestoreSummary};

pub fn print_info(message: &str) {
    println!("[Dash][INFO] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[Dash][ERROR]: {message}");
}

pub fn print_warning(message: &str) {
    eprintln!("[Dash][WARN] {message}");
}

pub fn print_widget_list(descriptors: &[PluginDescriptor]) {
    if descriptors.is_empty() {
        print_info("No widgets registered");
        return;
    }
    print_info("Available widgets:");
    for descriptor in descriptors {
        let instances = if descriptor.supports_multiple {
            "multi"
        } else {
            "single"
        };
        match &descriptor.source {
            PluginSource::Bundled => println!(
                "{} ({}) [{instances}] {}",
                descriptor.display_name, descriptor.module_name, descriptor.description
            ),
            PluginSource::Manifest(path) => println!(
                "{} ({}) [{instances}] {}",
                descriptor.display_name,
                descriptor.module_name,
                path.display()
            ),
        }
    }
}

pub fn print_dashboards(dashboards: &[Dashboard], current: usize) {
    print_info("Dashboards:");
    for (index, dashboard) in dashboards.iter().enumerate() {
        let marker = if index == current { "*" } else { " " };
        let count = dashboard.len();
        let widgets = if count == 1 { "widget" } else { "widgets" };
        println!("{marker}[{index}] {} - {count} {widgets}", dashboard.title());
        if dashboard.is_empty() {
            println!("\t(none)");
            continue;
        }
        let surface = dashboard.surface();
        for instance in dashboard.widgets() {
            let Some(dock) = surface.dock(&instance.dock_name) else {
                continue;
            };
            let visibility = if dock.visible { "" } else { " hidden" };
            println!(
                "\t{} ({}) [{}{}] {}x{} at {},{}: {}",
                instance.id,
                instance.kind,
                dock.area.label(),
                visibility,
                dock.geometry.width,
                dock.geometry.height,
                dock.geometry.x,
                dock.geometry.y,
                instance.widget.summary()
            );
        }
    }
}

pub fn print_restore_warnings(summary: &RestoreSummary) {
    for warning in &summary.warnings {
        print_warning(warning);
    }
    for report in &summary.reports {
        for warning in &report.warnings {
            print_warning(warning);
        }
    }
}
