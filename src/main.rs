use annotate_task::app::AnnotateApp;
use annotate_task::config::{self, CliArgs, Config};
use eframe::egui;

fn load_config() -> annotate_task::Result<Config> {
    let cli = CliArgs::parse(pico_args::Arguments::from_env())?;
    let path = cli.config.clone().or_else(config::default_config_path);
    let mut settings = match &path {
        Some(path) => config::load_from_path(path)?,
        None => Config::default(),
    };

    let save = cli.save_config;
    let unexpected = cli.unexpected.clone();
    settings.apply_cli(cli);

    env_logger::Builder::new()
        .filter_level(settings.log_level.to_level_filter())
        .parse_default_env()
        .init();

    if !unexpected.is_empty() {
        log::warn!("ignoring unexpected arguments: {unexpected:?}");
    }
    if save {
        if let Some(path) = &path {
            config::save_to_path(&settings, path)?;
            log::info!("settings written to {}", path.display());
        }
    }
    Ok(settings)
}

fn main() {
    let settings = match load_config() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("annotate-task: {err}");
            std::process::exit(1);
        }
    };

    let title = format!("annotate-task - {}", settings.tasks_file.display());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    if let Err(err) = eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(AnnotateApp::new(&cc.egui_ctx, settings)))),
    ) {
        log::error!("window failed: {err}");
        std::process::exit(1);
    }
}
