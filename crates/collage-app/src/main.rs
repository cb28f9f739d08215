//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() -> std::process::ExitCode {
    use clap::Parser;
    use collage_app::{AppConfig, CliArgs, Shell};
    use std::io::{self, BufReader};

    env_logger::init();
    log::info!("Starting Collage");

    let config = AppConfig::from(CliArgs::parse());
    let mut shell = Shell::from_config(&config);

    let result = match &config.script {
        Some(path) => match std::fs::File::open(path) {
            Ok(file) => shell.run(BufReader::new(file), io::stdout().lock()),
            Err(e) => Err(e),
        },
        None => shell.run(io::stdin().lock(), io::stdout().lock()),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}: {}", config.title, e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
