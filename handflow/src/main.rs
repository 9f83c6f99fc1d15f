//! handflow: interactive entry point.

use clap::Parser;
use handflow::app;
use handflow::cli::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = match cli.into_app_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          handflow: gesture-driven particles + MIDI           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Genre: {}", cfg.engine.genre);
    match cfg.tracker {
        app::TrackerKind::Leap => println!("  Mode:  LeapMotion hardware"),
        app::TrackerKind::Simulated => println!("  Mode:  mouse/keyboard simulation (--leap for hardware)"),
    }
    println!();

    if let Err(e) = app::run(cfg) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
