use colored::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = betaclip::cli::run_cli() {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
