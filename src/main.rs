use std::process::ExitCode;

fn main() -> ExitCode {
    // Load .env file if it exists (optional - won't fail if missing)
    if let Err(e) = squashplane::config::load_env_file(None) {
        eprintln!("Warning: {}", e);
    }

    match squashplane::cli::run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
