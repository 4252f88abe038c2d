fn main() {
    if let Err(err) = mass_script_cli::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
