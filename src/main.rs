fn main() {
    if let Err(e) = stratify::run() {
        tracing::error!("Fatal: {e}");
        eprintln!("stratify: {e}");
        std::process::exit(1);
    }
}
