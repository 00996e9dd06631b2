fn main() {
    let args = std::env::args();
    // Initialize logging as early as possible; fallback to stderr on failure.
    let _ = snapdist::logging::init_logging(snapdist::logging::LogFormat::from_env());

    if let Err(err) = snapdist::run(args) {
        eprintln!("snapdist error: {err}");
        std::process::exit(1);
    }
}
