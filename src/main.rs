fn main() {
    if let Err(e) = ollaterm::cli::main() {
        eprintln!("❌ Error: {e}");
        std::process::exit(1);
    }
}
