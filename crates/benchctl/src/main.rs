fn main() {
    if let Err(e) = benchctl::runtime::run_from_args() {
        eprintln!("benchctl: {}", e);
        std::process::exit(1);
    }
}
