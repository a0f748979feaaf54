fn main() {
    if let Err(err) = roster_map::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
