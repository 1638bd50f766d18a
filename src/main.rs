fn main() {
    if let Err(err) = depdot::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
