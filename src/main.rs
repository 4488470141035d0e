fn main() {
    if let Err(err) = crm_lake::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
