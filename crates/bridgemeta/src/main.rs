fn main() {
    let code = bridgemeta_cli::run_cli(std::env::args().collect());
    std::process::exit(code);
}
