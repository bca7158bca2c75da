pub mod common;
pub mod generate;

/// Run a command body and map its result to an exit code.
pub fn run_cli_sync<F>(f: F) -> i32
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}
