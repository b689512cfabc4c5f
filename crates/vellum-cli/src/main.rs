//! Thin entry point: all argument parsing and dispatch lives in
//! `vellum_cli::cli`.

#[tokio::main]
async fn main() {
    let exit_code = vellum_cli::run().await;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
