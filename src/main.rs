#[cfg(feature = "cli")]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    match web_search_agent::cli::run().await {
        // The stdin reader may still be parked on a blocking read, so leave
        // without waiting for the runtime to drain it.
        Ok(_) => std::process::exit(0),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    std::process::exit(1);
}
