use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    medexplain_lib::run().await
}
