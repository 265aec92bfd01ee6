use kmi_provider::cli::{self, options::Options};

#[tokio::main]
async fn main() {
    let options = Options::from_args();
    let code = cli::run(options).await;
    ::std::process::exit(code);
}
