use final_rating_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("final-rating: {err}");
        std::process::exit(1);
    }
}
