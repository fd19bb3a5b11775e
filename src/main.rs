#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    csv_cleaner_lib::run().await
}
