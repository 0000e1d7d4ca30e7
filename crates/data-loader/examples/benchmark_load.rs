use data_loader::{Catalog, LoaderConfig};
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/movies.csv"));

    println!("Loading catalog snapshot {}...\n", path.display());

    let start = Instant::now();
    let catalog = Catalog::load_from_file(&path, &LoaderConfig::new())
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    let duplicates = catalog
        .items()
        .iter()
        .filter(|item| item.base_title() != item.title)
        .count();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", catalog.len());
    println!("Genres: {}", catalog.genres().count());
    println!("Titles disambiguated by date: {}", duplicates);
    println!("Fingerprint: {}", catalog.fingerprint());
    println!("\nPerformance: {:.0} movies/second",
             catalog.len() as f64 / elapsed.as_secs_f64());
}
