use reqwest::Client;
use tabled::Table;

use crate::{
    catalog::CatalogClient,
    cli::spinner,
    error, info,
    types::SongQueryResult,
    utils,
};

fn catalog(catalog_url: &str) -> CatalogClient {
    CatalogClient::new(Client::new(), catalog_url)
}

fn print_result(result: &SongQueryResult) {
    if result.songs.is_empty() {
        info!("No songs found.");
        return;
    }
    println!("{}", Table::new(utils::song_rows(&result.songs)));
    info!("{} of {} songs", result.songs.len(), result.total);
}

pub async fn search(catalog_url: &str, query: &str, limit: Option<u32>) {
    let pb = spinner("Searching catalog...");
    let result = catalog(catalog_url).search_songs(query, limit).await;
    pb.finish_and_clear();

    match result {
        Ok(r) => print_result(&r),
        Err(e) => error!("Search failed: {}", e),
    }
}

pub async fn similar(catalog_url: &str, track_id: &str, limit: Option<u32>) {
    let pb = spinner("Fetching similar songs...");
    let result = catalog(catalog_url).recommendations_for(track_id, limit).await;
    pb.finish_and_clear();

    match result {
        Ok(r) => print_result(&r),
        Err(e) => error!("Failed to fetch similar songs: {}", e),
    }
}

pub async fn song(catalog_url: &str, track_id: &str) {
    let pb = spinner("Fetching song...");
    let result = catalog(catalog_url).get_song(track_id).await;
    pb.finish_and_clear();

    match result {
        Ok(s) => {
            println!("{}", Table::new(utils::song_rows(std::slice::from_ref(&s))));
            info!("Duration {}", utils::format_duration_ms(s.duration_ms));
            println!("{}", Table::new(utils::feature_rows(&s.resolved_features())));
        }
        Err(e) => error!("Failed to fetch song: {}", e),
    }
}
